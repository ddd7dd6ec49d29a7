use std::error::Error as StdError;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorCategory {
    /// Any failure that cannot be confidently attributed to any other error
    /// category in this enum.
    ///
    /// Use of Internal is never a guarantee the error was not caused by the
    /// caller - merely that it cannot be confidently determined by the code.
    Internal,

    /// The user provided invalid input (bad salt text, wrong passphrase,
    /// corrupt ciphertext, missing file).
    User,
}

/// Fine-grained condition flags for consumers that want to branch on error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Neither the primary nor the fallback key algorithm is available.
    EnvironmentUnsupported,
    /// A single key algorithm is not offered by the provider. This is the
    /// only kind that makes key derivation fall back to the legacy algorithm.
    AlgorithmUnavailable,
    /// The key derivation function itself failed.
    KeyDerivation,
    /// Cipher setup or transform failed: bad padding after decryption
    /// (wrong passphrase, wrong salt, corruption) or truncated ciphertext.
    CryptoOperation,
    /// Salt bytes had the wrong length.
    InvalidSalt,
    /// Text could not be decoded back to bytes.
    EncodingInvalid,
    /// The operating system random source could not be read.
    RandomUnavailable,
    /// Passphrase could not be obtained from the configured reader.
    PassphraseUnavailable,
    /// Interaction with the filesystem, stdin/stdout, or other I/O failed.
    Io,
}

#[derive(Debug, Error)]
#[error("{msg}")]
pub struct PbeError {
    /// Broad error category, always provided.
    pub category: ErrorCategory,
    /// Optional specific condition tag for consumers that need to
    /// branch their behavior. Any code consuming errors MUST handle
    /// the absence of a defined kind.
    pub kind: Option<ErrorKind>,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
    msg: String,
}

impl PbeError {
    /// Creates a new error with a required category and display message.
    pub fn new(category: ErrorCategory, msg: impl Into<String>) -> Self {
        Self {
            category,
            kind: None,
            source: None,
            msg: msg.into(),
        }
    }

    /// Creates a new error that also tags the failure with a kind.
    pub fn with_kind(category: ErrorCategory, kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self {
            category,
            kind: Some(kind),
            source: None,
            msg: msg.into(),
        }
    }

    /// Creates a new error that retains the originating source error.
    pub fn with_source(
        category: ErrorCategory,
        msg: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            category,
            kind: None,
            source: Some(Box::new(source)),
            msg: msg.into(),
        }
    }

    /// Creates a new error that carries both a kind tag and the originating source error.
    pub fn with_kind_and_source(
        category: ErrorCategory,
        kind: ErrorKind,
        msg: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            category,
            kind: Some(kind),
            source: Some(Box::new(source)),
            msg: msg.into(),
        }
    }

    /// The user-facing message carried by the error.
    pub fn message(&self) -> &str {
        &self.msg
    }

    /// Returns the preserved source error if present.
    pub fn source_error(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.source.as_deref()
    }

    /// True when the error carries the given kind.
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == Some(kind)
    }

    /// Wraps the current error with a higher-level message while preserving the original as source.
    ///
    /// Category and kind are carried over so callers can still branch on them.
    pub fn with_context(self, msg: impl Into<String>) -> Self {
        let category = self.category;
        let kind = self.kind;
        Self {
            category,
            kind,
            source: Some(Box::new(self)),
            msg: msg.into(),
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, PbeError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_context_keeps_kind_and_category() {
        let err = PbeError::with_kind(
            ErrorCategory::User,
            ErrorKind::CryptoOperation,
            "bad padding",
        )
        .with_context("failed to decrypt");

        assert_eq!(err.category, ErrorCategory::User);
        assert!(err.is(ErrorKind::CryptoOperation));
        assert_eq!(err.message(), "failed to decrypt");
        assert_eq!(err.source_error().unwrap().to_string(), "bad padding");
    }

    #[test]
    fn test_io_source_is_preserved() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "no such file");
        let err = PbeError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::Io,
            "failed to read from in.txt",
            io_err,
        );

        assert_eq!(err.to_string(), "failed to read from in.txt");
        assert!(err.source_error().is_some());
        assert_eq!(err.kind, Some(ErrorKind::Io));
    }

    #[test]
    fn test_plain_error_has_no_kind() {
        let err = PbeError::new(ErrorCategory::Internal, "oops");
        assert_eq!(err.kind, None);
        assert!(!err.is(ErrorKind::Io));
    }
}
