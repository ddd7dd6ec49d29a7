//! File encryption/decryption operations
//!
//! Encrypted files hold the base64 text of the bare ciphertext and nothing
//! else. The salt is not stored in the file; callers keep it next to the
//! file themselves and pass it back in for decryption.

use crate::encoding;
use crate::error::{ErrorCategory, ErrorKind, PbeError, Result};
use crate::passphrase::PassphraseReader;
use crate::pbecrypt;
use crate::salt::Salt;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// Encrypt a file with a passphrase and salt
///
/// Reads plaintext from `input_path`, encrypts it using a passphrase from
/// `passphrase_reader`, and writes the base64 ciphertext to `output_path`.
pub fn encrypt_file(
    input_path: &Path,
    output_path: &Path,
    salt: &Salt,
    passphrase_reader: &mut dyn PassphraseReader,
) -> Result<()> {
    let plaintext = fs::read(input_path).map_err(|e| read_error(input_path, e))?;
    let passphrase = passphrase_reader.read_passphrase()?;
    let ciphertext = pbecrypt::encrypt(&plaintext, &passphrase, salt)
        .map_err(|e| e.with_context("encryption failed"))?;
    let text = encoding::to_text(&ciphertext);
    write_file_atomic(output_path, text.as_bytes())
        .map_err(|e| e.with_context(format!("failed to write to {}", output_path.display())))?;

    tracing::debug!(
        input = %input_path.display(),
        output = %output_path.display(),
        bytes = plaintext.len(),
        "encrypted file"
    );
    Ok(())
}

/// Decrypt a file with a passphrase and salt
///
/// Reads base64 ciphertext from `input_path`, decrypts it using a passphrase
/// from `passphrase_reader`, and writes the plaintext to `output_path`.
/// Nothing is written when decryption fails.
pub fn decrypt_file(
    input_path: &Path,
    output_path: &Path,
    salt: &Salt,
    passphrase_reader: &mut dyn PassphraseReader,
) -> Result<()> {
    let text = fs::read_to_string(input_path).map_err(|e| read_error(input_path, e))?;
    let ciphertext = encoding::from_text(&text).map_err(|e| e.with_context("failed to decode"))?;
    let passphrase = passphrase_reader.read_passphrase()?;
    let plaintext = pbecrypt::decrypt(&ciphertext, &passphrase, salt)
        .map_err(|e| e.with_context("failed to decrypt"))?;
    write_file_atomic(output_path, &plaintext)
        .map_err(|e| e.with_context(format!("failed to write to {}", output_path.display())))?;

    tracing::debug!(
        input = %input_path.display(),
        output = %output_path.display(),
        bytes = plaintext.len(),
        "decrypted file"
    );
    Ok(())
}

/// Write `contents` to `path` via tempfile + fsync + rename.
///
/// Either the old file or the complete new file exists afterwards, never a
/// partial one. On Unix the file ends up with mode 0o600.
pub fn write_file_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp_file = tempfile::NamedTempFile::new_in(dir)
        .map_err(|e| io_error(ErrorCategory::User, "failed to create tempfile", e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        temp_file
            .as_file()
            .set_permissions(fs::Permissions::from_mode(0o600))
            .map_err(|e| io_error(ErrorCategory::Internal, "failed to set tempfile permissions", e))?;
    }

    temp_file
        .write_all(contents)
        .map_err(|e| io_error(ErrorCategory::Internal, "failed to write to tempfile", e))?;
    // Flush and fsync() such that the rename later, if it succeeds, will
    // always point to a valid file.
    temp_file
        .flush()
        .map_err(|e| io_error(ErrorCategory::Internal, "failed to flush tempfile", e))?;
    temp_file
        .as_file()
        .sync_all()
        .map_err(|e| io_error(ErrorCategory::Internal, "failed to sync file prior to rename", e))?;

    temp_file.persist(path).map_err(|e| {
        PbeError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            format!("failed to rename to target file {}", path.display()),
            e,
        )
    })?;
    Ok(())
}

fn io_error(category: ErrorCategory, msg: &str, err: io::Error) -> PbeError {
    PbeError::with_kind_and_source(category, ErrorKind::Io, msg, err)
}

fn read_error(path: &Path, err: io::Error) -> PbeError {
    let category = if err.kind() == io::ErrorKind::NotFound {
        ErrorCategory::User
    } else {
        ErrorCategory::Internal
    };
    PbeError::with_kind_and_source(
        category,
        ErrorKind::Io,
        format!("failed to read from {}", path.display()),
        err,
    )
}
