//! Random salts

use std::fmt;

use rand::RngCore;
use rand::rngs::OsRng;

use crate::encoding;
use crate::error::{ErrorCategory, ErrorKind, PbeError, Result};

/// Length of salt in bytes
pub const SALT_LEN: usize = 8;

/// An 8-byte salt.
///
/// Generate one per secret and store it next to the ciphertext; every
/// decryption needs the same salt again.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Salt([u8; SALT_LEN]);

impl Salt {
    /// Draws a fresh salt from the operating system random source.
    pub fn generate() -> Result<Self> {
        let mut bytes = [0u8; SALT_LEN];
        OsRng.try_fill_bytes(&mut bytes).map_err(|e| {
            PbeError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::RandomUnavailable,
                "OS random generator unavailable",
                e,
            )
        })?;
        Ok(Self(bytes))
    }

    pub const fn from_bytes(bytes: [u8; SALT_LEN]) -> Self {
        Self(bytes)
    }

    /// Builds a salt from a slice, which must be exactly [`SALT_LEN`] bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; SALT_LEN] = bytes.try_into().map_err(|_| {
            PbeError::with_kind(
                ErrorCategory::User,
                ErrorKind::InvalidSalt,
                format!("salt must be {} bytes, got {}", SALT_LEN, bytes.len()),
            )
        })?;
        Ok(Self(bytes))
    }

    pub fn from_text(text: &str) -> Result<Self> {
        let bytes = encoding::from_text(text).map_err(|e| e.with_context("invalid salt text"))?;
        Self::from_slice(&bytes)
    }

    pub fn to_text(&self) -> String {
        encoding::to_text(&self.0)
    }

    pub fn as_bytes(&self) -> &[u8; SALT_LEN] {
        &self.0
    }
}

impl AsRef<[u8]> for Salt {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Salt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Salt").field(&self.to_text()).finish()
    }
}

/// Generate salt
pub fn generate_salt() -> Result<Salt> {
    Salt::generate()
}
