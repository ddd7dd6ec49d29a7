//! pbecoder - password-based encryption
//!
//! Derives keys from a passphrase and an 8-byte salt (PBKDF2-HMAC-SHA1,
//! falling back to PBEWithMD5AndDES where PBKDF2 is unavailable) and
//! encrypts byte payloads with PBEWithMD5AndDES.
//!
//! ```no_run
//! use pbecoder::{Salt, pbecrypt};
//!
//! # fn main() -> pbecoder::Result<()> {
//! let salt = Salt::generate()?;
//! let ciphertext = pbecrypt::encrypt(b"PBE", b"azsxdc", &salt)?;
//! let plaintext = pbecrypt::decrypt(&ciphertext, b"azsxdc", &salt)?;
//! assert_eq!(plaintext, b"PBE");
//! # Ok(())
//! # }
//! ```
//!
//! All operations are stateless and safe to call from many threads at once.
//! Passphrases are taken as byte slices; callers own the buffers and should
//! keep them in `zeroize::Zeroizing` so they are wiped on every exit path.

#![forbid(unsafe_code)]

pub mod app;
pub mod encoding;
pub mod error;
pub mod file_ops;
pub mod kdf;
pub mod logging;
pub mod passphrase;
pub mod pbecrypt;
pub mod salt;
pub mod workdir;

pub use error::{ErrorCategory, ErrorKind, PbeError, Result};
pub use kdf::{CachingKeyDeriver, DerivedKey, KeyAlgorithm, KeyProvider, SystemProvider, derive_key};
pub use pbecrypt::{CipherParameters, decrypt, encrypt};
pub use salt::{Salt, generate_salt};
