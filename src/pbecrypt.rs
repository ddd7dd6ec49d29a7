//! Encryption/decryption with PBEWithMD5AndDES
//!
//! This module implements password-based encryption per PKCS #5 v1.5
//! (PBES1):
//! - PBKDF1-MD5 over passphrase and salt yields 16 bytes
//! - the first 8 bytes are the DES key, the last 8 bytes the CBC IV
//! - the payload is DES-CBC encrypted with PKCS #5 padding
//!
//! The output is the bare ciphertext, always a non-zero multiple of 8
//! bytes. It is byte-compatible with the JCE `PBEWithMD5AndDES` cipher for
//! ASCII passphrases.
//!
//! Encryption is deterministic: the same passphrase, salt and data always
//! produce the same ciphertext. There is no authentication tag. A wrong
//! passphrase or corrupt input is detected only when the padding happens
//! not to check out, so roughly 1 in 256 bad decryptions returns garbage
//! instead of an error.

use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use des::Des;
use zeroize::Zeroizing;

use crate::error::{ErrorCategory, ErrorKind, PbeError, Result};
use crate::kdf::{self, ITERATIONS};
use crate::salt::Salt;

type DesCbcEnc = cbc::Encryptor<Des>;
type DesCbcDec = cbc::Decryptor<Des>;

/// Length of a DES block (also the DES key and IV length)
pub const BLOCK_LEN: usize = 8;

/// Everything besides the passphrase needed to reproduce the cipher state.
///
/// Must be stored alongside the ciphertext.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CipherParameters {
    salt: Salt,
    iterations: u32,
}

impl CipherParameters {
    /// Parameters with the fixed module-wide iteration count.
    pub fn new(salt: Salt) -> Self {
        Self {
            salt,
            iterations: ITERATIONS,
        }
    }

    /// Parameters with an explicit iteration count, for interoperating with
    /// data produced elsewhere. Zero means the default count.
    pub fn with_iterations(salt: Salt, iterations: u32) -> Self {
        Self {
            salt,
            iterations: kdf::effective_iterations(iterations),
        }
    }

    pub fn salt(&self) -> &Salt {
        &self.salt
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }
}

/// DES key and IV for the given parameters.
fn key_and_iv(passphrase: &[u8], params: &CipherParameters) -> Zeroizing<[u8; 2 * BLOCK_LEN]> {
    kdf::pbkdf1_md5(passphrase, params.salt.as_bytes(), params.iterations)
}

/// Encrypt data with a passphrase and salt.
pub fn encrypt(data: &[u8], passphrase: &[u8], salt: &Salt) -> Result<Vec<u8>> {
    encrypt_with_params(data, passphrase, &CipherParameters::new(*salt))
}

/// Decrypt data produced by [`encrypt`] with the same passphrase and salt.
pub fn decrypt(data: &[u8], passphrase: &[u8], salt: &Salt) -> Result<Vec<u8>> {
    decrypt_with_params(data, passphrase, &CipherParameters::new(*salt))
}

pub fn encrypt_with_params(
    data: &[u8],
    passphrase: &[u8],
    params: &CipherParameters,
) -> Result<Vec<u8>> {
    let dk = key_and_iv(passphrase, params);
    let (key, iv) = dk.split_at(BLOCK_LEN);

    let cipher = DesCbcEnc::new_from_slices(key, iv).map_err(|e| {
        PbeError::with_kind(
            ErrorCategory::Internal,
            ErrorKind::CryptoOperation,
            format!("cipher initialization failed: {}", e),
        )
    })?;
    Ok(cipher.encrypt_padded_vec_mut::<Pkcs7>(data))
}

pub fn decrypt_with_params(
    data: &[u8],
    passphrase: &[u8],
    params: &CipherParameters,
) -> Result<Vec<u8>> {
    if data.is_empty() || data.len() % BLOCK_LEN != 0 {
        return Err(PbeError::with_kind(
            ErrorCategory::User,
            ErrorKind::CryptoOperation,
            format!(
                "ciphertext length {} is not a positive multiple of {}; likely truncated",
                data.len(),
                BLOCK_LEN
            ),
        ));
    }

    let dk = key_and_iv(passphrase, params);
    let (key, iv) = dk.split_at(BLOCK_LEN);

    let cipher = DesCbcDec::new_from_slices(key, iv).map_err(|e| {
        PbeError::with_kind(
            ErrorCategory::Internal,
            ErrorKind::CryptoOperation,
            format!("cipher initialization failed: {}", e),
        )
    })?;
    cipher.decrypt_padded_vec_mut::<Pkcs7>(data).map_err(|_| {
        PbeError::with_kind(
            ErrorCategory::User,
            ErrorKind::CryptoOperation,
            "bad padding: corrupt input, wrong salt, or bad passphrase",
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SALT: Salt = Salt::from_bytes([0x78, 0x57, 0x8e, 0x5a, 0x5d, 0x63, 0xcb, 0x06]);

    #[test]
    fn test_known_ciphertext() {
        let ciphertext = encrypt(b"PBE", b"azsxdc", &SALT).unwrap();
        assert_eq!(hex::encode(&ciphertext), "bbea0aa9d382da3b");
        assert_eq!(decrypt(&ciphertext, b"azsxdc", &SALT).unwrap(), b"PBE");
    }

    #[test]
    fn test_empty_plaintext() {
        let ciphertext = encrypt(b"", b"azsxdc", &SALT).unwrap();

        // Padding alone fills one block.
        assert_eq!(hex::encode(&ciphertext), "756dbb8a3fd50b4a");
        assert_eq!(decrypt(&ciphertext, b"azsxdc", &SALT).unwrap(), b"");
    }

    #[test]
    fn test_full_block_gets_extra_padding_block() {
        let ciphertext = encrypt(b"exactly8", b"password", &SALT).unwrap();
        assert_eq!(ciphertext.len(), 16);
        assert_eq!(hex::encode(&ciphertext), "4bee6a713641d1f853cd70703ee6a19b");
    }

    #[test]
    fn test_deterministic_encryption() {
        let ct1 = encrypt(b"hello world", b"test", &SALT).unwrap();
        let ct2 = encrypt(b"hello world", b"test", &SALT).unwrap();
        assert_eq!(ct1, ct2);
    }

    #[test]
    fn test_different_salt_different_ciphertext() {
        let other = Salt::from_bytes([1u8; 8]);
        let ct1 = encrypt(b"hello world", b"test", &SALT).unwrap();
        let ct2 = encrypt(b"hello world", b"test", &other).unwrap();
        assert_ne!(ct1, ct2);

        assert_eq!(decrypt(&ct2, b"test", &other).unwrap(), b"hello world");
    }

    #[test]
    fn test_wrong_passphrase() {
        let plaintext = b"secret data";
        let ciphertext = encrypt(plaintext, b"correct", &SALT).unwrap();

        match decrypt(&ciphertext, b"wrong", &SALT) {
            Err(e) => assert_eq!(e.kind, Some(ErrorKind::CryptoOperation)),
            Ok(garbage) => assert_ne!(garbage, plaintext),
        }
    }

    #[test]
    fn test_truncated_ciphertext() {
        let ciphertext = encrypt(b"some longer secret data", b"test", &SALT).unwrap();

        let err = decrypt(&ciphertext[..5], b"test", &SALT).expect_err("expected failure");
        assert_eq!(err.kind, Some(ErrorKind::CryptoOperation));
        assert_eq!(err.category, ErrorCategory::User);
        assert!(err.to_string().contains("likely truncated"));
    }

    #[test]
    fn test_empty_ciphertext() {
        let err = decrypt(b"", b"test", &SALT).expect_err("expected failure");
        assert_eq!(err.kind, Some(ErrorKind::CryptoOperation));
    }

    #[test]
    fn test_corrupted_block_never_yields_plaintext() {
        let mut ciphertext = encrypt(b"PBE", b"azsxdc", &SALT).unwrap();
        let last = ciphertext.len() - 1;
        ciphertext[last] ^= 0x01;

        match decrypt(&ciphertext, b"azsxdc", &SALT) {
            Err(e) => assert_eq!(e.kind, Some(ErrorKind::CryptoOperation)),
            Ok(garbage) => assert_ne!(garbage, b"PBE"),
        }
    }

    #[test]
    fn test_all_byte_values() {
        let plaintext: Vec<u8> = (0..=255).collect();
        let ciphertext = encrypt(&plaintext, b"test", &SALT).unwrap();
        assert_eq!(ciphertext.len(), 264);
        assert_eq!(decrypt(&ciphertext, b"test", &SALT).unwrap(), plaintext);
    }

    #[test]
    fn test_large_plaintext() {
        let plaintext = vec![0x42u8; 128 * 1024];
        let ciphertext = encrypt(&plaintext, b"test", &SALT).unwrap();
        assert_eq!(decrypt(&ciphertext, b"test", &SALT).unwrap(), plaintext);
    }

    #[test]
    fn test_iteration_count_matters() {
        let default = CipherParameters::new(SALT);
        let other = CipherParameters::with_iterations(SALT, 1000);
        assert_eq!(default.iterations(), ITERATIONS);

        let ct1 = encrypt_with_params(b"PBE", b"azsxdc", &default).unwrap();
        let ct2 = encrypt_with_params(b"PBE", b"azsxdc", &other).unwrap();
        assert_ne!(ct1, ct2);
        assert_eq!(decrypt_with_params(&ct2, b"azsxdc", &other).unwrap(), b"PBE");
    }

    #[test]
    fn test_zero_iterations_means_default() {
        let zero = CipherParameters::with_iterations(SALT, 0);
        let thousand = CipherParameters::with_iterations(SALT, kdf::DEFAULT_ITERATIONS);
        assert_eq!(zero, thousand);
        assert_eq!(zero.salt(), &SALT);
    }
}
