//! Behavioural properties of the public API

use std::collections::HashSet;
use std::thread;

use pbecoder::kdf::{self, DEFAULT_ITERATIONS, KEY_BITS, derive_key_with};
use pbecoder::{
    DerivedKey, ErrorKind, KeyAlgorithm, KeyProvider, Result, Salt, SystemProvider, decrypt,
    derive_key, encoding, encrypt, generate_salt,
};

/// A platform without PBKDF2.
struct LegacyOnlyProvider;

impl KeyProvider for LegacyOnlyProvider {
    fn supports(&self, algorithm: KeyAlgorithm) -> bool {
        algorithm == KeyAlgorithm::PbeWithMd5AndDes
    }

    fn generate_secret(
        &self,
        algorithm: KeyAlgorithm,
        passphrase: &[u8],
        salt: &[u8],
        iterations: u32,
    ) -> Result<DerivedKey> {
        if !self.supports(algorithm) {
            return Err(kdf::unavailable(algorithm));
        }
        SystemProvider.generate_secret(algorithm, passphrase, salt, iterations)
    }
}

#[test]
fn test_reference_scenario() {
    let salt = generate_salt().unwrap();
    let ciphertext = encrypt(b"PBE", b"azsxdc", &salt).unwrap();
    let decrypted = decrypt(&ciphertext, b"azsxdc", &salt).unwrap();
    assert_eq!(decrypted, b"PBE");

    let base64_alphabet =
        |s: &str| s.bytes().all(|b| b.is_ascii_alphanumeric() || b"+/=".contains(&b));
    assert!(base64_alphabet(&salt.to_text()));
    assert!(base64_alphabet(&encoding::to_text(&ciphertext)));
}

#[test]
fn test_roundtrip_various_sizes() {
    let salt = generate_salt().unwrap();
    for len in [0usize, 1, 7, 8, 9, 15, 16, 17, 1000] {
        let data: Vec<u8> = (0..len).map(|i| (i * 31 % 256) as u8).collect();
        let ciphertext = encrypt(&data, b"some passphrase", &salt).unwrap();
        assert_eq!(ciphertext.len(), (len / 8 + 1) * 8);
        assert_eq!(decrypt(&ciphertext, b"some passphrase", &salt).unwrap(), data);
    }
}

#[test]
fn test_wrong_password_never_returns_plaintext() {
    let salt = generate_salt().unwrap();
    let data = b"attack at dawn";
    let ciphertext = encrypt(data, b"P1", &salt).unwrap();

    for wrong in [&b"P2"[..], b"p1", b"P1 ", b""] {
        match decrypt(&ciphertext, wrong, &salt) {
            Err(e) => assert_eq!(e.kind, Some(ErrorKind::CryptoOperation)),
            Ok(garbage) => assert_ne!(garbage, data),
        }
    }
}

#[test]
fn test_mismatched_salt_never_returns_plaintext() {
    let data = b"attack at dawn";
    let salt = Salt::from_bytes([1, 2, 3, 4, 5, 6, 7, 8]);
    let other = Salt::from_bytes([8, 7, 6, 5, 4, 3, 2, 1]);
    let ciphertext = encrypt(data, b"P1", &salt).unwrap();

    match decrypt(&ciphertext, b"P1", &other) {
        Err(e) => assert_eq!(e.kind, Some(ErrorKind::CryptoOperation)),
        Ok(garbage) => assert_ne!(garbage, data),
    }
}

#[test]
fn test_salt_uniqueness() {
    let salts: HashSet<[u8; 8]> = (0..10_000)
        .map(|_| *generate_salt().unwrap().as_bytes())
        .collect();
    assert_eq!(salts.len(), 10_000);
}

#[test]
fn test_key_determinism() {
    let salt = Salt::from_bytes([9u8; 8]);
    let k1 = derive_key(b"password", salt.as_bytes()).unwrap();
    let k2 = derive_key(b"password", salt.as_bytes()).unwrap();
    assert_eq!(k1.as_bytes(), k2.as_bytes());
    assert_eq!(k1.algorithm(), k2.algorithm());
}

#[test]
fn test_fallback_returns_256_bit_key() {
    let salt = Salt::from_bytes([9u8; 8]);
    let key = derive_key_with(&LegacyOnlyProvider, b"password", salt.as_bytes()).unwrap();
    assert_eq!(key.algorithm(), KeyAlgorithm::PbeWithMd5AndDes);
    assert_eq!(key.bit_len(), KEY_BITS);
}

#[test]
fn test_zero_iterations_behaves_like_default() {
    let salt = [3u8; 8];
    for algorithm in [KeyAlgorithm::PbeWithMd5AndDes, KeyAlgorithm::Pbkdf2HmacSha1] {
        if !SystemProvider.supports(algorithm) {
            continue;
        }
        let zero = SystemProvider
            .generate_secret(algorithm, b"pw", &salt, 0)
            .unwrap();
        let default = SystemProvider
            .generate_secret(algorithm, b"pw", &salt, DEFAULT_ITERATIONS)
            .unwrap();
        assert_eq!(zero, default, "{}", algorithm);
    }
}

#[test]
fn test_concurrent_operations() {
    thread::scope(|scope| {
        for t in 0..8u8 {
            scope.spawn(move || {
                let salt = generate_salt().unwrap();
                let passphrase = [b'a' + t; 6];
                let data = vec![t; 100 + t as usize];
                for _ in 0..5 {
                    let ciphertext = encrypt(&data, &passphrase, &salt).unwrap();
                    assert_eq!(decrypt(&ciphertext, &passphrase, &salt).unwrap(), data);
                    derive_key(&passphrase, salt.as_bytes()).unwrap();
                }
            });
        }
    });
}

#[test]
fn test_encoding_roundtrip_every_byte() {
    let all: Vec<u8> = (0..=255).collect();
    for bytes in [&all[..0], &all[..], &all[..1], &all[..2], &all[..3]] {
        assert_eq!(encoding::from_text(&encoding::to_text(bytes)).unwrap(), bytes);
    }
}
