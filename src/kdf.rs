//! Key derivation from a passphrase and salt
//!
//! Two algorithms are known:
//!
//! - `PBKDF2WithHmacSHA1` (preferred): PBKDF2 per RFC 8018 over HMAC-SHA1.
//! - `PBEWithMD5AndDES` (fallback): the PKCS #5 v1.5 construction, iterated
//!   MD5 over `passphrase || salt`.
//!
//! [`derive_key`] always tries the preferred algorithm first and falls back
//! to the legacy one only when the provider reports it unavailable. The
//! outcome is not remembered between calls, so a platform that never has
//! PBKDF2 pays for the failed lookup every time. [`CachingKeyDeriver`]
//! remembers the outcome instead.

use std::fmt;
use std::sync::OnceLock;

use md5::{Digest, Md5};
use zeroize::Zeroizing;

use crate::error::{ErrorCategory, ErrorKind, PbeError, Result};

/// Iteration count used for every derivation and cipher operation.
pub const ITERATIONS: u32 = 2000;

/// Substituted when a caller asks for zero iterations.
pub const DEFAULT_ITERATIONS: u32 = 1000;

/// Length of the derived key in bits
pub const KEY_BITS: usize = 256;

/// Length of the derived key in bytes
pub const KEY_LEN: usize = KEY_BITS / 8;

/// Length of one MD5 digest; PBES1 splits it into DES key and IV.
pub(crate) const MD5_LEN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAlgorithm {
    Pbkdf2HmacSha1,
    PbeWithMd5AndDes,
}

impl KeyAlgorithm {
    pub const PRIMARY: KeyAlgorithm = KeyAlgorithm::Pbkdf2HmacSha1;
    pub const FALLBACK: KeyAlgorithm = KeyAlgorithm::PbeWithMd5AndDes;

    /// The JCE standard name of the algorithm.
    pub fn name(&self) -> &'static str {
        match self {
            KeyAlgorithm::Pbkdf2HmacSha1 => "PBKDF2WithHmacSHA1",
            KeyAlgorithm::PbeWithMd5AndDes => "PBEWithMD5AndDES",
        }
    }
}

impl fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Key material derived from a passphrase. Wiped from memory on drop.
#[derive(Clone)]
pub struct DerivedKey {
    algorithm: KeyAlgorithm,
    bytes: Zeroizing<[u8; KEY_LEN]>,
}

impl DerivedKey {
    fn new(algorithm: KeyAlgorithm, bytes: Zeroizing<[u8; KEY_LEN]>) -> Self {
        Self { algorithm, bytes }
    }

    /// The algorithm that actually produced this key.
    pub fn algorithm(&self) -> KeyAlgorithm {
        self.algorithm
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }

    pub fn bit_len(&self) -> usize {
        self.bytes.len() * 8
    }
}

impl PartialEq for DerivedKey {
    fn eq(&self, other: &Self) -> bool {
        self.algorithm == other.algorithm && self.bytes[..] == other.bytes[..]
    }
}

impl Eq for DerivedKey {}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedKey")
            .field("algorithm", &self.algorithm)
            .field("bits", &self.bit_len())
            .finish_non_exhaustive()
    }
}

/// Source of key derivation algorithms.
///
/// Implementations decide which algorithms the platform offers. An
/// algorithm the provider does not offer must be reported with
/// [`ErrorKind::AlgorithmUnavailable`]; that kind (and only that kind)
/// makes [`derive_key_with`] fall back.
pub trait KeyProvider: Send + Sync {
    fn supports(&self, algorithm: KeyAlgorithm) -> bool;

    /// Derive `KEY_LEN` bytes of key material.
    ///
    /// An `iterations` value of zero means [`DEFAULT_ITERATIONS`].
    fn generate_secret(
        &self,
        algorithm: KeyAlgorithm,
        passphrase: &[u8],
        salt: &[u8],
        iterations: u32,
    ) -> Result<DerivedKey>;
}

/// The algorithms compiled into this crate.
///
/// `PBKDF2WithHmacSHA1` is present when the `pbkdf2` feature is enabled;
/// `PBEWithMD5AndDES` is always present.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProvider;

impl KeyProvider for SystemProvider {
    fn supports(&self, algorithm: KeyAlgorithm) -> bool {
        match algorithm {
            KeyAlgorithm::Pbkdf2HmacSha1 => cfg!(feature = "pbkdf2"),
            KeyAlgorithm::PbeWithMd5AndDes => true,
        }
    }

    fn generate_secret(
        &self,
        algorithm: KeyAlgorithm,
        passphrase: &[u8],
        salt: &[u8],
        iterations: u32,
    ) -> Result<DerivedKey> {
        if !self.supports(algorithm) {
            return Err(unavailable(algorithm));
        }
        let iterations = effective_iterations(iterations);

        let bytes = match algorithm {
            KeyAlgorithm::Pbkdf2HmacSha1 => pbkdf2_hmac_sha1(passphrase, salt, iterations)?,
            KeyAlgorithm::PbeWithMd5AndDes => md5_bytes_to_key(passphrase, salt, iterations),
        };
        Ok(DerivedKey::new(algorithm, bytes))
    }
}

/// Error returned by providers for an algorithm they do not offer.
pub fn unavailable(algorithm: KeyAlgorithm) -> PbeError {
    PbeError::with_kind(
        ErrorCategory::Internal,
        ErrorKind::AlgorithmUnavailable,
        format!("{} is not available on this platform", algorithm),
    )
}

/// Zero hardening rounds is never used; zero means the default.
pub fn effective_iterations(iterations: u32) -> u32 {
    if iterations == 0 {
        DEFAULT_ITERATIONS
    } else {
        iterations
    }
}

/// Derive a 256-bit key from a passphrase and salt with the built-in provider.
pub fn derive_key(passphrase: &[u8], salt: &[u8]) -> Result<DerivedKey> {
    derive_key_with(&SystemProvider, passphrase, salt)
}

/// Derive a 256-bit key, trying the primary algorithm and then the fallback.
pub fn derive_key_with(
    provider: &dyn KeyProvider,
    passphrase: &[u8],
    salt: &[u8],
) -> Result<DerivedKey> {
    match provider.generate_secret(KeyAlgorithm::PRIMARY, passphrase, salt, ITERATIONS) {
        Ok(key) => Ok(key),
        Err(e) if e.is(ErrorKind::AlgorithmUnavailable) => {
            tracing::debug!(
                primary = %KeyAlgorithm::PRIMARY,
                fallback = %KeyAlgorithm::FALLBACK,
                "primary key algorithm unavailable, using fallback"
            );
            derive_fallback(provider, passphrase, salt)
        }
        Err(e) => Err(e),
    }
}

fn derive_fallback(
    provider: &dyn KeyProvider,
    passphrase: &[u8],
    salt: &[u8],
) -> Result<DerivedKey> {
    provider
        .generate_secret(KeyAlgorithm::FALLBACK, passphrase, salt, ITERATIONS)
        .map_err(|e| {
            if e.is(ErrorKind::AlgorithmUnavailable) {
                PbeError::with_kind_and_source(
                    ErrorCategory::Internal,
                    ErrorKind::EnvironmentUnsupported,
                    format!(
                        "no key derivation algorithm available (tried {} and {})",
                        KeyAlgorithm::PRIMARY,
                        KeyAlgorithm::FALLBACK
                    ),
                    e,
                )
            } else {
                e
            }
        })
}

/// Derives keys like [`derive_key_with`], but remembers which algorithm the
/// provider supports after the first success.
///
/// Later calls go straight to the remembered algorithm. A failed first call
/// caches nothing. The cache never upgrades from the fallback back to the
/// primary, so a provider that gains PBKDF2 later keeps getting the legacy
/// algorithm from the same deriver.
pub struct CachingKeyDeriver<P> {
    provider: P,
    algorithm: OnceLock<KeyAlgorithm>,
}

impl<P: KeyProvider> CachingKeyDeriver<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            algorithm: OnceLock::new(),
        }
    }

    /// The algorithm remembered so far, if any derivation has succeeded.
    pub fn cached_algorithm(&self) -> Option<KeyAlgorithm> {
        self.algorithm.get().copied()
    }

    pub fn derive_key(&self, passphrase: &[u8], salt: &[u8]) -> Result<DerivedKey> {
        if let Some(&algorithm) = self.algorithm.get() {
            return self
                .provider
                .generate_secret(algorithm, passphrase, salt, ITERATIONS);
        }

        let key = derive_key_with(&self.provider, passphrase, salt)?;
        // Concurrent first calls may race here; they reach the same answer
        // for the same provider, so losing the race is harmless.
        let _ = self.algorithm.set(key.algorithm());
        Ok(key)
    }
}

impl Default for CachingKeyDeriver<SystemProvider> {
    fn default() -> Self {
        Self::new(SystemProvider)
    }
}

#[cfg(feature = "pbkdf2")]
fn pbkdf2_hmac_sha1(
    passphrase: &[u8],
    salt: &[u8],
    iterations: u32,
) -> Result<Zeroizing<[u8; KEY_LEN]>> {
    use hmac::Hmac;
    use sha1::Sha1;

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2::pbkdf2::<Hmac<Sha1>>(passphrase, salt, iterations, &mut key[..]).map_err(|e| {
        PbeError::with_kind(
            ErrorCategory::Internal,
            ErrorKind::KeyDerivation,
            format!("PBKDF2 key derivation failed: {}", e),
        )
    })?;
    Ok(key)
}

#[cfg(not(feature = "pbkdf2"))]
fn pbkdf2_hmac_sha1(
    _passphrase: &[u8],
    _salt: &[u8],
    _iterations: u32,
) -> Result<Zeroizing<[u8; KEY_LEN]>> {
    Err(unavailable(KeyAlgorithm::Pbkdf2HmacSha1))
}

/// PKCS #5 v1.5 PBKDF1 with MD5: `T1 = MD5(P || S)`, `Ti = MD5(Ti-1)`.
///
/// The 16-byte result is the DES key (first half) and IV (second half) of
/// `PBEWithMD5AndDES`.
pub(crate) fn pbkdf1_md5(
    passphrase: &[u8],
    salt: &[u8],
    iterations: u32,
) -> Zeroizing<[u8; MD5_LEN]> {
    md5_chain_block(&[], passphrase, salt, iterations)
}

/// One block of the classic salted-password chain:
/// `MD5^iterations(prev || P || S)`.
fn md5_chain_block(
    prev: &[u8],
    passphrase: &[u8],
    salt: &[u8],
    iterations: u32,
) -> Zeroizing<[u8; MD5_LEN]> {
    let mut hasher = Md5::new();
    hasher.update(prev);
    hasher.update(passphrase);
    hasher.update(salt);

    let mut block = Zeroizing::new([0u8; MD5_LEN]);
    block.copy_from_slice(&hasher.finalize());
    for _ in 1..iterations {
        let next = Md5::digest(&block[..]);
        block.copy_from_slice(&next);
    }
    block
}

/// Stretch the PBKDF1 construction to `KEY_LEN` bytes by chaining blocks,
/// `Di = MD5^iterations(Di-1 || P || S)`. The first block is exactly
/// [`pbkdf1_md5`].
fn md5_bytes_to_key(passphrase: &[u8], salt: &[u8], iterations: u32) -> Zeroizing<[u8; KEY_LEN]> {
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    let mut prev: Zeroizing<[u8; MD5_LEN]> = Zeroizing::new([0u8; MD5_LEN]);
    for (i, chunk) in key.chunks_mut(MD5_LEN).enumerate() {
        let seed: &[u8] = if i == 0 { &[] } else { &prev[..] };
        let block = md5_chain_block(seed, passphrase, salt, iterations);
        chunk.copy_from_slice(&block[..chunk.len()]);
        prev = block;
    }
    key
}
