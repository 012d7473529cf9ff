//! Cryptographic provider seam.
//!
//! Handles never do math themselves. Generation, signing and verification
//! go through a [`CryptoProvider`]; the default [`RustCryptoProvider`]
//! uses the RustCrypto `p256`, `p384`, `rsa` and `hmac` crates. Keys that
//! live outside the process sign through a [`RemoteSigner`] instead.

use std::fmt;

use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use p256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use rand_core::CryptoRngCore;
use rsa::{Pkcs1v15Sign, RsaPrivateKey};
use serde::{Deserialize, Serialize};
use sha2::{Sha256, Sha384, Sha512};
use zeroize::Zeroizing;

use crate::error::{Error, Result};
use crate::material::{Curve, EcPublicKey, EcSecretKey, NativeKey, NativePublicKey, SymmetricKey};
use crate::metadata::KeyType;

const MIN_RSA_BITS: usize = 1024;

/// Draws before giving up on finding a scalar in `[1, n)`.
const SCALAR_ATTEMPTS: usize = 8;

/// Hash function the digest handed to `sign` was produced with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashAlgorithm {
    #[default]
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    #[must_use]
    pub fn output_len(&self) -> usize {
        match self {
            HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Sha384 => 48,
            HashAlgorithm::Sha512 => 64,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignOptions {
    pub hash: HashAlgorithm,
}

impl SignOptions {
    pub fn new(hash: HashAlgorithm) -> Self {
        SignOptions { hash }
    }

    pub(crate) fn check_digest(&self, digest: &[u8]) -> Result<()> {
        let expected = self.hash.output_len();
        if digest.len() != expected {
            return Err(Error::InvalidDigestLength {
                expected,
                actual: digest.len(),
            });
        }
        Ok(())
    }
}

/// What to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "snake_case")]
pub enum KeyParams {
    Ec { curve: Curve },
    Rsa { bits: usize },
    Symmetric { bits: usize },
}

impl KeyParams {
    pub fn key_type(&self) -> KeyType {
        match self {
            KeyParams::Ec { .. } => KeyType::EllipticCurve,
            KeyParams::Rsa { .. } => KeyType::Rsa,
            KeyParams::Symmetric { .. } => KeyType::Symmetric,
        }
    }
}

/// Supplies key generation and signing primitives.
///
/// Implementations must be safe to share between threads. The entropy
/// source is always passed in by the caller; a provider never seeds its
/// own.
pub trait CryptoProvider: Send + Sync + fmt::Debug {
    /// Generates fresh key material.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Generation`] when the parameters are unusable or
    /// the entropy source fails.
    ///
    /// RSA prime search draws through `RngCore::fill_bytes`, so an entropy
    /// source that fails halfway through RSA generation panics instead. The
    /// source is checked with `try_fill_bytes` before the search starts.
    fn generate(&self, params: &KeyParams, rng: &mut dyn CryptoRngCore) -> Result<NativeKey>;

    /// Signs a prehashed digest.
    fn sign(&self, key: &NativeKey, digest: &[u8], options: &SignOptions) -> Result<Vec<u8>>;

    /// Checks a signature produced by [`CryptoProvider::sign`].
    fn verify(
        &self,
        key: &NativePublicKey,
        digest: &[u8],
        signature: &[u8],
        options: &SignOptions,
    ) -> Result<()>;
}

/// Signs on behalf of a key whose material never enters this process.
///
/// A blocking signer (HSM, remote service) applies its own timeout and
/// cancellation rules; its errors are returned to the caller unchanged.
pub trait RemoteSigner: Send + Sync + fmt::Debug {
    fn sign(&self, key_id: &str, digest: &[u8], options: &SignOptions) -> Result<Vec<u8>>;
}

/// Provider backed by the RustCrypto crates.
///
/// ECDSA signatures use RFC 6979 nonces and are DER encoded. RSA uses
/// PKCS#1 v1.5. Symmetric keys produce an HMAC over the digest.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustCryptoProvider;

impl CryptoProvider for RustCryptoProvider {
    fn generate(&self, params: &KeyParams, mut rng: &mut dyn CryptoRngCore) -> Result<NativeKey> {
        match *params {
            KeyParams::Ec { curve: Curve::P256 } => {
                let secret = random_scalar(rng, 32, |b| p256::SecretKey::from_slice(b).ok())?;
                Ok(secret.into())
            }
            KeyParams::Ec { curve: Curve::P384 } => {
                let secret = random_scalar(rng, 48, |b| p384::SecretKey::from_slice(b).ok())?;
                Ok(secret.into())
            }
            KeyParams::Rsa { bits } => {
                if bits < MIN_RSA_BITS {
                    return Err(Error::Generation(format!(
                        "RSA keys need at least {MIN_RSA_BITS} bits, got {bits}"
                    )));
                }
                let mut sample = Zeroizing::new([0u8; 32]);
                rng.try_fill_bytes(&mut sample[..])
                    .map_err(|e| Error::Generation(e.to_string()))?;
                let key = RsaPrivateKey::new(&mut rng, bits)
                    .map_err(|e| Error::Generation(e.to_string()))?;
                Ok(key.into())
            }
            KeyParams::Symmetric { bits } => {
                if bits == 0 || bits % 8 != 0 {
                    return Err(Error::Generation(format!(
                        "symmetric key size must be a positive multiple of 8, got {bits}"
                    )));
                }
                let mut bytes = Zeroizing::new(vec![0u8; bits / 8]);
                rng.try_fill_bytes(&mut bytes)
                    .map_err(|e| Error::Generation(e.to_string()))?;
                Ok(SymmetricKey::from_zeroizing(bytes).into())
            }
        }
    }

    fn sign(&self, key: &NativeKey, digest: &[u8], options: &SignOptions) -> Result<Vec<u8>> {
        options.check_digest(digest)?;
        match key {
            NativeKey::Ec(EcSecretKey::P256(secret)) => {
                let signing_key = p256::ecdsa::SigningKey::from(secret);
                let signature: p256::ecdsa::Signature = signing_key
                    .sign_prehash(digest)
                    .map_err(|e| Error::Provider(e.to_string()))?;
                Ok(signature.to_der().as_bytes().to_vec())
            }
            NativeKey::Ec(EcSecretKey::P384(secret)) => {
                let signing_key = p384::ecdsa::SigningKey::from(secret);
                let signature: p384::ecdsa::Signature = signing_key
                    .sign_prehash(digest)
                    .map_err(|e| Error::Provider(e.to_string()))?;
                Ok(signature.to_der().as_bytes().to_vec())
            }
            NativeKey::Rsa(key) => key
                .sign(pkcs1v15(options.hash), digest)
                .map_err(|e| Error::Provider(e.to_string())),
            NativeKey::Symmetric(key) => Ok(match options.hash {
                HashAlgorithm::Sha256 => {
                    keyed::<Hmac<Sha256>>(key, digest)?.finalize().into_bytes().to_vec()
                }
                HashAlgorithm::Sha384 => {
                    keyed::<Hmac<Sha384>>(key, digest)?.finalize().into_bytes().to_vec()
                }
                HashAlgorithm::Sha512 => {
                    keyed::<Hmac<Sha512>>(key, digest)?.finalize().into_bytes().to_vec()
                }
            }),
        }
    }

    fn verify(
        &self,
        key: &NativePublicKey,
        digest: &[u8],
        signature: &[u8],
        options: &SignOptions,
    ) -> Result<()> {
        options.check_digest(digest)?;
        match key {
            NativePublicKey::Ec(EcPublicKey::P256(public)) => {
                let signature = p256::ecdsa::Signature::from_der(signature)
                    .map_err(|_| Error::VerificationFailed)?;
                p256::ecdsa::VerifyingKey::from(public)
                    .verify_prehash(digest, &signature)
                    .map_err(|_| Error::VerificationFailed)
            }
            NativePublicKey::Ec(EcPublicKey::P384(public)) => {
                let signature = p384::ecdsa::Signature::from_der(signature)
                    .map_err(|_| Error::VerificationFailed)?;
                p384::ecdsa::VerifyingKey::from(public)
                    .verify_prehash(digest, &signature)
                    .map_err(|_| Error::VerificationFailed)
            }
            NativePublicKey::Rsa(public) => public
                .verify(pkcs1v15(options.hash), digest, signature)
                .map_err(|_| Error::VerificationFailed),
            NativePublicKey::Symmetric(key) => {
                let checked = match options.hash {
                    HashAlgorithm::Sha256 => {
                        keyed::<Hmac<Sha256>>(key, digest)?.verify_slice(signature)
                    }
                    HashAlgorithm::Sha384 => {
                        keyed::<Hmac<Sha384>>(key, digest)?.verify_slice(signature)
                    }
                    HashAlgorithm::Sha512 => {
                        keyed::<Hmac<Sha512>>(key, digest)?.verify_slice(signature)
                    }
                };
                checked.map_err(|_| Error::VerificationFailed)
            }
        }
    }
}

/// Rejection-samples a secret scalar of `len` bytes. `parse` refuses zero
/// and values at or above the group order.
fn random_scalar<K>(
    rng: &mut dyn CryptoRngCore,
    len: usize,
    parse: impl Fn(&[u8]) -> Option<K>,
) -> Result<K> {
    let mut bytes = Zeroizing::new(vec![0u8; len]);
    for _ in 0..SCALAR_ATTEMPTS {
        rng.try_fill_bytes(&mut bytes)
            .map_err(|e| Error::Generation(e.to_string()))?;
        if let Some(secret) = parse(&bytes) {
            return Ok(secret);
        }
    }
    Err(Error::Generation(format!("no valid scalar after {SCALAR_ATTEMPTS} draws")))
}

fn pkcs1v15(hash: HashAlgorithm) -> Pkcs1v15Sign {
    match hash {
        HashAlgorithm::Sha256 => Pkcs1v15Sign::new::<Sha256>(),
        HashAlgorithm::Sha384 => Pkcs1v15Sign::new::<Sha384>(),
        HashAlgorithm::Sha512 => Pkcs1v15Sign::new::<Sha512>(),
    }
}

/// A MAC keyed with `key` that has already absorbed `data`.
fn keyed<M: Mac + KeyInit>(key: &SymmetricKey, data: &[u8]) -> Result<M> {
    let mut mac =
        <M as KeyInit>::new_from_slice(key.as_bytes()).map_err(|e| Error::Provider(e.to_string()))?;
    Mac::update(&mut mac, data);
    Ok(mac)
}
