//! In-memory key material.
//!
//! These are the closed sets of native keys a handle can own. Private
//! material is wiped when dropped: the `p256`/`p384` secret scalars and
//! `rsa` private exponents zeroize themselves, and [`SymmetricKey`] keeps
//! its bytes in a [`Zeroizing`] buffer.

use std::fmt;

use pkcs8::ObjectIdentifier;
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::metadata::KeyType;

pub(crate) const OID_SECP256R1: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.10045.3.1.7");
pub(crate) const OID_SECP384R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.34");

/// Named curves with an in-memory implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Curve {
    P256,
    P384,
}

impl Curve {
    #[must_use]
    pub fn bits(&self) -> u32 {
        match self {
            Curve::P256 => 256,
            Curve::P384 => 384,
        }
    }

    #[must_use]
    pub fn oid(&self) -> ObjectIdentifier {
        match self {
            Curve::P256 => OID_SECP256R1,
            Curve::P384 => OID_SECP384R1,
        }
    }

    #[must_use]
    pub fn from_oid(oid: &ObjectIdentifier) -> Option<Curve> {
        if *oid == OID_SECP256R1 {
            Some(Curve::P256)
        } else if *oid == OID_SECP384R1 {
            Some(Curve::P384)
        } else {
            None
        }
    }

    /// Curve whose scalars are `len` bytes long.
    pub(crate) fn from_scalar_len(len: usize) -> Option<Curve> {
        match len {
            32 => Some(Curve::P256),
            48 => Some(Curve::P384),
            _ => None,
        }
    }
}

impl fmt::Display for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Curve::P256 => write!(f, "P-256"),
            Curve::P384 => write!(f, "P-384"),
        }
    }
}

#[derive(Clone)]
pub enum EcSecretKey {
    P256(p256::SecretKey),
    P384(p384::SecretKey),
}

impl EcSecretKey {
    pub fn curve(&self) -> Curve {
        match self {
            EcSecretKey::P256(_) => Curve::P256,
            EcSecretKey::P384(_) => Curve::P384,
        }
    }

    pub fn public_key(&self) -> EcPublicKey {
        match self {
            EcSecretKey::P256(key) => EcPublicKey::P256(key.public_key()),
            EcSecretKey::P384(key) => EcPublicKey::P384(key.public_key()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EcPublicKey {
    P256(p256::PublicKey),
    P384(p384::PublicKey),
}

impl EcPublicKey {
    pub fn curve(&self) -> Curve {
        match self {
            EcPublicKey::P256(_) => Curve::P256,
            EcPublicKey::P384(_) => Curve::P384,
        }
    }
}

/// Secret bytes of a symmetric key.
#[derive(Clone)]
pub struct SymmetricKey(Zeroizing<Vec<u8>>);

impl SymmetricKey {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        SymmetricKey(Zeroizing::new(bytes.into()))
    }

    pub(crate) fn from_zeroizing(bytes: Zeroizing<Vec<u8>>) -> Self {
        SymmetricKey(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn bits(&self) -> u32 {
        u32::try_from(self.0.len() * 8).unwrap_or(u32::MAX)
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SymmetricKey")
            .field("bits", &self.bits())
            .finish_non_exhaustive()
    }
}

/// Private (or secret) key material held in process memory.
#[derive(Clone)]
pub enum NativeKey {
    Ec(EcSecretKey),
    Rsa(Box<RsaPrivateKey>),
    Symmetric(SymmetricKey),
}

impl NativeKey {
    pub fn key_type(&self) -> KeyType {
        match self {
            NativeKey::Ec(_) => KeyType::EllipticCurve,
            NativeKey::Rsa(_) => KeyType::Rsa,
            NativeKey::Symmetric(_) => KeyType::Symmetric,
        }
    }

    pub fn key_size_bits(&self) -> u32 {
        match self {
            NativeKey::Ec(key) => key.curve().bits(),
            NativeKey::Rsa(key) => rsa_bits(key.n().bits()),
            NativeKey::Symmetric(key) => key.bits(),
        }
    }

    /// The public counterpart. A symmetric key is its own counterpart.
    pub fn public_key(&self) -> NativePublicKey {
        match self {
            NativeKey::Ec(key) => NativePublicKey::Ec(key.public_key()),
            NativeKey::Rsa(key) => NativePublicKey::Rsa(Box::new(key.to_public_key())),
            NativeKey::Symmetric(key) => NativePublicKey::Symmetric(key.clone()),
        }
    }
}

impl fmt::Debug for NativeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeKey::Ec(key) => write!(f, "NativeKey::Ec({})", key.curve()),
            NativeKey::Rsa(_) => write!(f, "NativeKey::Rsa({} bits)", self.key_size_bits()),
            NativeKey::Symmetric(key) => write!(f, "NativeKey::Symmetric({key:?})"),
        }
    }
}

impl From<p256::SecretKey> for NativeKey {
    fn from(key: p256::SecretKey) -> Self {
        NativeKey::Ec(EcSecretKey::P256(key))
    }
}

impl From<p384::SecretKey> for NativeKey {
    fn from(key: p384::SecretKey) -> Self {
        NativeKey::Ec(EcSecretKey::P384(key))
    }
}

impl From<RsaPrivateKey> for NativeKey {
    fn from(key: RsaPrivateKey) -> Self {
        NativeKey::Rsa(Box::new(key))
    }
}

impl From<SymmetricKey> for NativeKey {
    fn from(key: SymmetricKey) -> Self {
        NativeKey::Symmetric(key)
    }
}

/// Public key material held in process memory.
///
/// `Symmetric` is the shared secret seen from the "public" side; it
/// exists so a symmetric key has the same private/public handle pair as
/// every other key.
#[derive(Debug, Clone)]
pub enum NativePublicKey {
    Ec(EcPublicKey),
    Rsa(Box<RsaPublicKey>),
    Symmetric(SymmetricKey),
}

impl NativePublicKey {
    pub fn key_type(&self) -> KeyType {
        match self {
            NativePublicKey::Ec(_) => KeyType::EllipticCurve,
            NativePublicKey::Rsa(_) => KeyType::Rsa,
            NativePublicKey::Symmetric(_) => KeyType::Symmetric,
        }
    }

    pub fn key_size_bits(&self) -> u32 {
        match self {
            NativePublicKey::Ec(key) => key.curve().bits(),
            NativePublicKey::Rsa(key) => rsa_bits(key.n().bits()),
            NativePublicKey::Symmetric(key) => key.bits(),
        }
    }
}

impl From<p256::PublicKey> for NativePublicKey {
    fn from(key: p256::PublicKey) -> Self {
        NativePublicKey::Ec(EcPublicKey::P256(key))
    }
}

impl From<p384::PublicKey> for NativePublicKey {
    fn from(key: p384::PublicKey) -> Self {
        NativePublicKey::Ec(EcPublicKey::P384(key))
    }
}

impl From<RsaPublicKey> for NativePublicKey {
    fn from(key: RsaPublicKey) -> Self {
        NativePublicKey::Rsa(Box::new(key))
    }
}

fn rsa_bits(bits: usize) -> u32 {
    u32::try_from(bits).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_core::OsRng;
    use rstest::rstest;

    #[rstest]
    #[case(Curve::P256, "1.2.840.10045.3.1.7", 256)]
    #[case(Curve::P384, "1.3.132.0.34", 384)]
    fn test_curve_oid(#[case] curve: Curve, #[case] oid: &str, #[case] bits: u32) {
        let parsed = ObjectIdentifier::new_unwrap(oid);
        assert_eq!(curve.oid(), parsed);
        assert_eq!(Curve::from_oid(&parsed), Some(curve));
        assert_eq!(curve.bits(), bits);
    }

    #[test]
    fn test_curve_from_unknown_oid() {
        // secp256k1
        let oid = ObjectIdentifier::new_unwrap("1.3.132.0.10");
        assert_eq!(Curve::from_oid(&oid), None);
    }

    #[test]
    fn test_ec_public_key_matches_secret() {
        let secret = p256::SecretKey::random(&mut OsRng);
        let native = NativeKey::from(secret.clone());

        assert_eq!(native.key_type(), KeyType::EllipticCurve);
        assert_eq!(native.key_size_bits(), 256);
        match native.public_key() {
            NativePublicKey::Ec(EcPublicKey::P256(public)) => {
                assert_eq!(public, secret.public_key())
            }
            other => panic!("unexpected public key {other:?}"),
        }
    }

    #[test]
    fn test_symmetric_key_debug_hides_bytes() {
        let key = NativeKey::from(SymmetricKey::new(vec![0x42; 32]));
        let printed = format!("{key:?}");

        assert!(printed.contains("256"));
        assert!(!printed.contains("42"));
        assert_eq!(key.public_key().key_type(), KeyType::Symmetric);
    }
}
