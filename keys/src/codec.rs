//! PEM ⇄ native key conversion.
//!
//! Decoding happens in two steps. [`Decoder<Pem, KeyBlock>`] dispatches on
//! the block label and inspects the algorithm identifier without building
//! any key:
//!
//! | label            | structure                   |
//! |------------------|-----------------------------|
//! | `PRIVATE KEY`    | PKCS#8 PrivateKeyInfo       |
//! | `EC PRIVATE KEY` | SEC1 ECPrivateKey           |
//! | `PUBLIC KEY`     | X.509 SubjectPublicKeyInfo  |
//! | `EC PUBLIC KEY`  | X.509 SubjectPublicKeyInfo  |
//!
//! Every other label is refused with
//! [`Error::UnsupportedPemBlockType`]. [`KeyBlock::decode_as`] then checks
//! the detected family against the one the caller expects and decodes the
//! key material.
//!
//! Encoding goes the other way through [`encode_pkcs8`],
//! [`encode_algorithm_specific`] and [`encode_pkix`], or through the
//! [`ToPem`] implementations, which pick the default format per key type.

use std::fmt;

use kagi::decoder::{DecodableFrom, Decoder};
use kagi_pem::{Label, Pem, ToPem};
use pkcs8::spki::SubjectPublicKeyInfoRef;
use pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use pkcs8::{ObjectIdentifier, PrivateKeyInfo};
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use zeroize::Zeroizing;

use crate::error::{Error, Result};
use crate::material::{Curve, EcPublicKey, EcSecretKey, NativeKey, NativePublicKey};
use crate::metadata::KeyType;

const OID_RSA_ENCRYPTION: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");
const OID_EC_PUBLIC_KEY: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");
const OID_ED25519: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.101.112");
const OID_ED448: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.101.113");

/// ASN.1 structure carried by a key block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyFormat {
    /// PKCS#8 PrivateKeyInfo
    Pkcs8,
    /// SEC1 ECPrivateKey
    Sec1,
    /// X.509 SubjectPublicKeyInfo
    Pkix,
}

impl KeyFormat {
    pub fn name(&self) -> &'static str {
        match self {
            KeyFormat::Pkcs8 => "PKCS#8",
            KeyFormat::Sec1 => "SEC1",
            KeyFormat::Pkix => "PKIX",
        }
    }

    pub fn is_private(&self) -> bool {
        !matches!(self, KeyFormat::Pkix)
    }
}

impl fmt::Display for KeyFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Private key encoding requested on export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrivateKeyFormat {
    /// `PRIVATE KEY`
    Pkcs8,
    /// The algorithm's own structure, `EC PRIVATE KEY` for elliptic curves.
    AlgorithmSpecific,
}

impl PrivateKeyFormat {
    /// Format used when the caller does not pick one.
    pub fn default_for(key_type: KeyType) -> PrivateKeyFormat {
        match key_type {
            KeyType::EllipticCurve => PrivateKeyFormat::AlgorithmSpecific,
            _ => PrivateKeyFormat::Pkcs8,
        }
    }
}

/// A classified key block whose material has not been decoded yet.
pub struct KeyBlock {
    format: KeyFormat,
    key_type: KeyType,
    curve: Option<Curve>,
    algorithm: Option<ObjectIdentifier>,
    der: Zeroizing<Vec<u8>>,
}

impl KeyBlock {
    pub fn format(&self) -> KeyFormat {
        self.format
    }

    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    pub fn curve(&self) -> Option<Curve> {
        self.curve
    }

    pub fn is_private(&self) -> bool {
        self.format.is_private()
    }

    /// Decodes the key material, requiring it to belong to `expected`.
    ///
    /// # Errors
    ///
    /// [`Error::KeyTypeMismatch`] when the block holds another algorithm
    /// family, [`Error::Decoding`] when the structure is malformed or uses
    /// a curve without an implementation.
    pub fn decode_as(&self, expected: KeyType) -> Result<DecodedKey> {
        if self.key_type != expected {
            debug!(
                %expected,
                actual = %self.key_type,
                algorithm = ?self.algorithm.map(|oid| oid.to_string()),
                format = %self.format,
                "key type mismatch"
            );
            return Err(Error::KeyTypeMismatch {
                expected,
                actual: self.key_type,
            });
        }

        match (self.format, self.key_type) {
            (KeyFormat::Pkcs8, KeyType::EllipticCurve) => {
                let key = match self.ec_curve()? {
                    Curve::P256 => p256::SecretKey::from_pkcs8_der(&self.der)
                        .map(NativeKey::from)
                        .map_err(|e| self.malformed(e))?,
                    Curve::P384 => p384::SecretKey::from_pkcs8_der(&self.der)
                        .map(NativeKey::from)
                        .map_err(|e| self.malformed(e))?,
                };
                Ok(DecodedKey::Private(key))
            }
            (KeyFormat::Pkcs8, KeyType::Rsa) => RsaPrivateKey::from_pkcs8_der(&self.der)
                .map(|key| DecodedKey::Private(key.into()))
                .map_err(|e| self.malformed(e)),
            (KeyFormat::Sec1, KeyType::EllipticCurve) => {
                let key = match self.ec_curve()? {
                    Curve::P256 => p256::SecretKey::from_sec1_der(&self.der)
                        .map(NativeKey::from)
                        .map_err(|e| self.malformed(e))?,
                    Curve::P384 => p384::SecretKey::from_sec1_der(&self.der)
                        .map(NativeKey::from)
                        .map_err(|e| self.malformed(e))?,
                };
                Ok(DecodedKey::Private(key))
            }
            (KeyFormat::Pkix, KeyType::EllipticCurve) => {
                let key = match self.ec_curve()? {
                    Curve::P256 => p256::PublicKey::from_public_key_der(&self.der)
                        .map(NativePublicKey::from)
                        .map_err(|e| self.malformed(e))?,
                    Curve::P384 => p384::PublicKey::from_public_key_der(&self.der)
                        .map(NativePublicKey::from)
                        .map_err(|e| self.malformed(e))?,
                };
                Ok(DecodedKey::Public(key))
            }
            (KeyFormat::Pkix, KeyType::Rsa) => RsaPublicKey::from_public_key_der(&self.der)
                .map(|key| DecodedKey::Public(key.into()))
                .map_err(|e| self.malformed(e)),
            (format, key_type) => Err(Error::UnsupportedOperation(format!(
                "no {key_type} handle can be built from a {format} block"
            ))),
        }
    }

    fn ec_curve(&self) -> Result<Curve> {
        self.curve.ok_or_else(|| Error::Decoding {
            format: self.format.name(),
            reason: "unsupported or missing named curve".to_string(),
        })
    }

    fn malformed(&self, e: impl fmt::Display) -> Error {
        malformed(self.format, e)
    }
}

impl fmt::Debug for KeyBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyBlock")
            .field("format", &self.format)
            .field("key_type", &self.key_type)
            .field("curve", &self.curve)
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

/// Native key material recovered from a PEM block.
#[derive(Debug, Clone)]
pub enum DecodedKey {
    Private(NativeKey),
    Public(NativePublicKey),
}

impl DecodedKey {
    pub fn key_type(&self) -> KeyType {
        match self {
            DecodedKey::Private(key) => key.key_type(),
            DecodedKey::Public(key) => key.key_type(),
        }
    }
}

impl DecodableFrom<Pem> for KeyBlock {}

impl Decoder<Pem, KeyBlock> for Pem {
    type Error = Error;

    fn decode(&self) -> Result<KeyBlock> {
        let format = match self.label() {
            Label::PrivateKey => KeyFormat::Pkcs8,
            Label::ECPrivateKey => KeyFormat::Sec1,
            Label::PublicKey | Label::ECPublicKey => KeyFormat::Pkix,
            other => return Err(Error::UnsupportedPemBlockType(other.to_string())),
        };
        trace!(label = %self.label(), %format, "classifying key block");

        let der = Zeroizing::new(Decoder::<Pem, Vec<u8>>::decode(self)?);

        let (algorithm, key_type, curve) = match format {
            KeyFormat::Pkcs8 => {
                let info = PrivateKeyInfo::try_from(der.as_slice())
                    .map_err(|e| malformed(format, e))?;
                let oid = info.algorithm.oid;
                let curve = info
                    .algorithm
                    .parameters_oid()
                    .ok()
                    .and_then(|p| Curve::from_oid(&p));
                (Some(oid), key_type_of(&oid), curve)
            }
            KeyFormat::Sec1 => {
                let key = sec1::EcPrivateKey::try_from(der.as_slice())
                    .map_err(|e| malformed(format, e))?;
                let curve = match key.parameters.and_then(|p| p.named_curve()) {
                    Some(named) => Curve::from_oid(&named),
                    None => Curve::from_scalar_len(key.private_key.len()),
                };
                (None, KeyType::EllipticCurve, curve)
            }
            KeyFormat::Pkix => {
                let info = SubjectPublicKeyInfoRef::try_from(der.as_slice())
                    .map_err(|e| malformed(format, e))?;
                let oid = info.algorithm.oid;
                let curve = info
                    .algorithm
                    .parameters_oid()
                    .ok()
                    .and_then(|p| Curve::from_oid(&p));
                (Some(oid), key_type_of(&oid), curve)
            }
        };

        Ok(KeyBlock {
            format,
            key_type,
            curve,
            algorithm,
            der,
        })
    }
}

fn malformed(format: KeyFormat, e: impl fmt::Display) -> Error {
    Error::Decoding {
        format: format.name(),
        reason: e.to_string(),
    }
}

fn key_type_of(oid: &ObjectIdentifier) -> KeyType {
    if *oid == OID_EC_PUBLIC_KEY {
        KeyType::EllipticCurve
    } else if *oid == OID_RSA_ENCRYPTION {
        KeyType::Rsa
    } else if *oid == OID_ED25519 || *oid == OID_ED448 {
        KeyType::EdDsa
    } else {
        KeyType::Unknown
    }
}

/// Encodes private material as a PKCS#8 `PRIVATE KEY` block.
pub fn encode_pkcs8(key: &NativeKey) -> Result<Pem> {
    let document = match key {
        NativeKey::Ec(EcSecretKey::P256(secret)) => secret.to_pkcs8_der(),
        NativeKey::Ec(EcSecretKey::P384(secret)) => secret.to_pkcs8_der(),
        NativeKey::Rsa(secret) => secret.to_pkcs8_der(),
        NativeKey::Symmetric(_) => return Err(symmetric_not_encodable()),
    }
    .map_err(|e| Error::Codec(e.to_string()))?;
    Ok(Pem::from_bytes(Label::PrivateKey, document.as_bytes()))
}

/// Encodes private material in its algorithm-specific form.
///
/// Only elliptic-curve keys have one here (SEC1, `EC PRIVATE KEY`).
pub fn encode_algorithm_specific(key: &NativeKey) -> Result<Pem> {
    let der = match key {
        NativeKey::Ec(EcSecretKey::P256(secret)) => secret.to_sec1_der(),
        NativeKey::Ec(EcSecretKey::P384(secret)) => secret.to_sec1_der(),
        NativeKey::Rsa(_) => {
            return Err(Error::Encoding(
                "RSA keys have no algorithm-specific encoding in the accepted label set".into(),
            ));
        }
        NativeKey::Symmetric(_) => return Err(symmetric_not_encodable()),
    }
    .map_err(|e| Error::Codec(e.to_string()))?;
    Ok(Pem::from_bytes(Label::ECPrivateKey, &der))
}

/// Encodes public material as an X.509 `PUBLIC KEY` block.
pub fn encode_pkix(key: &NativePublicKey) -> Result<Pem> {
    let document = match key {
        NativePublicKey::Ec(EcPublicKey::P256(public)) => public.to_public_key_der(),
        NativePublicKey::Ec(EcPublicKey::P384(public)) => public.to_public_key_der(),
        NativePublicKey::Rsa(public) => public.to_public_key_der(),
        NativePublicKey::Symmetric(_) => return Err(symmetric_not_encodable()),
    }
    .map_err(|e| Error::Codec(e.to_string()))?;
    Ok(Pem::from_bytes(Label::PublicKey, document.as_bytes()))
}

/// Encodes private material in the given format.
pub fn encode_private(key: &NativeKey, format: PrivateKeyFormat) -> Result<Pem> {
    match format {
        PrivateKeyFormat::Pkcs8 => encode_pkcs8(key),
        PrivateKeyFormat::AlgorithmSpecific => encode_algorithm_specific(key),
    }
}

fn symmetric_not_encodable() -> Error {
    Error::Encoding("symmetric keys have no PEM encoding".into())
}

impl ToPem for NativeKey {
    type Error = Error;

    fn pem_label(&self) -> Label {
        match PrivateKeyFormat::default_for(self.key_type()) {
            PrivateKeyFormat::Pkcs8 => Label::PrivateKey,
            PrivateKeyFormat::AlgorithmSpecific => Label::ECPrivateKey,
        }
    }

    fn to_pem(&self) -> Result<Pem> {
        encode_private(self, PrivateKeyFormat::default_for(self.key_type()))
    }
}

impl ToPem for NativePublicKey {
    type Error = Error;

    fn pem_label(&self) -> Label {
        Label::PublicKey
    }

    fn to_pem(&self) -> Result<Pem> {
        encode_pkix(self)
    }
}
