//! Descriptive data attached to every key handle.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Operations a key is meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyUsage {
    Signing,
    Verification,
    Encryption,
    Decryption,
    KeyAgreement,
    KeyWrapping,
}

pub type KeyUsages = BTreeSet<KeyUsage>;

/// Algorithm family of a key.
///
/// Handles exist for `EllipticCurve`, `Rsa` and `Symmetric`. `EdDsa` and
/// `Unknown` are only produced while decoding, to name what a PEM block
/// actually contained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum KeyType {
    EllipticCurve,
    Rsa,
    Symmetric,
    EdDsa,
    Unknown,
}

impl KeyType {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            KeyType::EllipticCurve => "EC",
            KeyType::Rsa => "RSA",
            KeyType::Symmetric => "symmetric",
            KeyType::EdDsa => "EdDSA",
            KeyType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Symmetric ciphers a key may be paired with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CipherSuite {
    Aes128Gcm,
    Aes256Gcm,
    ChaCha20Poly1305,
}

pub type CipherSuites = BTreeSet<CipherSuite>;

/// Immutable description of a key.
///
/// The `id` is whatever the caller assigned; it is not checked for
/// uniqueness. `key_size_bits` always comes from the key material itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyMetadata {
    id: String,
    key_type: KeyType,
    key_size_bits: u32,
    usage: KeyUsages,
    ciphers: CipherSuites,
}

impl KeyMetadata {
    pub fn new(
        id: impl Into<String>,
        key_type: KeyType,
        key_size_bits: u32,
        usage: KeyUsages,
        ciphers: CipherSuites,
    ) -> Self {
        KeyMetadata {
            id: id.into(),
            key_type,
            key_size_bits,
            usage,
            ciphers,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    pub fn key_size_bits(&self) -> u32 {
        self.key_size_bits
    }

    pub fn usage(&self) -> &KeyUsages {
        &self.usage
    }

    pub fn has_usage(&self, usage: KeyUsage) -> bool {
        self.usage.contains(&usage)
    }

    pub fn ciphers(&self) -> &CipherSuites {
        &self.ciphers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(KeyType::EllipticCurve, "EC")]
    #[case(KeyType::Rsa, "RSA")]
    #[case(KeyType::Symmetric, "symmetric")]
    #[case(KeyType::EdDsa, "EdDSA")]
    #[case(KeyType::Unknown, "unknown")]
    fn test_key_type_display(#[case] key_type: KeyType, #[case] expected: &str) {
        assert_eq!(key_type.to_string(), expected);
    }

    #[test]
    fn test_metadata_accessors() {
        let metadata = KeyMetadata::new(
            "k1",
            KeyType::Symmetric,
            256,
            KeyUsages::from([KeyUsage::Encryption, KeyUsage::Decryption]),
            CipherSuites::from([CipherSuite::Aes256Gcm]),
        );

        assert_eq!(metadata.id(), "k1");
        assert_eq!(metadata.key_type(), KeyType::Symmetric);
        assert_eq!(metadata.key_size_bits(), 256);
        assert!(metadata.has_usage(KeyUsage::Encryption));
        assert!(!metadata.has_usage(KeyUsage::Signing));
        assert!(metadata.ciphers().contains(&CipherSuite::Aes256Gcm));
    }

    #[test]
    fn test_metadata_serde() {
        let metadata = KeyMetadata::new(
            "signer",
            KeyType::EllipticCurve,
            256,
            KeyUsages::from([KeyUsage::Verification, KeyUsage::Signing]),
            CipherSuites::new(),
        );

        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(json["key_type"], "elliptic_curve");
        // sets serialize in a stable order
        assert_eq!(json["usage"], serde_json::json!(["signing", "verification"]));

        let back: KeyMetadata = serde_json::from_value(json).unwrap();
        assert_eq!(back, metadata);
    }
}
