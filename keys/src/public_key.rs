use std::fmt;
use std::io;
use std::sync::Arc;

use kagi_pem::{Label, Pem, ToPem};

use crate::codec::encode_pkix;
use crate::error::{Error, Result};
use crate::key::{KeyExt, RawKey};
use crate::material::NativePublicKey;
use crate::metadata::{KeyMetadata, KeyType};
use crate::provider::{CryptoProvider, SignOptions};

/// The public side of a key.
///
/// For asymmetric keys this holds the public point or modulus. For a
/// symmetric key it is a view of the shared secret, and for a remote key it
/// holds no material at all.
#[derive(Clone)]
pub struct PublicKeyHandle {
    metadata: KeyMetadata,
    material: Option<NativePublicKey>,
    provider: Arc<dyn CryptoProvider>,
}

impl PublicKeyHandle {
    pub(crate) fn new(
        metadata: KeyMetadata,
        material: Option<NativePublicKey>,
        provider: Arc<dyn CryptoProvider>,
    ) -> Self {
        PublicKeyHandle {
            metadata,
            material,
            provider,
        }
    }

    /// Checks `signature` over a prehashed `digest`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidDigestLength`] when the digest does not match
    /// `options.hash`, [`Error::VerificationFailed`] for a bad signature and
    /// [`Error::UnsupportedOperation`] when the key is remote.
    pub fn verify(&self, digest: &[u8], signature: &[u8], options: &SignOptions) -> Result<()> {
        options.check_digest(digest)?;
        let key = self.material.as_ref().ok_or_else(|| {
            Error::UnsupportedOperation(format!(
                "public key {} is remote and cannot verify locally",
                self.metadata.id()
            ))
        })?;
        self.provider.verify(key, digest, signature, options)
    }

    /// PEM text of the key as a `PUBLIC KEY` block, newline terminated.
    pub fn export_pem(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write_pem(&mut out)?;
        Ok(out)
    }

    /// Writes the same bytes [`export_pem`](Self::export_pem) returns.
    pub fn write_pem<W: io::Write + ?Sized>(&self, sink: &mut W) -> Result<()> {
        let pem = self.to_pem()?;
        writeln!(sink, "{pem}")?;
        Ok(())
    }

    pub fn raw_key(&self) -> RawKey<'_, NativePublicKey> {
        match &self.material {
            Some(key) => RawKey::Local(key),
            None => RawKey::Remote(self.metadata.id()),
        }
    }
}

impl KeyExt for PublicKeyHandle {
    fn metadata(&self) -> &KeyMetadata {
        &self.metadata
    }

    fn is_remote(&self) -> bool {
        self.material.is_none()
    }

    fn is_private(&self) -> bool {
        self.metadata.key_type() == KeyType::Symmetric
    }
}

impl ToPem for PublicKeyHandle {
    type Error = Error;

    fn pem_label(&self) -> Label {
        Label::PublicKey
    }

    fn to_pem(&self) -> Result<Pem> {
        match &self.material {
            Some(key) => encode_pkix(key),
            None => Err(Error::Encoding(format!(
                "public key {} is remote",
                self.metadata.id()
            ))),
        }
    }
}

impl fmt::Debug for PublicKeyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicKeyHandle")
            .field("metadata", &self.metadata)
            .field("remote", &self.is_remote())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::SymmetricKey;
    use crate::metadata::{CipherSuites, KeyUsage, KeyUsages};
    use crate::provider::RustCryptoProvider;
    use rand_core::OsRng;
    use rstest::rstest;

    fn handle(material: Option<NativePublicKey>, key_type: KeyType, bits: u32) -> PublicKeyHandle {
        let metadata = KeyMetadata::new(
            "pk",
            key_type,
            bits,
            KeyUsages::from([KeyUsage::Verification]),
            CipherSuites::new(),
        );
        PublicKeyHandle::new(metadata, material, Arc::new(RustCryptoProvider))
    }

    #[test]
    fn test_ec_export() {
        let secret = p256::SecretKey::random(&mut OsRng);
        let key = handle(
            Some(secret.public_key().into()),
            KeyType::EllipticCurve,
            256,
        );

        let exported = String::from_utf8(key.export_pem().unwrap()).unwrap();
        assert!(exported.starts_with("-----BEGIN PUBLIC KEY-----\n"));
        assert!(exported.ends_with("-----END PUBLIC KEY-----\n"));

        let mut written = Vec::new();
        key.write_pem(&mut written).unwrap();
        assert_eq!(written, exported.as_bytes());

        assert!(!key.is_private());
        assert!(!key.is_remote());
        assert!(!key.is_symmetric());
        assert!(key.raw_key().local().is_some());
    }

    #[test]
    fn test_remote_view() {
        let key = handle(None, KeyType::Rsa, 2048);

        assert!(key.is_remote());
        assert!(!key.is_private());
        assert!(matches!(key.raw_key(), RawKey::Remote("pk")));
        assert!(matches!(key.export_pem(), Err(Error::Encoding(_))));
        assert!(matches!(
            key.verify(&[0; 32], &[0; 64], &SignOptions::default()),
            Err(Error::UnsupportedOperation(_))
        ));
    }

    #[rstest]
    #[case::local(Some(NativePublicKey::Symmetric(SymmetricKey::new(vec![1; 16]))), false)]
    #[case::remote(None, true)]
    fn test_symmetric_view(#[case] material: Option<NativePublicKey>, #[case] remote: bool) {
        let key = handle(material, KeyType::Symmetric, 128);

        assert!(key.is_symmetric());
        assert!(key.is_private());
        assert_eq!(key.is_remote(), remote);
        assert!(matches!(key.export_pem(), Err(Error::Encoding(_))));
    }

    #[test]
    fn test_verify_checks_digest_length() {
        let secret = p256::SecretKey::random(&mut OsRng);
        let key = handle(
            Some(secret.public_key().into()),
            KeyType::EllipticCurve,
            256,
        );

        assert!(matches!(
            key.verify(&[0; 20], &[0; 64], &SignOptions::default()),
            Err(Error::InvalidDigestLength {
                expected: 32,
                actual: 20
            })
        ));
    }

    #[test]
    fn test_debug_hides_material() {
        let key = handle(
            Some(NativePublicKey::Symmetric(SymmetricKey::new(b"topsecret".to_vec()))),
            KeyType::Symmetric,
            72,
        );
        assert!(!format!("{key:?}").contains("topsecret"));
    }
}
