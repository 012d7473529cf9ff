//! Construction of key handles.
//!
//! Every handle comes from a [`KeyFactory`], which owns the
//! [`CryptoProvider`] the handles later sign with. The free functions at
//! the bottom of this module use a factory backed by
//! [`RustCryptoProvider`].

use std::fmt;
use std::sync::Arc;

use kagi::decoder::Decoder;
use kagi_pem::{Pem, parse_many};
use rand_core::{CryptoRngCore, OsRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::codec::{DecodedKey, KeyBlock};
use crate::error::{Error, Result};
use crate::key::KeyHandle;
use crate::material::{NativeKey, NativePublicKey};
use crate::metadata::{CipherSuites, KeyMetadata, KeyType, KeyUsages};
use crate::private_key::PrivateKeyHandle;
use crate::provider::{CryptoProvider, KeyParams, RemoteSigner, RustCryptoProvider};
use crate::public_key::PublicKeyHandle;

/// What is known about a key held by a remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteKeySpec {
    pub key_type: KeyType,
    pub key_size_bits: u32,
}

#[derive(Clone)]
pub struct KeyFactory {
    provider: Arc<dyn CryptoProvider>,
}

impl Default for KeyFactory {
    fn default() -> Self {
        KeyFactory::new(Arc::new(RustCryptoProvider))
    }
}

impl fmt::Debug for KeyFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyFactory")
            .field("provider", &self.provider)
            .finish()
    }
}

impl KeyFactory {
    pub fn new(provider: Arc<dyn CryptoProvider>) -> Self {
        KeyFactory { provider }
    }

    pub fn provider(&self) -> &Arc<dyn CryptoProvider> {
        &self.provider
    }

    /// Generates a fresh key with entropy from the operating system.
    pub fn generate(
        &self,
        id: &str,
        params: &KeyParams,
        usage: KeyUsages,
        ciphers: CipherSuites,
    ) -> Result<PrivateKeyHandle> {
        self.generate_with_rng(id, params, usage, ciphers, &mut OsRng)
    }

    pub fn generate_with_rng<R: CryptoRngCore>(
        &self,
        id: &str,
        params: &KeyParams,
        usage: KeyUsages,
        ciphers: CipherSuites,
        rng: &mut R,
    ) -> Result<PrivateKeyHandle> {
        let key = self.provider.generate(params, rng)?;
        debug!(
            id,
            key_type = %key.key_type(),
            bits = key.key_size_bits(),
            "generated key"
        );
        Ok(self.from_native(id, key, usage, ciphers))
    }

    /// Wraps existing in-memory material.
    ///
    /// `ciphers` only applies to symmetric keys; it is dropped for the
    /// asymmetric families.
    pub fn from_native(
        &self,
        id: &str,
        key: NativeKey,
        usage: KeyUsages,
        ciphers: CipherSuites,
    ) -> PrivateKeyHandle {
        let key_type = key.key_type();
        let ciphers = match key_type {
            KeyType::Symmetric => ciphers,
            _ => CipherSuites::new(),
        };
        let metadata = KeyMetadata::new(id, key_type, key.key_size_bits(), usage, ciphers);
        let public = PublicKeyHandle::new(
            metadata.clone(),
            Some(key.public_key()),
            self.provider.clone(),
        );
        PrivateKeyHandle::local(metadata, key, public, self.provider.clone())
    }

    pub fn public_from_native(
        &self,
        id: &str,
        key: NativePublicKey,
        usage: KeyUsages,
    ) -> PublicKeyHandle {
        let metadata = KeyMetadata::new(
            id,
            key.key_type(),
            key.key_size_bits(),
            usage,
            CipherSuites::new(),
        );
        PublicKeyHandle::new(metadata, Some(key), self.provider.clone())
    }

    /// Builds a handle from one PEM block.
    ///
    /// Accepts `PRIVATE KEY`, `EC PRIVATE KEY`, `PUBLIC KEY` and
    /// `EC PUBLIC KEY`. The key inside must belong to `expected`.
    pub fn from_pem(
        &self,
        pem: &Pem,
        id: &str,
        usage: KeyUsages,
        expected: KeyType,
    ) -> Result<KeyHandle> {
        debug!(id, label = %pem.label(), %expected, "decoding key block");
        let block: KeyBlock = pem.decode()?;
        Ok(match block.decode_as(expected)? {
            DecodedKey::Private(key) => {
                KeyHandle::Private(self.from_native(id, key, usage, CipherSuites::new()))
            }
            DecodedKey::Public(key) => KeyHandle::Public(self.public_from_native(id, key, usage)),
        })
    }

    /// Like [`from_pem`](Self::from_pem), refusing public key blocks.
    pub fn private_key_from_pem(
        &self,
        pem: &Pem,
        id: &str,
        usage: KeyUsages,
        expected: KeyType,
    ) -> Result<PrivateKeyHandle> {
        let block = self.classify(pem, true)?;
        match block.decode_as(expected)? {
            DecodedKey::Private(key) => Ok(self.from_native(id, key, usage, CipherSuites::new())),
            DecodedKey::Public(_) => Err(Error::UnsupportedPemBlockType(pem.label().to_string())),
        }
    }

    /// Like [`from_pem`](Self::from_pem), refusing private key blocks.
    pub fn public_key_from_pem(
        &self,
        pem: &Pem,
        id: &str,
        usage: KeyUsages,
        expected: KeyType,
    ) -> Result<PublicKeyHandle> {
        let block = self.classify(pem, false)?;
        match block.decode_as(expected)? {
            DecodedKey::Public(key) => Ok(self.public_from_native(id, key, usage)),
            DecodedKey::Private(_) => Err(Error::UnsupportedPemBlockType(pem.label().to_string())),
        }
    }

    /// Builds a handle from PEM text holding one or more blocks.
    ///
    /// A private key block wins over a public one, so the output of
    /// [`PrivateKeyHandle::export_pem`] with the public half appended reads
    /// back as the private key.
    pub fn from_pem_str(
        &self,
        text: &str,
        id: &str,
        usage: KeyUsages,
        expected: KeyType,
    ) -> Result<KeyHandle> {
        let blocks = parse_many(text)?;
        let mut unsupported = None;
        let mut public = None;
        for pem in &blocks {
            let block = match Decoder::<Pem, KeyBlock>::decode(pem) {
                Ok(block) => block,
                Err(Error::UnsupportedPemBlockType(label)) => {
                    unsupported.get_or_insert(label);
                    continue;
                }
                Err(e) => return Err(e),
            };
            if block.is_private() {
                return self.from_pem(pem, id, usage, expected);
            }
            public.get_or_insert(pem);
        }
        match (public, unsupported) {
            (Some(pem), _) => self.from_pem(pem, id, usage, expected),
            (None, Some(label)) => Err(Error::UnsupportedPemBlockType(label)),
            (None, None) => Err(Error::Pem(kagi_pem::Error::MissingData)),
        }
    }

    /// Builds a handle for a key held by a remote service.
    ///
    /// When `public` material is given it must belong to the declared
    /// family, and its size replaces the declared size. Without it the
    /// public handle is remote too. EdDSA and unknown key types are refused
    /// with [`Error::UnsupportedOperation`].
    pub fn remote(
        &self,
        id: &str,
        spec: RemoteKeySpec,
        usage: KeyUsages,
        signer: Option<Arc<dyn RemoteSigner>>,
        public: Option<NativePublicKey>,
    ) -> Result<PrivateKeyHandle> {
        if matches!(spec.key_type, KeyType::EdDsa | KeyType::Unknown) {
            return Err(Error::UnsupportedOperation(format!(
                "{} keys have no handle",
                spec.key_type
            )));
        }
        let mut key_size_bits = spec.key_size_bits;
        if let Some(key) = &public {
            if key.key_type() != spec.key_type {
                return Err(Error::KeyTypeMismatch {
                    expected: spec.key_type,
                    actual: key.key_type(),
                });
            }
            key_size_bits = key.key_size_bits();
        }
        debug!(
            id,
            key_type = %spec.key_type,
            bits = key_size_bits,
            signer = signer.is_some(),
            "registered remote key"
        );

        let metadata = KeyMetadata::new(
            id,
            spec.key_type,
            key_size_bits,
            usage,
            CipherSuites::new(),
        );
        let public = PublicKeyHandle::new(metadata.clone(), public, self.provider.clone());
        Ok(PrivateKeyHandle::remote(
            metadata,
            signer,
            public,
            self.provider.clone(),
        ))
    }

    fn classify(&self, pem: &Pem, private: bool) -> Result<KeyBlock> {
        let block: KeyBlock = pem.decode()?;
        if block.is_private() != private {
            return Err(Error::UnsupportedPemBlockType(pem.label().to_string()));
        }
        Ok(block)
    }
}

/// [`KeyFactory::generate`] on the default factory.
pub fn generate(
    id: &str,
    params: &KeyParams,
    usage: KeyUsages,
    ciphers: CipherSuites,
) -> Result<PrivateKeyHandle> {
    KeyFactory::default().generate(id, params, usage, ciphers)
}

/// [`KeyFactory::from_native`] on the default factory.
pub fn from_native(
    id: &str,
    key: NativeKey,
    usage: KeyUsages,
    ciphers: CipherSuites,
) -> PrivateKeyHandle {
    KeyFactory::default().from_native(id, key, usage, ciphers)
}

/// [`KeyFactory::from_pem`] on the default factory.
pub fn from_pem(pem: &Pem, id: &str, usage: KeyUsages, expected: KeyType) -> Result<KeyHandle> {
    KeyFactory::default().from_pem(pem, id, usage, expected)
}

/// [`KeyFactory::private_key_from_pem`] on the default factory.
pub fn private_key_from_pem(
    pem: &Pem,
    id: &str,
    usage: KeyUsages,
    expected: KeyType,
) -> Result<PrivateKeyHandle> {
    KeyFactory::default().private_key_from_pem(pem, id, usage, expected)
}

/// [`KeyFactory::public_key_from_pem`] on the default factory.
pub fn public_key_from_pem(
    pem: &Pem,
    id: &str,
    usage: KeyUsages,
    expected: KeyType,
) -> Result<PublicKeyHandle> {
    KeyFactory::default().public_key_from_pem(pem, id, usage, expected)
}
