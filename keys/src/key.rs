//! The contract shared by every key handle.

use crate::metadata::{KeyMetadata, KeyType, KeyUsage, KeyUsages};
use crate::private_key::PrivateKeyHandle;
use crate::public_key::PublicKeyHandle;

/// Queries every handle answers, whatever its material.
pub trait KeyExt {
    fn metadata(&self) -> &KeyMetadata;

    /// True for keys whose material lives in a remote service.
    fn is_remote(&self) -> bool;

    /// True when the handle can produce signatures.
    ///
    /// The public view of a symmetric key reports `true` as well: it holds
    /// the same shared secret as its private handle.
    fn is_private(&self) -> bool;

    fn id(&self) -> &str {
        self.metadata().id()
    }

    fn key_type(&self) -> KeyType {
        self.metadata().key_type()
    }

    fn key_size_bits(&self) -> u32 {
        self.metadata().key_size_bits()
    }

    fn usage(&self) -> &KeyUsages {
        self.metadata().usage()
    }

    fn has_usage(&self, usage: KeyUsage) -> bool {
        self.metadata().has_usage(usage)
    }

    fn is_symmetric(&self) -> bool {
        self.key_type() == KeyType::Symmetric
    }
}

/// Borrowed view of what backs a handle.
///
/// `Remote` carries the key id the remote service knows the key by.
#[derive(Debug, Clone, Copy)]
pub enum RawKey<'a, K> {
    Local(&'a K),
    Remote(&'a str),
}

impl<'a, K> RawKey<'a, K> {
    pub fn is_remote(&self) -> bool {
        matches!(self, RawKey::Remote(_))
    }

    pub fn local(&self) -> Option<&'a K> {
        match self {
            RawKey::Local(key) => Some(key),
            RawKey::Remote(_) => None,
        }
    }
}

/// Either side of a key pair, as produced by
/// [`KeyFactory::from_pem`](crate::KeyFactory::from_pem).
#[derive(Debug, Clone)]
pub enum KeyHandle {
    Private(PrivateKeyHandle),
    Public(PublicKeyHandle),
}

impl KeyHandle {
    pub fn as_private(&self) -> Option<&PrivateKeyHandle> {
        match self {
            KeyHandle::Private(key) => Some(key),
            KeyHandle::Public(_) => None,
        }
    }

    pub fn as_public(&self) -> Option<&PublicKeyHandle> {
        match self {
            KeyHandle::Private(_) => None,
            KeyHandle::Public(key) => Some(key),
        }
    }

    pub fn into_private(self) -> Option<PrivateKeyHandle> {
        match self {
            KeyHandle::Private(key) => Some(key),
            KeyHandle::Public(_) => None,
        }
    }

    pub fn into_public(self) -> Option<PublicKeyHandle> {
        match self {
            KeyHandle::Private(_) => None,
            KeyHandle::Public(key) => Some(key),
        }
    }

    /// The public side: the handle itself, or the private key's counterpart.
    pub fn public_key(&self) -> &PublicKeyHandle {
        match self {
            KeyHandle::Private(key) => key.public_key(),
            KeyHandle::Public(key) => key,
        }
    }
}

impl KeyExt for KeyHandle {
    fn metadata(&self) -> &KeyMetadata {
        match self {
            KeyHandle::Private(key) => key.metadata(),
            KeyHandle::Public(key) => key.metadata(),
        }
    }

    fn is_remote(&self) -> bool {
        match self {
            KeyHandle::Private(key) => key.is_remote(),
            KeyHandle::Public(key) => key.is_remote(),
        }
    }

    fn is_private(&self) -> bool {
        match self {
            KeyHandle::Private(key) => key.is_private(),
            KeyHandle::Public(key) => key.is_private(),
        }
    }
}

impl From<PrivateKeyHandle> for KeyHandle {
    fn from(key: PrivateKeyHandle) -> Self {
        KeyHandle::Private(key)
    }
}

impl From<PublicKeyHandle> for KeyHandle {
    fn from(key: PublicKeyHandle) -> Self {
        KeyHandle::Public(key)
    }
}
