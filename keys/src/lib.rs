//! # kagi-keys
//!
//! One set of handles for every kind of key a service signs with:
//! elliptic-curve and RSA key pairs held in memory, symmetric secrets, and
//! keys that live in a remote signer or HSM.
//!
//! Handles are built by a [`KeyFactory`] and are immutable afterwards. A
//! [`PrivateKeyHandle`] signs prehashed digests, exports PEM and hands out
//! its [`PublicKeyHandle`]. The math is delegated to a [`CryptoProvider`].
//!
//! ```
//! use kagi_keys::{Curve, KeyExt, KeyParams, KeyUsage, KeyUsages, CipherSuites, SignOptions};
//!
//! let key = kagi_keys::generate(
//!     "k1",
//!     &KeyParams::Ec { curve: Curve::P256 },
//!     KeyUsages::from([KeyUsage::Signing]),
//!     CipherSuites::new(),
//! )
//! .unwrap();
//!
//! let digest = [0x11; 32];
//! let signature = key.sign(&digest, &SignOptions::default()).unwrap();
//! key.public_key().verify(&digest, &signature, &SignOptions::default()).unwrap();
//! assert_eq!(key.public_key().id(), "k1");
//! ```

#![forbid(unsafe_code)]

pub mod codec;
pub mod error;
pub mod factory;
pub mod key;
pub mod material;
pub mod metadata;
pub mod private_key;
pub mod provider;
pub mod public_key;

pub use codec::{DecodedKey, KeyBlock, KeyFormat, PrivateKeyFormat};
pub use error::{Error, Result};
pub use factory::{
    KeyFactory, RemoteKeySpec, from_native, from_pem, generate, private_key_from_pem,
    public_key_from_pem,
};
pub use key::{KeyExt, KeyHandle, RawKey};
pub use material::{Curve, EcPublicKey, EcSecretKey, NativeKey, NativePublicKey, SymmetricKey};
pub use metadata::{CipherSuite, CipherSuites, KeyMetadata, KeyType, KeyUsage, KeyUsages};
pub use private_key::PrivateKeyHandle;
pub use provider::{
    CryptoProvider, HashAlgorithm, KeyParams, RemoteSigner, RustCryptoProvider, SignOptions,
};
pub use public_key::PublicKeyHandle;
