//! # kagi
//!
//! Core traits shared by the kagi key-handling crates.
//!
//! The typed steps between untrusted text and classified key material are
//! [`Decoder`](decoder::Decoder) conversions:
//!
//! ```text
//! &str → Pem → KeyBlock
//!        Pem → Vec<u8>
//! ```
//!
//! The `kagi-pem` crate implements the framing steps and `kagi-keys`
//! implements the key decoding steps. The marker trait
//! [`DecodableFrom`](decoder::DecodableFrom) keeps the set of allowed
//! conversions explicit, so a `Pem` can only be decoded into the types
//! that opted in.
//!
//! ## Example
//!
//! ```ignore
//! use kagi::decoder::Decoder;
//! use kagi_pem::Pem;
//! use kagi_keys::{KeyType, codec::KeyBlock};
//!
//! let pem: Pem = "-----BEGIN PUBLIC KEY-----...".decode()?;
//! let block: KeyBlock = pem.decode()?;
//! let key = block.decode_as(KeyType::EllipticCurve)?;
//! ```

#![forbid(unsafe_code)]

pub mod decoder;
