//! Decoder trait for type-safe conversions.
//!
//! `Decoder<T, D>` converts a source `T` into a destination `D`. The
//! destination has to opt in through `DecodableFrom<T>`, which keeps the
//! conversion graph closed: a PEM block decodes into raw bytes or into key
//! material, and nothing else.
//!
//! # Implementation Guide
//!
//! ```no_run
//! use kagi::decoder::{DecodableFrom, Decoder};
//!
//! struct Armored(String);
//! struct Payload(Vec<u8>);
//!
//! #[derive(Debug)]
//! struct ArmorError;
//!
//! impl DecodableFrom<Armored> for Payload {}
//!
//! impl Decoder<Armored, Payload> for Armored {
//!     type Error = ArmorError;
//!
//!     fn decode(&self) -> Result<Payload, Self::Error> {
//!         Ok(Payload(self.0.as_bytes().to_vec()))
//!     }
//! }
//! ```

/// Converts `self` (of type `T`) into `D`.
///
/// # Type Parameters
///
/// * `T` - The source type (usually `Self`)
/// * `D` - The destination type, which must implement `DecodableFrom<T>`
///
/// Implementations in this workspace:
///
/// - `&str` / `String` → `Pem` (`kagi-pem`)
/// - `Pem` → `Vec<u8>` (`kagi-pem`, base64 payload)
/// - `Pem` → `KeyBlock` (`kagi-keys`, label and algorithm dispatch)
pub trait Decoder<T, D: DecodableFrom<T>> {
    /// The error type returned when decoding fails.
    type Error;

    /// Decodes `self` into type `D`.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is malformed or cannot represent a `D`.
    fn decode(&self) -> Result<D, Self::Error>;
}

/// Marker trait indicating that type `D` can be decoded from type `T`.
///
/// It has no methods. Implement it on the destination type next to the
/// matching `Decoder` implementation.
pub trait DecodableFrom<T> {}

#[cfg(test)]
mod tests {
    use super::*;

    struct Hex(&'static str);

    #[derive(Debug, PartialEq)]
    struct Bytes(Vec<u8>);

    impl DecodableFrom<Hex> for Bytes {}

    impl Decoder<Hex, Bytes> for Hex {
        type Error = String;

        fn decode(&self) -> Result<Bytes, Self::Error> {
            (0..self.0.len())
                .step_by(2)
                .map(|i| {
                    self.0
                        .get(i..i + 2)
                        .and_then(|s| u8::from_str_radix(s, 16).ok())
                        .ok_or_else(|| format!("bad hex at {i}"))
                })
                .collect::<Result<Vec<u8>, String>>()
                .map(Bytes)
        }
    }

    #[test]
    fn test_decoder_roundtrip_through_marker() {
        let decoded: Bytes = Hex("00ff10").decode().unwrap();
        assert_eq!(decoded, Bytes(vec![0x00, 0xff, 0x10]));
    }

    #[test]
    fn test_decoder_error() {
        let decoded: Result<Bytes, String> = Hex("0").decode();
        assert!(decoded.is_err());
    }
}
