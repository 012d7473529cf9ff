use thiserror::Error;

use crate::metadata::KeyType;

/// Errors returned by key construction, signing and export.
///
/// Every failure goes back to the immediate caller; nothing is retried and
/// there is no fallback to another format or provider.
#[derive(Debug, Error)]
pub enum Error {
    /// The provider could not produce fresh key material.
    #[error("key generation failed: {0}")]
    Generation(String),

    /// PEM framing or base64 error.
    #[error("PEM error: {0}")]
    Pem(#[from] kagi_pem::Error),

    /// The payload of a recognised block is not a valid structure.
    #[error("malformed {format} structure: {reason}")]
    Decoding {
        format: &'static str,
        reason: String,
    },

    /// The block label is outside the accepted key vocabulary.
    #[error("unsupported PEM block: {0}")]
    UnsupportedPemBlockType(String),

    /// The block is well formed but holds another algorithm family.
    #[error("key type mismatch: expected {expected}, found {actual}")]
    KeyTypeMismatch { expected: KeyType, actual: KeyType },

    /// The key has no material that can be serialized (remote or symmetric keys).
    #[error("key cannot be encoded: {0}")]
    Encoding(String),

    /// The encoder failed on material that is normally serializable.
    #[error("codec error: {0}")]
    Codec(String),

    #[error("invalid digest length: expected {expected} bytes, got {actual}")]
    InvalidDigestLength { expected: usize, actual: usize },

    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("signature verification failed")]
    VerificationFailed,

    /// The provider rejected a signing request.
    #[error("provider error: {0}")]
    Provider(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
