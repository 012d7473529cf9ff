use base64::DecodeError;
use thiserror::Error;

/// PEM framing errors.
///
/// These only describe the text structure. Whether a label is acceptable
/// is decided by the caller: an unknown label parses into
/// [`Label::Other`](crate::Label::Other).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// No `-----BEGIN ...-----` line before the payload (or no block at all).
    #[error("no BEGIN boundary found")]
    MissingPreEncapsulationBoundary,

    /// The input ended inside a block.
    #[error("no END boundary found")]
    MissingPostEncapsulationBoundary,

    /// BEGIN is directly followed by END or by a blank line.
    #[error("block has no payload")]
    MissingData,

    /// Empty label, or a label padded with whitespace.
    #[error("invalid label")]
    InvalidLabel,

    /// BEGIN and END name different labels.
    #[error("BEGIN and END labels differ")]
    LabelMismatch,

    #[error("malformed BEGIN/END line")]
    InvalidEncapsulationBoundary,

    /// Blank line inside the payload.
    #[error("blank line inside base64 payload")]
    InvalidBase64Line,

    /// Payload continues after a padded (`=`) line.
    #[error("data after base64 padding")]
    InvalidBase64Finl,

    #[error("base64 decode: {0}")]
    Base64Decode(#[from] DecodeError),
}

pub type Result<T> = std::result::Result<T, Error>;
