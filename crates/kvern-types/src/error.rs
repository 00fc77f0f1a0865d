use thiserror::Error;

/// Errors from the attribute codec.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The byte blob could not be decoded into an attribute mapping.
    #[error("malformed attribute blob: {0}")]
    Malformed(String),

    /// The attribute mapping could not be encoded.
    #[error("unencodable attribute mapping: {0}")]
    Unencodable(String),
}
