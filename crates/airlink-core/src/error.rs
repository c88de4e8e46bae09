//! Error types for airlink

use thiserror::Error;

/// Result type alias for airlink operations
pub type Result<T> = std::result::Result<T, Error>;

/// Airlink protocol error types
#[derive(Error, Debug)]
pub enum Error {
    /// Topic string does not follow the `namespace:identifier` convention
    #[error("invalid topic: {0}")]
    InvalidTopic(String),

    /// Data frame payload is not valid base64
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// Wire message could not be serialized
    #[error("encode error: {0}")]
    Encode(String),

    /// Wire message could not be deserialized
    #[error("decode error: {0}")]
    Decode(String),

    /// Transform target is not attached to a rendered scene
    #[error("transform target missing")]
    MissingTarget,

    /// Screen transform has no inverse
    #[error("singular screen transform")]
    SingularTransform,

    /// Generic protocol error
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl From<base64::DecodeError> for Error {
    fn from(e: base64::DecodeError) -> Self {
        Error::MalformedPayload(e.to_string())
    }
}
