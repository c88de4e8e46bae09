//! Audio data frames
//!
//! Each `audio_data` event carries one discrete chunk of raw audio bytes,
//! base64-encoded in the payload's `payload` field. Frames are ephemeral:
//! decoded, handed to the consumer, and dropped. The field name and encoding
//! are a compatibility contract with the server.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use serde::Deserialize;
use serde_json::Value;

use crate::{Error, Result};

/// An inbound data frame before decoding
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DataFrame {
    /// Base64-encoded audio bytes
    pub payload: String,
}

impl DataFrame {
    /// Create a frame from an already-encoded payload
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    /// Extract a frame from an event payload
    pub fn from_event(payload: &Value) -> Result<Self> {
        serde_json::from_value(payload.clone()).map_err(|e| Error::Decode(e.to_string()))
    }

    /// Decode the payload into raw audio bytes
    pub fn decode(&self) -> Result<Bytes> {
        decode_payload(&self.payload)
    }
}

/// Decode a base64 payload into raw bytes
///
/// Strict decoding: standard alphabet with padding. Anything else is a
/// precondition violation surfaced as [`Error::MalformedPayload`].
pub fn decode_payload(payload: &str) -> Result<Bytes> {
    let raw = STANDARD.decode(payload)?;
    Ok(Bytes::from(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_known_value() {
        let buffer = decode_payload("aGVsbG8=").unwrap();
        assert_eq!(buffer.as_ref(), b"hello");
    }

    #[test]
    fn test_decode_invalid() {
        assert!(matches!(
            decode_payload("not base64!!"),
            Err(Error::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_from_event() {
        let payload = serde_json::json!({"payload": "AAEC"});
        let frame = DataFrame::from_event(&payload).unwrap();
        assert_eq!(frame.decode().unwrap().as_ref(), &[0u8, 1, 2]);

        let missing = serde_json::json!({"data": "AAEC"});
        assert!(DataFrame::from_event(&missing).is_err());
    }
}
