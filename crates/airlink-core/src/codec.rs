//! JSON wire codec
//!
//! Messages travel as JSON text frames shaped as
//! `{"topic", "event", "payload", "ref", "join_ref"}`. Encoding and decoding
//! are deterministic; malformed input surfaces a typed error, never a panic.

use bytes::Bytes;

use crate::message::Push;
use crate::{Error, Result};

/// Encode a push for the wire
pub fn encode(push: &Push) -> Result<Bytes> {
    let vec = serde_json::to_vec(push).map_err(|e| Error::Encode(e.to_string()))?;
    Ok(Bytes::from(vec))
}

/// Decode a wire frame into a push
pub fn decode(bytes: &[u8]) -> Result<Push> {
    serde_json::from_slice(bytes).map_err(|e| Error::Decode(e.to_string()))
}
