//! Audio frame payload decoding tests

use airlink_core::{decode_payload, DataFrame, Error};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::json;

#[test]
fn test_decode_basic() {
    let buffer = decode_payload("aGVsbG8gd29ybGQ=").expect("decode failed");
    assert_eq!(buffer.as_ref(), b"hello world");
}

#[test]
fn test_decode_empty() {
    let buffer = decode_payload("").expect("decode failed");
    assert!(buffer.is_empty());
}

#[test]
fn test_decode_length_property() {
    // Decoded length is floor(len * 3 / 4) adjusted for padding
    for raw_len in [1usize, 2, 3, 4, 17, 255, 1024] {
        let raw: Vec<u8> = (0..raw_len).map(|i| (i % 256) as u8).collect();
        let encoded = STANDARD.encode(&raw);
        let decoded = decode_payload(&encoded).expect("decode failed");
        assert_eq!(decoded.len(), raw_len);
        assert_eq!(decoded.as_ref(), &raw[..]);
    }
}

#[test]
fn test_decode_deterministic() {
    let first = decode_payload("AAECAwQ=").unwrap();
    let second = decode_payload("AAECAwQ=").unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_decode_full_byte_range() {
    let raw: Vec<u8> = (0u8..=255).collect();
    let encoded = STANDARD.encode(&raw);
    let decoded = decode_payload(&encoded).unwrap();
    assert_eq!(decoded.as_ref(), &raw[..]);
}

#[test]
fn test_decode_invalid_inputs() {
    for input in ["!!!!", "aGVsbG8", "a", "====", "aGVs bG8="] {
        let result = decode_payload(input);
        assert!(
            matches!(result, Err(Error::MalformedPayload(_))),
            "expected MalformedPayload for {:?}",
            input
        );
    }
}

#[test]
fn test_frame_from_event() {
    let payload = json!({"payload": "aGVsbG8="});
    let frame = DataFrame::from_event(&payload).expect("frame extraction failed");
    assert_eq!(frame.payload, "aGVsbG8=");
    assert_eq!(frame.decode().unwrap().as_ref(), b"hello");
}

#[test]
fn test_frame_from_event_wrong_shape() {
    assert!(DataFrame::from_event(&json!({})).is_err());
    assert!(DataFrame::from_event(&json!({"payload": 42})).is_err());
    assert!(DataFrame::from_event(&json!(null)).is_err());
}
