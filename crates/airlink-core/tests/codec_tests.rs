//! Wire codec tests

use airlink_core::{codec, ChannelEvent, Push, Reply, ReplyStatus};
use serde_json::json;

#[test]
fn test_push_roundtrip() {
    let push = Push::new(
        "radio:audio_stream",
        ChannelEvent::Custom("audio_data".to_string()),
        json!({"payload": "aGVsbG8="}),
    );

    let encoded = codec::encode(&push).expect("encode failed");
    let decoded = codec::decode(&encoded).expect("decode failed");

    assert_eq!(decoded, push);
}

#[test]
fn test_join_wire_shape() {
    let push = Push::new("radio:audio_stream", ChannelEvent::Join, json!({}))
        .with_ref("1")
        .with_join_ref("1");

    let encoded = codec::encode(&push).unwrap();
    let raw: serde_json::Value = serde_json::from_slice(&encoded).unwrap();

    assert_eq!(raw["topic"], "radio:audio_stream");
    assert_eq!(raw["event"], "phx_join");
    assert_eq!(raw["payload"], json!({}));
    assert_eq!(raw["ref"], "1");
    assert_eq!(raw["join_ref"], "1");
}

#[test]
fn test_decode_server_reply() {
    let wire = br#"{
        "topic": "radio:audio_stream",
        "event": "phx_reply",
        "payload": {"status": "ok", "response": {}},
        "ref": "1"
    }"#;

    let push = codec::decode(wire).unwrap();
    assert_eq!(push.event, ChannelEvent::Reply);
    assert_eq!(push.message_ref.as_deref(), Some("1"));

    let reply = push.as_reply().unwrap();
    assert_eq!(reply.status, ReplyStatus::Ok);
}

#[test]
fn test_decode_error_reply() {
    let wire = br#"{
        "topic": "radio:audio_stream",
        "event": "phx_reply",
        "payload": {"status": "error", "response": {"reason": "unmatched topic"}},
        "ref": "1"
    }"#;

    let reply = codec::decode(wire).unwrap().as_reply().unwrap();
    assert_eq!(reply.status, ReplyStatus::Error);
    assert_eq!(reply.response["reason"], "unmatched topic");
}

#[test]
fn test_decode_missing_ref_fields() {
    // Server pushes carry no ref
    let wire = br#"{
        "topic": "radio:audio_stream",
        "event": "audio_data",
        "payload": {"payload": "AAEC"}
    }"#;

    let push = codec::decode(wire).unwrap();
    assert_eq!(push.message_ref, None);
    assert_eq!(push.join_ref, None);
    assert_eq!(
        push.event,
        ChannelEvent::Custom("audio_data".to_string())
    );
}

#[test]
fn test_decode_invalid() {
    assert!(codec::decode(b"").is_err());
    assert!(codec::decode(b"[1,2,3]").is_err());
    assert!(codec::decode(b"{\"event\": \"phx_join\"}").is_err());
}

#[test]
fn test_reply_payload_helpers() {
    let ok = Reply::ok(json!({})).into_payload();
    assert_eq!(ok["status"], "ok");

    let err = Reply::error(json!({"reason": "denied"})).into_payload();
    assert_eq!(err["status"], "error");
    assert_eq!(err["response"]["reason"], "denied");
}
