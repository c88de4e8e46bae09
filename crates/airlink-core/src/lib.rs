//! Airlink Core
//!
//! Core types and protocol primitives for the airlink realtime client.
//!
//! This crate provides:
//! - Channel wire messages ([`Push`], [`ChannelEvent`], [`Reply`])
//! - JSON wire encoding/decoding ([`codec`])
//! - Topic parsing and validation ([`Topic`])
//! - Audio frame payload decoding ([`DataFrame`])
//! - Pointer coordinate transforms ([`Point2D`], [`ScreenTransform`])

pub mod codec;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod message;
pub mod topic;

pub use codec::{decode, encode};
pub use error::{Error, Result};
pub use frame::{decode_payload, DataFrame};
pub use geometry::{to_local, Point2D, ScreenTransform, TransformTarget};
pub use message::{ChannelEvent, Push, Reply, ReplyStatus};
pub use topic::Topic;

/// Serializer version reported to the server on connect
pub const PROTOCOL_VSN: &str = "2.0.0";

/// Reserved topic for connection-level heartbeats
pub const CONTROL_TOPIC: &str = "phoenix";

/// Event name carrying streamed audio frames
pub const AUDIO_DATA_EVENT: &str = "audio_data";

/// Default socket mount path on the server
pub const DEFAULT_SOCKET_PATH: &str = "/socket/websocket";
