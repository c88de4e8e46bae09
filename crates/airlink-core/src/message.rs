//! Channel wire messages

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Named events carried on a channel
///
/// Protocol-level events use reserved `phx_`-prefixed names; everything else
/// is an application event addressed by its literal name (e.g. `audio_data`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChannelEvent {
    /// Join handshake request
    Join,
    /// Server reply to a pushed message, correlated by ref
    Reply,
    /// Server-side channel crash
    Error,
    /// Server closed the channel
    Close,
    /// Leave request
    Leave,
    /// Connection keepalive
    Heartbeat,
    /// Application-defined event
    Custom(String),
}

impl ChannelEvent {
    /// The wire name of this event
    pub fn as_str(&self) -> &str {
        match self {
            ChannelEvent::Join => "phx_join",
            ChannelEvent::Reply => "phx_reply",
            ChannelEvent::Error => "phx_error",
            ChannelEvent::Close => "phx_close",
            ChannelEvent::Leave => "phx_leave",
            ChannelEvent::Heartbeat => "heartbeat",
            ChannelEvent::Custom(name) => name,
        }
    }

    /// Map a wire name back to an event
    pub fn from_wire(name: &str) -> Self {
        match name {
            "phx_join" => ChannelEvent::Join,
            "phx_reply" => ChannelEvent::Reply,
            "phx_error" => ChannelEvent::Error,
            "phx_close" => ChannelEvent::Close,
            "phx_leave" => ChannelEvent::Leave,
            "heartbeat" => ChannelEvent::Heartbeat,
            other => ChannelEvent::Custom(other.to_string()),
        }
    }

    /// Check whether this is a reserved protocol event
    pub fn is_protocol(&self) -> bool {
        !matches!(self, ChannelEvent::Custom(_))
    }
}

impl std::fmt::Display for ChannelEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for ChannelEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ChannelEvent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(ChannelEvent::from_wire(&name))
    }
}

/// One message multiplexed over the socket, in either direction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Push {
    pub topic: String,
    pub event: ChannelEvent,
    #[serde(default)]
    pub payload: Value,
    #[serde(rename = "ref", skip_serializing_if = "Option::is_none", default)]
    pub message_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub join_ref: Option<String>,
}

impl Push {
    /// Create a push with no refs attached
    pub fn new(topic: impl Into<String>, event: ChannelEvent, payload: Value) -> Self {
        Self {
            topic: topic.into(),
            event,
            payload,
            message_ref: None,
            join_ref: None,
        }
    }

    /// Attach a message ref for reply correlation
    pub fn with_ref(mut self, message_ref: impl Into<String>) -> Self {
        self.message_ref = Some(message_ref.into());
        self
    }

    /// Attach the ref of the join that opened the channel
    pub fn with_join_ref(mut self, join_ref: impl Into<String>) -> Self {
        self.join_ref = Some(join_ref.into());
        self
    }

    /// Parse the payload as a reply envelope
    ///
    /// Only meaningful when `event` is [`ChannelEvent::Reply`].
    pub fn as_reply(&self) -> Option<Reply> {
        if self.event != ChannelEvent::Reply {
            return None;
        }
        serde_json::from_value(self.payload.clone()).ok()
    }
}

/// Reply envelope carried in a `phx_reply` payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub status: ReplyStatus,
    #[serde(default)]
    pub response: Value,
}

impl Reply {
    /// An `ok` reply with the given response body
    pub fn ok(response: Value) -> Self {
        Self {
            status: ReplyStatus::Ok,
            response,
        }
    }

    /// An `error` reply with the given reason
    pub fn error(response: Value) -> Self {
        Self {
            status: ReplyStatus::Error,
            response,
        }
    }

    /// Serialize into a push payload
    pub fn into_payload(self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Reply disposition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyStatus {
    Ok,
    Error,
}
