//! Client error types

use serde_json::Value;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("not connected")]
    NotConnected,

    #[error("already connected")]
    AlreadyConnected,

    #[error("send failed: {0}")]
    SendFailed(String),

    #[error("timeout")]
    Timeout,

    /// Server rejected the join; carries the error response body
    #[error("join rejected: {0}")]
    JoinRejected(Value),

    #[error("channel closed")]
    ChannelClosed,

    #[error("protocol error: {0}")]
    Protocol(#[from] airlink_core::Error),

    #[error("transport error: {0}")]
    Transport(#[from] airlink_transport::TransportError),

    #[error("client error: {0}")]
    Other(String),
}
