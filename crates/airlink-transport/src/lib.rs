//! Airlink Transport Layer
//!
//! Duplex transport used by the channel client. WebSocket is the primary
//! (and currently only) implementation; the traits keep the client decoupled
//! from the concrete socket so tests can drive an in-process endpoint.

pub mod error;
pub mod traits;

#[cfg(feature = "websocket")]
pub mod websocket;

pub use error::{Result, TransportError};
pub use traits::{Transport, TransportEvent, TransportReceiver, TransportSender, TransportServer};

#[cfg(feature = "websocket")]
pub use websocket::{
    endpoint_url, WebSocketConfig, WebSocketReceiver, WebSocketSender, WebSocketServer,
    WebSocketTransport,
};
