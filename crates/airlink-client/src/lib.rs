//! Airlink Client Library
//!
//! High-level async client for the airlink channel protocol.
//!
//! # Example
//!
//! ```ignore
//! use airlink_client::{FramePipeline, Socket};
//! use airlink_core::Topic;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let socket = Socket::connect_to("ws://localhost:4000/socket/websocket").await?;
//!
//!     let channel = socket.channel(Topic::parse("radio:audio_stream")?).await?;
//!     channel.await_join(std::time::Duration::from_secs(5)).await?;
//!
//!     let pipeline = FramePipeline::new();
//!     pipeline.attach(&channel, |buffer| {
//!         // hand the decoded bytes to the visualization
//!         let _ = buffer;
//!     });
//!
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod channel;
pub mod error;
pub mod hooks;
pub mod socket;
pub mod stream;

pub use builder::SocketBuilder;
pub use channel::{Channel, ChannelState};
pub use error::{ClientError, Result};
pub use hooks::{EventMetadata, Hook, HookRegistry, PointerEvent, PointerEventKind};
pub use socket::{Socket, SocketState};
pub use stream::FramePipeline;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::builder::SocketBuilder;
    pub use crate::channel::{Channel, ChannelState};
    pub use crate::error::{ClientError, Result};
    pub use crate::hooks::{EventMetadata, Hook, HookRegistry, PointerEvent, PointerEventKind};
    pub use crate::socket::{Socket, SocketState};
    pub use crate::stream::FramePipeline;
    pub use airlink_core::{DataFrame, Point2D, ScreenTransform, Topic, TransformTarget};
}
