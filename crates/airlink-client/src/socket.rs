//! Socket connection and channel multiplexing
//!
//! One [`Socket`] owns the physical connection and a demux table mapping
//! topics to channels. A single reader task feeds decoded pushes through a
//! bounded queue into a dispatcher task, so per-channel delivery stays FIFO
//! and a slow consumer applies backpressure to the transport instead of
//! growing memory without bound.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};

use airlink_core::{codec, ChannelEvent, Push, Topic, CONTROL_TOPIC};
use airlink_transport::{
    endpoint_url, Transport, TransportEvent, TransportReceiver, TransportSender, WebSocketSender,
    WebSocketTransport,
};

use crate::builder::SocketBuilder;
use crate::channel::{Channel, ChannelState};
use crate::error::{ClientError, Result};

/// Capacity of the bounded queue between transport delivery and dispatch
const DISPATCH_QUEUE_CAPACITY: usize = 1024;

/// Connection lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketState {
    Disconnected,
    Connecting,
    Connected,
}

/// A multiplexed connection to the server
pub struct Socket {
    url: String,
    params: Vec<(String, String)>,
    heartbeat_interval: Duration,
    reconnect: bool,
    reconnect_interval: Duration,

    state: Arc<RwLock<SocketState>>,
    /// Queue feeding the transport writer task
    sender: Arc<RwLock<Option<mpsc::Sender<Bytes>>>>,
    /// Handle for closing the live transport
    transport: Arc<RwLock<Option<Arc<WebSocketSender>>>>,
    /// Demux table: one channel per topic
    channels: Arc<DashMap<String, Arc<Channel>>>,
    /// Monotonic message ref counter
    next_ref: AtomicU32,
    /// Ref of an unanswered heartbeat
    pending_heartbeat: Arc<RwLock<Option<String>>>,
    /// Set by close(); stops heartbeat and reconnect loops
    closed: Arc<AtomicBool>,
}

impl Socket {
    pub(crate) fn new(
        url: String,
        params: Vec<(String, String)>,
        heartbeat_interval: Duration,
        reconnect: bool,
        reconnect_interval: Duration,
    ) -> Self {
        Self {
            url,
            params,
            heartbeat_interval,
            reconnect,
            reconnect_interval,
            state: Arc::new(RwLock::new(SocketState::Disconnected)),
            sender: Arc::new(RwLock::new(None)),
            transport: Arc::new(RwLock::new(None)),
            channels: Arc::new(DashMap::new()),
            next_ref: AtomicU32::new(1),
            pending_heartbeat: Arc::new(RwLock::new(None)),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Create a builder
    pub fn builder(url: &str) -> SocketBuilder {
        SocketBuilder::new(url)
    }

    /// Connect with default options (convenience method)
    pub async fn connect_to(url: &str) -> Result<Arc<Self>> {
        SocketBuilder::new(url).connect().await
    }

    /// Current connection state
    pub fn state(&self) -> SocketState {
        *self.state.read()
    }

    /// Check if connected
    pub fn is_connected(&self) -> bool {
        self.state() == SocketState::Connected
    }

    /// Internal connect
    pub(crate) async fn do_connect(self: Arc<Self>) -> Result<()> {
        let url = endpoint_url(&self.url, &self.params)?;

        {
            let mut state = self.state.write();
            match *state {
                SocketState::Disconnected => *state = SocketState::Connecting,
                _ => return Err(ClientError::AlreadyConnected),
            }
        }

        info!("Connecting to {}", url);

        let (sender, mut receiver) = match <WebSocketTransport as Transport>::connect(&url).await {
            Ok(pair) => pair,
            Err(e) => {
                *self.state.write() = SocketState::Disconnected;
                return Err(e.into());
            }
        };

        // Outgoing queue -> transport writer
        let (out_tx, mut out_rx) = mpsc::channel::<Bytes>(100);
        *self.sender.write() = Some(out_tx);

        let sender = Arc::new(sender);
        *self.transport.write() = Some(sender.clone());

        tokio::spawn(async move {
            while let Some(data) = out_rx.recv().await {
                if let Err(e) = sender.send(data).await {
                    error!("Send error: {}", e);
                    break;
                }
            }
        });

        *self.pending_heartbeat.write() = None;
        self.closed.store(false, Ordering::SeqCst);
        *self.state.write() = SocketState::Connected;

        // Bounded dispatch queue between transport delivery and channel dispatch
        let (dispatch_tx, mut dispatch_rx) = mpsc::channel::<Push>(DISPATCH_QUEUE_CAPACITY);

        // Dispatcher task
        let channels = Arc::clone(&self.channels);
        let pending_heartbeat = Arc::clone(&self.pending_heartbeat);
        tokio::spawn(async move {
            while let Some(push) = dispatch_rx.recv().await {
                route(&channels, &pending_heartbeat, push);
            }
        });

        // Reader task
        let state = Arc::clone(&self.state);
        let sender_slot = Arc::clone(&self.sender);
        let transport_slot = Arc::clone(&self.transport);
        let channels = Arc::clone(&self.channels);
        let weak = Arc::downgrade(&self);
        tokio::spawn(async move {
            while let Some(event) = receiver.recv().await {
                match event {
                    TransportEvent::Data(data) => match codec::decode(&data) {
                        Ok(push) => {
                            if dispatch_tx.send(push).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!("Undecodable frame: {}", e),
                    },
                    TransportEvent::Disconnected { reason } => {
                        info!("Disconnected: {:?}", reason);
                        break;
                    }
                    TransportEvent::Error(e) => error!("Transport error: {}", e),
                    TransportEvent::Connected => {}
                }
            }

            // Connection lost: reset channels, callers must re-join
            *state.write() = SocketState::Disconnected;
            *sender_slot.write() = None;
            *transport_slot.write() = None;
            for entry in channels.iter() {
                entry.value().set_state(ChannelState::Idle);
            }
            channels.clear();

            if let Some(socket) = weak.upgrade() {
                socket.maybe_reconnect();
            }
        });

        // Heartbeat task
        let weak = Arc::downgrade(&self);
        let interval = self.heartbeat_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // the first tick fires immediately
            loop {
                ticker.tick().await;
                let Some(socket) = weak.upgrade() else { break };
                if socket.closed.load(Ordering::SeqCst) || !socket.is_connected() {
                    break;
                }
                if let Err(e) = socket.send_heartbeat().await {
                    warn!("Heartbeat failed: {}", e);
                    break;
                }
            }
        });

        Ok(())
    }

    /// Join a topic, or return the channel already subscribed to it
    ///
    /// Join is idempotent per topic: at most one channel exists per distinct
    /// topic, and a second call while joining/joined returns the existing
    /// channel. A channel that errored, left, or went idle is replaced by a
    /// fresh join.
    pub async fn channel(&self, topic: Topic) -> Result<Arc<Channel>> {
        if !self.is_connected() {
            return Err(ClientError::NotConnected);
        }
        if topic.is_control() {
            return Err(ClientError::Other(
                "cannot join the reserved control topic".to_string(),
            ));
        }

        let join_ref = self.make_ref();
        let channel = match self.channels.entry(topic.as_str().to_string()) {
            Entry::Occupied(mut occupied) => {
                let existing = Arc::clone(occupied.get());
                match existing.state() {
                    ChannelState::Joining | ChannelState::Joined => {
                        debug!(topic = %topic, "returning existing channel");
                        return Ok(existing);
                    }
                    _ => {
                        let fresh = Channel::new(topic.clone(), join_ref.clone());
                        occupied.insert(Arc::clone(&fresh));
                        fresh
                    }
                }
            }
            Entry::Vacant(vacant) => {
                let fresh = Channel::new(topic.clone(), join_ref.clone());
                vacant.insert(Arc::clone(&fresh));
                fresh
            }
        };

        let push = Push::new(topic.as_str(), ChannelEvent::Join, json!({}))
            .with_ref(join_ref.as_str())
            .with_join_ref(join_ref.as_str());

        if let Err(e) = self.send_push(&push).await {
            self.channels.remove(topic.as_str());
            return Err(e);
        }

        debug!(topic = %topic, join_ref = %join_ref, "join requested");
        Ok(channel)
    }

    /// Leave a topic and stop dispatch to its listeners
    pub async fn leave(&self, topic: &Topic) -> Result<()> {
        let Some((_, channel)) = self.channels.remove(topic.as_str()) else {
            return Err(ClientError::ChannelClosed);
        };
        channel.set_state(ChannelState::Left);

        let push = Push::new(topic.as_str(), ChannelEvent::Leave, json!({}))
            .with_ref(self.make_ref().as_str())
            .with_join_ref(channel.join_ref());
        self.send_push(&push).await
    }

    /// Push an application event to the server on a joined channel
    pub async fn push(&self, channel: &Channel, event: &str, payload: Value) -> Result<()> {
        if channel.state() != ChannelState::Joined {
            return Err(ClientError::ChannelClosed);
        }

        let push = Push::new(
            channel.topic().as_str(),
            ChannelEvent::Custom(event.to_string()),
            payload,
        )
        .with_ref(self.make_ref().as_str())
        .with_join_ref(channel.join_ref());
        self.send_push(&push).await
    }

    /// Close the connection and reset all channels
    pub async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);

        let transport = self.transport.write().take();
        if let Some(transport) = transport {
            let _ = transport.close().await;
        }

        *self.state.write() = SocketState::Disconnected;
        *self.sender.write() = None;
        for entry in self.channels.iter() {
            entry.value().set_state(ChannelState::Idle);
        }
        self.channels.clear();
    }

    fn make_ref(&self) -> String {
        self.next_ref.fetch_add(1, Ordering::SeqCst).to_string()
    }

    pub(crate) async fn send_push(&self, push: &Push) -> Result<()> {
        let data = codec::encode(push)?;
        self.send_raw(data).await
    }

    async fn send_raw(&self, data: Bytes) -> Result<()> {
        let tx = self.sender.read().clone();
        if let Some(tx) = tx {
            tx.send(data)
                .await
                .map_err(|e| ClientError::SendFailed(e.to_string()))
        } else {
            Err(ClientError::NotConnected)
        }
    }

    async fn send_heartbeat(&self) -> Result<()> {
        let message_ref = {
            let mut pending = self.pending_heartbeat.write();
            if let Some(unanswered) = pending.take() {
                warn!(
                    "Heartbeat {} went unanswered, closing connection",
                    unanswered
                );
                drop(pending);
                self.teardown();
                return Err(ClientError::Timeout);
            }
            let message_ref = self.make_ref();
            *pending = Some(message_ref.clone());
            message_ref
        };

        let push = Push::new(CONTROL_TOPIC, ChannelEvent::Heartbeat, json!({}))
            .with_ref(message_ref.as_str());
        self.send_push(&push).await
    }

    /// Drop the live transport; the reader task finishes the cleanup
    fn teardown(&self) {
        *self.state.write() = SocketState::Disconnected;
        *self.sender.write() = None;
        if let Some(transport) = self.transport.write().take() {
            tokio::spawn(async move {
                let _ = transport.close().await;
            });
        }
    }

    fn maybe_reconnect(self: Arc<Self>) {
        if !self.reconnect || self.closed.load(Ordering::SeqCst) {
            return;
        }

        let weak = Arc::downgrade(&self);
        let interval = self.reconnect_interval;
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                let Some(socket) = weak.upgrade() else { break };
                if socket.closed.load(Ordering::SeqCst) {
                    break;
                }
                match Arc::clone(&socket).do_connect().await {
                    Ok(()) => {
                        info!("Reconnected to {}", socket.url);
                        break;
                    }
                    Err(e) => warn!("Reconnect failed: {}", e),
                }
            }
        });
    }
}

/// Route one inbound push to its channel
fn route(
    channels: &DashMap<String, Arc<Channel>>,
    pending_heartbeat: &RwLock<Option<String>>,
    push: Push,
) {
    if push.topic == CONTROL_TOPIC {
        if push.event == ChannelEvent::Reply {
            let mut pending = pending_heartbeat.write();
            if pending.as_deref() == push.message_ref.as_deref() {
                trace!("heartbeat acknowledged");
                *pending = None;
            }
        }
        return;
    }

    let Some(channel) = channels.get(&push.topic).map(|e| Arc::clone(e.value())) else {
        trace!(topic = %push.topic, "no channel for inbound event");
        return;
    };

    match &push.event {
        ChannelEvent::Reply => channel.handle_reply(push.message_ref.as_deref(), &push.payload),
        ChannelEvent::Error => channel.handle_error(),
        ChannelEvent::Close => {
            channel.handle_close();
            channels.remove(&push.topic);
        }
        ChannelEvent::Custom(name) => channel.dispatch(name, &push.payload),
        ChannelEvent::Join | ChannelEvent::Leave | ChannelEvent::Heartbeat => {
            trace!(event = %push.event, "ignoring unexpected protocol event");
        }
    }
}
