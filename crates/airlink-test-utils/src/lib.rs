//! Common test helpers and utilities for airlink tests
//!
//! This crate provides:
//! - A scripted in-process server endpoint ([`TestServer`])
//! - Condition-based waiting (no hardcoded sleeps)
//! - A collector for decoded audio buffers ([`BufferCollector`])
//!
//! The server is test tooling only: it acknowledges joins, heartbeats, and
//! leaves the way the real endpoint does, and lets tests push arbitrary
//! events at the client.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::Notify;
use tracing::debug;

use airlink_core::{
    codec, ChannelEvent, Push, Reply, AUDIO_DATA_EVENT, DEFAULT_SOCKET_PATH,
};
use airlink_transport::{
    TransportEvent, TransportReceiver, TransportSender, TransportServer, WebSocketReceiver,
    WebSocketSender, WebSocketServer,
};

/// Default test timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default condition check interval
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_millis(10);

// ============================================================================
// Condition-Based Waiting
// ============================================================================

/// Wait for a condition with timeout - condition-based, not time-based
pub async fn wait_for<F, Fut>(check: F, interval: Duration, max_wait: Duration) -> bool
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let start = Instant::now();
    while start.elapsed() < max_wait {
        if check().await {
            return true;
        }
        tokio::time::sleep(interval).await;
    }
    false
}

/// Wait for an atomic counter to reach a target value
pub async fn wait_for_count(counter: &AtomicU32, target: u32, max_wait: Duration) -> bool {
    wait_for(
        || async { counter.load(Ordering::SeqCst) >= target },
        DEFAULT_CHECK_INTERVAL,
        max_wait,
    )
    .await
}

// ============================================================================
// Test Server - scripted endpoint with RAII cleanup
// ============================================================================

#[derive(Default)]
struct ServerState {
    /// Topics whose joins are rejected, with the error response to send
    reject: DashMap<String, Value>,
    /// Every push received from clients, in arrival order
    pushes: Mutex<Vec<Push>>,
    /// Live client connections
    clients: Mutex<Vec<Arc<WebSocketSender>>>,
}

/// A scripted server endpoint that cleans up on drop
pub struct TestServer {
    port: u16,
    handle: Option<tokio::task::JoinHandle<()>>,
    state: Arc<ServerState>,
}

impl TestServer {
    /// Bind an ephemeral port and start accepting connections
    pub async fn start() -> Self {
        let mut server = WebSocketServer::bind("127.0.0.1:0")
            .await
            .expect("bind failed");
        let port = server.local_addr().expect("no local addr").port();

        let state = Arc::new(ServerState::default());
        let accept_state = state.clone();

        let handle = tokio::spawn(async move {
            while let Ok((sender, receiver, addr)) = server.accept().await {
                debug!("test server accepted {}", addr);
                let sender = Arc::new(sender);
                accept_state.clients.lock().push(sender.clone());
                tokio::spawn(serve_connection(sender, receiver, accept_state.clone()));
            }
        });

        Self {
            port,
            handle: Some(handle),
            state,
        }
    }

    /// The socket URL for this server
    pub fn url(&self) -> String {
        format!("ws://127.0.0.1:{}{}", self.port, DEFAULT_SOCKET_PATH)
    }

    /// Get the port number
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Reject joins for a topic with the given error response
    pub fn reject_topic(&self, topic: &str, reason: Value) {
        self.state.reject.insert(topic.to_string(), reason);
    }

    /// Push an event to every connected client
    pub async fn push(&self, topic: &str, event: &str, payload: Value) {
        let push = Push::new(topic, ChannelEvent::from_wire(event), payload);
        let bytes = codec::encode(&push).expect("encode failed");

        let clients: Vec<Arc<WebSocketSender>> = self.state.clients.lock().clone();
        for client in clients {
            let _ = client.send(bytes.clone()).await;
        }
    }

    /// Push an audio frame carrying an already-base64-encoded payload
    pub async fn push_audio(&self, topic: &str, encoded: &str) {
        self.push(topic, AUDIO_DATA_EVENT, json!({"payload": encoded}))
            .await;
    }

    /// All pushes received from clients so far
    pub fn pushes(&self) -> Vec<Push> {
        self.state.pushes.lock().clone()
    }

    /// Check whether a join was received for a topic
    pub fn saw_join(&self, topic: &str) -> bool {
        self.state
            .pushes
            .lock()
            .iter()
            .any(|p| p.event == ChannelEvent::Join && p.topic == topic)
    }

    /// Check whether any heartbeat was received
    pub fn saw_heartbeat(&self) -> bool {
        self.state
            .pushes
            .lock()
            .iter()
            .any(|p| p.event == ChannelEvent::Heartbeat)
    }

    /// Check whether a leave was received for a topic
    pub fn saw_leave(&self, topic: &str) -> bool {
        self.state
            .pushes
            .lock()
            .iter()
            .any(|p| p.event == ChannelEvent::Leave && p.topic == topic)
    }

    /// Wait until a received push satisfies the predicate
    pub async fn wait_for_push<F>(&self, predicate: F, max_wait: Duration) -> bool
    where
        F: Fn(&Push) -> bool,
    {
        let start = Instant::now();
        while start.elapsed() < max_wait {
            if self.state.pushes.lock().iter().any(&predicate) {
                return true;
            }
            tokio::time::sleep(DEFAULT_CHECK_INTERVAL).await;
        }
        false
    }

    /// Number of client connections accepted so far
    pub fn connection_count(&self) -> usize {
        self.state.clients.lock().len()
    }

    /// Stop the server explicitly (also happens on drop)
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Drive one client connection through the scripted protocol
async fn serve_connection(
    sender: Arc<WebSocketSender>,
    mut receiver: WebSocketReceiver,
    state: Arc<ServerState>,
) {
    while let Some(event) = receiver.recv().await {
        match event {
            TransportEvent::Data(data) => {
                let Ok(push) = codec::decode(&data) else {
                    continue;
                };
                state.pushes.lock().push(push.clone());

                let reply = match &push.event {
                    ChannelEvent::Join => {
                        match state.reject.get(&push.topic).map(|r| r.value().clone()) {
                            Some(reason) => Some(Reply::error(reason)),
                            None => Some(Reply::ok(json!({}))),
                        }
                    }
                    ChannelEvent::Heartbeat | ChannelEvent::Leave => Some(Reply::ok(json!({}))),
                    _ => None,
                };

                if let Some(reply) = reply {
                    let mut response =
                        Push::new(push.topic.clone(), ChannelEvent::Reply, reply.into_payload());
                    response.message_ref = push.message_ref.clone();
                    response.join_ref = push.join_ref.clone();

                    if let Ok(bytes) = codec::encode(&response) {
                        let _ = sender.send(bytes).await;
                    }
                }
            }
            TransportEvent::Disconnected { .. } => break,
            _ => {}
        }
    }
}

// ============================================================================
// Buffer Collector - for verifying decoded audio delivery
// ============================================================================

/// Thread-safe collector for decoded buffers
#[derive(Clone, Default)]
pub struct BufferCollector {
    buffers: Arc<Mutex<Vec<Bytes>>>,
    count: Arc<AtomicU32>,
    notify: Arc<Notify>,
}

impl BufferCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sink function for pipeline attachment
    pub fn sink(&self) -> impl Fn(Bytes) + Send + Sync + 'static {
        let buffers = self.buffers.clone();
        let count = self.count.clone();
        let notify = self.notify.clone();

        move |buffer| {
            buffers.lock().push(buffer);
            count.fetch_add(1, Ordering::SeqCst);
            notify.notify_waiters();
        }
    }

    /// Get the count of received buffers
    pub fn count(&self) -> u32 {
        self.count.load(Ordering::SeqCst)
    }

    /// Wait for at least n buffers to be received
    pub async fn wait_for_count(&self, n: u32, max_wait: Duration) -> bool {
        wait_for_count(&self.count, n, max_wait).await
    }

    /// Get all collected buffers
    pub fn buffers(&self) -> Vec<Bytes> {
        self.buffers.lock().clone()
    }

    /// Get the last buffer received
    pub fn last(&self) -> Option<Bytes> {
        self.buffers.lock().last().cloned()
    }

    /// Clear all collected buffers
    pub fn clear(&self) {
        self.buffers.lock().clear();
        self.count.store(0, Ordering::SeqCst);
    }
}
