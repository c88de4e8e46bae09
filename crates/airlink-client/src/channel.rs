//! Channel state machine and event dispatch
//!
//! A channel is one topic subscription multiplexed over the socket. Inbound
//! events for a topic are delivered to that channel's listeners in
//! registration order, FIFO per channel. Channels are created by
//! [`Socket::channel`](crate::socket::Socket::channel) and torn down by
//! [`Socket::leave`](crate::socket::Socket::leave) or connection loss.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::RwLock;
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, trace, warn};

use airlink_core::{Reply, ReplyStatus, Topic};

use crate::error::{ClientError, Result};

/// Listener callback invoked with the event payload
pub type EventCallback = Arc<dyn Fn(&Value) + Send + Sync>;

/// Channel lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// Not subscribed; set when the connection drops
    Idle,
    /// Join sent, awaiting the server reply
    Joining,
    /// Server acknowledged the join
    Joined,
    /// Join rejected or server-side channel crash
    Errored,
    /// Left by request or closed by the server
    Left,
}

/// One topic subscription
pub struct Channel {
    topic: Topic,
    join_ref: String,
    state_tx: watch::Sender<ChannelState>,
    listeners: DashMap<String, Vec<EventCallback>>,
    reject_reason: RwLock<Option<Value>>,
}

impl Channel {
    pub(crate) fn new(topic: Topic, join_ref: String) -> Arc<Self> {
        let (state_tx, _) = watch::channel(ChannelState::Joining);
        Arc::new(Self {
            topic,
            join_ref,
            state_tx,
            listeners: DashMap::new(),
            reject_reason: RwLock::new(None),
        })
    }

    /// The topic this channel is subscribed to
    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    pub(crate) fn join_ref(&self) -> &str {
        &self.join_ref
    }

    /// Current lifecycle state
    pub fn state(&self) -> ChannelState {
        *self.state_tx.borrow()
    }

    /// Watch state transitions
    pub fn state_changes(&self) -> watch::Receiver<ChannelState> {
        self.state_tx.subscribe()
    }

    /// Why the join was rejected, if it was
    pub fn reject_reason(&self) -> Option<Value> {
        self.reject_reason.read().clone()
    }

    /// Register a listener for a named event
    ///
    /// Listeners for the same event run in registration order. Repeated
    /// registration appends; avoiding duplicates is the caller's concern.
    pub fn on(&self, event: impl Into<String>, callback: impl Fn(&Value) + Send + Sync + 'static) {
        self.listeners
            .entry(event.into())
            .or_default()
            .push(Arc::new(callback));
    }

    /// Number of listeners registered for an event
    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners.get(event).map(|cbs| cbs.len()).unwrap_or(0)
    }

    /// Wait until the join handshake settles
    pub async fn await_join(&self, timeout: Duration) -> Result<()> {
        let mut rx = self.state_tx.subscribe();

        let settled = tokio::time::timeout(timeout, async {
            loop {
                let state = *rx.borrow_and_update();
                match state {
                    ChannelState::Joined => return Ok(()),
                    ChannelState::Errored => {
                        return Err(ClientError::JoinRejected(
                            self.reject_reason().unwrap_or(Value::Null),
                        ))
                    }
                    ChannelState::Idle | ChannelState::Left => {
                        return Err(ClientError::ChannelClosed)
                    }
                    ChannelState::Joining => {}
                }
                if rx.changed().await.is_err() {
                    return Err(ClientError::ChannelClosed);
                }
            }
        })
        .await;

        match settled {
            Ok(result) => result,
            Err(_) => Err(ClientError::Timeout),
        }
    }

    pub(crate) fn set_state(&self, state: ChannelState) {
        let previous = *self.state_tx.borrow();
        if previous != state {
            debug!(topic = %self.topic, ?previous, ?state, "channel state change");
            self.state_tx.send_replace(state);
        }
    }

    /// Handle a `phx_reply` push addressed to this channel
    pub(crate) fn handle_reply(&self, message_ref: Option<&str>, payload: &Value) {
        if self.state() == ChannelState::Joining && message_ref == Some(self.join_ref.as_str()) {
            match serde_json::from_value::<Reply>(payload.clone()) {
                Ok(reply) => match reply.status {
                    ReplyStatus::Ok => self.set_state(ChannelState::Joined),
                    ReplyStatus::Error => {
                        *self.reject_reason.write() = Some(reply.response);
                        self.set_state(ChannelState::Errored);
                    }
                },
                Err(e) => warn!(topic = %self.topic, "malformed join reply: {}", e),
            }
            return;
        }

        trace!(topic = %self.topic, ?message_ref, "reply outside join handshake");
    }

    /// Server-side channel crash
    pub(crate) fn handle_error(&self) {
        self.set_state(ChannelState::Errored);
    }

    /// Server closed the channel
    pub(crate) fn handle_close(&self) {
        self.set_state(ChannelState::Left);
    }

    /// Dispatch an application event to listeners, in registration order
    ///
    /// Events arriving once the channel has left `Joined` are dropped.
    pub(crate) fn dispatch(&self, event: &str, payload: &Value) {
        if self.state() != ChannelState::Joined {
            trace!(topic = %self.topic, event, "dropping event for non-joined channel");
            return;
        }

        let callbacks: Vec<EventCallback> = match self.listeners.get(event) {
            Some(cbs) => cbs.value().clone(),
            None => return,
        };

        for callback in callbacks {
            callback(payload);
        }
    }
}
