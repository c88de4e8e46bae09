//! Socket builder pattern

use std::sync::Arc;
use std::time::Duration;

use crate::socket::Socket;
use crate::Result;

/// Builder for a socket connection
pub struct SocketBuilder {
    url: String,
    params: Vec<(String, String)>,
    heartbeat_interval: Duration,
    reconnect: bool,
    reconnect_interval: Duration,
}

impl SocketBuilder {
    /// Create a new builder
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            params: Vec::new(),
            heartbeat_interval: Duration::from_secs(30),
            reconnect: true,
            reconnect_interval: Duration::from_secs(5),
        }
    }

    /// Add a connection param sent in the endpoint query string
    /// (e.g. `_csrf_token`)
    pub fn param(mut self, key: &str, value: &str) -> Self {
        self.params.push((key.to_string(), value.to_string()));
        self
    }

    /// Set the heartbeat interval
    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Enable/disable auto-reconnect
    pub fn reconnect(mut self, enabled: bool) -> Self {
        self.reconnect = enabled;
        self
    }

    /// Set the reconnect interval
    pub fn reconnect_interval(mut self, interval: Duration) -> Self {
        self.reconnect_interval = interval;
        self
    }

    /// Build and connect
    pub async fn connect(self) -> Result<Arc<Socket>> {
        let socket = Arc::new(Socket::new(
            self.url,
            self.params,
            self.heartbeat_interval,
            self.reconnect,
            self.reconnect_interval,
        ));

        Arc::clone(&socket).do_connect().await?;
        Ok(socket)
    }
}
