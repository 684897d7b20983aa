use std::time::Duration;

use crate::net::{DEFAULT_CONNECT_TIMEOUT, Endpoint, WebSocketConnector};

#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub endpoint: Endpoint,
    /// Name the server knows this player by. Used to stamp answers and to
    /// decide which markings belong to the viewer.
    pub user: String,
    pub reconnect_interval: Duration,
    pub time_sync_interval: Duration,
    /// Upper bound on one connect attempt, handshake included.
    pub connect_timeout: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            endpoint: Endpoint::default(),
            user: String::new(),
            reconnect_interval: Duration::from_millis(1000),
            time_sync_interval: Duration::from_millis(1000),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl SyncConfig {
    pub fn new(endpoint: Endpoint, user: impl Into<String>) -> Self {
        Self {
            endpoint,
            user: user.into(),
            ..Self::default()
        }
    }

    pub fn websocket_connector(&self) -> WebSocketConnector {
        WebSocketConnector::new(self.connect_timeout)
    }
}
