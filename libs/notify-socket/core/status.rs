use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};

/// Error text recorded once automatic reconnection gives up
pub const MAX_ATTEMPTS_MESSAGE: &str = "Max reconnection attempts reached";

/// Error text recorded on a transport error event
pub const CONNECTION_ERROR_MESSAGE: &str = "WebSocket connection error";

/// Lifecycle phase of the connection manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Open,
    /// Waiting for a scheduled reconnect attempt
    Reconnecting,
    /// Attempts exhausted; only a manual `reconnect()` leaves this state
    Failed,
}

/// Observable connection status
///
/// `connected` and `reconnecting` are never both true.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectionStatus {
    pub connected: bool,
    pub reconnecting: bool,
    pub error: Option<String>,
    pub last_connected: Option<DateTime<Utc>>,
    pub reconnect_attempts: u32,
    pub state: ConnectionState,
}

impl ConnectionStatus {
    pub(crate) fn mark_open(&mut self) {
        self.connected = true;
        self.reconnecting = false;
        self.error = None;
        self.last_connected = Some(Utc::now());
        self.reconnect_attempts = 0;
        self.state = ConnectionState::Open;
    }

    pub(crate) fn mark_reconnecting(&mut self, attempt: u32) {
        self.connected = false;
        self.reconnecting = true;
        self.reconnect_attempts = attempt;
        self.state = ConnectionState::Reconnecting;
    }

    pub(crate) fn mark_failed(&mut self) {
        self.connected = false;
        self.reconnecting = false;
        self.error = Some(MAX_ATTEMPTS_MESSAGE.to_string());
        self.state = ConnectionState::Failed;
    }

    /// Transport error: the socket is unusable until its close arrives
    pub(crate) fn mark_error(&mut self) {
        self.connected = false;
        self.reconnecting = false;
        self.error = Some(CONNECTION_ERROR_MESSAGE.to_string());
        self.state = ConnectionState::Disconnected;
    }

    pub(crate) fn mark_disconnected(&mut self) {
        self.connected = false;
        self.reconnecting = false;
        self.state = ConnectionState::Disconnected;
    }
}

/// Client metrics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metrics {
    pub messages_sent: u64,
    pub messages_received: u64,
    pub messages_dropped: u64,
    pub reconnect_count: u64,
}

/// Lock-free counters behind [`Metrics`]
#[derive(Debug, Default)]
pub struct AtomicMetrics {
    messages_sent: AtomicU64,
    messages_received: AtomicU64,
    messages_dropped: AtomicU64,
    reconnect_count: AtomicU64,
}

impl AtomicMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn increment_sent(&self) {
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn increment_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn increment_dropped(&self) {
        self.messages_dropped.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn increment_reconnects(&self) {
        self.reconnect_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> Metrics {
        Metrics {
            messages_sent: self.messages_sent.load(Ordering::Relaxed),
            messages_received: self.messages_received.load(Ordering::Relaxed),
            messages_dropped: self.messages_dropped.load(Ordering::Relaxed),
            reconnect_count: self.reconnect_count.load(Ordering::Relaxed),
        }
    }
}
