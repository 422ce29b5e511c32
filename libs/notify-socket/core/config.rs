use crate::core::endpoint::Endpoint;
use crate::core::transport::Transport;
use crate::traits::*;
use std::sync::Arc;
use std::time::Duration;

/// Configuration for the notification client
///
/// Built with the type-state builder; the router collaborators are held
/// separately by the driver.
pub struct ClientConfig {
    /// Notification socket endpoint
    pub(crate) endpoint: Endpoint,

    /// Credential source consulted on every connection attempt
    pub(crate) auth: Arc<dyn AuthProvider>,

    /// Socket factory
    pub(crate) transport: Arc<dyn Transport>,

    /// Reconnection strategy applied after abnormal closes
    pub(crate) reconnect_strategy: Box<dyn ReconnectionStrategy>,

    /// Interval between client heartbeats while open
    pub(crate) heartbeat_interval: Duration,

    /// Maximum number of messages buffered while disconnected
    pub(crate) queue_capacity: usize,
}

impl ClientConfig {
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn heartbeat_interval(&self) -> Duration {
        self.heartbeat_interval
    }

    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    pub fn max_reconnect_attempts(&self) -> u32 {
        self.reconnect_strategy.max_attempts()
    }
}
