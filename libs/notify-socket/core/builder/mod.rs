pub mod states;

use crate::client::NotificationClient;
use crate::config::ClientConfig;
use crate::endpoint::Endpoint;
use crate::heartbeat::DEFAULT_HEARTBEAT_INTERVAL;
use crate::queue::OutboundQueue;
use crate::transport::{Transport, TungsteniteTransport};
use crate::traits::*;
use states::*;
use std::sync::Arc;
use std::time::Duration;

/// Optional settings carried across type-state transitions
struct Settings {
    endpoint: Option<Endpoint>,
    notifications: Option<Arc<dyn NotificationStore>>,
    risk: Option<Arc<dyn RiskStore>>,
    toaster: Arc<dyn Toaster>,
    auth: Arc<dyn AuthProvider>,
    transport: Arc<dyn Transport>,
    reconnect_strategy: Box<dyn ReconnectionStrategy>,
    heartbeat_interval: Duration,
    queue_capacity: usize,
}

/// Type-state builder for NotificationClient
///
/// This builder uses Rust's type system to enforce that required
/// fields (endpoint and state stores) are set before the client can be built.
pub struct NotificationClientBuilder<E, S>
where
    E: EndpointState,
    S: StoresState,
{
    _state: TypeState<E, S>,
    settings: Settings,
}

impl NotificationClientBuilder<NoEndpoint, NoStores> {
    /// Create a new builder instance
    pub fn new() -> Self {
        Self {
            _state: TypeState::new(),
            settings: Settings {
                endpoint: None,
                notifications: None,
                risk: None,
                toaster: Arc::new(NoOpToaster),
                auth: Arc::new(NoAuth),
                transport: Arc::new(TungsteniteTransport),
                reconnect_strategy: Box::new(LinearBackoff::default()),
                heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
                queue_capacity: OutboundQueue::DEFAULT_CAPACITY,
            },
        }
    }
}

impl Default for NotificationClientBuilder<NoEndpoint, NoStores> {
    fn default() -> Self {
        Self::new()
    }
}

// Endpoint setting
impl<S> NotificationClientBuilder<NoEndpoint, S>
where
    S: StoresState,
{
    pub fn endpoint(mut self, endpoint: Endpoint) -> NotificationClientBuilder<HasEndpoint, S> {
        self.settings.endpoint = Some(endpoint);
        NotificationClientBuilder {
            _state: TypeState::new(),
            settings: self.settings,
        }
    }
}

// Store setting
impl<E> NotificationClientBuilder<E, NoStores>
where
    E: EndpointState,
{
    /// Set the state collaborators fed by the built-in handlers
    pub fn stores(
        mut self,
        notifications: Arc<dyn NotificationStore>,
        risk: Arc<dyn RiskStore>,
    ) -> NotificationClientBuilder<E, HasStores> {
        self.settings.notifications = Some(notifications);
        self.settings.risk = Some(risk);
        NotificationClientBuilder {
            _state: TypeState::new(),
            settings: self.settings,
        }
    }
}

// Optional configuration methods
impl<E, S> NotificationClientBuilder<E, S>
where
    E: EndpointState,
    S: StoresState,
{
    pub fn auth(mut self, auth: impl AuthProvider + 'static) -> Self {
        self.settings.auth = Arc::new(auth);
        self
    }

    pub fn toaster(mut self, toaster: Arc<dyn Toaster>) -> Self {
        self.settings.toaster = toaster;
        self
    }

    /// Replace the socket transport (tests use an in-memory one)
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.settings.transport = transport;
        self
    }

    pub fn reconnect_strategy(mut self, strategy: impl ReconnectionStrategy + 'static) -> Self {
        self.settings.reconnect_strategy = Box::new(strategy);
        self
    }

    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.settings.heartbeat_interval = interval;
        self
    }

    /// Bound the outbound queue; the oldest message is evicted when full
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.settings.queue_capacity = capacity;
        self
    }
}

// Build method - only available when all required fields are set
impl NotificationClientBuilder<HasEndpoint, HasStores> {
    /// Spawn the driver task and return the client handle
    ///
    /// Must be called from within a Tokio runtime. The client starts
    /// disconnected; call `connect` to open the socket.
    pub fn build(self) -> Result<NotificationClient> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
            NotifyError::Configuration("NotificationClient requires a Tokio runtime".into())
        })?;

        if self.settings.heartbeat_interval.is_zero() {
            return Err(NotifyError::Configuration(
                "heartbeat interval must be greater than zero".into(),
            ));
        }

        let s = self.settings;
        let (endpoint, notifications, risk) = match (s.endpoint, s.notifications, s.risk) {
            (Some(e), Some(n), Some(r)) => (e, n, r),
            _ => {
                return Err(NotifyError::Configuration(
                    "endpoint and stores must be set".into(),
                ))
            }
        };

        let config = ClientConfig {
            endpoint,
            auth: s.auth,
            transport: s.transport,
            reconnect_strategy: s.reconnect_strategy,
            heartbeat_interval: s.heartbeat_interval,
            queue_capacity: s.queue_capacity,
        };

        Ok(NotificationClient::spawn(
            &runtime,
            config,
            notifications,
            risk,
            s.toaster,
        ))
    }
}
