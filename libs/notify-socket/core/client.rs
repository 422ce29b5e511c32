use crate::config::ClientConfig;
use crate::envelope::{Envelope, OutboundMessage};
use crate::heartbeat::{next_beat, Heartbeat};
use crate::queue::OutboundQueue;
use crate::registry::{SubscriberRegistry, Subscription};
use crate::router::Router;
use crate::status::{AtomicMetrics, ConnectionState, ConnectionStatus, Metrics};
use crate::transport::{OutboundFrame, SocketConnection, SocketEvent, ABNORMAL_CLOSURE, NORMAL_CLOSURE};
use crate::traits::*;
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::future::pending;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::sync::oneshot;
use tokio::time::{sleep, Sleep};
use tracing::{debug, error, info, warn};

/// Internal command messages for client control
#[derive(Debug)]
enum ClientCommand {
    /// Open the socket, optionally with an explicit credential
    Connect(Option<String>),
    /// Close the socket intentionally
    Disconnect,
    /// Disconnect, reset the attempt counter and connect again
    Reconnect,
    /// Send or queue a message
    Send(OutboundMessage),
    /// Acknowledge once every earlier command has been processed
    Settle(oneshot::Sender<()>),
    /// Disconnect and stop the driver
    Shutdown(oneshot::Sender<()>),
}

/// Connection lifecycle events for observers
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// Socket opened
    Connected,
    /// Socket closed with the given code
    Disconnected { code: u16 },
    /// Reconnect scheduled (attempt number)
    Reconnecting(u32),
    /// Automatic reconnection gave up
    ReconnectionExhausted,
    /// Error occurred
    Error(String),
}

/// Real-time notification client
///
/// A cheap handle over a single driver task that owns the socket, the
/// reconnect and heartbeat timers, and the outbound queue. Every method
/// returns immediately; outcomes surface through [`ConnectionStatus`],
/// [`ClientEvent`]s, the state stores, and toasts.
///
/// Dropping the handle disconnects and stops the driver.
pub struct NotificationClient {
    /// Command channel sender
    command_tx: UnboundedSender<ClientCommand>,
    /// Event channel receiver
    event_rx: Receiver<ClientEvent>,
    status: Arc<RwLock<ConnectionStatus>>,
    metrics: Arc<AtomicMetrics>,
    registry: Arc<Mutex<SubscriberRegistry>>,
    /// Driver task handle
    task_handle: Option<tokio::task::JoinHandle<()>>,
}

impl NotificationClient {
    /// Create a new client builder
    pub fn builder() -> crate::builder::NotificationClientBuilder<
        crate::builder::states::NoEndpoint,
        crate::builder::states::NoStores,
    > {
        crate::builder::NotificationClientBuilder::new()
    }

    pub(crate) fn spawn(
        runtime: &tokio::runtime::Handle,
        config: ClientConfig,
        notifications: Arc<dyn NotificationStore>,
        risk: Arc<dyn RiskStore>,
        toaster: Arc<dyn Toaster>,
    ) -> Self {
        let status = Arc::new(RwLock::new(ConnectionStatus::default()));
        let metrics = Arc::new(AtomicMetrics::new());
        let registry = Arc::new(Mutex::new(SubscriberRegistry::new()));

        let (command_tx, command_rx) = unbounded_channel();
        let (event_tx, event_rx) = unbounded();

        let driver = Driver {
            queue: OutboundQueue::new(config.queue_capacity),
            router: Router::new(notifications, risk, toaster, Arc::clone(&registry)),
            config,
            status: Arc::clone(&status),
            metrics: Arc::clone(&metrics),
            event_tx,
            socket: None,
            heartbeat: None,
            reconnect_timer: None,
            last_credential: None,
        };

        let task_handle = runtime.spawn(driver.run(command_rx));

        Self {
            command_tx,
            event_rx,
            status,
            metrics,
            registry,
            task_handle: Some(task_handle),
        }
    }

    /// Open the socket
    ///
    /// No-op while a socket is open or an attempt is pending. Without an
    /// explicit credential the auth provider's token is used, then the
    /// credential of the previous connection. The provider is queried on the
    /// driver task, so a slow provider delays every other event.
    pub fn connect(&self, credential: Option<String>) -> Result<()> {
        self.command(ClientCommand::Connect(credential))
    }

    /// Close the socket, cancel timers, and drop queued messages
    pub fn disconnect(&self) -> Result<()> {
        self.command(ClientCommand::Disconnect)
    }

    /// Disconnect, reset the attempt counter, and connect again
    pub fn reconnect(&self) -> Result<()> {
        self.command(ClientCommand::Reconnect)
    }

    /// Send a message now if open, otherwise queue it until the next open
    pub fn send(&self, message: OutboundMessage) -> Result<()> {
        self.command(ClientCommand::Send(message))
    }

    /// Build and send a `{type, data}` message stamped with the current time
    pub fn send_message(&self, kind: impl Into<String>, data: Value) -> Result<()> {
        self.send(Envelope::new(kind, data))
    }

    /// Register a callback for every inbound message of exactly `kind`
    ///
    /// The callback receives the envelope's `data` field. Errors and panics
    /// are logged and never reach other subscribers.
    pub fn subscribe<F>(&self, kind: &str, callback: F) -> Subscription
    where
        F: Fn(&Value) -> Result<()> + Send + Sync + 'static,
    {
        let id = self.registry.lock().insert(kind, Arc::new(callback));
        debug!("Subscribed #{} to '{}'", id, kind);
        Subscription::new(&self.registry, kind, id)
    }

    /// Snapshot of the connection status
    pub fn status(&self) -> ConnectionStatus {
        self.status.read().clone()
    }

    /// Check if connected
    #[inline]
    pub fn is_connected(&self) -> bool {
        self.status.read().connected
    }

    #[inline]
    pub fn connection_state(&self) -> ConnectionState {
        self.status.read().state
    }

    /// Get current metrics
    pub fn metrics(&self) -> Metrics {
        self.metrics.snapshot()
    }

    /// Try to receive an event (non-blocking)
    pub fn try_recv_event(&self) -> Option<ClientEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Receive an event (blocking)
    pub fn recv_event(&self) -> std::result::Result<ClientEvent, crossbeam_channel::RecvError> {
        self.event_rx.recv()
    }

    /// Wait until the driver has processed every command issued so far
    ///
    /// Socket events and timers that were already due are processed first.
    pub async fn settle(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.command(ClientCommand::Settle(tx))?;
        rx.await
            .map_err(|_| NotifyError::ChannelSend("driver stopped".into()))
    }

    /// Disconnect and stop the driver task
    pub async fn shutdown(mut self) -> Result<()> {
        info!("Shutting down notification client");

        let (tx, rx) = oneshot::channel();
        if self.command(ClientCommand::Shutdown(tx)).is_ok() {
            let _ = rx.await;
        }

        if let Some(handle) = self.task_handle.take() {
            let _ = handle.await;
        }
        Ok(())
    }

    fn command(&self, command: ClientCommand) -> Result<()> {
        self.command_tx
            .send(command)
            .map_err(|e| NotifyError::ChannelSend(e.to_string()))
    }
}

// =============================================================================
// Driver
// =============================================================================

/// Socket owned by the driver
struct ActiveSocket {
    connection: SocketConnection,
    open: bool,
}

/// Single task serializing commands, socket events, and timers
struct Driver {
    config: ClientConfig,
    router: Router,
    status: Arc<RwLock<ConnectionStatus>>,
    metrics: Arc<AtomicMetrics>,
    event_tx: Sender<ClientEvent>,
    socket: Option<ActiveSocket>,
    queue: OutboundQueue,
    heartbeat: Option<Heartbeat>,
    reconnect_timer: Option<Pin<Box<Sleep>>>,
    last_credential: Option<String>,
}

impl Driver {
    async fn run(mut self, mut command_rx: UnboundedReceiver<ClientCommand>) {
        loop {
            tokio::select! {
                biased;

                event = next_socket_event(&mut self.socket) => {
                    self.on_socket_event(event);
                }

                _ = reconnect_due(&mut self.reconnect_timer) => {
                    self.reconnect_timer = None;
                    debug!("Reconnect timer fired");
                    self.connect(None).await;
                }

                _ = next_beat(&mut self.heartbeat) => {
                    debug!("Heartbeat tick - sending heartbeat");
                    self.send(Envelope::heartbeat());
                }

                cmd = command_rx.recv() => {
                    match cmd {
                        Some(ClientCommand::Connect(credential)) => self.connect(credential).await,
                        Some(ClientCommand::Disconnect) => self.disconnect(),
                        Some(ClientCommand::Reconnect) => {
                            self.disconnect();
                            self.status.write().reconnect_attempts = 0;
                            self.connect(None).await;
                        }
                        Some(ClientCommand::Send(message)) => self.send(message),
                        Some(ClientCommand::Settle(ack)) => {
                            let _ = ack.send(());
                        }
                        Some(ClientCommand::Shutdown(ack)) => {
                            self.disconnect();
                            let _ = ack.send(());
                            break;
                        }
                        None => {
                            debug!("Client handle dropped");
                            self.disconnect();
                            break;
                        }
                    }
                }
            }
        }

        info!("Notification driver exiting");
    }

    // -------------------------------------------------------------------------
    // Connection manager
    // -------------------------------------------------------------------------

    async fn connect(&mut self, credential: Option<String>) {
        if self.socket.is_some() {
            debug!("Socket already open or connecting, ignoring connect");
            return;
        }

        let auth = Arc::clone(&self.config.auth);
        let fallback = self.last_credential.clone();
        let Some(credential) = resolve_credential(credential, auth.as_ref(), fallback).await else {
            error!("{}", NotifyError::MissingCredential);
            {
                let mut status = self.status.write();
                if status.reconnecting {
                    status.mark_disconnected();
                    status.error = Some(NotifyError::MissingCredential.to_string());
                }
            }
            self.emit(ClientEvent::Error(NotifyError::MissingCredential.to_string()));
            return;
        };

        // Any pending automatic attempt is superseded by this one
        self.reconnect_timer = None;

        let url = self.config.endpoint.url(&credential);
        self.last_credential = Some(credential);

        {
            let mut status = self.status.write();
            status.connected = false;
            status.state = ConnectionState::Connecting;
        }

        info!("Connecting to {}", self.config.endpoint.redacted_url());
        let connection = self.config.transport.open(&url);
        self.socket = Some(ActiveSocket {
            connection,
            open: false,
        });
    }

    fn disconnect(&mut self) {
        self.reconnect_timer = None;
        self.heartbeat = None;

        if let Some(socket) = self.socket.take() {
            let _ = socket.connection.outbound.send(OutboundFrame::Close {
                code: NORMAL_CLOSURE,
                reason: "Client disconnect".into(),
            });
            info!("Disconnected from notification socket");
            self.emit(ClientEvent::Disconnected {
                code: NORMAL_CLOSURE,
            });
        }

        self.status.write().mark_disconnected();

        let dropped = self.queue.clear();
        if dropped > 0 {
            debug!("Discarded {} queued messages on disconnect", dropped);
        }
    }

    fn on_socket_event(&mut self, event: SocketEvent) {
        match event {
            SocketEvent::Open => self.on_open(),
            SocketEvent::Message(frame) => self.on_message(frame),
            SocketEvent::Error(reason) => self.on_error(reason),
            SocketEvent::Closed { code, reason } => self.on_close(code, reason),
        }
    }

    fn on_open(&mut self) {
        let Some(socket) = self.socket.as_mut() else {
            return;
        };
        socket.open = true;
        self.reconnect_timer = None;

        self.status.write().mark_open();
        info!("Connected to {}", self.config.endpoint.redacted_url());
        self.emit(ClientEvent::Connected);

        for message in self.queue.drain() {
            self.send(message);
        }

        self.heartbeat = Some(Heartbeat::start(self.config.heartbeat_interval));

        self.router.toaster().toast(
            ToastLevel::Info,
            "Notifications en temps réel activées",
            ToastOptions::new(),
        );
    }

    fn on_error(&mut self, reason: String) {
        error!("WebSocket error: {}", reason);
        self.status.write().mark_error();
        self.emit(ClientEvent::Error(reason));
    }

    fn on_close(&mut self, code: u16, reason: String) {
        self.socket = None;
        self.heartbeat = None;
        self.status.write().connected = false;
        self.emit(ClientEvent::Disconnected { code });

        if code == NORMAL_CLOSURE {
            info!("Notification socket closed normally");
            self.status.write().mark_disconnected();
            return;
        }

        warn!("Notification socket closed abnormally: {} {}", code, reason);
        self.schedule_reconnect();
    }

    fn schedule_reconnect(&mut self) {
        let strategy = &self.config.reconnect_strategy;
        let attempts = self.status.read().reconnect_attempts;

        let next = attempts + 1;
        if attempts < strategy.max_attempts() {
            if let Some(delay) = strategy.next_delay(next) {
                self.status.write().mark_reconnecting(next);
                self.metrics.increment_reconnects();
                info!(
                    "Reconnecting in {:?} (attempt {}/{})",
                    delay,
                    next,
                    strategy.max_attempts()
                );
                self.emit(ClientEvent::Reconnecting(next));
                self.reconnect_timer = Some(Box::pin(sleep(delay)));
                return;
            }
        }

        self.status.write().mark_failed();
        error!("Reconnection strategy exhausted after {} attempts", attempts);
        self.emit(ClientEvent::ReconnectionExhausted);
        self.router.toaster().toast(
            ToastLevel::Error,
            "Connexion temps réel perdue",
            ToastOptions::new()
                .description("Impossible de se reconnecter au serveur de notifications"),
        );
    }

    // -------------------------------------------------------------------------
    // Message router
    // -------------------------------------------------------------------------

    fn on_message(&mut self, frame: WsMessage) {
        self.metrics.increment_received();

        let envelope = match self.router.decode(&frame) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!("Dropping malformed frame: {}", e);
                return;
            }
        };

        if let Some(reply) = self.router.dispatch_builtin(&envelope) {
            self.send(reply);
        }
        self.router.notify_subscribers(&envelope);
    }

    // -------------------------------------------------------------------------
    // Outbound queue
    // -------------------------------------------------------------------------

    fn send(&mut self, message: OutboundMessage) {
        if let Some(socket) = self.socket.as_ref().filter(|s| s.open) {
            let frame = match message.to_frame() {
                Ok(frame) => frame,
                Err(e) => {
                    error!("Failed to encode '{}' message: {}", message.kind, e);
                    return;
                }
            };

            match socket.connection.outbound.send(OutboundFrame::Message(frame)) {
                Ok(()) => {
                    self.metrics.increment_sent();
                    return;
                }
                // Transport gone; its close event will follow
                Err(_) => warn!("Socket transport unavailable, queueing '{}'", message.kind),
            }
        } else {
            warn!("Socket not open, queueing '{}' message", message.kind);
        }

        if let Some(evicted) = self.queue.push(message) {
            self.metrics.increment_dropped();
            warn!(
                "Outbound queue full ({}), dropped oldest '{}' message",
                self.config.queue_capacity, evicted.kind
            );
        }
    }

    fn emit(&self, event: ClientEvent) {
        let _ = self.event_tx.send(event);
    }
}

/// Credential for a connection attempt
///
/// Explicit argument first, then the auth provider's token, then the
/// credential of the previous connection.
async fn resolve_credential(
    explicit: Option<String>,
    auth: &dyn AuthProvider,
    fallback: Option<String>,
) -> Option<String> {
    if let Some(token) = explicit.filter(|t| !t.is_empty()) {
        return Some(token);
    }

    if auth.is_authenticated().await {
        if let Some(token) = auth.token().await.filter(|t| !t.is_empty()) {
            return Some(token);
        }
    }

    fallback
}

/// Next event of the current socket, or forever when there is none
///
/// A transport that hangs up without a close event counts as an abnormal close.
async fn next_socket_event(socket: &mut Option<ActiveSocket>) -> SocketEvent {
    match socket {
        Some(socket) => socket
            .connection
            .events
            .recv()
            .await
            .unwrap_or(SocketEvent::Closed {
                code: ABNORMAL_CLOSURE,
                reason: "Transport dropped".into(),
            }),
        None => pending().await,
    }
}

/// Resolves when the armed reconnect timer expires, or never when disarmed
async fn reconnect_due(timer: &mut Option<Pin<Box<Sleep>>>) {
    match timer {
        Some(sleep) => sleep.as_mut().await,
        None => pending().await,
    }
}
