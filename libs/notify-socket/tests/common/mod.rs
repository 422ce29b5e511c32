//! Common test utilities for notify-socket integration tests
//!
//! - `FakeTransport`: in-memory sockets driven by the test
//! - `RecordingToaster`: captures toasts
//! - `MockWsServer`: real WebSocket server for end-to-end checks

#![allow(dead_code, unused_macros)]

use notify_socket::*;
use parking_lot::Mutex;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, Notify};

/// Macro for verbose test output (controlled by TEST_VERBOSE env var)
macro_rules! verbose_println {
    ($($arg:tt)*) => {
        if std::env::var("TEST_VERBOSE").is_ok() {
            println!($($arg)*);
        }
    };
}

// =============================================================================
// Fake transport
// =============================================================================

/// One socket opened through the fake transport
pub struct FakeSocket {
    pub url: String,
    pub peer: SocketPeer,
}

/// Transport that hands every opened socket to the test
#[derive(Clone, Default)]
pub struct FakeTransport {
    sockets: Arc<Mutex<Vec<FakeSocket>>>,
}

impl Transport for FakeTransport {
    fn open(&self, url: &str) -> SocketConnection {
        let (connection, peer) = SocketConnection::pair();
        self.sockets.lock().push(FakeSocket {
            url: url.to_string(),
            peer,
        });
        connection
    }
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sockets opened so far
    pub fn open_count(&self) -> usize {
        self.sockets.lock().len()
    }

    pub fn url(&self, idx: usize) -> String {
        self.sockets.lock()[idx].url.clone()
    }

    pub fn emit(&self, idx: usize, event: SocketEvent) {
        self.sockets.lock()[idx].peer.emit(event);
    }

    fn last_index(&self) -> usize {
        self.open_count()
            .checked_sub(1)
            .expect("no socket has been opened")
    }

    pub fn open_last(&self) {
        self.emit(self.last_index(), SocketEvent::Open);
    }

    pub fn close_last(&self, code: u16) {
        self.emit(
            self.last_index(),
            SocketEvent::Closed {
                code,
                reason: String::new(),
            },
        );
    }

    pub fn error_last(&self, reason: &str) {
        self.emit(self.last_index(), SocketEvent::Error(reason.to_string()));
    }

    /// Deliver an inbound text frame on the latest socket
    pub fn inbound_last(&self, text: &str) {
        self.emit(
            self.last_index(),
            SocketEvent::Message(WsMessage::Text(text.to_string())),
        );
    }

    /// Frames the client has written to socket `idx` since the last call
    pub fn sent_frames(&self, idx: usize) -> Vec<OutboundFrame> {
        let mut sockets = self.sockets.lock();
        let mut frames = Vec::new();
        while let Ok(frame) = sockets[idx].peer.outbound.try_recv() {
            frames.push(frame);
        }
        frames
    }

    /// Message envelopes written to socket `idx` since the last call
    pub fn sent_envelopes(&self, idx: usize) -> Vec<Envelope> {
        self.sent_frames(idx)
            .into_iter()
            .filter_map(|frame| match frame {
                OutboundFrame::Message(msg) => Some(Envelope::from_frame(&msg).unwrap()),
                OutboundFrame::Close { .. } => None,
            })
            .collect()
    }
}

// =============================================================================
// Toaster
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedToast {
    pub level: ToastLevel,
    pub title: String,
    pub options: ToastOptions,
}

#[derive(Default)]
pub struct RecordingToaster {
    toasts: Mutex<Vec<RecordedToast>>,
}

impl Toaster for RecordingToaster {
    fn toast(&self, level: ToastLevel, title: &str, options: ToastOptions) {
        self.toasts.lock().push(RecordedToast {
            level,
            title: title.to_string(),
            options,
        });
    }
}

impl RecordingToaster {
    pub fn toasts(&self) -> Vec<RecordedToast> {
        self.toasts.lock().clone()
    }

    pub fn with_level(&self, level: ToastLevel) -> Vec<RecordedToast> {
        self.toasts
            .lock()
            .iter()
            .filter(|t| t.level == level)
            .cloned()
            .collect()
    }
}

// =============================================================================
// Client fixture
// =============================================================================

pub struct Harness {
    pub client: NotificationClient,
    pub transport: FakeTransport,
    pub toaster: Arc<RecordingToaster>,
    pub notifications: Arc<InMemoryNotificationStore>,
    pub risk: Arc<InMemoryRiskStore>,
}

/// Client wired to a fake transport with the default linear backoff
pub fn harness() -> Harness {
    harness_with_risk(InMemoryRiskStore::new())
}

pub fn harness_with_risk(risk: InMemoryRiskStore) -> Harness {
    let transport = FakeTransport::new();
    let toaster = Arc::new(RecordingToaster::default());
    let notifications = Arc::new(InMemoryNotificationStore::new());
    let risk = Arc::new(risk);

    let client = NotificationClient::builder()
        .endpoint(Endpoint::new("ecole.example.org", true).unwrap())
        .stores(notifications.clone(), risk.clone())
        .toaster(toaster.clone())
        .transport(Arc::new(transport.clone()))
        .build()
        .unwrap();

    Harness {
        client,
        transport,
        toaster,
        notifications,
        risk,
    }
}

/// Advance the paused clock, then let the driver catch up
pub async fn advance(client: &NotificationClient, by: Duration) {
    tokio::time::advance(by).await;
    client.settle().await.unwrap();
}

/// Drain every pending client event
pub fn drain_events(client: &NotificationClient) -> Vec<ClientEvent> {
    std::iter::from_fn(|| client.try_recv_event()).collect()
}

pub fn text(value: Value) -> String {
    value.to_string()
}

// =============================================================================
// Mock WebSocket server
// =============================================================================

/// A mock WebSocket server that records the request URI and every text
/// frame it receives, and pushes frames supplied by the test
pub struct MockWsServer {
    pub addr: SocketAddr,
    pub request_uri: Arc<Mutex<Option<String>>>,
    pub received: Arc<Mutex<Vec<String>>>,
    push_tx: mpsc::UnboundedSender<String>,
    shutdown: Arc<Notify>,
}

impl MockWsServer {
    /// Start a server accepting a single connection
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Arc::new(Notify::new());
        let request_uri = Arc::new(Mutex::new(None));
        let received = Arc::new(Mutex::new(Vec::new()));
        let (push_tx, push_rx) = mpsc::unbounded_channel();

        let shutdown_clone = shutdown.clone();
        let uri_clone = request_uri.clone();
        let received_clone = received.clone();

        tokio::spawn(async move {
            tokio::select! {
                result = listener.accept() => {
                    if let Ok((stream, _)) = result {
                        Self::handle_connection(stream, uri_clone, received_clone, push_rx, shutdown_clone).await;
                    }
                }
                _ = shutdown_clone.notified() => {}
            }
        });

        Self {
            addr,
            request_uri,
            received,
            push_tx,
            shutdown,
        }
    }

    async fn handle_connection(
        stream: tokio::net::TcpStream,
        request_uri: Arc<Mutex<Option<String>>>,
        received: Arc<Mutex<Vec<String>>>,
        mut push_rx: mpsc::UnboundedReceiver<String>,
        shutdown: Arc<Notify>,
    ) {
        use futures::{SinkExt, StreamExt};
        use tokio_tungstenite::accept_hdr_async;
        use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
        use tokio_tungstenite::tungstenite::Message;

        let callback = |req: &Request, resp: Response| -> std::result::Result<Response, ErrorResponse> {
            *request_uri.lock() = Some(req.uri().to_string());
            Ok(resp)
        };

        let ws_stream = match accept_hdr_async(stream, callback).await {
            Ok(ws) => ws,
            Err(e) => {
                eprintln!("WebSocket handshake failed: {}", e);
                return;
            }
        };

        let (mut write, mut read) = ws_stream.split();

        loop {
            tokio::select! {
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => received.lock().push(text.to_string()),
                        Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                        Some(Ok(_)) => {}
                    }
                }
                Some(text) = push_rx.recv() => {
                    if write.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                _ = shutdown.notified() => {
                    break;
                }
            }
        }
    }

    /// Host and port for `Endpoint::new`
    pub fn host(&self) -> String {
        self.addr.to_string()
    }

    /// Push a text frame to the connected client
    pub fn push(&self, text: impl Into<String>) {
        let _ = self.push_tx.send(text.into());
    }

    /// Shutdown the server
    pub fn shutdown(&self) {
        self.shutdown.notify_waiters();
    }
}

impl Drop for MockWsServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}
