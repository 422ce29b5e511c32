//! Connection manager, message router, and outbound queue
//!
//! ## Example
//!
//! ```rust,ignore
//! use notify_socket::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = NotificationClient::builder()
//!         .endpoint(Endpoint::new("ecole.example.org", true)?)
//!         .stores(
//!             Arc::new(InMemoryNotificationStore::new()),
//!             Arc::new(InMemoryRiskStore::new()),
//!         )
//!         .toaster(Arc::new(TracingToaster))
//!         .build()?;
//!
//!     client.connect(Some("tok-1".into()))?;
//!
//!     let _sub = client.subscribe("grade_posted", |data| {
//!         println!("grade: {}", data);
//!         Ok(())
//!     });
//!
//!     while let Ok(event) = client.recv_event() {
//!         println!("Event: {:?}", event);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod client;
pub mod config;
pub mod endpoint;
pub mod envelope;
pub mod heartbeat;
pub mod queue;
pub mod registry;
pub mod router;
pub mod status;
pub mod transport;

// Re-export main types
pub use builder::{states, NotificationClientBuilder};
pub use client::{ClientEvent, NotificationClient};
pub use config::ClientConfig;
pub use endpoint::Endpoint;
pub use envelope::{Envelope, OutboundMessage};
pub use registry::Subscription;
pub use status::{AtomicMetrics, ConnectionState, ConnectionStatus, Metrics};
pub use transport::{SocketConnection, SocketEvent, SocketPeer, Transport, TungsteniteTransport};

/// Create a new notification client builder
///
/// Shorthand for [`NotificationClient::builder`].
pub fn builder() -> NotificationClientBuilder<states::NoEndpoint, states::NoStores> {
    NotificationClientBuilder::new()
}
