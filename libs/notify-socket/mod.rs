//! # notify-socket
//!
//! Real-time notification client for the campus platform.
//!
//! ## Features
//!
//! - **Single driver task**: commands, socket events, and timers are serialized in one loop
//! - **Type-state builder**: endpoint and state stores are required at compile time
//! - **Linear backoff**: bounded automatic reconnection after abnormal closes
//! - **Subscriber registry**: per-kind callbacks with isolated failures
//! - **Offline queue**: messages sent while disconnected are flushed in order on open

pub mod traits;
pub mod core;

// Re-export all traits
pub use traits::*;

// Re-export core client functionality
pub use core::{
    builder, client, config, endpoint, envelope, heartbeat, queue, registry, router, status,
    transport,
    builder::{states, NotificationClientBuilder},
    client::{ClientEvent, NotificationClient},
    config::ClientConfig,
    endpoint::Endpoint,
    envelope::{Envelope, OutboundMessage},
    registry::Subscription,
    router::BuiltinKind,
    status::{AtomicMetrics, ConnectionState, ConnectionStatus, Metrics},
    transport::{
        OutboundFrame, SocketConnection, SocketEvent, SocketPeer, Transport, TungsteniteTransport,
    },
};

// Convenience function
pub use core::builder as client_builder;
