//! # Notification socket traits
//!
//! Seams between the notification socket and the host application:
//!
//! - **AuthProvider**: supplies the socket credential
//! - **NotificationStore** / **RiskStore**: receive decoded events
//! - **Toaster**: surfaces user-visible notices
//! - **ReconnectionStrategy**: controls reconnect timing

pub mod auth;
pub mod error;
pub mod parser;
pub mod reconnect;
pub mod stores;
pub mod toast;

// Re-export commonly used types
pub use auth::{AuthProvider, NoAuth, StaticAuth};
pub use error::{NotifyError, Result};
pub use parser::WsMessage;
pub use reconnect::{ExponentialBackoff, LinearBackoff, ReconnectionStrategy};
pub use stores::{
    InMemoryNotificationStore, InMemoryRiskStore, NotificationEntry, NotificationStore,
    RiskCollection, RiskStore,
};
pub use toast::{NoOpToaster, ToastLevel, ToastOptions, Toaster, TracingToaster};
