//! Binary runner utilities
//!
//! Provides a standardized way to run binaries with banners and periodic
//! status logging, plus the mapping from configuration to a client.

use anyhow::Context;
use notify_config::{NotifyConfig, ReconnectKind};
use notify_socket::{
    Endpoint, ExponentialBackoff, LinearBackoff, NoAuth, NotificationClient, NotificationStore,
    RiskStore, StaticAuth, TracingToaster,
};
use std::sync::Arc;
use tracing::info;

/// Configuration for running a binary application
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Name of the binary (for logging)
    pub name: String,
    /// Interval between status summaries in seconds
    pub status_interval_secs: u64,
}

impl RunConfig {
    /// Create a new run configuration
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status_interval_secs: 300, // 5 minutes default
        }
    }

    /// Set status summary interval
    pub fn with_status_interval(mut self, secs: u64) -> Self {
        self.status_interval_secs = secs;
        self
    }
}

/// Trait for binary applications
#[allow(async_fn_in_trait)]
pub trait BinaryRunner {
    /// Run the application main loop
    async fn run(&mut self) -> anyhow::Result<()>;

    /// Get the run configuration
    fn config(&self) -> &RunConfig;

    /// Summary logged when the binary stops
    fn stats(&self) -> Option<String> {
        None
    }

    /// Print startup banner
    fn print_banner(&self) {
        let config = self.config();
        info!("");
        info!("========================================");
        info!("Starting {}", config.name);
        info!("Press Ctrl+C to stop");
        info!("========================================");
        info!("");
    }

    /// Print shutdown banner
    fn print_shutdown(&self, stats: Option<&str>) {
        let config = self.config();
        info!("");
        info!("========================================");
        info!("{} stopped gracefully", config.name);
        if let Some(stats) = stats {
            info!("{}", stats);
        }
        info!("========================================");
    }

    /// Execute the binary with proper initialization and cleanup
    async fn execute(&mut self) -> anyhow::Result<()> {
        self.print_banner();
        let result = self.run().await;
        let stats = self.stats();
        self.print_shutdown(stats.as_deref());
        result
    }
}

/// Build a notification client from configuration
///
/// Toasts go to the tracing log. The configured token, if any, is served by
/// a static auth provider.
pub fn client_from_config(
    config: &NotifyConfig,
    notifications: Arc<dyn NotificationStore>,
    risk: Arc<dyn RiskStore>,
) -> anyhow::Result<NotificationClient> {
    let endpoint = Endpoint::new(config.host.clone(), config.secure)
        .with_context(|| format!("invalid host '{}'", config.host))?;

    let builder = NotificationClient::builder()
        .endpoint(endpoint)
        .stores(notifications, risk)
        .toaster(Arc::new(TracingToaster))
        .heartbeat_interval(config.heartbeat_interval())
        .queue_capacity(config.queue_capacity);

    let builder = match &config.token {
        Some(token) => builder.auth(StaticAuth::new(token.clone())),
        None => builder.auth(NoAuth),
    };

    let reconnect = &config.reconnect;
    let builder = match reconnect.strategy {
        ReconnectKind::Linear => builder.reconnect_strategy(LinearBackoff::new(
            reconnect.base_interval(),
            reconnect.max_attempts,
        )),
        ReconnectKind::Exponential => builder.reconnect_strategy(ExponentialBackoff::new(
            reconnect.base_interval(),
            reconnect.max_delay(),
            reconnect.max_attempts,
        )),
    };

    Ok(builder.build()?)
}
