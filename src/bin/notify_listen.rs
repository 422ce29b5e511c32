use anyhow::Result;
use campus_realtime::bin_common::{
    client_from_config, init_tracing_with_level, BinaryRunner, ListenArgs, RunConfig,
};
use campus_realtime::notify_config::NotifyConfig;
use campus_realtime::notify_socket::{
    ClientEvent, InMemoryNotificationStore, InMemoryRiskStore, NotificationClient, RiskCollection,
    Subscription,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Poll interval for the client event stream
const EVENT_POLL_INTERVAL: Duration = Duration::from_millis(250);

struct NotifyListener {
    run_config: RunConfig,
    client: NotificationClient,
    notifications: Arc<InMemoryNotificationStore>,
    risk: Arc<InMemoryRiskStore>,
    extra_kinds: Vec<String>,
}

impl NotifyListener {
    fn log_event(&self, event: ClientEvent) {
        match event {
            ClientEvent::Connected => info!("Connected"),
            ClientEvent::Disconnected { code } => info!("Disconnected (code {})", code),
            ClientEvent::Reconnecting(attempt) => info!("Reconnect attempt {} scheduled", attempt),
            ClientEvent::ReconnectionExhausted => {
                warn!("Reconnection attempts exhausted; restart the listener to retry")
            }
            ClientEvent::Error(e) => warn!("Client error: {}", e),
        }
    }

    fn log_status(&self) {
        let status = self.client.status();
        let metrics = self.client.metrics();
        info!(
            "Status: {:?} | sent {} | received {} | dropped {} | reconnects {}",
            status.state,
            metrics.messages_sent,
            metrics.messages_received,
            metrics.messages_dropped,
            metrics.reconnect_count
        );
        info!(
            "Stores: {} notifications ({} unread) | {} alerts",
            self.notifications.entries().len(),
            self.notifications.unread_count(),
            self.risk.records(RiskCollection::Alerts).len()
        );
    }
}

impl BinaryRunner for NotifyListener {
    async fn run(&mut self) -> Result<()> {
        let _subscriptions: Vec<Subscription> = self
            .extra_kinds
            .iter()
            .map(|kind| {
                let name = kind.clone();
                self.client.subscribe(kind, move |data| {
                    info!("[{}] {}", name, data);
                    Ok(())
                })
            })
            .collect();

        self.client.connect(None)?;

        let mut poll = tokio::time::interval(EVENT_POLL_INTERVAL);
        let mut status = tokio::time::interval(Duration::from_secs(
            self.run_config.status_interval_secs,
        ));

        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                _ = &mut ctrl_c => {
                    info!("Ctrl+C received, disconnecting");
                    break;
                }
                _ = poll.tick() => {
                    while let Some(event) = self.client.try_recv_event() {
                        self.log_event(event);
                    }
                }
                _ = status.tick() => self.log_status(),
            }
        }

        self.client.disconnect()?;
        self.client.settle().await?;
        Ok(())
    }

    fn config(&self) -> &RunConfig {
        &self.run_config
    }

    fn stats(&self) -> Option<String> {
        let metrics = self.client.metrics();
        Some(format!(
            "Received {} messages, sent {}",
            metrics.messages_received, metrics.messages_sent
        ))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load config first (before logging is initialized)
    let args = ListenArgs::from_env()?;
    let config = NotifyConfig::load(args.config_path())?;

    init_tracing_with_level(&config.log_level);
    config.log();
    config.require_token()?;

    let notifications = Arc::new(InMemoryNotificationStore::new());
    let risk = Arc::new(InMemoryRiskStore::new());
    let client = client_from_config(&config, notifications.clone(), risk.clone())?;

    let mut listener = NotifyListener {
        run_config: RunConfig::new("Notification listener").with_status_interval(60),
        client,
        notifications,
        risk,
        extra_kinds: args.kinds,
    };

    listener.execute().await?;
    listener.client.shutdown().await?;
    Ok(())
}
