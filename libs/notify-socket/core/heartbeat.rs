//! Heartbeat timer for open connections
//!
//! The timer lives inside the driver loop and is owned as an `Option`:
//! dropping it is the only way to stop it, so no tick can be observed after
//! the connection is torn down.
//!
//! Known gap: the client pings every interval and answers server pings, but
//! never checks that the server answers. A silently dead connection is only
//! detected when the transport itself reports a close.

use std::time::Duration;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::debug;

/// Default interval between client heartbeats
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_millis(30_000);

/// Periodic heartbeat timer
pub struct Heartbeat {
    ticker: Interval,
}

impl Heartbeat {
    /// Start a timer whose first tick is one full interval from now
    pub fn start(interval: Duration) -> Self {
        let mut ticker = interval_at(Instant::now() + interval, interval);
        // If we miss ticks due to slow processing, skip them rather than bursting
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        debug!("Heartbeat started with interval: {:?}", interval);
        Self { ticker }
    }

    pub async fn tick(&mut self) {
        self.ticker.tick().await;
    }
}

/// Wait for the next tick, or forever when no heartbeat is armed
pub async fn next_beat(heartbeat: &mut Option<Heartbeat>) {
    match heartbeat {
        Some(hb) => hb.tick().await,
        None => std::future::pending().await,
    }
}
