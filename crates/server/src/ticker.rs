//! Periodic trigger.
//!
//! Runs a reminder pass on a fixed interval. Pass failures are logged and the
//! loop keeps going; nothing here ever surfaces an error to a user.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::state::{AppState, TriggerSource};

/// Tick loop. Returns when `shutdown` is notified.
pub async fn run_ticker(state: Arc<AppState>, every: Duration, shutdown: Arc<Notify>) {
    info!(interval_secs = every.as_secs(), "reminder timer started");

    let mut interval = tokio::time::interval(every);
    // A slow pass should not be followed by a burst of catch-up ticks.
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                match state.run_pass(TriggerSource::Timer).await {
                    Ok(summary) => debug!(
                        sent = summary.sent_count,
                        failed = summary.errors.len(),
                        "timer pass finished"
                    ),
                    Err(e) => error!(error = %e, "timer pass failed"),
                }
            }
            _ = shutdown.notified() => {
                info!("reminder timer shutting down");
                break;
            }
        }
    }
}
