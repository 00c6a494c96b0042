//! Auto-refresh timer
//!
//! A cancellable task that asks the scheduler for a round on every tick.
//! Stopping it only stops future ticks; a running round completes.

use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use super::Scheduler;

/// Smallest accepted auto-refresh interval
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_millis(100);

/// Default auto-refresh interval
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(5);

/// Running auto-refresh timer
///
/// Dropping the handle stops the timer.
pub struct AutoRefresh {
    interval: Duration,
    stop_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl AutoRefresh {
    /// Start ticking; the first round is requested immediately
    ///
    /// `interval` is raised to `MIN_REFRESH_INTERVAL` if smaller. Must be
    /// called within a Tokio runtime.
    pub fn start(scheduler: Scheduler, interval: Duration) -> Self {
        let interval = interval.max(MIN_REFRESH_INTERVAL);
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if !scheduler.trigger() {
                            debug!("Auto-refresh tick coalesced into running round");
                        }
                    }
                    _ = &mut stop_rx => {
                        break;
                    }
                }
            }

            debug!("Auto-refresh timer stopped");
        });

        info!(interval_ms = interval.as_millis() as u64, "Auto-refresh started");

        Self {
            interval,
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether the timer task is still alive
    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().map_or(false, |h| !h.is_finished())
    }

    /// Stop the timer and wait for its task to exit
    pub async fn stop(mut self) {
        self.signal_stop();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }

    fn signal_stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for AutoRefresh {
    fn drop(&mut self) {
        self.signal_stop();
    }
}
