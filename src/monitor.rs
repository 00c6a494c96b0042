//! Fleet monitor: the query interface
//!
//! The single handle consumers use to read snapshots, force refreshes,
//! toggle auto-refresh and edit the peer registry. Registry edits take
//! effect at the next round.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::info;

use crate::config::FleetwatchConfig;
use crate::error::{Error, Result, ValidationError};
use crate::peer::{PeerRegistry, Topology};
use crate::scheduler::{AutoRefresh, RoundSettings, Scheduler, MIN_REFRESH_INTERVAL};
use crate::transport::{HttpTransport, HttpTransportConfig, PeerTransport};
use crate::types::{PeerDescriptor, Snapshot};

/// Current auto-refresh setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoRefreshStatus {
    pub enabled: bool,
    pub interval_ms: u64,
}

struct AutoState {
    interval: Duration,
    timer: Option<AutoRefresh>,
}

/// Handle to a running fleet aggregator
pub struct FleetMonitor {
    registry: Arc<PeerRegistry>,
    scheduler: Scheduler,
    auto: Mutex<AutoState>,
}

impl FleetMonitor {
    /// Create a monitor; auto-refresh starts disabled
    pub fn new(
        registry: Arc<PeerRegistry>,
        transport: Arc<dyn PeerTransport>,
        settings: RoundSettings,
        refresh_interval: Duration,
    ) -> Self {
        let scheduler = Scheduler::new(registry.clone(), transport, settings);

        Self {
            registry,
            scheduler,
            auto: Mutex::new(AutoState {
                interval: refresh_interval.max(MIN_REFRESH_INTERVAL),
                timer: None,
            }),
        }
    }

    /// Build a monitor over HTTP from configuration
    ///
    /// Auto-refresh is not started; callers decide when the first round runs.
    pub fn from_config(config: &FleetwatchConfig) -> Result<Self> {
        let registry = Arc::new(config.build_registry()?);
        let transport = Arc::new(HttpTransport::new(HttpTransportConfig::default())?);

        Ok(Self::new(
            registry,
            transport,
            config.aggregator.round_settings(),
            config.aggregator.refresh_interval(),
        ))
    }

    // ─────────────────────────────────────────────────────────────
    // Snapshots
    // ─────────────────────────────────────────────────────────────

    /// Latest snapshot; the initial sentinel before the first round
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.scheduler.current()
    }

    /// Receiver notified whenever a new snapshot is published
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.scheduler.subscribe()
    }

    /// Run a round now, or join the one in flight, and return its snapshot
    pub async fn refresh_now(&self) -> Arc<Snapshot> {
        self.scheduler.refresh_now().await
    }

    /// Request a round without waiting; `false` when one is already running
    pub fn trigger_refresh(&self) -> bool {
        self.scheduler.trigger()
    }

    /// Layout and edges of the latest snapshot
    pub fn topology(&self) -> Topology {
        Topology::from_snapshot(&self.snapshot())
    }

    // ─────────────────────────────────────────────────────────────
    // Auto-Refresh
    // ─────────────────────────────────────────────────────────────

    /// Enable or disable the auto-refresh timer
    ///
    /// Replaces any running timer. Disabling never aborts a round already
    /// in flight and always succeeds; the interval is only checked when
    /// enabling. Must be called within a Tokio runtime.
    pub fn set_auto_refresh(&self, enabled: bool, interval: Duration) -> Result<()> {
        if !enabled {
            let mut auto = self.auto.lock();
            auto.timer = None;
            if interval >= MIN_REFRESH_INTERVAL {
                auto.interval = interval;
            }
            drop(auto);

            info!("Auto-refresh disabled");
            return Ok(());
        }

        if interval < MIN_REFRESH_INTERVAL {
            return Err(ValidationError::invalid(
                "interval",
                format!(
                    "must be at least {} ms",
                    MIN_REFRESH_INTERVAL.as_millis()
                ),
            )
            .into());
        }

        let mut auto = self.auto.lock();
        // Dropping the old timer stops it
        auto.timer = None;
        auto.interval = interval;
        auto.timer = Some(AutoRefresh::start(self.scheduler.clone(), interval));

        info!(interval_ms = interval.as_millis() as u64, "Auto-refresh enabled");
        Ok(())
    }

    /// Whether auto-refresh is on, and its interval
    pub fn auto_refresh(&self) -> (bool, Duration) {
        let auto = self.auto.lock();
        match auto.timer {
            Some(ref timer) => (true, timer.interval()),
            None => (false, auto.interval),
        }
    }

    pub fn auto_refresh_status(&self) -> AutoRefreshStatus {
        let (enabled, interval) = self.auto_refresh();
        AutoRefreshStatus {
            enabled,
            interval_ms: interval.as_millis() as u64,
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Registry
    // ─────────────────────────────────────────────────────────────

    /// Register a peer; returns its generated id
    pub fn add_peer(
        &self,
        address: &str,
        fallback_name: &str,
        fallback_domain: &str,
    ) -> Result<String> {
        let descriptor = PeerDescriptor::new(address, fallback_name, fallback_domain);
        let added = self.registry.add(descriptor).map_err(Error::from)?;
        Ok(added.id)
    }

    /// Remove a peer; `false` if unknown or protected
    pub fn remove_peer(&self, id: &str) -> bool {
        self.registry.remove(id)
    }

    /// Registered peers in registry order
    pub fn peers(&self) -> Vec<PeerDescriptor> {
        self.registry.list()
    }

    pub fn peer_count(&self) -> usize {
        self.registry.len()
    }

    pub fn has_peers(&self) -> bool {
        !self.registry.is_empty()
    }

    /// Whether a round is running right now
    pub fn round_in_flight(&self) -> bool {
        self.scheduler.is_running()
    }

    // ─────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────

    /// Stop auto-refresh and wait for the timer task to exit
    pub async fn shutdown(&self) {
        let timer = self.auto.lock().timer.take();
        if let Some(timer) = timer {
            timer.stop().await;
        }
    }
}
