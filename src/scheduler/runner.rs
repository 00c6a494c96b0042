//! Round scheduler
//!
//! Owns the current snapshot and makes sure at most one round runs at a
//! time. Rounds run on their own task, so a caller that stops waiting
//! never aborts one half way.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::debug;

use crate::peer::PeerRegistry;
use crate::transport::PeerTransport;
use crate::types::Snapshot;

use super::{run_round, RoundSettings};

/// Outcome of asking for a round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundTicket {
    /// A new round with this number was started
    Started(u64),

    /// A round with this number was already running
    Coalesced(u64),
}

impl RoundTicket {
    pub fn round(&self) -> u64 {
        match self {
            RoundTicket::Started(round) | RoundTicket::Coalesced(round) => *round,
        }
    }

    pub fn started(&self) -> bool {
        matches!(self, RoundTicket::Started(_))
    }
}

#[derive(Debug, Default)]
struct RoundState {
    running: Option<u64>,
    last_started: u64,
}

struct SchedulerInner {
    registry: Arc<PeerRegistry>,
    transport: Arc<dyn PeerTransport>,
    settings: RoundSettings,
    snapshot_tx: watch::Sender<Arc<Snapshot>>,
    state: Mutex<RoundState>,
}

impl SchedulerInner {
    async fn execute(self: Arc<Self>, round: u64) {
        // Composition is fixed at round start
        let descriptors = self.registry.list();
        let snapshot = run_round(self.transport.as_ref(), &descriptors, &self.settings, round).await;

        let published = self.publish(snapshot);
        if !published {
            debug!(round, "Discarding stale round");
        }

        let mut state = self.state.lock();
        if state.running == Some(round) {
            state.running = None;
        }
    }

    /// Replace the current snapshot if `snapshot` is newer
    fn publish(&self, snapshot: Snapshot) -> bool {
        let mut candidate = Some(snapshot);
        self.snapshot_tx.send_if_modified(|current| match candidate.take() {
            Some(next) if next.round > current.round => {
                *current = Arc::new(next);
                true
            }
            _ => false,
        })
    }
}

/// Schedules aggregation rounds and publishes their snapshots
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<SchedulerInner>,
}

impl Scheduler {
    /// Create a scheduler publishing the initial snapshot
    pub fn new(
        registry: Arc<PeerRegistry>,
        transport: Arc<dyn PeerTransport>,
        settings: RoundSettings,
    ) -> Self {
        let (snapshot_tx, _) = watch::channel(Arc::new(Snapshot::initial()));

        Self {
            inner: Arc::new(SchedulerInner {
                registry,
                transport,
                settings,
                snapshot_tx,
                state: Mutex::new(RoundState::default()),
            }),
        }
    }

    /// Start a round unless one is already running
    ///
    /// Must be called within a Tokio runtime.
    pub fn request_round(&self) -> RoundTicket {
        let mut state = self.inner.state.lock();
        if let Some(running) = state.running {
            debug!(round = running, "Round in flight, coalescing request");
            return RoundTicket::Coalesced(running);
        }

        state.last_started += 1;
        let round = state.last_started;
        state.running = Some(round);
        drop(state);

        debug!(round, transport = self.inner.transport.name(), "Starting round");
        tokio::spawn(self.inner.clone().execute(round));
        RoundTicket::Started(round)
    }

    /// Start a round if none is running; `false` when coalesced
    pub fn trigger(&self) -> bool {
        self.request_round().started()
    }

    /// Wait for the running round, or a new one, and return its snapshot
    pub async fn refresh_now(&self) -> Arc<Snapshot> {
        let mut rx = self.subscribe();
        let target = self.request_round().round();

        let snapshot = match rx.wait_for(|snapshot| snapshot.round >= target).await {
            Ok(snapshot) => Arc::clone(&snapshot),
            Err(_) => self.current(),
        };
        snapshot
    }

    /// The latest published snapshot
    pub fn current(&self) -> Arc<Snapshot> {
        self.inner.snapshot_tx.borrow().clone()
    }

    /// Receiver notified on every publication
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.inner.snapshot_tx.subscribe()
    }

    /// Whether a round is currently running
    pub fn is_running(&self) -> bool {
        self.inner.state.lock().running.is_some()
    }

    /// Number of rounds started so far
    #[cfg(test)]
    pub fn rounds_started(&self) -> u64 {
        self.inner.state.lock().last_started
    }

    #[cfg(test)]
    pub fn registry(&self) -> &Arc<PeerRegistry> {
        &self.inner.registry
    }
}
