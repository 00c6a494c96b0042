//! One aggregation round
//!
//! Fans out a health probe and history fetch per peer plus a single task
//! registry call, joins them, and assembles the snapshot in one step.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures_util::future::join_all;
use tracing::{debug, info};

use crate::collector::{collect_history, collect_tasks, probe_peer, ProbeOutcome};
use crate::peer::build_edges;
use crate::transport::PeerTransport;
use crate::types::{PeerDescriptor, Snapshot};

// ─────────────────────────────────────────────────────────────────
// Round Settings
// ─────────────────────────────────────────────────────────────────

/// Deadlines and limits applied to every round
#[derive(Debug, Clone)]
pub struct RoundSettings {
    /// Deadline of each health probe
    pub probe_timeout: Duration,

    /// Deadline of each history fetch
    pub history_timeout: Duration,

    /// Deadline of the task registry call
    pub task_timeout: Duration,

    /// Exchange records kept per peer
    pub history_limit: usize,

    /// Tasks requested from the primary
    pub task_limit: usize,

    /// Peer hosting the task registry; `None` uses the first peer
    pub primary_peer: Option<String>,
}

impl Default for RoundSettings {
    fn default() -> Self {
        Self {
            probe_timeout: Duration::from_secs(3),
            history_timeout: Duration::from_secs(3),
            task_timeout: Duration::from_secs(5),
            history_limit: 20,
            task_limit: 50,
            primary_peer: None,
        }
    }
}

/// Pick the task registry host among the captured descriptors
pub fn select_primary<'a>(
    descriptors: &'a [PeerDescriptor],
    primary_peer: Option<&str>,
) -> Option<&'a PeerDescriptor> {
    match primary_peer {
        Some(id) => descriptors.iter().find(|d| d.id == id),
        None => descriptors.first(),
    }
}

// ─────────────────────────────────────────────────────────────────
// Round Execution
// ─────────────────────────────────────────────────────────────────

/// Run one round over `descriptors` and build its snapshot
///
/// Every call runs under its own deadline, so the round finishes within
/// the largest configured timeout plus scheduling overhead.
pub async fn run_round(
    transport: &dyn PeerTransport,
    descriptors: &[PeerDescriptor],
    settings: &RoundSettings,
    round: u64,
) -> Snapshot {
    let started = Instant::now();
    let primary = select_primary(descriptors, settings.primary_peer.as_deref());

    let per_peer = join_all(descriptors.iter().map(|descriptor| async move {
        tokio::join!(
            probe_peer(transport, descriptor, settings.probe_timeout),
            collect_history(
                transport,
                descriptor,
                settings.history_limit,
                settings.history_timeout,
            ),
        )
    }));
    let tasks = collect_tasks(
        transport,
        primary,
        settings.task_limit,
        settings.task_timeout,
    );

    let (per_peer, tasks) = tokio::join!(per_peer, tasks);

    let mut peers = Vec::with_capacity(per_peer.len());
    let mut exchanges_by_peer = BTreeMap::new();
    for (outcome, window) in per_peer {
        if let ProbeOutcome::Unreachable { status, reason } = &outcome {
            debug!(round, peer = %status.peer_id, error = %reason, "Peer offline this round");
        }
        let status = outcome.into_status();
        exchanges_by_peer.insert(status.peer_id.clone(), window);
        peers.push(status);
    }
    let edges = build_edges(&peers, &exchanges_by_peer);

    let snapshot = Snapshot {
        round,
        peers,
        exchanges_by_peer,
        tasks,
        edges,
        generated_at: Utc::now(),
    };

    info!(
        round,
        peers = snapshot.peers.len(),
        reachable = snapshot.reachable_count(),
        edges = snapshot.edges.len(),
        active_edges = snapshot.active_edge_count(),
        tasks = snapshot.tasks.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Round complete"
    );

    snapshot
}
