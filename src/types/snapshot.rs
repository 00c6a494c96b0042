//! The published fleet view
//!
//! A `Snapshot` is built once per round and never modified after it is
//! published. Consumers hold it behind an `Arc`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ExchangeRecord, PeerStatus, Task};

/// Pairwise relation between two reachable peers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    /// Peer earlier in registry order
    pub peer_a: String,

    /// Peer later in registry order
    pub peer_b: String,

    /// Whether an exchange between the two was seen this round
    pub active: bool,
}

impl Edge {
    /// Whether this edge touches `peer_id`
    #[cfg(test)]
    pub fn touches(&self, peer_id: &str) -> bool {
        self.peer_a == peer_id || self.peer_b == peer_id
    }
}

/// Result of one aggregation round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Round number (0 = nothing aggregated yet)
    pub round: u64,

    /// One status per configured peer, in registry order
    pub peers: Vec<PeerStatus>,

    /// Exchange window per peer id
    pub exchanges_by_peer: BTreeMap<String, Vec<ExchangeRecord>>,

    /// Tasks reported by the primary peer
    pub tasks: Vec<Task>,

    /// Mesh edges between reachable peers
    pub edges: Vec<Edge>,

    /// When the round finished
    pub generated_at: DateTime<Utc>,
}

impl Snapshot {
    /// Placeholder published before the first round completes
    pub fn initial() -> Self {
        Self {
            round: 0,
            peers: Vec::new(),
            exchanges_by_peer: BTreeMap::new(),
            tasks: Vec::new(),
            edges: Vec::new(),
            generated_at: Utc::now(),
        }
    }

    /// Whether this is the pre-first-round placeholder
    pub fn is_initial(&self) -> bool {
        self.round == 0
    }

    /// Look up a peer's status
    #[cfg(test)]
    pub fn peer(&self, peer_id: &str) -> Option<&PeerStatus> {
        self.peers.iter().find(|p| p.peer_id == peer_id)
    }

    /// Number of reachable peers
    pub fn reachable_count(&self) -> usize {
        self.peers.iter().filter(|p| p.reachable).count()
    }

    /// Number of edges with observed activity
    pub fn active_edge_count(&self) -> usize {
        self.edges.iter().filter(|e| e.active).count()
    }

    /// Find the edge between two peers, in either order
    #[cfg(test)]
    pub fn edge(&self, a: &str, b: &str) -> Option<&Edge> {
        self.edges
            .iter()
            .find(|e| (e.peer_a == a && e.peer_b == b) || (e.peer_a == b && e.peer_b == a))
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::initial()
    }
}
