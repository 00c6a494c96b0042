//! Mesh topology derived from a round's results
//!
//! - Edges between every pair of reachable peers
//! - An edge is active when either side's exchange window names the other
//! - Deterministic circular layout for rendering

use std::collections::BTreeMap;
use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::types::{Edge, ExchangeRecord, PeerStatus, Snapshot};

// ─────────────────────────────────────────────────────────────────
// Edges
// ─────────────────────────────────────────────────────────────────

/// Build the edge set for one round
///
/// One edge per unordered pair of reachable peers, `peer_a` earlier in
/// `peers` than `peer_b`.
pub fn build_edges(
    peers: &[PeerStatus],
    exchanges_by_peer: &BTreeMap<String, Vec<ExchangeRecord>>,
) -> Vec<Edge> {
    let reachable: Vec<&PeerStatus> = peers.iter().filter(|p| p.reachable).collect();
    let mut edges = Vec::new();

    for (i, a) in reachable.iter().enumerate() {
        for b in &reachable[i + 1..] {
            let active = window_names(exchanges_by_peer.get(&a.peer_id), b)
                || window_names(exchanges_by_peer.get(&b.peer_id), a);

            edges.push(Edge {
                peer_a: a.peer_id.clone(),
                peer_b: b.peer_id.clone(),
                active,
            });
        }
    }

    edges
}

/// Whether any record in `window` has `peer` as sender or receiver
fn window_names(window: Option<&Vec<ExchangeRecord>>, peer: &PeerStatus) -> bool {
    window.map_or(false, |records| {
        records.iter().any(|r| {
            peer.answers_to(&r.sender_id) || r.receiver_id.as_deref().map_or(false, |id| peer.answers_to(id))
        })
    })
}

// ─────────────────────────────────────────────────────────────────
// Layout
// ─────────────────────────────────────────────────────────────────

/// Position of a peer on the unit circle (y axis pointing up)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodePosition {
    pub peer_id: String,
    pub x: f64,
    pub y: f64,
}

/// Place peers on the unit circle, clockwise from 12 o'clock
///
/// Reachability does not affect placement, so nodes stay put as peers
/// come and go. A lone peer sits at the centre.
pub fn circular_layout(peers: &[PeerStatus]) -> Vec<NodePosition> {
    let n = peers.len();
    if n == 1 {
        return vec![NodePosition {
            peer_id: peers[0].peer_id.clone(),
            x: 0.0,
            y: 0.0,
        }];
    }

    peers
        .iter()
        .enumerate()
        .map(|(i, peer)| {
            let angle = 2.0 * PI * i as f64 / n as f64;
            NodePosition {
                peer_id: peer.peer_id.clone(),
                x: angle.sin(),
                y: angle.cos(),
            }
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────
// Topology View
// ─────────────────────────────────────────────────────────────────

/// Node of the topology view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologyNode {
    #[serde(flatten)]
    pub position: NodePosition,
    pub name: String,
    pub domain: String,
    pub reachable: bool,
}

/// Nodes with positions plus the edges of one snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topology {
    pub round: u64,
    pub nodes: Vec<TopologyNode>,
    pub edges: Vec<Edge>,
}

impl Topology {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let nodes = circular_layout(&snapshot.peers)
            .into_iter()
            .zip(&snapshot.peers)
            .map(|(position, peer)| TopologyNode {
                position,
                name: peer.name.clone(),
                domain: peer.domain.clone(),
                reachable: peer.reachable,
            })
            .collect();

        Self {
            round: snapshot.round,
            nodes,
            edges: snapshot.edges.clone(),
        }
    }
}
