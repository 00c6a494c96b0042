//! Peer identity and per-round status
//!
//! A `PeerDescriptor` is local configuration; a `PeerStatus` is what a
//! single round learned about that peer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────
// Peer Descriptor
// ─────────────────────────────────────────────────────────────────

/// Configured peer, owned by the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerDescriptor {
    /// Local identifier, unique within a registry
    pub id: String,

    /// Base URL of the peer (e.g. `http://localhost:8001`)
    pub address: String,

    /// Name used when the peer cannot report its own
    pub fallback_name: String,

    /// Domain used when the peer cannot report its own
    pub fallback_domain: String,
}

impl PeerDescriptor {
    /// Create a descriptor with a generated id
    pub fn new(
        address: impl Into<String>,
        fallback_name: impl Into<String>,
        fallback_domain: impl Into<String>,
    ) -> Self {
        Self {
            id: generate_peer_id(),
            address: address.into(),
            fallback_name: fallback_name.into(),
            fallback_domain: fallback_domain.into(),
        }
    }

    /// Replace the generated id with an explicit one
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}

/// Generate a short random peer id
pub fn generate_peer_id() -> String {
    format!("peer-{}", &uuid::Uuid::new_v4().simple().to_string()[..8])
}

// ─────────────────────────────────────────────────────────────────
// Peer Status
// ─────────────────────────────────────────────────────────────────

/// Liveness and self-reported identity of a peer for one round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerStatus {
    /// Registry id of the peer
    pub peer_id: String,

    /// Id the peer reports for itself (registry id when unknown)
    pub reported_id: String,

    /// Display name
    pub name: String,

    /// Knowledge domain
    pub domain: String,

    /// Whether the health probe succeeded this round
    pub reachable: bool,

    /// Time of the successful probe, if any
    pub last_seen: Option<DateTime<Utc>>,
}

impl PeerStatus {
    /// Status for a peer that could not be probed
    pub fn unreachable(descriptor: &PeerDescriptor) -> Self {
        Self {
            peer_id: descriptor.id.clone(),
            reported_id: descriptor.id.clone(),
            name: descriptor.fallback_name.clone(),
            domain: descriptor.fallback_domain.clone(),
            reachable: false,
            last_seen: None,
        }
    }

    /// Whether an agent id found in exchange records refers to this peer
    pub fn answers_to(&self, agent_id: &str) -> bool {
        agent_id == self.peer_id || agent_id == self.reported_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique() {
        let a = PeerDescriptor::new("http://a:1", "A", "x");
        let b = PeerDescriptor::new("http://b:1", "B", "x");
        assert!(a.id.starts_with("peer-"));
        assert_eq!(a.id.len(), "peer-".len() + 8);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_unreachable_uses_fallbacks() {
        let peer = PeerDescriptor::new("http://localhost:8002", "Gamma", "analytics").with_id("gamma");
        let status = PeerStatus::unreachable(&peer);

        assert!(!status.reachable);
        assert_eq!(status.reported_id, "gamma");
        assert_eq!(status.name, "Gamma");
        assert_eq!(status.domain, "analytics");
        assert!(status.last_seen.is_none());
    }

    #[test]
    fn test_answers_to_both_ids() {
        let status = PeerStatus {
            peer_id: "alpha".into(),
            reported_id: "dkmes-alpha".into(),
            name: "Alpha".into(),
            domain: "km".into(),
            reachable: true,
            last_seen: Some(Utc::now()),
        };
        assert!(status.answers_to("alpha"));
        assert!(status.answers_to("dkmes-alpha"));
        assert!(!status.answers_to("beta"));
    }
}
