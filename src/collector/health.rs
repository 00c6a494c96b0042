//! Health probe

use std::time::Duration;

use chrono::Utc;
use tracing::debug;

use crate::protocol::HealthReport;
use crate::transport::{PeerTransport, TransportError};
use crate::types::{PeerDescriptor, PeerStatus};

use super::bounded;

/// Result of probing one peer
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    /// Peer answered with a usable health report
    Reachable(PeerStatus),

    /// Probe failed; status carries the descriptor fallbacks
    Unreachable {
        status: PeerStatus,
        reason: TransportError,
    },
}

impl ProbeOutcome {
    pub fn into_status(self) -> PeerStatus {
        match self {
            ProbeOutcome::Reachable(status) => status,
            ProbeOutcome::Unreachable { status, .. } => status,
        }
    }
}

/// Probe one peer's `/health`
pub async fn probe_peer(
    transport: &dyn PeerTransport,
    descriptor: &PeerDescriptor,
    timeout: Duration,
) -> ProbeOutcome {
    match bounded(timeout, transport.health(&descriptor.address)).await {
        Ok(report) => {
            let status = reachable_status(descriptor, report);
            debug!(peer = %descriptor.id, reported_id = %status.reported_id, "Peer reachable");
            ProbeOutcome::Reachable(status)
        }
        Err(reason) => {
            debug!(peer = %descriptor.id, address = %descriptor.address, error = %reason, "Peer unreachable");
            ProbeOutcome::Unreachable {
                status: PeerStatus::unreachable(descriptor),
                reason,
            }
        }
    }
}

fn reachable_status(descriptor: &PeerDescriptor, report: HealthReport) -> PeerStatus {
    PeerStatus {
        peer_id: descriptor.id.clone(),
        reported_id: report.agent_id.unwrap_or_else(|| descriptor.id.clone()),
        name: report
            .agent_name
            .unwrap_or_else(|| descriptor.fallback_name.clone()),
        domain: report
            .domain
            .unwrap_or_else(|| descriptor.fallback_domain.clone()),
        reachable: true,
        last_seen: Some(Utc::now()),
    }
}
