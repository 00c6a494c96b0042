//! Transport trait definitions

use async_trait::async_trait;
use thiserror::Error;

use crate::protocol::{ExchangeEntry, HealthReport, TaskEntry};

/// Failure of a single peer call
///
/// Never leaves the collectors; each variant is logged and replaced by a
/// default value.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("timed out after {0} ms")]
    Timeout(u64),

    #[error("request failed: {0}")]
    Request(String),

    #[error("peer returned status {0}")]
    Status(u16),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
}

/// Result type for transport calls
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Calls an aggregation round makes against a peer
///
/// Implementations do not enforce deadlines; the collectors wrap every
/// call in its own timeout.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    /// Transport name for logs
    fn name(&self) -> &'static str;

    /// `GET {address}/health`
    async fn health(&self, address: &str) -> TransportResult<HealthReport>;

    /// `GET {address}/api/v1/kep/history?limit={limit}`
    async fn exchange_history(
        &self,
        address: &str,
        limit: usize,
    ) -> TransportResult<Vec<ExchangeEntry>>;

    /// JSON-RPC `tasks/list` against `{address}/a2a`
    async fn list_tasks(&self, address: &str, limit: usize) -> TransportResult<Vec<TaskEntry>>;
}
