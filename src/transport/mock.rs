//! Scripted transport for testing
//!
//! Each address maps to a `MockPeer` describing how it answers. Unknown
//! addresses behave like a refused connection.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::protocol::{ExchangeEntry, HealthReport, TaskEntry};

use super::{PeerTransport, TransportError, TransportResult};

/// How a scripted peer responds
#[derive(Debug, Clone, Default)]
pub struct MockPeer {
    /// Health body; `None` answers with a request error
    pub health: Option<HealthReport>,

    /// History entries; `None` answers with status 500
    pub history: Option<Vec<ExchangeEntry>>,

    /// Task entries; `None` answers with an RPC error
    pub tasks: Option<Vec<TaskEntry>>,

    /// Delay before every answer
    pub delay: Duration,
}

impl MockPeer {
    /// A healthy peer reporting `agent_id` with empty history
    pub fn healthy(agent_id: &str) -> Self {
        Self {
            health: Some(HealthReport {
                status: Some("healthy".into()),
                agent_id: Some(agent_id.into()),
                ..Default::default()
            }),
            history: Some(Vec::new()),
            tasks: Some(Vec::new()),
            delay: Duration::ZERO,
        }
    }

    /// A peer that refuses every call
    pub fn down() -> Self {
        Self::default()
    }

    pub fn with_history(mut self, history: Vec<ExchangeEntry>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn with_tasks(mut self, tasks: Vec<TaskEntry>) -> Self {
        self.tasks = Some(tasks);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// In-memory transport with call counters
#[derive(Default)]
pub struct MockTransport {
    peers: RwLock<HashMap<String, MockPeer>>,
    health_calls: AtomicUsize,
    history_calls: AtomicUsize,
    task_calls: AtomicUsize,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script (or re-script) the peer at `address`
    pub fn set_peer(&self, address: &str, peer: MockPeer) {
        self.peers.write().insert(address.to_string(), peer);
    }

    /// Edit the script of an existing peer
    pub fn update_peer(&self, address: &str, f: impl FnOnce(&mut MockPeer)) {
        if let Some(peer) = self.peers.write().get_mut(address) {
            f(peer);
        }
    }

    pub fn health_calls(&self) -> usize {
        self.health_calls.load(Ordering::SeqCst)
    }

    pub fn history_calls(&self) -> usize {
        self.history_calls.load(Ordering::SeqCst)
    }

    pub fn task_calls(&self) -> usize {
        self.task_calls.load(Ordering::SeqCst)
    }

    async fn script(&self, address: &str) -> TransportResult<MockPeer> {
        let peer = self.peers.read().get(address).cloned();
        match peer {
            Some(peer) => {
                if !peer.delay.is_zero() {
                    tokio::time::sleep(peer.delay).await;
                }
                Ok(peer)
            }
            None => Err(TransportError::Request("connection refused".into())),
        }
    }
}

#[async_trait]
impl PeerTransport for MockTransport {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn health(&self, address: &str) -> TransportResult<HealthReport> {
        self.health_calls.fetch_add(1, Ordering::SeqCst);
        self.script(address)
            .await?
            .health
            .ok_or_else(|| TransportError::Request("connection refused".into()))
    }

    async fn exchange_history(
        &self,
        address: &str,
        limit: usize,
    ) -> TransportResult<Vec<ExchangeEntry>> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        let mut history = self
            .script(address)
            .await?
            .history
            .ok_or(TransportError::Status(500))?;
        history.truncate(limit);
        Ok(history)
    }

    async fn list_tasks(&self, address: &str, limit: usize) -> TransportResult<Vec<TaskEntry>> {
        self.task_calls.fetch_add(1, Ordering::SeqCst);
        let mut tasks = self.script(address).await?.tasks.ok_or(TransportError::Rpc {
            code: -32601,
            message: "Method not found".into(),
        })?;
        tasks.truncate(limit);
        Ok(tasks)
    }
}

/// Exchange entry sent by `sender` to `receiver`
pub fn exchange(request_id: &str, sender: &str, receiver: &str, confidence: f64) -> ExchangeEntry {
    ExchangeEntry {
        request_id: Some(request_id.into()),
        sender_agent_id: Some(sender.into()),
        receiver_agent_id: Some(receiver.into()),
        domain: None,
        query: Some(format!("query {}", request_id)),
        confidence: Some(confidence),
        timestamp: None,
    }
}
