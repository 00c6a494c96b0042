//! Exchange history collector

use std::time::Duration;

use tracing::{debug, trace};

use crate::protocol::{parse_timestamp, ExchangeEntry};
use crate::transport::PeerTransport;
use crate::types::{clamp_confidence, summarize_query, ExchangeRecord, PeerDescriptor};

use super::bounded;

/// Fetch a peer's most recent exchanges
///
/// Returns at most `limit` records, newest first with undated records
/// last. Any failure yields an empty window.
pub async fn collect_history(
    transport: &dyn PeerTransport,
    descriptor: &PeerDescriptor,
    limit: usize,
    timeout: Duration,
) -> Vec<ExchangeRecord> {
    let entries = match bounded(timeout, transport.exchange_history(&descriptor.address, limit)).await
    {
        Ok(entries) => entries,
        Err(e) => {
            debug!(peer = %descriptor.id, error = %e, "History unavailable");
            return Vec::new();
        }
    };

    let received = entries.len();
    let window = history_window(entries, limit);
    trace!(peer = %descriptor.id, received, kept = window.len(), "History collected");
    window
}

/// Coerce, order and bound a batch of raw entries
pub fn history_window(entries: Vec<ExchangeEntry>, limit: usize) -> Vec<ExchangeRecord> {
    let mut records: Vec<ExchangeRecord> = entries.into_iter().filter_map(exchange_record).collect();

    // Stable, so undated records keep the peer's order
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    records.truncate(limit);
    records
}

/// Coerce one entry; entries without a request id or sender are dropped
pub fn exchange_record(entry: ExchangeEntry) -> Option<ExchangeRecord> {
    Some(ExchangeRecord {
        request_id: entry.request_id?,
        sender_id: entry.sender_agent_id?,
        receiver_id: entry.receiver_agent_id,
        domain: entry.domain,
        query_summary: entry.query.as_deref().map(summarize_query).unwrap_or_default(),
        confidence: clamp_confidence(entry.confidence.unwrap_or(0.0)),
        timestamp: entry.timestamp.as_ref().and_then(parse_timestamp),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{exchange, MockPeer, MockTransport};
    use serde_json::json;

    const TIMEOUT: Duration = Duration::from_millis(200);

    fn descriptor() -> PeerDescriptor {
        PeerDescriptor::new("http://alpha", "Alpha", "knowledge-management").with_id("alpha")
    }

    fn dated(request_id: &str, ts: &str) -> ExchangeEntry {
        ExchangeEntry {
            timestamp: Some(json!(ts)),
            ..exchange(request_id, "dkmes-alpha", "agent-beta-aiml", 0.5)
        }
    }

    #[test]
    fn test_entries_without_identity_are_dropped() {
        let entries = vec![
            ExchangeEntry {
                request_id: None,
                ..exchange("r0", "a", "b", 0.5)
            },
            ExchangeEntry {
                sender_agent_id: None,
                ..exchange("r1", "a", "b", 0.5)
            },
            exchange("r2", "a", "b", 0.5),
        ];

        let window = history_window(entries, 10);
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].request_id, "r2");
    }

    #[test]
    fn test_confidence_is_clamped() {
        let entries = vec![
            exchange("hi", "a", "b", 3.0),
            exchange("lo", "a", "b", -0.2),
            exchange("nan", "a", "b", f64::NAN),
            ExchangeEntry {
                confidence: None,
                ..exchange("none", "a", "b", 0.0)
            },
        ];

        for record in history_window(entries, 10) {
            assert!((0.0..=1.0).contains(&record.confidence));
            if record.request_id == "hi" {
                assert_eq!(record.confidence, 1.0);
            } else {
                assert_eq!(record.confidence, 0.0);
            }
        }
    }

    #[test]
    fn test_window_is_newest_first_and_bounded() {
        let entries = vec![
            exchange("undated", "a", "b", 0.5),
            dated("old", "2025-01-01T00:00:00"),
            dated("new", "2025-03-01T00:00:00Z"),
            dated("mid", "2025-02-01 12:00:00"),
        ];

        let ids: Vec<_> = history_window(entries.clone(), 10)
            .into_iter()
            .map(|r| r.request_id)
            .collect();
        assert_eq!(ids, vec!["new", "mid", "old", "undated"]);

        let ids: Vec<_> = history_window(entries, 2)
            .into_iter()
            .map(|r| r.request_id)
            .collect();
        assert_eq!(ids, vec!["new", "mid"]);
    }

    #[test]
    fn test_long_query_is_summarized() {
        let entry = ExchangeEntry {
            query: Some("x".repeat(500)),
            ..exchange("r1", "a", "b", 0.5)
        };

        let record = exchange_record(entry).unwrap();
        assert_eq!(record.query_summary.chars().count(), 160);
    }

    #[tokio::test]
    async fn test_failure_yields_empty_window() {
        let transport = MockTransport::new();
        transport.set_peer(
            "http://alpha",
            MockPeer {
                history: None,
                ..MockPeer::healthy("dkmes-alpha")
            },
        );

        let window = collect_history(&transport, &descriptor(), 20, TIMEOUT).await;
        assert!(window.is_empty());
    }

    #[tokio::test]
    async fn test_timeout_yields_empty_window() {
        let transport = MockTransport::new();
        transport.set_peer(
            "http://alpha",
            MockPeer::healthy("dkmes-alpha")
                .with_history(vec![exchange("r1", "a", "b", 0.5)])
                .with_delay(Duration::from_secs(2)),
        );

        let window = collect_history(&transport, &descriptor(), 20, TIMEOUT).await;
        assert!(window.is_empty());
    }

    #[tokio::test]
    async fn test_collects_records() {
        let transport = MockTransport::new();
        transport.set_peer(
            "http://alpha",
            MockPeer::healthy("dkmes-alpha").with_history(vec![
                exchange("r1", "dkmes-alpha", "agent-beta-aiml", 0.82),
                exchange("r2", "dkmes-alpha", "agent-gamma-analytics", 0.4),
            ]),
        );

        let window = collect_history(&transport, &descriptor(), 20, TIMEOUT).await;
        assert_eq!(window.len(), 2);
        assert_eq!(window[0].confidence, 0.82);
        assert_eq!(window[0].receiver_id.as_deref(), Some("agent-beta-aiml"));
    }
}
