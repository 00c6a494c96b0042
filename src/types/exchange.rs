//! Exchange records
//!
//! One record is a knowledge request observed by a peer: who asked whom,
//! about what, and how confident the answer was.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Longest query summary kept per record (in characters)
pub const QUERY_SUMMARY_MAX_CHARS: usize = 160;

/// A single interaction observed by a peer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRecord {
    /// Request id assigned by the sender
    pub request_id: String,

    /// Agent id of the requesting side
    pub sender_id: String,

    /// Agent id of the answering side, when the peer records it
    pub receiver_id: Option<String>,

    /// Knowledge domain of the request
    pub domain: Option<String>,

    /// Truncated query text
    pub query_summary: String,

    /// Answer confidence, always within [0, 1]
    pub confidence: f64,

    /// When the exchange happened
    pub timestamp: Option<DateTime<Utc>>,
}

/// Clamp a reported confidence into [0, 1]; non-finite values become 0
pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Truncate a query to `QUERY_SUMMARY_MAX_CHARS` characters
pub fn summarize_query(query: &str) -> String {
    let trimmed = query.trim();
    if trimmed.chars().count() <= QUERY_SUMMARY_MAX_CHARS {
        return trimmed.to_string();
    }
    let mut summary: String = trimmed.chars().take(QUERY_SUMMARY_MAX_CHARS - 1).collect();
    summary.push('…');
    summary
}
