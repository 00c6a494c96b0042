//! Peer response documents
//!
//! Every field is optional. Missing or oddly typed values decode to
//! `None` instead of failing the whole document.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::lenient::{list_or_empty, opt_f64, opt_string};

// ─────────────────────────────────────────────────────────────────
// Health
// ─────────────────────────────────────────────────────────────────

/// Body of `GET /health`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    /// Self-reported status label (usually "healthy")
    #[serde(default, deserialize_with = "opt_string")]
    pub status: Option<String>,

    /// Peer's own agent id
    #[serde(default, deserialize_with = "opt_string")]
    pub agent_id: Option<String>,

    /// Display name
    #[serde(default, deserialize_with = "opt_string")]
    pub agent_name: Option<String>,

    /// Knowledge domain
    #[serde(default, deserialize_with = "opt_string")]
    pub domain: Option<String>,

    /// Peer clock at response time, any supported format
    #[serde(default)]
    pub timestamp: Option<Value>,
}

// ─────────────────────────────────────────────────────────────────
// Exchange History
// ─────────────────────────────────────────────────────────────────

/// One entry of `GET /api/v1/kep/history`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExchangeEntry {
    #[serde(default, deserialize_with = "opt_string")]
    pub request_id: Option<String>,

    #[serde(default, deserialize_with = "opt_string")]
    pub sender_agent_id: Option<String>,

    #[serde(default, deserialize_with = "opt_string")]
    pub receiver_agent_id: Option<String>,

    #[serde(default, deserialize_with = "opt_string")]
    pub domain: Option<String>,

    #[serde(default, deserialize_with = "opt_string")]
    pub query: Option<String>,

    #[serde(default, deserialize_with = "opt_f64")]
    pub confidence: Option<f64>,

    #[serde(default)]
    pub timestamp: Option<Value>,
}

/// History body, either wrapped or a bare list
///
/// Entries stay as raw values so one malformed entry is skipped
/// instead of rejecting the list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum HistoryPayload {
    Wrapped {
        #[serde(default, deserialize_with = "list_or_empty")]
        exchanges: Vec<Value>,
    },
    Bare(Vec<Value>),
}

impl HistoryPayload {
    /// Decode the entries that are objects, dropping the rest
    pub fn into_entries(self) -> Vec<ExchangeEntry> {
        let raw = match self {
            HistoryPayload::Wrapped { exchanges } => exchanges,
            HistoryPayload::Bare(list) => list,
        };
        raw.into_iter()
            .filter(Value::is_object)
            .filter_map(|v| serde_json::from_value(v).ok())
            .collect()
    }
}
