//! JSON-RPC 2.0 envelope for the task registry
//!
//! Only `tasks/list` is used. Task entries follow the A2A shape:
//! `{id, status: {state, timestamp}, history: [{role, parts: [{text}]}]}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::lenient::{list_or_empty, opt_string};

/// Method name for listing tasks
pub const TASKS_LIST_METHOD: &str = "tasks/list";

// ─────────────────────────────────────────────────────────────────
// Envelope
// ─────────────────────────────────────────────────────────────────

/// Outgoing JSON-RPC request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    pub params: Value,
    pub id: String,
}

impl JsonRpcRequest {
    /// Build a request with a fresh id
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            method: method.into(),
            params,
            id: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// `tasks/list` with a limit
    pub fn list_tasks(limit: usize) -> Self {
        Self::new(TASKS_LIST_METHOD, serde_json::json!({ "limit": limit }))
    }
}

/// Incoming JSON-RPC response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub result: Option<Value>,

    #[serde(default)]
    pub error: Option<JsonRpcError>,
}

/// Error object of a failed call
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JsonRpcError {
    #[serde(default)]
    pub code: i64,

    #[serde(default, deserialize_with = "opt_string")]
    pub message: Option<String>,
}

// ─────────────────────────────────────────────────────────────────
// Task Entries
// ─────────────────────────────────────────────────────────────────

/// One task as reported by the registry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskEntry {
    #[serde(default, deserialize_with = "opt_string")]
    pub id: Option<String>,

    #[serde(default)]
    pub status: Option<TaskStatusEntry>,

    /// Raw history messages, decoded one at a time
    #[serde(default, deserialize_with = "list_or_empty")]
    pub history: Vec<Value>,
}

/// `status` object of a task
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskStatusEntry {
    #[serde(default, deserialize_with = "opt_string")]
    pub state: Option<String>,

    #[serde(default)]
    pub timestamp: Option<Value>,
}

/// One history message
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageEntry {
    #[serde(default, deserialize_with = "opt_string")]
    pub role: Option<String>,

    #[serde(default, deserialize_with = "list_or_empty")]
    pub parts: Vec<Value>,
}

impl MessageEntry {
    /// Text parts joined by a single space
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| part.get("text").and_then(Value::as_str))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// `result` of `tasks/list`, either wrapped or a bare list
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TaskListPayload {
    Wrapped {
        #[serde(default, deserialize_with = "list_or_empty")]
        tasks: Vec<Value>,
    },
    Bare(Vec<Value>),
}

impl TaskListPayload {
    /// Decode the entries that are objects, dropping the rest
    pub fn into_entries(self) -> Vec<TaskEntry> {
        let raw = match self {
            TaskListPayload::Wrapped { tasks } => tasks,
            TaskListPayload::Bare(list) => list,
        };
        raw.into_iter()
            .filter(Value::is_object)
            .filter_map(|v| serde_json::from_value(v).ok())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_tasks_request() {
        let req = JsonRpcRequest::list_tasks(10);
        let json = serde_json::to_value(&req).unwrap();

        assert_eq!(json["jsonrpc"], "2.0");
        assert_eq!(json["method"], "tasks/list");
        assert_eq!(json["params"]["limit"], 10);
        assert!(!req.id.is_empty());
    }

    #[test]
    fn test_response_with_error() {
        let resp: JsonRpcResponse = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": "1",
            "error": {"code": -32601, "message": "Method not found"}
        }))
        .unwrap();

        assert!(resp.result.is_none());
        let err = resp.error.unwrap();
        assert_eq!(err.code, -32601);
        assert_eq!(err.message.as_deref(), Some("Method not found"));
    }

    #[test]
    fn test_task_list_payload() {
        let payload: TaskListPayload = serde_json::from_value(json!({
            "tasks": [{
                "id": "t1",
                "contextId": "c1",
                "status": {"state": "TASK_STATE_WORKING", "timestamp": 1700000000.0},
                "history": [{"role": "ROLE_USER", "parts": [{"text": "hello"}]}]
            }, "junk"]
        }))
        .unwrap();
        let entries = payload.into_entries();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id.as_deref(), Some("t1"));
        let status = entries[0].status.as_ref().unwrap();
        assert_eq!(status.state.as_deref(), Some("TASK_STATE_WORKING"));
    }

    #[test]
    fn test_message_text_joins_parts() {
        let msg: MessageEntry = serde_json::from_value(json!({
            "role": "ROLE_AGENT",
            "parts": [{"text": "first"}, {"data": 1}, {"text": " second "}]
        }))
        .unwrap();

        assert_eq!(msg.text(), "first second");
    }

    #[test]
    fn test_null_lists_are_empty() {
        let payload: TaskListPayload = serde_json::from_value(json!({
            "tasks": [{"id": "t1", "status": {"state": "TASK_STATE_COMPLETED"}, "history": null}]
        }))
        .unwrap();
        let entries = payload.into_entries();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].history.is_empty());

        let msg: MessageEntry =
            serde_json::from_value(json!({"role": "ROLE_USER", "parts": null})).unwrap();
        assert_eq!(msg.text(), "");

        let payload: TaskListPayload = serde_json::from_value(json!({"tasks": null})).unwrap();
        assert!(payload.into_entries().is_empty());
    }
}
