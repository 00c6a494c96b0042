//! Distributed task state as reported by the primary peer's task registry

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────
// Task State
// ─────────────────────────────────────────────────────────────────

/// Lifecycle state of a distributed task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Accepted, not started
    Submitted,
    /// Being processed
    Working,
    /// Finished successfully
    Completed,
    /// Finished with an error
    Failed,
    /// Label not in the mapping table
    Unknown,
}

impl TaskState {
    /// Map an external state label to a state
    ///
    /// Accepts `TASK_STATE_WORKING`, `working`, `Working` and so on.
    /// Anything unrecognised maps to `Unknown`.
    pub fn from_label(label: &str) -> Self {
        let normalized = label.trim().to_ascii_lowercase();
        let bare = normalized
            .strip_prefix("task_state_")
            .unwrap_or(&normalized);

        match bare {
            "submitted" => TaskState::Submitted,
            "working" => TaskState::Working,
            "completed" => TaskState::Completed,
            "failed" => TaskState::Failed,
            _ => TaskState::Unknown,
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskState::Submitted => write!(f, "submitted"),
            TaskState::Working => write!(f, "working"),
            TaskState::Completed => write!(f, "completed"),
            TaskState::Failed => write!(f, "failed"),
            TaskState::Unknown => write!(f, "unknown"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Task
// ─────────────────────────────────────────────────────────────────

/// One message in a task's history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStep {
    /// Author role (`user`, `agent`, ...)
    pub role: String,

    /// Text parts joined by a space
    pub text: String,
}

/// A distributed work item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Task id assigned by the registry
    pub id: String,

    /// Current state
    pub state: TaskState,

    /// Time of the last state change
    pub updated_at: Option<DateTime<Utc>>,

    /// Message history, oldest first
    pub history: Vec<TaskStep>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_mapping_table() {
        assert_eq!(TaskState::from_label("TASK_STATE_SUBMITTED"), TaskState::Submitted);
        assert_eq!(TaskState::from_label("TASK_STATE_WORKING"), TaskState::Working);
        assert_eq!(TaskState::from_label("TASK_STATE_COMPLETED"), TaskState::Completed);
        assert_eq!(TaskState::from_label("TASK_STATE_FAILED"), TaskState::Failed);
        assert_eq!(TaskState::from_label("working"), TaskState::Working);
        assert_eq!(TaskState::from_label(" Completed "), TaskState::Completed);
    }

    #[test]
    fn test_unrecognized_labels_are_unknown() {
        assert_eq!(TaskState::from_label("TASK_STATE_CANCELLED"), TaskState::Unknown);
        assert_eq!(TaskState::from_label("TASK_STATE_UNSPECIFIED"), TaskState::Unknown);
        assert_eq!(TaskState::from_label(""), TaskState::Unknown);
        assert_eq!(TaskState::from_label("exploded"), TaskState::Unknown);
    }

    #[test]
    fn test_state_serialization() {
        let json = serde_json::to_string(&TaskState::Working).unwrap();
        assert_eq!(json, "\"working\"");
        assert_eq!(TaskState::Failed.to_string(), "failed");
    }
}
