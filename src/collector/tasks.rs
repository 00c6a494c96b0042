//! Task registry client

use std::time::Duration;

use tracing::{debug, warn};

use crate::protocol::{parse_timestamp, MessageEntry, TaskEntry};
use crate::transport::PeerTransport;
use crate::types::{PeerDescriptor, Task, TaskState, TaskStep};

use super::bounded;

/// List tasks known to the primary peer
///
/// With no primary, or on any failure, the list is empty.
pub async fn collect_tasks(
    transport: &dyn PeerTransport,
    primary: Option<&PeerDescriptor>,
    limit: usize,
    timeout: Duration,
) -> Vec<Task> {
    let Some(primary) = primary else {
        debug!("No primary peer, skipping task registry");
        return Vec::new();
    };

    match bounded(timeout, transport.list_tasks(&primary.address, limit)).await {
        Ok(entries) => {
            let tasks: Vec<Task> = entries.into_iter().filter_map(task_from_entry).collect();
            debug!(peer = %primary.id, count = tasks.len(), "Tasks collected");
            tasks
        }
        Err(e) => {
            warn!(peer = %primary.id, error = %e, "Task registry unavailable");
            Vec::new()
        }
    }
}

/// Coerce one task entry; entries without an id are dropped
pub fn task_from_entry(entry: TaskEntry) -> Option<Task> {
    let id = entry.id?;
    let (state, updated_at) = match entry.status {
        Some(status) => (
            status
                .state
                .as_deref()
                .map(TaskState::from_label)
                .unwrap_or(TaskState::Unknown),
            status.timestamp.as_ref().and_then(parse_timestamp),
        ),
        None => (TaskState::Unknown, None),
    };

    let history = entry
        .history
        .into_iter()
        .filter_map(|raw| serde_json::from_value::<MessageEntry>(raw).ok())
        .map(task_step)
        .collect();

    Some(Task {
        id,
        state,
        updated_at,
        history,
    })
}

fn task_step(message: MessageEntry) -> TaskStep {
    TaskStep {
        role: message
            .role
            .as_deref()
            .map(role_label)
            .unwrap_or_else(|| "unknown".to_string()),
        text: message.text(),
    }
}

/// `ROLE_AGENT` → `agent`
fn role_label(raw: &str) -> String {
    let lower = raw.trim().to_ascii_lowercase();
    lower.strip_prefix("role_").unwrap_or(&lower).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::TaskStatusEntry;
    use crate::transport::{MockPeer, MockTransport};
    use serde_json::json;

    const TIMEOUT: Duration = Duration::from_millis(200);

    fn primary() -> PeerDescriptor {
        PeerDescriptor::new("http://alpha", "Alpha", "knowledge-management").with_id("alpha")
    }

    fn entry(id: &str, state: &str) -> TaskEntry {
        TaskEntry {
            id: Some(id.into()),
            status: Some(TaskStatusEntry {
                state: Some(state.into()),
                timestamp: Some(json!(1_700_000_000.0)),
            }),
            history: vec![
                json!({"role": "ROLE_USER", "parts": [{"text": "What is RAG?"}]}),
                json!({"role": "agent", "parts": [{"text": "Retrieval"}, {"text": "augmented"}]}),
                json!("junk"),
            ],
        }
    }

    #[test]
    fn test_task_from_entry() {
        let task = task_from_entry(entry("t1", "TASK_STATE_WORKING")).unwrap();

        assert_eq!(task.id, "t1");
        assert_eq!(task.state, TaskState::Working);
        assert_eq!(task.updated_at.unwrap().timestamp(), 1_700_000_000);
        assert_eq!(task.history.len(), 2);
        assert_eq!(task.history[0].role, "user");
        assert_eq!(task.history[0].text, "What is RAG?");
        assert_eq!(task.history[1].role, "agent");
        assert_eq!(task.history[1].text, "Retrieval augmented");
    }

    #[test]
    fn test_unmapped_state_is_unknown() {
        assert_eq!(
            task_from_entry(entry("t1", "TASK_STATE_INPUT_REQUIRED")).unwrap().state,
            TaskState::Unknown
        );

        let bare = TaskEntry {
            id: Some("t2".into()),
            ..TaskEntry::default()
        };
        let task = task_from_entry(bare).unwrap();
        assert_eq!(task.state, TaskState::Unknown);
        assert!(task.updated_at.is_none());
        assert!(task.history.is_empty());
    }

    #[test]
    fn test_entry_without_id_is_dropped() {
        assert!(task_from_entry(TaskEntry::default()).is_none());
    }

    #[tokio::test]
    async fn test_collect_from_primary() {
        let transport = MockTransport::new();
        transport.set_peer(
            "http://alpha",
            MockPeer::healthy("dkmes-alpha").with_tasks(vec![
                entry("t1", "completed"),
                entry("t2", "TASK_STATE_FAILED"),
            ]),
        );

        let tasks = collect_tasks(&transport, Some(&primary()), 50, TIMEOUT).await;
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].state, TaskState::Completed);
        assert_eq!(tasks[1].state, TaskState::Failed);
    }

    #[tokio::test]
    async fn test_no_primary_makes_no_call() {
        let transport = MockTransport::new();

        let tasks = collect_tasks(&transport, None, 50, TIMEOUT).await;
        assert!(tasks.is_empty());
        assert_eq!(transport.task_calls(), 0);
    }

    #[tokio::test]
    async fn test_rpc_error_yields_empty_list() {
        let transport = MockTransport::new();
        transport.set_peer(
            "http://alpha",
            MockPeer {
                tasks: None,
                ..MockPeer::healthy("dkmes-alpha")
            },
        );

        let tasks = collect_tasks(&transport, Some(&primary()), 50, TIMEOUT).await;
        assert!(tasks.is_empty());
        assert_eq!(transport.task_calls(), 1);
    }
}
