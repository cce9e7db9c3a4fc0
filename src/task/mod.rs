//! Core task type and lifecycle state machine.
//!
//! # State Machine
//! ```text
//! Pending -> Processing -> Completed
//!                      \-> Failed
//!        \-> Failed  (cancelled or misconfigured before execution)
//! ```
//!
//! A task reaches a terminal state exactly once. The record itself is owned
//! by the task store; the engine only mutates it through status updates.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Create a new unique task ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the inner UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::str::FromStr for TaskId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status of a task in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Task is waiting to be executed
    Pending,
    /// Task is currently being executed
    Processing,
    /// Task completed (result attached; may still carry recoverable step errors)
    Completed,
    /// Task failed with a caller-visible error
    Failed,
}

impl TaskStatus {
    /// Check if the task is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }

    /// Check whether a transition to `next` is allowed.
    ///
    /// # Property
    /// `is_terminal() => !can_transition_to(next)` for every `next`.
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        match (self, next) {
            (TaskStatus::Pending, TaskStatus::Processing) => true,
            (TaskStatus::Pending, TaskStatus::Failed) => true,
            (TaskStatus::Processing, TaskStatus::Completed) => true,
            (TaskStatus::Processing, TaskStatus::Failed) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::Processing => write!(f, "processing"),
            TaskStatus::Completed => write!(f, "completed"),
            TaskStatus::Failed => write!(f, "failed"),
        }
    }
}

/// A task submitted to the orchestration engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    /// Caller-supplied tag, e.g. `candidate_search` or `compliance_check`
    pub task_type: String,
    /// Natural-language goal the plan is generated from
    pub goal: String,
    /// Free-form parameter bag threaded into step prompts
    #[serde(default)]
    pub parameters: serde_json::Value,
    pub status: TaskStatus,
    /// Final result payload (set once, on completion)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// Caller-visible error message (set once, on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Task {
    /// Create a fresh pending task.
    pub fn new(task_type: &str, goal: &str, parameters: serde_json::Value) -> Self {
        let now = crate::store::now_string();
        Self {
            id: TaskId::new(),
            task_type: task_type.to_string(),
            goal: goal.to_string(),
            parameters,
            status: TaskStatus::Pending,
            result: None,
            error: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

/// Errors that can occur during task state transitions.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TaskError {
    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition { from: TaskStatus, to: TaskStatus },

    #[error("Task not found: {0}")]
    NotFound(TaskId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_task_is_pending() {
        let task = Task::new("candidate_search", "find rust engineers", serde_json::json!({}));
        assert_eq!(task.status, TaskStatus::Pending);
        assert!(task.result.is_none());
        assert!(task.error.is_none());
    }

    #[test]
    fn lifecycle_transitions() {
        assert!(TaskStatus::Pending.can_transition_to(TaskStatus::Processing));
        assert!(TaskStatus::Pending.can_transition_to(TaskStatus::Failed));
        assert!(TaskStatus::Processing.can_transition_to(TaskStatus::Completed));
        assert!(TaskStatus::Processing.can_transition_to(TaskStatus::Failed));
    }

    #[test]
    fn terminal_states_cannot_transition() {
        for terminal in [TaskStatus::Completed, TaskStatus::Failed] {
            assert!(terminal.is_terminal());
            for next in [
                TaskStatus::Pending,
                TaskStatus::Processing,
                TaskStatus::Completed,
                TaskStatus::Failed,
            ] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn pending_cannot_complete_directly() {
        assert!(!TaskStatus::Pending.can_transition_to(TaskStatus::Completed));
    }
}
