//! Task lifecycle storage with pluggable backends.
//!
//! Supports:
//! - `memory`: In-memory storage (non-persistent, for testing)
//! - `sqlite`: SQLite database (default)
//!
//! The store owns the task records; the engine only mutates them through
//! status updates, and the store enforces the lifecycle state machine
//! (terminal transitions happen exactly once).

mod blob;
mod memory;
mod sqlite;

pub use blob::{BlobStore, FsBlobStore};
pub use memory::InMemoryTaskStore;
pub use sqlite::SqliteTaskStore;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::path::PathBuf;

use crate::task::{Task, TaskId, TaskStatus};

/// Get current timestamp as RFC3339 string.
pub fn now_string() -> String {
    Utc::now().to_rfc3339()
}

/// Task store trait - implemented by all storage backends.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Whether this store persists data across restarts.
    fn is_persistent(&self) -> bool;

    /// Create a new pending task.
    async fn create_task(
        &self,
        task_type: &str,
        goal: &str,
        parameters: Value,
    ) -> Result<Task, String>;

    /// Get a single task by ID.
    async fn get_task(&self, id: TaskId) -> Result<Option<Task>, String>;

    /// List tasks, ordered by updated_at descending.
    async fn list_tasks(&self, limit: usize, offset: usize) -> Result<Vec<Task>, String>;

    /// Update task status, attaching a result or error where given.
    ///
    /// Rejects transitions the lifecycle state machine does not allow, so a
    /// terminal status can never be overwritten.
    async fn update_status(
        &self,
        id: TaskId,
        status: TaskStatus,
        result: Option<Value>,
        error: Option<String>,
    ) -> Result<(), String>;
}

/// Task store type selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskStoreType {
    Memory,
    #[default]
    Sqlite,
}

impl TaskStoreType {
    /// Parse from environment variable value.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "memory" => Self::Memory,
            "sqlite" | "db" => Self::Sqlite,
            _ => Self::default(),
        }
    }
}

/// Create a task store based on type and configuration.
pub async fn create_task_store(
    store_type: TaskStoreType,
    base_dir: PathBuf,
) -> Result<Box<dyn TaskStore>, String> {
    match store_type {
        TaskStoreType::Memory => Ok(Box::new(InMemoryTaskStore::new())),
        TaskStoreType::Sqlite => {
            let store = SqliteTaskStore::new(base_dir).await?;
            Ok(Box::new(store))
        }
    }
}

/// Shared transition check used by every backend.
pub(crate) fn apply_transition(
    task: &mut Task,
    status: TaskStatus,
    result: Option<Value>,
    error: Option<String>,
) -> Result<(), String> {
    if !task.status.can_transition_to(status) {
        return Err(format!(
            "Invalid task transition from {} to {}",
            task.status, status
        ));
    }
    task.status = status;
    if let Some(result) = result {
        task.result = Some(result);
    }
    if let Some(error) = error {
        task.error = Some(error);
    }
    task.updated_at = now_string();
    Ok(())
}
