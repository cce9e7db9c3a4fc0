//! In-memory task store (non-persistent).

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::task::{Task, TaskId, TaskStatus};

use super::{apply_transition, TaskStore};

#[derive(Clone, Default)]
pub struct InMemoryTaskStore {
    tasks: Arc<RwLock<HashMap<TaskId, Task>>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    fn is_persistent(&self) -> bool {
        false
    }

    async fn create_task(
        &self,
        task_type: &str,
        goal: &str,
        parameters: Value,
    ) -> Result<Task, String> {
        let task = Task::new(task_type, goal, parameters);
        self.tasks.write().await.insert(task.id, task.clone());
        Ok(task)
    }

    async fn get_task(&self, id: TaskId) -> Result<Option<Task>, String> {
        Ok(self.tasks.read().await.get(&id).cloned())
    }

    async fn list_tasks(&self, limit: usize, offset: usize) -> Result<Vec<Task>, String> {
        let mut tasks: Vec<Task> = self.tasks.read().await.values().cloned().collect();
        tasks.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(tasks.into_iter().skip(offset).take(limit).collect())
    }

    async fn update_status(
        &self,
        id: TaskId,
        status: TaskStatus,
        result: Option<Value>,
        error: Option<String>,
    ) -> Result<(), String> {
        let mut tasks = self.tasks.write().await;
        let task = tasks
            .get_mut(&id)
            .ok_or_else(|| format!("Task {} not found", id))?;
        apply_transition(task, status, result, error)
    }
}
