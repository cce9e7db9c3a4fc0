//! SQLite-based task store.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::task::{Task, TaskId, TaskStatus};

use super::{apply_transition, TaskStore};

const SCHEMA: &str = r#"
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS tasks (
    id TEXT PRIMARY KEY NOT NULL,
    task_type TEXT NOT NULL,
    goal TEXT NOT NULL,
    parameters TEXT NOT NULL DEFAULT '{}',
    status TEXT NOT NULL DEFAULT 'pending',
    result TEXT,
    error TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_tasks_updated_at ON tasks(updated_at DESC);
CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status);
"#;

pub struct SqliteTaskStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteTaskStore {
    pub async fn new(base_dir: PathBuf) -> Result<Self, String> {
        let db_path = base_dir.join("tasks.db");

        tokio::fs::create_dir_all(&base_dir)
            .await
            .map_err(|e| format!("Failed to create task store dir: {}", e))?;

        let conn = tokio::task::spawn_blocking(move || {
            let conn = Connection::open(&db_path)
                .map_err(|e| format!("Failed to open SQLite database: {}", e))?;
            conn.execute_batch(SCHEMA)
                .map_err(|e| format!("Failed to run schema: {}", e))?;
            Ok::<_, String>(conn)
        })
        .await
        .map_err(|e| format!("Task join error: {}", e))??;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn row_to_task(row: &rusqlite::Row<'_>) -> rusqlite::Result<Task> {
        let id: String = row.get("id")?;
        let parameters: String = row.get("parameters")?;
        let status: String = row.get("status")?;
        let result: Option<String> = row.get("result")?;

        Ok(Task {
            id: id.parse().unwrap_or_default(),
            task_type: row.get("task_type")?,
            goal: row.get("goal")?,
            parameters: serde_json::from_str(&parameters).unwrap_or(Value::Null),
            status: match status.as_str() {
                "processing" => TaskStatus::Processing,
                "completed" => TaskStatus::Completed,
                "failed" => TaskStatus::Failed,
                _ => TaskStatus::Pending,
            },
            result: result.and_then(|r| serde_json::from_str(&r).ok()),
            error: row.get("error")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

#[async_trait]
impl TaskStore for SqliteTaskStore {
    fn is_persistent(&self) -> bool {
        true
    }

    async fn create_task(
        &self,
        task_type: &str,
        goal: &str,
        parameters: Value,
    ) -> Result<Task, String> {
        let task = Task::new(task_type, goal, parameters);

        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO tasks (id, task_type, goal, parameters, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                task.id.to_string(),
                task.task_type,
                task.goal,
                task.parameters.to_string(),
                task.status.to_string(),
                task.created_at,
                task.updated_at,
            ],
        )
        .map_err(|e| format!("Failed to insert task: {}", e))?;

        Ok(task)
    }

    async fn get_task(&self, id: TaskId) -> Result<Option<Task>, String> {
        let conn = self.conn.lock().await;
        conn.query_row(
            "SELECT * FROM tasks WHERE id = ?1",
            params![id.to_string()],
            Self::row_to_task,
        )
        .optional()
        .map_err(|e| format!("Failed to load task: {}", e))
    }

    async fn list_tasks(&self, limit: usize, offset: usize) -> Result<Vec<Task>, String> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare("SELECT * FROM tasks ORDER BY updated_at DESC LIMIT ?1 OFFSET ?2")
            .map_err(|e| format!("Failed to prepare list query: {}", e))?;

        let tasks = stmt
            .query_map(params![limit as i64, offset as i64], Self::row_to_task)
            .map_err(|e| format!("Failed to list tasks: {}", e))?
            .collect::<Result<Vec<Task>, _>>()
            .map_err(|e| format!("Failed to read task row: {}", e))?;

        Ok(tasks)
    }

    async fn update_status(
        &self,
        id: TaskId,
        status: TaskStatus,
        result: Option<Value>,
        error: Option<String>,
    ) -> Result<(), String> {
        let conn = self.conn.lock().await;

        // Read-check-write under the connection lock so concurrent updates
        // cannot race past the state machine.
        let mut task = conn
            .query_row(
                "SELECT * FROM tasks WHERE id = ?1",
                params![id.to_string()],
                Self::row_to_task,
            )
            .optional()
            .map_err(|e| format!("Failed to load task: {}", e))?
            .ok_or_else(|| format!("Task {} not found", id))?;

        apply_transition(&mut task, status, result, error)?;

        conn.execute(
            "UPDATE tasks SET status = ?2, result = ?3, error = ?4, updated_at = ?5 WHERE id = ?1",
            params![
                task.id.to_string(),
                task.status.to_string(),
                task.result.as_ref().map(|r| r.to_string()),
                task.error,
                task.updated_at,
            ],
        )
        .map_err(|e| format!("Failed to update task: {}", e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn store() -> (SqliteTaskStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteTaskStore::new(dir.path().to_path_buf()).await.unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn task_roundtrips_through_sqlite() {
        let (store, _dir) = store().await;
        let task = store
            .create_task("candidate_search", "find rust engineers", json!({"k": 1}))
            .await
            .unwrap();

        let fetched = store.get_task(task.id).await.unwrap().unwrap();
        assert_eq!(fetched.goal, "find rust engineers");
        assert_eq!(fetched.parameters["k"], 1);
        assert_eq!(fetched.status, TaskStatus::Pending);
    }

    #[tokio::test]
    async fn lifecycle_is_enforced_across_the_connection() {
        let (store, _dir) = store().await;
        let task = store.create_task("t", "goal", json!({})).await.unwrap();

        store
            .update_status(task.id, TaskStatus::Processing, None, None)
            .await
            .unwrap();
        store
            .update_status(
                task.id,
                TaskStatus::Completed,
                Some(json!({"summary": "done"})),
                None,
            )
            .await
            .unwrap();

        let err = store
            .update_status(task.id, TaskStatus::Processing, None, None)
            .await
            .unwrap_err();
        assert!(err.contains("Invalid task transition"));

        let done = store.get_task(task.id).await.unwrap().unwrap();
        assert_eq!(done.result.unwrap()["summary"], "done");
    }

    #[tokio::test]
    async fn list_pages_through_tasks() {
        let (store, _dir) = store().await;
        for i in 0..4 {
            store
                .create_task("t", &format!("goal {}", i), json!({}))
                .await
                .unwrap();
        }
        assert_eq!(store.list_tasks(3, 0).await.unwrap().len(), 3);
        assert_eq!(store.list_tasks(3, 3).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_task_reads_as_none() {
        let (store, _dir) = store().await;
        assert!(store.get_task(TaskId::new()).await.unwrap().is_none());
    }
}
