//! Background task runner - drives one task from pending to terminal.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::engine::EngineError;
use crate::store::{now_string, BlobStore, TaskStore};
use crate::task::{Task, TaskStatus};

use super::AppState;

/// Execute a task to completion and persist the outcome.
///
/// Only configuration errors and cancellation reach the task's `failed`
/// status; recoverable degradation stays inside the stored report.
pub async fn run_task(state: Arc<AppState>, task: Task) {
    let token = CancellationToken::new();
    state.running.write().await.insert(task.id, token.clone());

    let outcome = execute_and_store(&state, &task, &token).await;
    if let Err(e) = outcome {
        tracing::warn!(task_id = %task.id, "Failed to persist task outcome: {}", e);
    }

    state.running.write().await.remove(&task.id);
}

async fn execute_and_store(
    state: &AppState,
    task: &Task,
    token: &CancellationToken,
) -> Result<(), String> {
    state
        .store
        .update_status(task.id, TaskStatus::Processing, None, None)
        .await?;

    match state.executor.execute(task, token).await {
        Ok(report) => {
            tracing::info!(
                task_id = %task.id,
                status = ?report.status,
                errors = report.errors.len(),
                "Task completed"
            );
            let payload = offload_if_large(state, task, report).await;
            state
                .store
                .update_status(task.id, TaskStatus::Completed, Some(payload), None)
                .await
        }
        Err(e @ EngineError::NotReady) => {
            tracing::error!(task_id = %task.id, "Task failed: {}", e);
            state
                .store
                .update_status(task.id, TaskStatus::Failed, None, Some(e.to_string()))
                .await
        }
        Err(e @ EngineError::Cancelled) => {
            tracing::info!(task_id = %task.id, "Task cancelled");
            state
                .store
                .update_status(task.id, TaskStatus::Failed, None, Some(e.to_string()))
                .await
        }
    }
}

/// Serialize the report; payloads over the inline limit go to the blob store
/// and the task record keeps a locator reference instead.
async fn offload_if_large(
    state: &AppState,
    task: &Task,
    report: crate::engine::TaskReport,
) -> serde_json::Value {
    let payload = match serde_json::to_value(&report) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(task_id = %task.id, "Failed to serialize report: {}", e);
            return serde_json::json!({"status": "partial", "error": e.to_string()});
        }
    };

    let rendered = payload.to_string();
    if rendered.len() <= state.config.inline_result_limit {
        return payload;
    }

    let key = format!("task-{}-{}.json", task.id, now_string().replace(':', "-"));
    match state.blobs.put(&key, rendered.as_bytes()).await {
        Ok(locator) => {
            tracing::info!(
                task_id = %task.id,
                locator = %locator,
                size = rendered.len(),
                "Result offloaded to blob store"
            );
            serde_json::json!({
                "status": report.status,
                "summary": report.summary,
                "blob_locator": locator,
                "size_bytes": rendered.len(),
            })
        }
        Err(e) => {
            // Inline storage is the lesser evil when the blob store is down.
            tracing::warn!(task_id = %task.id, "Blob offload failed, storing inline: {}", e);
            payload
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::engine::PlanExecutor;
    use crate::llm::{ChatMessage, ChatResponse, LlmClient, ToolDefinition};
    use crate::store::{BlobStore, FsBlobStore, InMemoryTaskStore, TaskStore};
    use crate::tools::ToolRegistry;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use tokio::sync::RwLock;

    struct FixedLlm {
        ready: bool,
    }

    #[async_trait]
    impl LlmClient for FixedLlm {
        fn is_ready(&self) -> bool {
            self.ready
        }

        async fn chat_completion(
            &self,
            _model: &str,
            _messages: &[ChatMessage],
            _tools: Option<&[ToolDefinition]>,
        ) -> anyhow::Result<ChatResponse> {
            Ok(ChatResponse::text(r#"{"summary": "all good"}"#))
        }
    }

    async fn app_state(ready: bool, inline_limit: usize, dir: &std::path::Path) -> Arc<AppState> {
        let llm = Arc::new(FixedLlm { ready });
        let tools = Arc::new(ToolRegistry::empty());
        let executor = Arc::new(PlanExecutor::new(
            llm,
            tools,
            "test-model".to_string(),
        ));
        let mut config = Config::new(None, "test-model".to_string(), PathBuf::from(dir));
        config.inline_result_limit = inline_limit;

        let blobs: Arc<dyn BlobStore> = Arc::new(
            FsBlobStore::new(dir.join("blobs")).await.unwrap(),
        );

        Arc::new(AppState {
            config,
            store: Box::new(InMemoryTaskStore::new()),
            blobs,
            executor,
            running: RwLock::new(HashMap::new()),
        })
    }

    #[tokio::test]
    async fn successful_run_completes_the_task_with_report() {
        let dir = tempfile::tempdir().unwrap();
        let state = app_state(true, 1024 * 1024, dir.path()).await;
        let task = state
            .store
            .create_task("candidate_search", "goal", json!({}))
            .await
            .unwrap();

        run_task(Arc::clone(&state), task.clone()).await;

        let done = state.store.get_task(task.id).await.unwrap().unwrap();
        assert_eq!(done.status, TaskStatus::Completed);
        let result = done.result.unwrap();
        assert_eq!(result["summary"], "all good");
        assert!(state.running.read().await.is_empty());
    }

    #[tokio::test]
    async fn not_ready_client_fails_the_task_with_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let state = app_state(false, 1024 * 1024, dir.path()).await;
        let task = state
            .store
            .create_task("candidate_search", "goal", json!({}))
            .await
            .unwrap();

        run_task(Arc::clone(&state), task.clone()).await;

        let failed = state.store.get_task(task.id).await.unwrap().unwrap();
        assert_eq!(failed.status, TaskStatus::Failed);
        assert!(failed.error.unwrap().contains("not ready"));
    }

    #[tokio::test]
    async fn oversized_results_are_offloaded_to_the_blob_store() {
        let dir = tempfile::tempdir().unwrap();
        // Tiny inline limit forces every report into the blob store.
        let state = app_state(true, 16, dir.path()).await;
        let task = state
            .store
            .create_task("candidate_search", "goal", json!({}))
            .await
            .unwrap();

        run_task(Arc::clone(&state), task.clone()).await;

        let done = state.store.get_task(task.id).await.unwrap().unwrap();
        let result = done.result.unwrap();
        let locator = result["blob_locator"].as_str().unwrap();
        let bytes = state.blobs.get(locator).await.unwrap();
        let full: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(full["summary"], "all good");
    }
}
