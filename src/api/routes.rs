//! HTTP route handlers.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::engine::PlanExecutor;
use crate::llm::OpenRouterClient;
use crate::sourcing::{HttpSourceConnector, SourceConnector};
use crate::store::{self, BlobStore, FsBlobStore, TaskStore, TaskStoreType};
use crate::task::{Task, TaskId};
use crate::tools::ToolRegistry;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: Box<dyn TaskStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub executor: Arc<PlanExecutor>,
    /// Cancellation tokens of currently running tasks
    pub running: RwLock<HashMap<TaskId, CancellationToken>>,
}

/// Start the HTTP server.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let llm = Arc::new(OpenRouterClient::new(config.api_key.clone()));
    if config.api_key.is_none() {
        tracing::warn!(
            "OPENROUTER_API_KEY not set; tasks will fail with a configuration error"
        );
    }

    let sources: Vec<Arc<dyn SourceConnector>> = config
        .sources
        .iter()
        .map(|endpoint| {
            Arc::new(HttpSourceConnector::new(
                endpoint.name.clone(),
                endpoint.url.clone(),
            )) as Arc<dyn SourceConnector>
        })
        .collect();
    tracing::info!("Configured {} candidate sources", sources.len());

    let tools = Arc::new(ToolRegistry::with_defaults(
        Arc::clone(&llm) as Arc<dyn crate::llm::LlmClient>,
        config.default_model.clone(),
        sources,
    ));

    let executor = Arc::new(PlanExecutor::new(
        llm,
        tools,
        config.default_model.clone(),
    ));

    let store_type = TaskStoreType::from_str(&config.task_store);
    let store = store::create_task_store(store_type, config.data_dir.clone())
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize task store: {}", e))?;

    let blobs: Arc<dyn BlobStore> =
        Arc::new(FsBlobStore::new(config.data_dir.join("blobs")).await.map_err(
            |e| anyhow::anyhow!("Failed to initialize blob store: {}", e),
        )?);

    let state = Arc::new(AppState {
        config: config.clone(),
        store,
        blobs,
        executor,
        running: RwLock::new(HashMap::new()),
    });

    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("talentflow engine listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the task API router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/tasks", post(create_task).get(list_tasks))
        .route("/api/tasks/:id", get(get_task))
        .route("/api/tasks/:id/cancel", post(cancel_task))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    #[serde(default = "default_task_type")]
    pub task_type: String,
    pub goal: String,
    #[serde(default)]
    pub parameters: serde_json::Value,
}

fn default_task_type() -> String {
    "general".to_string()
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    limit: usize,
    #[serde(default)]
    offset: usize,
}

fn default_limit() -> usize {
    50
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// POST /api/tasks - create a task and start executing it in the background.
async fn create_task(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    if request.goal.trim().is_empty() {
        return Err(error(StatusCode::BAD_REQUEST, "goal must not be empty"));
    }

    let task = state
        .store
        .create_task(&request.task_type, &request.goal, request.parameters)
        .await
        .map_err(|e| error(StatusCode::INTERNAL_SERVER_ERROR, e))?;

    tracing::info!(task_id = %task.id, task_type = %task.task_type, "Task created");

    let spawned_task = task.clone();
    let spawned_state = Arc::clone(&state);
    tokio::spawn(async move {
        super::runner::run_task(spawned_state, spawned_task).await;
    });

    Ok((StatusCode::CREATED, Json(task)))
}

/// GET /api/tasks - list recent tasks.
async fn list_tasks(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Task>>, ApiError> {
    let tasks = state
        .store
        .list_tasks(query.limit, query.offset)
        .await
        .map_err(|e| error(StatusCode::INTERNAL_SERVER_ERROR, e))?;
    Ok(Json(tasks))
}

/// GET /api/tasks/:id - fetch one task.
async fn get_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Task>, ApiError> {
    let id: TaskId = id
        .parse()
        .map_err(|_| error(StatusCode::BAD_REQUEST, "invalid task id"))?;

    let task = state
        .store
        .get_task(id)
        .await
        .map_err(|e| error(StatusCode::INTERNAL_SERVER_ERROR, e))?
        .ok_or_else(|| error(StatusCode::NOT_FOUND, format!("Task {} not found", id)))?;

    Ok(Json(task))
}

/// POST /api/tasks/:id/cancel - request cancellation of a running task.
async fn cancel_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let id: TaskId = id
        .parse()
        .map_err(|_| error(StatusCode::BAD_REQUEST, "invalid task id"))?;

    let running = state.running.read().await;
    match running.get(&id) {
        Some(token) => {
            token.cancel();
            tracing::info!(task_id = %id, "Cancellation requested");
            Ok((
                StatusCode::ACCEPTED,
                Json(serde_json::json!({"status": "cancelling"})),
            ))
        }
        None => {
            drop(running);
            // Distinguish "already finished" from "never existed".
            let exists = state
                .store
                .get_task(id)
                .await
                .map_err(|e| error(StatusCode::INTERNAL_SERVER_ERROR, e))?
                .is_some();
            if exists {
                Err(error(StatusCode::CONFLICT, "Task is not running"))
            } else {
                Err(error(StatusCode::NOT_FOUND, format!("Task {} not found", id)))
            }
        }
    }
}
