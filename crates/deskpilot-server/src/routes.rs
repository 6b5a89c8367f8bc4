//! HTTP routes
//!
//! Fire-and-forget interface: POST /automate registers a task and spawns
//! its execution, then replies immediately. Clients poll GET /status and
//! the session listing for progress.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use deskpilot_core::executor::PlanExecutor;
use deskpilot_core::store::TaskStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<TaskStore>,
    pub executor: Arc<PlanExecutor>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

impl ErrorBody {
    fn new(code: &'static str, message: impl Into<String>) -> Json<Self> {
        Json(Self {
            code,
            message: message.into(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct AutomateRequest {
    pub intent: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AutomateResponse {
    pub task_id: String,
    pub session_id: String,
    pub status: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct SessionTasksResponse {
    pub session_id: String,
    pub task_ids: Vec<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/automate", post(automate))
        .route("/status/{task_id}", get(status))
        .route("/sessions/{session_id}/tasks", get(session_tasks))
        .with_state(state)
}

async fn automate(
    State(state): State<AppState>,
    Json(request): Json<AutomateRequest>,
) -> Result<Json<AutomateResponse>, (StatusCode, Json<ErrorBody>)> {
    let intent = request.intent.trim().to_string();
    if intent.is_empty() {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            ErrorBody::new("empty_intent", "intent must not be empty"),
        ));
    }

    let task_id = Uuid::new_v4().to_string();
    let session_id = request
        .session_id
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    if let Err(err) = state.store.register_task(&task_id, &session_id) {
        error!(task_id, error = %err, "failed to register task");
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorBody::new("registration_failed", err.to_string()),
        ));
    }

    info!(task_id, session_id, intent, "automation task accepted");

    let executor = state.executor.clone();
    let spawned_task_id = task_id.clone();
    tokio::spawn(async move {
        executor.run_task(&spawned_task_id, &intent).await;
    });

    Ok(Json(AutomateResponse {
        task_id,
        session_id,
        status: "processing",
        message: "automation task started",
    }))
}

async fn status(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorBody>)> {
    let snapshot = state.store.get_status(&task_id).map_err(|err| {
        error!(task_id, error = %err, "status lookup failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorBody::new("store_error", err.to_string()),
        )
    })?;

    match snapshot {
        Some(snapshot) => {
            let mut body = serde_json::to_value(&snapshot).map_err(|err| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::new("serialization_error", err.to_string()),
                )
            })?;
            if let Some(map) = body.as_object_mut() {
                map.insert("task_id".to_string(), serde_json::Value::String(task_id));
            }
            Ok(Json(body))
        }
        None => Err((
            StatusCode::NOT_FOUND,
            ErrorBody::new("task_not_found", format!("no task with id {task_id}")),
        )),
    }
}

async fn session_tasks(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionTasksResponse>, (StatusCode, Json<ErrorBody>)> {
    let task_ids = state.store.get_session_tasks(&session_id).map_err(|err| {
        error!(session_id, error = %err, "session lookup failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorBody::new("store_error", err.to_string()),
        )
    })?;
    Ok(Json(SessionTasksResponse {
        session_id,
        task_ids,
    }))
}
