//! Task CRUD endpoints
//!
//! Creating a second task of the same type for an episode is a 409. Updates
//! that complete a task run the workflow cascade (recording task spawn,
//! episode recorded transition); a cascade failure is logged, the task update
//! itself stands.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use podtrack_common::models::{Task, TaskStatus, TaskType};
use serde::Deserialize;
use uuid::Uuid;

use crate::db::{episodes, tasks};
use crate::error::{ApiError, ApiResult};
use crate::services::workflow;
use crate::AppState;

fn map_create_error(err: podtrack_common::Error, task_type: TaskType) -> ApiError {
    match err {
        podtrack_common::Error::Database(sqlx::Error::Database(ref db))
            if db.is_unique_violation() =>
        {
            ApiError::Conflict(format!(
                "Episode already has a {} task",
                task_type.as_str()
            ))
        }
        other => other.into(),
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateTask {
    pub episode_id: Uuid,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    pub status: Option<TaskStatus>,
    pub assigned_to: Option<Uuid>,
    pub due_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

/// POST /api/tasks
pub async fn create_task(
    State(state): State<AppState>,
    Json(payload): Json<CreateTask>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    if episodes::load_episode(&state.db, payload.episode_id)
        .await?
        .is_none()
    {
        return Err(ApiError::BadRequest(format!(
            "Unknown episode: {}",
            payload.episode_id
        )));
    }

    let task = tasks::create_task(
        &state.db,
        tasks::TaskInput {
            episode_id: payload.episode_id,
            task_type: payload.task_type,
            status: payload.status.unwrap_or(TaskStatus::NotStarted),
            assigned_to: payload.assigned_to,
            due_date: payload.due_date,
            notes: payload.notes,
        },
    )
    .await
    .map_err(|e| map_create_error(e, payload.task_type))?;
    Ok((StatusCode::CREATED, Json(task)))
}

#[derive(Debug, Deserialize)]
pub struct TaskListParams {
    pub episode_id: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
    pub status: Option<TaskStatus>,
    #[serde(rename = "type")]
    pub task_type: Option<TaskType>,
    #[serde(default)]
    pub skip: i64,
    #[serde(default)]
    pub limit: i64,
}

/// GET /api/tasks
pub async fn list_tasks(
    State(state): State<AppState>,
    Query(params): Query<TaskListParams>,
) -> ApiResult<Json<Vec<Task>>> {
    let listed = tasks::list_tasks(
        &state.db,
        tasks::TaskFilter {
            episode_id: params.episode_id,
            assigned_to: params.assigned_to,
            status: params.status,
            task_type: params.task_type,
            skip: params.skip,
            limit: params.limit,
        },
        Utc::now(),
    )
    .await?;
    Ok(Json(listed))
}

/// GET /api/tasks/:id
pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Task>> {
    let task = tasks::load_task(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Task {}", id)))?;
    Ok(Json(task))
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateTask {
    pub status: Option<TaskStatus>,
    pub assigned_to: Option<Uuid>,
    pub due_date: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

/// PUT /api/tasks/:id
pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTask>,
) -> ApiResult<Json<Task>> {
    let before = tasks::load_task(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Task {}", id)))?;

    let after = tasks::update_task(
        &state.db,
        id,
        tasks::TaskUpdate {
            status: payload.status,
            assigned_to: payload.assigned_to,
            due_date: payload.due_date,
            completed_at: payload.completed_at,
            notes: payload.notes,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("Task {}", id)))?;

    if before.status != after.status {
        if let Err(e) = workflow::apply_task_change(&state.db, &before, &after, Utc::now()).await {
            tracing::error!(task_id = %id, "Workflow cascade failed after task update: {}", e);
        }
    }

    Ok(Json(after))
}

/// DELETE /api/tasks/:id
pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if tasks::delete_task(&state.db, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Task {}", id)))
    }
}

/// Build task routes
pub fn task_routes() -> Router<AppState> {
    Router::new()
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route(
            "/api/tasks/:id",
            get(get_task).put(update_task).delete(delete_task),
        )
}
