//! User CRUD endpoints
//!
//! Deleting a user unassigns them from tasks and episode engineer slots and
//! reports the counts.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use podtrack_common::models::User;
use serde::Deserialize;
use uuid::Uuid;

use super::Pagination;
use crate::db::users::{self, UnassignmentCounts, UserInput, UserUpdate};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub name: String,
    pub email: Option<String>,
    pub role: Option<String>,
}

/// POST /api/users
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUser>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let user = users::create_user(
        &state.db,
        UserInput {
            name: payload.name,
            email: payload.email,
            role: payload.role,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /api/users
pub async fn list_users(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<Vec<User>>> {
    let users = users::list_users(&state.db, page.skip, page.limit).await?;
    Ok(Json(users))
}

/// GET /api/users/:id
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<User>> {
    let user = users::load_user(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User {}", id)))?;
    Ok(Json(user))
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
}

/// PUT /api/users/:id
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUser>,
) -> ApiResult<Json<User>> {
    let user = users::update_user(
        &state.db,
        id,
        UserUpdate {
            name: payload.name,
            email: payload.email,
            role: payload.role,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("User {}", id)))?;
    Ok(Json(user))
}

/// DELETE /api/users/:id
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<UnassignmentCounts>> {
    let counts = users::delete_user(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User {}", id)))?;
    Ok(Json(counts))
}

/// Build user routes
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/api/users", get(list_users).post(create_user))
        .route(
            "/api/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
}
