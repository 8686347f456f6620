//! Podcast CRUD endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use podtrack_common::models::Podcast;
use serde::Deserialize;
use uuid::Uuid;

use super::Pagination;
use crate::db::podcasts::{self, PodcastInput, PodcastUpdate};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreatePodcast {
    pub name: String,
    pub host: Option<String>,
    pub default_studio_settings: Option<String>,
    pub tasks_time_allowance: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// POST /api/podcasts
pub async fn create_podcast(
    State(state): State<AppState>,
    Json(payload): Json<CreatePodcast>,
) -> ApiResult<(StatusCode, Json<Podcast>)> {
    let podcast = podcasts::create_podcast(
        &state.db,
        PodcastInput {
            name: payload.name,
            host: payload.host,
            default_studio_settings: payload.default_studio_settings,
            tasks_time_allowance: payload.tasks_time_allowance,
            aliases: payload.aliases,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(podcast)))
}

/// GET /api/podcasts
pub async fn list_podcasts(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<Vec<Podcast>>> {
    let podcasts = podcasts::list_podcasts(&state.db, page.skip, page.limit).await?;
    Ok(Json(podcasts))
}

/// GET /api/podcasts/:id
pub async fn get_podcast(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Podcast>> {
    let podcast = podcasts::load_podcast(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Podcast {}", id)))?;
    Ok(Json(podcast))
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdatePodcast {
    pub name: Option<String>,
    pub host: Option<String>,
    pub default_studio_settings: Option<String>,
    pub tasks_time_allowance: Option<String>,
    pub aliases: Option<Vec<String>>,
}

/// PUT /api/podcasts/:id
pub async fn update_podcast(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePodcast>,
) -> ApiResult<Json<Podcast>> {
    let podcast = podcasts::update_podcast(
        &state.db,
        id,
        PodcastUpdate {
            name: payload.name,
            host: payload.host,
            default_studio_settings: payload.default_studio_settings,
            tasks_time_allowance: payload.tasks_time_allowance,
            aliases: payload.aliases,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("Podcast {}", id)))?;
    Ok(Json(podcast))
}

/// DELETE /api/podcasts/:id
pub async fn delete_podcast(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if podcasts::delete_podcast(&state.db, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Podcast {}", id)))
    }
}

/// Build podcast routes
pub fn podcast_routes() -> Router<AppState> {
    Router::new()
        .route("/api/podcasts", get(list_podcasts).post(create_podcast))
        .route(
            "/api/podcasts/:id",
            get(get_podcast).put(update_podcast).delete(delete_podcast),
        )
}
