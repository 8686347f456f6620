//! Episode CRUD endpoints
//!
//! Updates that change the episode status or a client approval run the
//! workflow cascade (task creation/completion) after the write; a cascade
//! failure is logged, the episode update itself stands.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use podtrack_common::models::{Approval, Episode, EpisodeStatus};
use serde::Deserialize;
use uuid::Uuid;

use crate::db::{episodes, podcasts};
use crate::error::{ApiError, ApiResult};
use crate::services::workflow;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateEpisode {
    pub podcast_id: Uuid,
    pub episode_number: Option<String>,
    pub recording_date: Option<DateTime<Utc>>,
    pub studio: Option<String>,
    pub guest_names: Option<String>,
    pub status: Option<EpisodeStatus>,
    pub episode_notes: Option<String>,
    pub reels_notes: Option<String>,
    pub studio_settings_override: Option<String>,
    pub recording_engineer_id: Option<Uuid>,
    pub editing_engineer_id: Option<Uuid>,
    pub reels_engineer_id: Option<Uuid>,
}

/// POST /api/episodes
pub async fn create_episode(
    State(state): State<AppState>,
    Json(payload): Json<CreateEpisode>,
) -> ApiResult<(StatusCode, Json<Episode>)> {
    if podcasts::load_podcast(&state.db, payload.podcast_id)
        .await?
        .is_none()
    {
        return Err(ApiError::BadRequest(format!(
            "Unknown podcast: {}",
            payload.podcast_id
        )));
    }

    let episode = episodes::create_episode(
        &state.db,
        episodes::EpisodeInput {
            podcast_id: payload.podcast_id,
            episode_number: payload.episode_number,
            recording_date: payload.recording_date,
            studio: payload.studio,
            guest_names: payload.guest_names,
            status: payload.status,
            episode_notes: payload.episode_notes,
            reels_notes: payload.reels_notes,
            studio_settings_override: payload.studio_settings_override,
            client_approved_editing: None,
            client_approved_reels: None,
            recording_engineer_id: payload.recording_engineer_id,
            editing_engineer_id: payload.editing_engineer_id,
            reels_engineer_id: payload.reels_engineer_id,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(episode)))
}

#[derive(Debug, Deserialize)]
pub struct EpisodeListParams {
    pub podcast_id: Option<Uuid>,
    pub status: Option<EpisodeStatus>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    #[serde(default)]
    pub skip: i64,
    #[serde(default)]
    pub limit: i64,
}

/// GET /api/episodes
pub async fn list_episodes(
    State(state): State<AppState>,
    Query(params): Query<EpisodeListParams>,
) -> ApiResult<Json<Vec<Episode>>> {
    let listed = episodes::list_episodes(
        &state.db,
        episodes::EpisodeFilter {
            podcast_id: params.podcast_id,
            status: params.status,
            date_from: params.date_from,
            date_to: params.date_to,
            skip: params.skip,
            limit: params.limit,
        },
    )
    .await?;
    Ok(Json(listed))
}

/// GET /api/episodes/:id
pub async fn get_episode(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Episode>> {
    let episode = episodes::load_episode(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Episode {}", id)))?;
    Ok(Json(episode))
}

/// Distinguishes an absent field (leave unchanged) from an explicit JSON
/// `null` (clear the column).
fn clearable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateEpisode {
    pub episode_number: Option<String>,
    #[serde(default, deserialize_with = "clearable")]
    pub recording_date: Option<Option<DateTime<Utc>>>,
    pub studio: Option<String>,
    pub guest_names: Option<String>,
    pub status: Option<EpisodeStatus>,
    pub episode_notes: Option<String>,
    pub reels_notes: Option<String>,
    pub studio_settings_override: Option<String>,
    pub client_approved_editing: Option<Approval>,
    pub client_approved_reels: Option<Approval>,
    #[serde(default, deserialize_with = "clearable")]
    pub recording_engineer_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "clearable")]
    pub editing_engineer_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "clearable")]
    pub reels_engineer_id: Option<Option<Uuid>>,
}

/// PUT /api/episodes/:id
pub async fn update_episode(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateEpisode>,
) -> ApiResult<Json<Episode>> {
    let before = episodes::load_episode(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Episode {}", id)))?;

    let after = episodes::update_episode(
        &state.db,
        id,
        episodes::EpisodeUpdate {
            episode_number: payload.episode_number,
            recording_date: payload.recording_date,
            studio: payload.studio,
            guest_names: payload.guest_names,
            status: payload.status,
            episode_notes: payload.episode_notes,
            reels_notes: payload.reels_notes,
            studio_settings_override: payload.studio_settings_override,
            client_approved_editing: payload.client_approved_editing,
            client_approved_reels: payload.client_approved_reels,
            recording_engineer_id: payload.recording_engineer_id,
            editing_engineer_id: payload.editing_engineer_id,
            reels_engineer_id: payload.reels_engineer_id,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("Episode {}", id)))?;

    let lifecycle_changed = before.status != after.status
        || before.client_approved_editing != after.client_approved_editing
        || before.client_approved_reels != after.client_approved_reels;
    if lifecycle_changed {
        if let Err(e) = workflow::apply_episode_change(&state.db, &before, &after, Utc::now()).await
        {
            tracing::error!(episode_id = %id, "Workflow cascade failed after episode update: {}", e);
        }
    }

    Ok(Json(after))
}

/// DELETE /api/episodes/:id
pub async fn delete_episode(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if episodes::delete_episode(&state.db, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Episode {}", id)))
    }
}

/// Build episode routes
pub fn episode_routes() -> Router<AppState> {
    Router::new()
        .route("/api/episodes", get(list_episodes).post(create_episode))
        .route(
            "/api/episodes/:id",
            get(get_episode).put(update_episode).delete(delete_episode),
        )
}
