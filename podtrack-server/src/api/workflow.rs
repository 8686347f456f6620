//! Workflow trigger endpoints
//!
//! Invoked by a scheduler (or manually): the daily run and the lookahead
//! calendar sync. Both return the counts of what they did.

use axum::{
    extract::{Query, State},
    routing::post,
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::services::workflow::{self, DailySummary, SyncSummary};
use crate::AppState;

/// POST /api/workflow/daily
pub async fn run_daily(State(state): State<AppState>) -> ApiResult<Json<DailySummary>> {
    let summary = workflow::run_daily(
        &state.db,
        state.calendar.as_ref(),
        &state.settings.calendar,
        Utc::now(),
    )
    .await?;
    Ok(Json(summary))
}

#[derive(Debug, Deserialize)]
pub struct SyncParams {
    pub days_ahead: Option<i64>,
}

/// POST /api/workflow/sync-calendar?days_ahead=N
pub async fn sync_calendar(
    State(state): State<AppState>,
    Query(params): Query<SyncParams>,
) -> ApiResult<Json<SyncSummary>> {
    let days_ahead = params
        .days_ahead
        .unwrap_or(state.settings.calendar.lookahead_days);
    if days_ahead < 1 {
        return Err(ApiError::BadRequest(format!(
            "days_ahead must be >= 1, got {}",
            days_ahead
        )));
    }

    let summary = workflow::sync_calendar(
        &state.db,
        state.calendar.as_ref(),
        &state.settings.calendar,
        days_ahead,
        Utc::now(),
    )
    .await?;
    Ok(Json(summary))
}

/// Build workflow trigger routes
pub fn workflow_routes() -> Router<AppState> {
    Router::new()
        .route("/api/workflow/daily", post(run_daily))
        .route("/api/workflow/sync-calendar", post(sync_calendar))
}
