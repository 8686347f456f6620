//! podtrack-server library interface for testing
//!
//! Exposes public APIs for integration testing

pub mod api;
pub mod db;
pub mod error;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use podtrack_common::config::Settings;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::services::calendar::CalendarGateway;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Calendar gateway (swappable in tests)
    pub calendar: Arc<dyn CalendarGateway>,
    /// Resolved configuration
    pub settings: Arc<Settings>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: SqlitePool, calendar: Arc<dyn CalendarGateway>, settings: Settings) -> Self {
        Self {
            db,
            calendar,
            settings: Arc::new(settings),
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::workflow_routes())
        .merge(api::podcast_routes())
        .merge(api::episode_routes())
        .merge(api::task_routes())
        .merge(api::user_routes())
        .merge(api::notification_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
