//! Shared test helpers: in-memory app with a scripted calendar gateway
#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{DateTime, Utc};
use chrono_tz::Asia::Jerusalem;
use http_body_util::BodyExt;
use podtrack_common::config::{CalendarSettings, Settings, DEFAULT_CALENDAR_BASE_URL};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower::util::ServiceExt;

use podtrack_server::services::calendar::{CalendarGateway, GatewayError};
use podtrack_server::services::event_extractor::{EventTime, RawEvent};
use podtrack_server::AppState;

/// Gateway that always returns the same events
pub struct StaticGateway(pub Vec<RawEvent>);

#[async_trait]
impl CalendarGateway for StaticGateway {
    async fn fetch_events(
        &self,
        _time_min: DateTime<Utc>,
        _time_max: DateTime<Utc>,
    ) -> Result<Vec<RawEvent>, GatewayError> {
        Ok(self.0.clone())
    }
}

/// Gateway that always fails
pub struct DownGateway;

#[async_trait]
impl CalendarGateway for DownGateway {
    async fn fetch_events(
        &self,
        _time_min: DateTime<Utc>,
        _time_max: DateTime<Utc>,
    ) -> Result<Vec<RawEvent>, GatewayError> {
        Err(GatewayError::Network("connection refused".to_string()))
    }
}

pub fn test_settings() -> Settings {
    Settings {
        database_url: "sqlite::memory:".to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
        calendar: CalendarSettings {
            enabled: true,
            base_url: DEFAULT_CALENDAR_BASE_URL.to_string(),
            calendar_id: "primary".to_string(),
            token: Some("test-token".to_string()),
            timezone: Jerusalem,
            lookahead_days: 7,
        },
    }
}

/// Create a test app backed by an in-memory database and the given gateway
pub async fn create_test_app(gateway: Arc<dyn CalendarGateway>) -> (axum::Router, SqlitePool) {
    let pool = SqlitePool::connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");
    podtrack_server::db::init_tables(&pool)
        .await
        .expect("Failed to initialize schema");

    let state = AppState::new(pool.clone(), gateway, test_settings());
    (podtrack_server::build_router(state), pool)
}

/// Timed calendar event
pub fn event(summary: &str, start: &str) -> RawEvent {
    RawEvent {
        id: Some("ev".to_string()),
        summary: Some(summary.to_string()),
        start: Some(EventTime {
            date: None,
            date_time: Some(start.to_string()),
        }),
        ..Default::default()
    }
}

pub async fn request(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            builder.body(Body::from(json.to_string())).unwrap()
        }
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("Request failed");
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Response is not JSON")
    };
    (status, value)
}
