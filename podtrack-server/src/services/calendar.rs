//! Calendar gateway
//!
//! The workflow engine talks to the calendar through the `CalendarGateway`
//! trait; the production implementation is an HTTP client for a Google
//! Calendar v3 shaped events API. Tests substitute their own gateway.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use podtrack_common::config::CalendarSettings;
use serde::Deserialize;

use super::event_extractor::RawEvent;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("calendar integration is not configured")]
    NotConfigured,
    #[error("calendar authentication failed")]
    Auth,
    #[error("calendar API error {status}: {message}")]
    Api { status: u16, message: String },
    #[error("calendar request failed: {0}")]
    Network(String),
    #[error("unexpected calendar response: {0}")]
    InvalidResponse(String),
}

/// Source of calendar events for a UTC time window `[time_min, time_max)`
#[async_trait]
pub trait CalendarGateway: Send + Sync {
    async fn fetch_events(
        &self,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> Result<Vec<RawEvent>, GatewayError>;
}

#[derive(Debug, Deserialize, Default)]
struct EventsResponse {
    #[serde(default)]
    items: Vec<RawEvent>,
}

/// HTTP calendar client (Google Calendar v3 events list shape)
pub struct HttpCalendarClient {
    client: reqwest::Client,
    settings: CalendarSettings,
}

impl HttpCalendarClient {
    pub fn new(settings: CalendarSettings) -> podtrack_common::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| podtrack_common::Error::Internal(format!("HTTP client init: {}", e)))?;
        Ok(Self { client, settings })
    }
}

#[async_trait]
impl CalendarGateway for HttpCalendarClient {
    async fn fetch_events(
        &self,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> Result<Vec<RawEvent>, GatewayError> {
        if !self.settings.enabled {
            return Err(GatewayError::NotConfigured);
        }
        let Some(token) = self.settings.token.as_deref() else {
            return Err(GatewayError::NotConfigured);
        };

        let url = format!(
            "{}/calendars/{}/events",
            self.settings.base_url.trim_end_matches('/'),
            self.settings.calendar_id
        );
        tracing::debug!(
            time_min = %time_min.to_rfc3339(),
            time_max = %time_max.to_rfc3339(),
            "Fetching calendar events"
        );

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .query(&[
                ("timeMin", time_min.to_rfc3339()),
                ("timeMax", time_max.to_rfc3339()),
                ("singleEvents", "true".to_string()),
                ("orderBy", "startTime".to_string()),
                ("maxResults", "250".to_string()),
            ])
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(GatewayError::Auth);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: EventsResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
        tracing::debug!("Calendar returned {} events", body.items.len());
        Ok(body.items)
    }
}
