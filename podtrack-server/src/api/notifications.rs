//! Notification feed
//!
//! Derived read model, nothing is stored: today's recordings plus open tasks
//! that are overdue or coming due within 24 hours.

use axum::{extract::State, routing::get, Json, Router};
use chrono::{DateTime, Duration, Utc};
use podtrack_common::models::TaskStatus;
use podtrack_common::time::local_day_span;
use serde::Serialize;
use uuid::Uuid;

use crate::db::{episodes, tasks};
use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Urgent,
    High,
    Normal,
}

#[derive(Debug, Serialize)]
pub struct Notification {
    pub kind: String,
    pub priority: Priority,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episode_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
}

/// GET /api/notifications
pub async fn list_notifications(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Notification>>> {
    let now = Utc::now();
    let mut notifications = Vec::new();

    let (day_start, day_end) = local_day_span(now, state.settings.calendar.timezone);
    for episode in episodes::find_in_recording_span(&state.db, day_start, day_end).await? {
        let number = episode
            .episode_number
            .as_deref()
            .map(|n| format!("episode {}", n))
            .unwrap_or_else(|| "episode".to_string());
        notifications.push(Notification {
            kind: "recording_today".to_string(),
            priority: Priority::High,
            message: format!("Recording today: {}", number),
            episode_id: Some(episode.id),
            task_id: None,
            due_date: episode.recording_date,
        });
    }

    let open_tasks = tasks::list_tasks(
        &state.db,
        tasks::TaskFilter {
            limit: 500,
            ..Default::default()
        },
        now,
    )
    .await?;
    let soon = now + Duration::hours(24);
    for task in open_tasks {
        if matches!(task.status, TaskStatus::Done | TaskStatus::Skipped) {
            continue;
        }
        let Some(due) = task.due_date else { continue };
        let (kind, priority) = if due < now {
            ("task_overdue", Priority::Urgent)
        } else if due <= soon {
            ("task_due_soon", Priority::High)
        } else {
            continue;
        };
        notifications.push(Notification {
            kind: kind.to_string(),
            priority,
            message: format!("{} task due {}", task.task_type.label(), due.to_rfc3339()),
            episode_id: Some(task.episode_id),
            task_id: Some(task.id),
            due_date: Some(due),
        });
    }

    Ok(Json(notifications))
}

/// Build notification routes
pub fn notification_routes() -> Router<AppState> {
    Router::new().route("/api/notifications", get(list_notifications))
}
