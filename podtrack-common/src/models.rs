//! Domain model types shared between the persistence layer and the API.
//!
//! All enums are stored as lowercase snake_case text in SQLite and use the
//! same spelling on the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Episode production status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EpisodeStatus {
    NotStarted,
    Recorded,
    InEditing,
    SentToClient,
    Published,
}

impl EpisodeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EpisodeStatus::NotStarted => "not_started",
            EpisodeStatus::Recorded => "recorded",
            EpisodeStatus::InEditing => "in_editing",
            EpisodeStatus::SentToClient => "sent_to_client",
            EpisodeStatus::Published => "published",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "not_started" => Some(EpisodeStatus::NotStarted),
            "recorded" => Some(EpisodeStatus::Recorded),
            "in_editing" => Some(EpisodeStatus::InEditing),
            "sent_to_client" => Some(EpisodeStatus::SentToClient),
            "published" => Some(EpisodeStatus::Published),
            _ => None,
        }
    }
}

/// Task type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Recording,
    Editing,
    Reels,
    Publishing,
    StudioPreparation,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Recording => "recording",
            TaskType::Editing => "editing",
            TaskType::Reels => "reels",
            TaskType::Publishing => "publishing",
            TaskType::StudioPreparation => "studio_preparation",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "recording" => Some(TaskType::Recording),
            "editing" => Some(TaskType::Editing),
            "reels" => Some(TaskType::Reels),
            "publishing" => Some(TaskType::Publishing),
            "studio_preparation" => Some(TaskType::StudioPreparation),
            _ => None,
        }
    }

    /// Display label for notifications and task notes
    pub fn label(&self) -> &'static str {
        match self {
            TaskType::Recording => "Recording",
            TaskType::Editing => "Editing",
            TaskType::Reels => "Reels",
            TaskType::Publishing => "Publishing",
            TaskType::StudioPreparation => "Studio Preparation",
        }
    }
}

/// Task status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    NotStarted,
    InProgress,
    Blocked,
    /// Editing/reels: work done, awaiting client approval
    SentToClient,
    Done,
    Skipped,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "not_started",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Blocked => "blocked",
            TaskStatus::SentToClient => "sent_to_client",
            TaskStatus::Done => "done",
            TaskStatus::Skipped => "skipped",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "not_started" => Some(TaskStatus::NotStarted),
            "in_progress" => Some(TaskStatus::InProgress),
            "blocked" => Some(TaskStatus::Blocked),
            "sent_to_client" => Some(TaskStatus::SentToClient),
            "done" => Some(TaskStatus::Done),
            "skipped" => Some(TaskStatus::Skipped),
            _ => None,
        }
    }
}

/// Client approval state for editing/reels deliverables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Approval {
    Pending,
    Approved,
    Rejected,
}

impl Approval {
    pub fn as_str(&self) -> &'static str {
        match self {
            Approval::Pending => "pending",
            Approval::Approved => "approved",
            Approval::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Approval::Pending),
            "approved" => Some(Approval::Approved),
            "rejected" => Some(Approval::Rejected),
            _ => None,
        }
    }
}

/// Podcast record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Podcast {
    pub id: Uuid,
    pub name: String,
    pub host: Option<String>,
    pub default_studio_settings: Option<String>,
    /// Free text, e.g. "7", "3 days", "1 week" (see [`crate::allowance`])
    pub tasks_time_allowance: Option<String>,
    pub aliases: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Episode record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Episode {
    pub id: Uuid,
    pub podcast_id: Uuid,
    pub episode_number: Option<String>,
    pub recording_date: Option<DateTime<Utc>>,
    pub studio: Option<String>,
    pub guest_names: Option<String>,
    pub status: EpisodeStatus,
    pub episode_notes: Option<String>,
    pub reels_notes: Option<String>,
    pub studio_settings_override: Option<String>,
    pub client_approved_editing: Approval,
    pub client_approved_reels: Approval,
    pub recording_engineer_id: Option<Uuid>,
    pub editing_engineer_id: Option<Uuid>,
    pub reels_engineer_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Task record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub episode_id: Uuid,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    pub status: TaskStatus,
    pub assigned_to: Option<Uuid>,
    pub due_date: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User (team member / engineer) record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub role: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
