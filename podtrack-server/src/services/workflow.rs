//! Workflow engine
//!
//! Drives the episode and task lifecycle:
//!
//! - daily run: today's recordings from the calendar (DB fallback when the
//!   gateway is unavailable), studio preparation tasks, stale-task cleanup
//! - calendar sync: idempotent episode upserts over a lookahead window
//! - status cascades: episode recorded, client approvals, task completion
//!
//! Entry points take an explicit `now` so clock-dependent behavior stays
//! testable.

use chrono::{DateTime, Duration, Utc};
use podtrack_common::allowance::parse_allowance;
use podtrack_common::config::CalendarSettings;
use podtrack_common::models::{
    Approval, Episode, EpisodeStatus, Podcast, Task, TaskStatus, TaskType,
};
use podtrack_common::{Error, Result};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::db::episodes::{self, upsert_from_draft, EpisodeUpdate};
use crate::db::podcasts;
use crate::db::tasks::{self, TaskInput};
use crate::services::calendar::CalendarGateway;
use crate::services::event_extractor::{extract_drafts, EpisodeDraft};
use crate::services::podcast_resolver;
use podtrack_common::time::local_day_span;

/// Editing/reels/publishing due-date allowance when the podcast sets none
fn default_allowance() -> Duration {
    Duration::days(2)
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct DailySummary {
    pub episodes_processed: u64,
    pub tasks_created: u64,
    pub stale_tasks_deleted: u64,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SyncSummary {
    pub created: u64,
    pub updated: u64,
    pub skipped: u64,
}

/// Daily workflow: ensure every episode recording today has a studio
/// preparation task, and drop studio preparation tasks more than a day
/// overdue.
///
/// "Today" is the calendar day of `now` in the configured timezone. When the
/// calendar gateway is unavailable the run falls back to episodes already in
/// the database whose recording date falls today.
pub async fn run_daily(
    pool: &SqlitePool,
    gateway: &dyn CalendarGateway,
    settings: &CalendarSettings,
    now: DateTime<Utc>,
) -> Result<DailySummary> {
    let (day_start, day_end) = local_day_span(now, settings.timezone);
    let stale_tasks_deleted = tasks::delete_stale_studio_prep(pool, now).await?;

    let episodes = match gateway.fetch_events(day_start, day_end).await {
        Ok(events) => {
            let drafts = extract_drafts(&events, settings.timezone);
            let mut episodes: Vec<Episode> = Vec::new();
            for draft in &drafts {
                match resolve_and_upsert(pool, draft).await {
                    Ok(Some((episode, _))) => episodes.push(episode),
                    Ok(None) => {}
                    Err(e) => {
                        warn!(
                            episodes_processed = episodes.len(),
                            stale_deleted = stale_tasks_deleted,
                            "Daily workflow aborted mid-batch: {}",
                            e
                        );
                        return Err(Error::Internal(format!(
                            "Daily workflow aborted after {} episodes: {}",
                            episodes.len(),
                            e
                        )));
                    }
                }
            }
            episodes
        }
        Err(e) => {
            warn!("Calendar unavailable, using stored episodes for today: {}", e);
            episodes::find_in_recording_span(pool, day_start, day_end).await?
        }
    };

    let mut tasks_created = 0;
    for episode in &episodes {
        match ensure_studio_prep(pool, episode, now).await {
            Ok(true) => tasks_created += 1,
            Ok(false) => {}
            Err(e) => {
                warn!(
                    tasks_created,
                    stale_deleted = stale_tasks_deleted,
                    "Daily workflow aborted during task creation: {}",
                    e
                );
                return Err(Error::Internal(format!(
                    "Daily workflow aborted after {} studio preparation tasks: {}",
                    tasks_created, e
                )));
            }
        }
    }

    let summary = DailySummary {
        episodes_processed: episodes.len() as u64,
        tasks_created,
        stale_tasks_deleted,
    };
    info!(
        episodes = summary.episodes_processed,
        tasks_created = summary.tasks_created,
        stale_deleted = summary.stale_tasks_deleted,
        "Daily workflow complete"
    );
    Ok(summary)
}

/// Calendar sync: upsert episodes for events from the start of today through
/// `days_ahead` days. Unlike the daily run there is no database fallback; an
/// unavailable gateway syncs nothing.
pub async fn sync_calendar(
    pool: &SqlitePool,
    gateway: &dyn CalendarGateway,
    settings: &CalendarSettings,
    days_ahead: i64,
    now: DateTime<Utc>,
) -> Result<SyncSummary> {
    let (day_start, _) = local_day_span(now, settings.timezone);
    let window_end = day_start + Duration::days(days_ahead);

    let events = match gateway.fetch_events(day_start, window_end).await {
        Ok(events) => events,
        Err(e) => {
            warn!("Calendar unavailable, nothing to sync: {}", e);
            return Ok(SyncSummary::default());
        }
    };

    let drafts = extract_drafts(&events, settings.timezone);
    let mut summary = SyncSummary::default();
    for draft in &drafts {
        match resolve_and_upsert(pool, draft).await {
            Ok(Some((_, true))) => summary.created += 1,
            Ok(Some((_, false))) => summary.updated += 1,
            Ok(None) => summary.skipped += 1,
            Err(e) => {
                // Successes already written stay written; report how far we got
                warn!(
                    created = summary.created,
                    updated = summary.updated,
                    skipped = summary.skipped,
                    "Calendar sync aborted mid-batch: {}",
                    e
                );
                return Err(Error::Internal(format!(
                    "Calendar sync aborted after {} created, {} updated, {} skipped: {}",
                    summary.created, summary.updated, summary.skipped, e
                )));
            }
        }
    }
    info!(
        created = summary.created,
        updated = summary.updated,
        skipped = summary.skipped,
        "Calendar sync complete"
    );
    Ok(summary)
}

/// Resolve the draft's podcast and upsert the episode. Returns None when no
/// podcast matches; unknown podcasts are never auto-created.
async fn resolve_and_upsert(
    pool: &SqlitePool,
    draft: &EpisodeDraft,
) -> Result<Option<(Episode, bool)>> {
    let podcast_id = match draft.podcast_id_hint {
        Some(id) => match podcasts::load_podcast(pool, id).await? {
            Some(podcast) => Some(podcast.id),
            None => {
                warn!(podcast_id = %id, "Event references unknown podcast id, skipping");
                None
            }
        },
        None => {
            let candidate = draft.podcast_candidate.as_deref().unwrap_or("");
            let known = podcasts::list_podcasts(pool, 0, i64::MAX).await?;
            podcast_resolver::resolve(&known, candidate).map(|p| p.id)
        }
    };

    let Some(podcast_id) = podcast_id else {
        warn!(
            candidate = ?draft.podcast_candidate,
            "No podcast matched calendar event, skipping"
        );
        return Ok(None);
    };

    let (episode, created) = upsert_from_draft(pool, podcast_id, draft).await?;
    if created {
        info!(episode_id = %episode.id, number = ?episode.episode_number, "Episode created from calendar");
    }
    Ok(Some((episode, created)))
}

/// Idempotently create the studio preparation task for an episode recorded
/// today. Due one hour before the recording, clamped so it is never in the
/// past; assigned to the recording engineer; notes carry the effective studio
/// settings plus any episode notes.
async fn ensure_studio_prep(pool: &SqlitePool, episode: &Episode, now: DateTime<Utc>) -> Result<bool> {
    let podcast = podcasts::load_podcast(pool, episode.podcast_id).await?;

    let due = episode
        .recording_date
        .map(|d| d - Duration::hours(1))
        .map(|d| if d < now { now } else { d })
        .unwrap_or(now);

    let settings = episode
        .studio_settings_override
        .clone()
        .or_else(|| podcast.as_ref().and_then(|p| p.default_studio_settings.clone()));
    let mut parts = Vec::new();
    if let Some(settings) = settings {
        parts.push(format!("Studio settings: {}", settings));
    }
    if let Some(notes) = &episode.episode_notes {
        parts.push(notes.clone());
    }
    let notes = if parts.is_empty() { None } else { Some(parts.join("\n")) };

    let (_, created) = tasks::ensure_task(
        pool,
        TaskInput {
            episode_id: episode.id,
            task_type: TaskType::StudioPreparation,
            status: TaskStatus::NotStarted,
            assigned_to: episode.recording_engineer_id,
            due_date: Some(due),
            notes,
        },
    )
    .await?;
    if created {
        info!(episode_id = %episode.id, "Studio preparation task created");
    }
    Ok(created)
}

fn allowance_for(podcast: Option<&Podcast>) -> Duration {
    podcast
        .and_then(|p| p.tasks_time_allowance.as_deref())
        .and_then(parse_allowance)
        .unwrap_or_else(default_allowance)
}

/// React to an episode update: the recorded transition spawns editing and
/// reels tasks and completes studio preparation; client approvals complete or
/// reopen their task, and once both are approved a publishing task appears.
///
/// Returns the number of tasks created.
pub async fn apply_episode_change(
    pool: &SqlitePool,
    before: &Episode,
    after: &Episode,
    now: DateTime<Utc>,
) -> Result<u64> {
    let podcast = podcasts::load_podcast(pool, after.podcast_id).await?;
    let allowance = allowance_for(podcast.as_ref());
    let mut created = 0;

    if before.status != EpisodeStatus::Recorded && after.status == EpisodeStatus::Recorded {
        if let Some(prep) =
            tasks::find_by_episode_and_type(pool, after.id, TaskType::StudioPreparation).await?
        {
            if prep.status != TaskStatus::Done {
                tasks::mark_done(pool, prep.id, now).await?;
            }
        }

        let due = after.recording_date.unwrap_or(now) + allowance;
        let (_, was_new) = tasks::ensure_task(
            pool,
            TaskInput {
                episode_id: after.id,
                task_type: TaskType::Editing,
                status: TaskStatus::NotStarted,
                assigned_to: after.editing_engineer_id,
                due_date: Some(due),
                notes: None,
            },
        )
        .await?;
        if was_new {
            created += 1;
        }
        let (_, was_new) = tasks::ensure_task(
            pool,
            TaskInput {
                episode_id: after.id,
                task_type: TaskType::Reels,
                status: TaskStatus::NotStarted,
                assigned_to: after.reels_engineer_id,
                due_date: Some(due),
                notes: after.reels_notes.clone(),
            },
        )
        .await?;
        if was_new {
            created += 1;
        }
        info!(episode_id = %after.id, "Episode recorded, editing and reels tasks ensured");
    }

    if before.client_approved_editing != after.client_approved_editing {
        apply_approval(pool, after.id, TaskType::Editing, after.client_approved_editing, now)
            .await?;
    }
    if before.client_approved_reels != after.client_approved_reels {
        apply_approval(pool, after.id, TaskType::Reels, after.client_approved_reels, now).await?;
    }

    let both_approved = after.client_approved_editing == Approval::Approved
        && after.client_approved_reels == Approval::Approved;
    let was_both_approved = before.client_approved_editing == Approval::Approved
        && before.client_approved_reels == Approval::Approved;
    if both_approved && !was_both_approved {
        let (_, was_new) = tasks::ensure_task(
            pool,
            TaskInput {
                episode_id: after.id,
                task_type: TaskType::Publishing,
                status: TaskStatus::NotStarted,
                assigned_to: None,
                due_date: Some(now + allowance),
                notes: None,
            },
        )
        .await?;
        if was_new {
            created += 1;
            info!(episode_id = %after.id, "Both approvals in, publishing task created");
        }
    }

    Ok(created)
}

/// Approval transitions: approved completes the matching task; a rejection
/// after completion reopens it as in_progress.
async fn apply_approval(
    pool: &SqlitePool,
    episode_id: uuid::Uuid,
    task_type: TaskType,
    approval: Approval,
    now: DateTime<Utc>,
) -> Result<()> {
    let Some(task) = tasks::find_by_episode_and_type(pool, episode_id, task_type).await? else {
        return Ok(());
    };
    match approval {
        Approval::Approved if task.status != TaskStatus::Done => {
            tasks::mark_done(pool, task.id, now).await?;
            info!(episode_id = %episode_id, task = task_type.as_str(), "Client approved, task completed");
        }
        Approval::Rejected if task.status == TaskStatus::Done => {
            tasks::reset_to_in_progress(pool, task.id, now).await?;
            info!(episode_id = %episode_id, task = task_type.as_str(), "Client rejected, task reopened");
        }
        _ => {}
    }
    Ok(())
}

/// React to a task update: finishing studio preparation spawns the recording
/// task; finishing recording marks the episode recorded and cascades.
pub async fn apply_task_change(
    pool: &SqlitePool,
    before: &Task,
    after: &Task,
    now: DateTime<Utc>,
) -> Result<()> {
    if before.status == TaskStatus::Done || after.status != TaskStatus::Done {
        return Ok(());
    }
    let Some(episode) = episodes::load_episode(pool, after.episode_id).await? else {
        return Ok(());
    };

    match after.task_type {
        TaskType::StudioPreparation => {
            let due = episode
                .recording_date
                .map(|d| if d < now { now } else { d })
                .unwrap_or(now);
            let (_, created) = tasks::ensure_task(
                pool,
                TaskInput {
                    episode_id: episode.id,
                    task_type: TaskType::Recording,
                    status: TaskStatus::NotStarted,
                    assigned_to: episode.recording_engineer_id,
                    due_date: Some(due),
                    notes: None,
                },
            )
            .await?;
            if created {
                info!(episode_id = %episode.id, "Studio ready, recording task created");
            }
        }
        TaskType::Recording => {
            if episode.status == EpisodeStatus::NotStarted {
                let updated = episodes::update_episode(
                    pool,
                    episode.id,
                    EpisodeUpdate {
                        status: Some(EpisodeStatus::Recorded),
                        ..Default::default()
                    },
                )
                .await?;
                if let Some(updated) = updated {
                    apply_episode_change(pool, &episode, &updated, now).await?;
                }
            }
        }
        _ => {}
    }
    Ok(())
}
