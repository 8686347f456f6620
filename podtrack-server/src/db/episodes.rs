//! Episode persistence
//!
//! Includes the calendar-sync upsert: an atomic insert-or-merge keyed on
//! (podcast_id, episode_number, recording day) with a fill-empty-only merge
//! policy, so a later calendar sync never clobbers manually entered data.

use chrono::{DateTime, Utc};
use podtrack_common::models::{Approval, Episode, EpisodeStatus};
use podtrack_common::{Error, Result};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::clean_text;
use crate::services::event_extractor::EpisodeDraft;

fn parse_uuid(s: &str, what: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| Error::Internal(format!("bad {} id: {}", what, e)))
}

fn opt_uuid(row: &sqlx::sqlite::SqliteRow, col: &str) -> Result<Option<Uuid>> {
    let raw: Option<String> = row.get(col);
    raw.map(|s| parse_uuid(&s, col)).transpose()
}

pub(crate) fn episode_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Episode> {
    let id: String = row.get("id");
    let podcast_id: String = row.get("podcast_id");
    let status: String = row.get("status");
    let approved_editing: String = row.get("client_approved_editing");
    let approved_reels: String = row.get("client_approved_reels");

    Ok(Episode {
        id: parse_uuid(&id, "episode")?,
        podcast_id: parse_uuid(&podcast_id, "podcast")?,
        episode_number: row.get("episode_number"),
        recording_date: row.get("recording_date"),
        studio: row.get("studio"),
        guest_names: row.get("guest_names"),
        status: EpisodeStatus::parse(&status)
            .ok_or_else(|| Error::Internal(format!("invalid episode status: {}", status)))?,
        episode_notes: row.get("episode_notes"),
        reels_notes: row.get("reels_notes"),
        studio_settings_override: row.get("studio_settings_override"),
        client_approved_editing: Approval::parse(&approved_editing)
            .ok_or_else(|| Error::Internal(format!("invalid approval: {}", approved_editing)))?,
        client_approved_reels: Approval::parse(&approved_reels)
            .ok_or_else(|| Error::Internal(format!("invalid approval: {}", approved_reels)))?,
        recording_engineer_id: opt_uuid(row, "recording_engineer_id")?,
        editing_engineer_id: opt_uuid(row, "editing_engineer_id")?,
        reels_engineer_id: opt_uuid(row, "reels_engineer_id")?,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

/// Fields accepted when creating an episode via CRUD
#[derive(Debug, Clone, Default)]
pub struct EpisodeInput {
    pub podcast_id: Uuid,
    pub episode_number: Option<String>,
    pub recording_date: Option<DateTime<Utc>>,
    pub studio: Option<String>,
    pub guest_names: Option<String>,
    pub status: Option<EpisodeStatus>,
    pub episode_notes: Option<String>,
    pub reels_notes: Option<String>,
    pub studio_settings_override: Option<String>,
    pub client_approved_editing: Option<Approval>,
    pub client_approved_reels: Option<Approval>,
    pub recording_engineer_id: Option<Uuid>,
    pub editing_engineer_id: Option<Uuid>,
    pub reels_engineer_id: Option<Uuid>,
}

/// Create a new episode
pub async fn create_episode(pool: &SqlitePool, input: EpisodeInput) -> Result<Episode> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO episodes (
            id, podcast_id, episode_number, recording_date, studio, guest_names,
            status, episode_notes, reels_notes, studio_settings_override,
            client_approved_editing, client_approved_reels,
            recording_engineer_id, editing_engineer_id, reels_engineer_id,
            created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(input.podcast_id.to_string())
    .bind(clean_text(input.episode_number))
    .bind(input.recording_date)
    .bind(clean_text(input.studio))
    .bind(clean_text(input.guest_names))
    .bind(input.status.unwrap_or(EpisodeStatus::NotStarted).as_str())
    .bind(clean_text(input.episode_notes))
    .bind(clean_text(input.reels_notes))
    .bind(clean_text(input.studio_settings_override))
    .bind(input.client_approved_editing.unwrap_or(Approval::Pending).as_str())
    .bind(input.client_approved_reels.unwrap_or(Approval::Pending).as_str())
    .bind(input.recording_engineer_id.map(|u| u.to_string()))
    .bind(input.editing_engineer_id.map(|u| u.to_string()))
    .bind(input.reels_engineer_id.map(|u| u.to_string()))
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    load_episode(pool, id)
        .await?
        .ok_or_else(|| Error::Internal("Episode vanished after insert".to_string()))
}

/// Load episode by id
pub async fn load_episode(pool: &SqlitePool, id: Uuid) -> Result<Option<Episode>> {
    let row = sqlx::query("SELECT * FROM episodes WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;
    row.map(|r| episode_from_row(&r)).transpose()
}

/// Episode list filters
#[derive(Debug, Clone, Default)]
pub struct EpisodeFilter {
    pub podcast_id: Option<Uuid>,
    pub status: Option<EpisodeStatus>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub skip: i64,
    pub limit: i64,
}

/// List episodes, newest recording first, undated episodes last
pub async fn list_episodes(pool: &SqlitePool, filter: EpisodeFilter) -> Result<Vec<Episode>> {
    let mut sql = String::from("SELECT * FROM episodes WHERE 1=1");
    if filter.podcast_id.is_some() {
        sql.push_str(" AND podcast_id = ?");
    }
    if filter.status.is_some() {
        sql.push_str(" AND status = ?");
    }
    if filter.date_from.is_some() {
        sql.push_str(" AND recording_date >= ?");
    }
    if filter.date_to.is_some() {
        sql.push_str(" AND recording_date <= ?");
    }
    sql.push_str(" ORDER BY recording_date IS NULL, recording_date DESC LIMIT ? OFFSET ?");

    let mut query = sqlx::query(&sql);
    if let Some(podcast_id) = filter.podcast_id {
        query = query.bind(podcast_id.to_string());
    }
    if let Some(status) = filter.status {
        query = query.bind(status.as_str());
    }
    if let Some(from) = filter.date_from {
        query = query.bind(from);
    }
    if let Some(to) = filter.date_to {
        query = query.bind(to);
    }
    let limit = if filter.limit > 0 { filter.limit } else { 50 };
    let rows = query.bind(limit).bind(filter.skip).fetch_all(pool).await?;
    rows.iter().map(episode_from_row).collect()
}

/// Episodes whose recording_date falls within `[start, end)`
pub async fn find_in_recording_span(
    pool: &SqlitePool,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<Episode>> {
    let rows = sqlx::query(
        "SELECT * FROM episodes WHERE recording_date >= ? AND recording_date < ? ORDER BY recording_date",
    )
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;
    rows.iter().map(episode_from_row).collect()
}

/// Fields accepted on update; `None` leaves the column unchanged. Text fields
/// sent as empty strings clear the column; the date and engineer fields use a
/// nested option, `Some(None)` clears.
#[derive(Debug, Clone, Default)]
pub struct EpisodeUpdate {
    pub episode_number: Option<String>,
    pub recording_date: Option<Option<DateTime<Utc>>>,
    pub studio: Option<String>,
    pub guest_names: Option<String>,
    pub status: Option<EpisodeStatus>,
    pub episode_notes: Option<String>,
    pub reels_notes: Option<String>,
    pub studio_settings_override: Option<String>,
    pub client_approved_editing: Option<Approval>,
    pub client_approved_reels: Option<Approval>,
    pub recording_engineer_id: Option<Option<Uuid>>,
    pub editing_engineer_id: Option<Option<Uuid>>,
    pub reels_engineer_id: Option<Option<Uuid>>,
}

/// Update an episode; returns the updated record or None if it doesn't exist
pub async fn update_episode(
    pool: &SqlitePool,
    id: Uuid,
    update: EpisodeUpdate,
) -> Result<Option<Episode>> {
    let Some(existing) = load_episode(pool, id).await? else {
        return Ok(None);
    };

    let text = |new: Option<String>, old: Option<String>| match new {
        Some(v) => clean_text(Some(v)),
        None => old,
    };

    let episode_number = text(update.episode_number, existing.episode_number);
    let recording_date = match update.recording_date {
        Some(v) => v,
        None => existing.recording_date,
    };
    let studio = text(update.studio, existing.studio);
    let guest_names = text(update.guest_names, existing.guest_names);
    let status = update.status.unwrap_or(existing.status);
    let episode_notes = text(update.episode_notes, existing.episode_notes);
    let reels_notes = text(update.reels_notes, existing.reels_notes);
    let studio_settings_override =
        text(update.studio_settings_override, existing.studio_settings_override);
    let client_approved_editing = update
        .client_approved_editing
        .unwrap_or(existing.client_approved_editing);
    let client_approved_reels = update
        .client_approved_reels
        .unwrap_or(existing.client_approved_reels);
    let engineer = |new: Option<Option<Uuid>>, old: Option<Uuid>| match new {
        Some(v) => v,
        None => old,
    };
    let recording_engineer_id = engineer(update.recording_engineer_id, existing.recording_engineer_id);
    let editing_engineer_id = engineer(update.editing_engineer_id, existing.editing_engineer_id);
    let reels_engineer_id = engineer(update.reels_engineer_id, existing.reels_engineer_id);

    sqlx::query(
        r#"
        UPDATE episodes SET
            episode_number = ?, recording_date = ?, studio = ?, guest_names = ?,
            status = ?, episode_notes = ?, reels_notes = ?, studio_settings_override = ?,
            client_approved_editing = ?, client_approved_reels = ?,
            recording_engineer_id = ?, editing_engineer_id = ?, reels_engineer_id = ?,
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&episode_number)
    .bind(recording_date)
    .bind(&studio)
    .bind(&guest_names)
    .bind(status.as_str())
    .bind(&episode_notes)
    .bind(&reels_notes)
    .bind(&studio_settings_override)
    .bind(client_approved_editing.as_str())
    .bind(client_approved_reels.as_str())
    .bind(recording_engineer_id.map(|u| u.to_string()))
    .bind(editing_engineer_id.map(|u| u.to_string()))
    .bind(reels_engineer_id.map(|u| u.to_string()))
    .bind(Utc::now())
    .bind(id.to_string())
    .execute(pool)
    .await?;

    load_episode(pool, id).await
}

/// Delete an episode and its tasks. Returns false if it doesn't exist.
pub async fn delete_episode(pool: &SqlitePool, id: Uuid) -> Result<bool> {
    sqlx::query("DELETE FROM tasks WHERE episode_id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;
    let result = sqlx::query("DELETE FROM episodes WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Create or merge an episode from a calendar event draft.
///
/// Drafts carrying both an episode number and a recording date are upserted
/// atomically against the sync-key index: a conflicting row (same podcast,
/// same number, same UTC recording day) is merged fill-empty-only — existing
/// non-empty values win, the recording time-of-day is refreshed from the
/// event. Numberless drafts always insert a new episode.
///
/// Returns the episode and whether it was newly created.
pub async fn upsert_from_draft(
    pool: &SqlitePool,
    podcast_id: Uuid,
    draft: &EpisodeDraft,
) -> Result<(Episode, bool)> {
    let new_id = Uuid::new_v4();
    let now = Utc::now();
    let episode_number = clean_text(draft.episode_number.clone());
    let studio = clean_text(draft.studio.clone());
    let guest_names = clean_text(draft.guest_names.clone());
    let notes = clean_text(draft.notes.clone());

    if episode_number.is_none() {
        // No reliable match key: always a new episode
        let episode = create_episode(
            pool,
            EpisodeInput {
                podcast_id,
                episode_number: None,
                recording_date: Some(draft.recording_date),
                studio,
                guest_names,
                episode_notes: notes,
                ..Default::default()
            },
        )
        .await?;
        return Ok((episode, true));
    }

    let row = sqlx::query(
        r#"
        INSERT INTO episodes (
            id, podcast_id, episode_number, recording_date, studio, guest_names,
            status, episode_notes, client_approved_editing, client_approved_reels,
            created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, 'not_started', ?, 'pending', 'pending', ?, ?)
        ON CONFLICT(podcast_id, episode_number, date(recording_date))
        WHERE episode_number IS NOT NULL AND recording_date IS NOT NULL
        DO UPDATE SET
            recording_date = excluded.recording_date,
            studio = COALESCE(NULLIF(episodes.studio, ''), excluded.studio),
            guest_names = COALESCE(NULLIF(episodes.guest_names, ''), excluded.guest_names),
            episode_notes = COALESCE(NULLIF(episodes.episode_notes, ''), excluded.episode_notes),
            updated_at = excluded.updated_at
        RETURNING id
        "#,
    )
    .bind(new_id.to_string())
    .bind(podcast_id.to_string())
    .bind(&episode_number)
    .bind(draft.recording_date)
    .bind(&studio)
    .bind(&guest_names)
    .bind(&notes)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await?;

    let returned: String = row.get("id");
    let created = returned == new_id.to_string();
    let episode = load_episode(pool, parse_uuid(&returned, "episode")?)
        .await?
        .ok_or_else(|| Error::Internal("Episode vanished after upsert".to_string()))?;
    Ok((episode, created))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::podcasts::{create_podcast, PodcastInput};

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");
        crate::db::init_tables(&pool).await.unwrap();
        pool
    }

    fn draft(number: Option<&str>, date: &str) -> EpisodeDraft {
        EpisodeDraft {
            podcast_candidate: Some("Show".to_string()),
            podcast_id_hint: None,
            episode_number: number.map(|s| s.to_string()),
            recording_date: date.parse().unwrap(),
            studio: None,
            guest_names: None,
            notes: None,
        }
    }

    async fn make_podcast(pool: &SqlitePool) -> Uuid {
        create_podcast(
            pool,
            PodcastInput {
                name: "Show".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .id
    }

    #[tokio::test]
    async fn test_upsert_creates_then_matches_same_day() {
        let pool = test_pool().await;
        let podcast_id = make_podcast(&pool).await;

        let (first, created) =
            upsert_from_draft(&pool, podcast_id, &draft(Some("33"), "2026-03-15T10:00:00Z"))
                .await
                .unwrap();
        assert!(created);

        // Same number, same day, later time: matches and refreshes the time
        let (second, created) =
            upsert_from_draft(&pool, podcast_id, &draft(Some("33"), "2026-03-15T14:00:00Z"))
                .await
                .unwrap();
        assert!(!created);
        assert_eq!(second.id, first.id);
        assert_eq!(
            second.recording_date.unwrap().to_rfc3339(),
            "2026-03-15T14:00:00+00:00"
        );
    }

    #[tokio::test]
    async fn test_upsert_fill_empty_only() {
        let pool = test_pool().await;
        let podcast_id = make_podcast(&pool).await;

        let mut d = draft(Some("5"), "2026-03-15T10:00:00Z");
        d.studio = Some("TLV".to_string());
        upsert_from_draft(&pool, podcast_id, &d).await.unwrap();

        // Existing studio is never overwritten; empty guest_names is filled
        let mut d2 = draft(Some("5"), "2026-03-15T10:00:00Z");
        d2.studio = Some("Other".to_string());
        d2.guest_names = Some("John Doe".to_string());
        let (merged, created) = upsert_from_draft(&pool, podcast_id, &d2).await.unwrap();
        assert!(!created);
        assert_eq!(merged.studio.as_deref(), Some("TLV"));
        assert_eq!(merged.guest_names.as_deref(), Some("John Doe"));
    }

    #[tokio::test]
    async fn test_different_number_same_day_is_new_episode() {
        let pool = test_pool().await;
        let podcast_id = make_podcast(&pool).await;

        let (a, _) = upsert_from_draft(&pool, podcast_id, &draft(Some("33"), "2026-03-15T10:00:00Z"))
            .await
            .unwrap();
        let (b, created) =
            upsert_from_draft(&pool, podcast_id, &draft(Some("34"), "2026-03-15T11:00:00Z"))
                .await
                .unwrap();
        assert!(created);
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn test_numberless_drafts_never_merge() {
        let pool = test_pool().await;
        let podcast_id = make_podcast(&pool).await;

        let (a, _) = upsert_from_draft(&pool, podcast_id, &draft(None, "2026-03-15T10:00:00Z"))
            .await
            .unwrap();
        let (b, created) = upsert_from_draft(&pool, podcast_id, &draft(None, "2026-03-15T10:00:00Z"))
            .await
            .unwrap();
        assert!(created);
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn test_update_clears_engineer_and_date_with_nested_none() {
        let pool = test_pool().await;
        let podcast_id = make_podcast(&pool).await;
        let engineer = crate::db::users::create_user(
            &pool,
            crate::db::users::UserInput {
                name: "Engineer".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .id;

        let episode = create_episode(
            &pool,
            EpisodeInput {
                podcast_id,
                episode_number: Some("1".to_string()),
                recording_date: Some("2026-03-15T10:00:00Z".parse().unwrap()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        sqlx::query("UPDATE episodes SET editing_engineer_id = ? WHERE id = ?")
            .bind(engineer.to_string())
            .bind(episode.id.to_string())
            .execute(&pool)
            .await
            .unwrap();

        // Omitted fields stay put
        let untouched = update_episode(
            &pool,
            episode.id,
            EpisodeUpdate {
                studio: Some("TLV".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(untouched.editing_engineer_id, Some(engineer));
        assert!(untouched.recording_date.is_some());

        // Nested None unassigns the engineer and clears the date
        let cleared = update_episode(
            &pool,
            episode.id,
            EpisodeUpdate {
                editing_engineer_id: Some(None),
                recording_date: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(cleared.editing_engineer_id, None);
        assert_eq!(cleared.recording_date, None);
        assert_eq!(cleared.studio.as_deref(), Some("TLV"));
    }

    #[tokio::test]
    async fn test_list_orders_undated_last() {
        let pool = test_pool().await;
        let podcast_id = make_podcast(&pool).await;

        create_episode(
            &pool,
            EpisodeInput {
                podcast_id,
                episode_number: Some("1".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        create_episode(
            &pool,
            EpisodeInput {
                podcast_id,
                episode_number: Some("2".to_string()),
                recording_date: Some("2026-03-15T10:00:00Z".parse().unwrap()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let listed = list_episodes(
            &pool,
            EpisodeFilter {
                limit: 10,
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].episode_number.as_deref(), Some("2"));
        assert_eq!(listed[1].episode_number.as_deref(), Some("1"));
    }
}
