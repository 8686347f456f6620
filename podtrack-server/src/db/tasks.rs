//! Task persistence
//!
//! Automation-created tasks are guarded by the unique (episode_id, type)
//! index: `ensure_task` is an insert-if-missing that is safe to race.

use chrono::{DateTime, Duration, Utc};
use podtrack_common::models::{Task, TaskStatus, TaskType};
use podtrack_common::{Error, Result};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::clean_text;

pub(crate) fn task_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Task> {
    let id: String = row.get("id");
    let episode_id: String = row.get("episode_id");
    let task_type: String = row.get("type");
    let status: String = row.get("status");
    let assigned_to: Option<String> = row.get("assigned_to");

    Ok(Task {
        id: Uuid::parse_str(&id).map_err(|e| Error::Internal(format!("bad task id: {}", e)))?,
        episode_id: Uuid::parse_str(&episode_id)
            .map_err(|e| Error::Internal(format!("bad episode id: {}", e)))?,
        task_type: TaskType::parse(&task_type)
            .ok_or_else(|| Error::Internal(format!("invalid task type: {}", task_type)))?,
        status: TaskStatus::parse(&status)
            .ok_or_else(|| Error::Internal(format!("invalid task status: {}", status)))?,
        assigned_to: assigned_to
            .map(|s| Uuid::parse_str(&s).map_err(|e| Error::Internal(format!("bad user id: {}", e))))
            .transpose()?,
        due_date: row.get("due_date"),
        completed_at: row.get("completed_at"),
        notes: row.get("notes"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

/// Fields accepted when creating a task
#[derive(Debug, Clone)]
pub struct TaskInput {
    pub episode_id: Uuid,
    pub task_type: TaskType,
    pub status: TaskStatus,
    pub assigned_to: Option<Uuid>,
    pub due_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

/// Create a task. Fails with a unique-constraint error if a task of the same
/// type already exists for the episode.
pub async fn create_task(pool: &SqlitePool, input: TaskInput) -> Result<Task> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO tasks (id, episode_id, type, status, assigned_to, due_date, notes, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(input.episode_id.to_string())
    .bind(input.task_type.as_str())
    .bind(input.status.as_str())
    .bind(input.assigned_to.map(|u| u.to_string()))
    .bind(input.due_date)
    .bind(clean_text(input.notes))
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    load_task(pool, id)
        .await?
        .ok_or_else(|| Error::Internal("Task vanished after insert".to_string()))
}

/// Idempotently create a task of the given type for an episode.
///
/// Insert-or-ignore against the (episode_id, type) unique index; the
/// surviving row is returned along with whether this call created it.
pub async fn ensure_task(pool: &SqlitePool, input: TaskInput) -> Result<(Task, bool)> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO tasks (id, episode_id, type, status, assigned_to, due_date, notes, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(episode_id, type) DO NOTHING
        "#,
    )
    .bind(id.to_string())
    .bind(input.episode_id.to_string())
    .bind(input.task_type.as_str())
    .bind(input.status.as_str())
    .bind(input.assigned_to.map(|u| u.to_string()))
    .bind(input.due_date)
    .bind(clean_text(input.notes))
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    let created = result.rows_affected() > 0;
    let task = find_by_episode_and_type(pool, input.episode_id, input.task_type)
        .await?
        .ok_or_else(|| Error::Internal("Task vanished after ensure".to_string()))?;
    Ok((task, created))
}

/// Load task by id
pub async fn load_task(pool: &SqlitePool, id: Uuid) -> Result<Option<Task>> {
    let row = sqlx::query("SELECT * FROM tasks WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;
    row.map(|r| task_from_row(&r)).transpose()
}

/// Find the task of a given type for an episode
pub async fn find_by_episode_and_type(
    pool: &SqlitePool,
    episode_id: Uuid,
    task_type: TaskType,
) -> Result<Option<Task>> {
    let row = sqlx::query("SELECT * FROM tasks WHERE episode_id = ? AND type = ?")
        .bind(episode_id.to_string())
        .bind(task_type.as_str())
        .fetch_optional(pool)
        .await?;
    row.map(|r| task_from_row(&r)).transpose()
}

/// Task list filters
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub episode_id: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
    pub status: Option<TaskStatus>,
    pub task_type: Option<TaskType>,
    pub skip: i64,
    pub limit: i64,
}

/// List tasks ordered by due date (undated last). Studio preparation tasks
/// more than one day overdue are excluded; the daily workflow deletes them.
pub async fn list_tasks(
    pool: &SqlitePool,
    filter: TaskFilter,
    now: DateTime<Utc>,
) -> Result<Vec<Task>> {
    let stale_cutoff = now - Duration::days(1);

    let mut sql = String::from(
        "SELECT * FROM tasks WHERE (type != 'studio_preparation' OR due_date IS NULL OR due_date >= ?)",
    );
    if filter.episode_id.is_some() {
        sql.push_str(" AND episode_id = ?");
    }
    if filter.assigned_to.is_some() {
        sql.push_str(" AND assigned_to = ?");
    }
    if filter.status.is_some() {
        sql.push_str(" AND status = ?");
    }
    if filter.task_type.is_some() {
        sql.push_str(" AND type = ?");
    }
    sql.push_str(" ORDER BY due_date IS NULL, due_date LIMIT ? OFFSET ?");

    let mut query = sqlx::query(&sql).bind(stale_cutoff);
    if let Some(episode_id) = filter.episode_id {
        query = query.bind(episode_id.to_string());
    }
    if let Some(assigned_to) = filter.assigned_to {
        query = query.bind(assigned_to.to_string());
    }
    if let Some(status) = filter.status {
        query = query.bind(status.as_str());
    }
    if let Some(task_type) = filter.task_type {
        query = query.bind(task_type.as_str());
    }
    let limit = if filter.limit > 0 { filter.limit } else { 100 };
    let rows = query.bind(limit).bind(filter.skip).fetch_all(pool).await?;
    rows.iter().map(task_from_row).collect()
}

/// Fields accepted on update; `None` leaves the column unchanged
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    pub status: Option<TaskStatus>,
    pub assigned_to: Option<Uuid>,
    pub due_date: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

/// Update a task; returns the updated record or None if it doesn't exist
pub async fn update_task(pool: &SqlitePool, id: Uuid, update: TaskUpdate) -> Result<Option<Task>> {
    let Some(existing) = load_task(pool, id).await? else {
        return Ok(None);
    };

    let status = update.status.unwrap_or(existing.status);
    // Completion timestamp tracks the done transition unless set explicitly
    let completed_at = match (update.completed_at, status) {
        (Some(at), _) => Some(at),
        (None, TaskStatus::Done) if existing.status != TaskStatus::Done => Some(Utc::now()),
        (None, TaskStatus::Done) => existing.completed_at,
        (None, _) => None,
    };
    let notes = match update.notes {
        Some(v) => clean_text(Some(v)),
        None => existing.notes,
    };

    sqlx::query(
        r#"
        UPDATE tasks SET status = ?, assigned_to = ?, due_date = ?, completed_at = ?, notes = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(status.as_str())
    .bind(update.assigned_to.or(existing.assigned_to).map(|u| u.to_string()))
    .bind(update.due_date.or(existing.due_date))
    .bind(completed_at)
    .bind(&notes)
    .bind(Utc::now())
    .bind(id.to_string())
    .execute(pool)
    .await?;

    load_task(pool, id).await
}

/// Mark a task done with a completion timestamp
pub async fn mark_done(pool: &SqlitePool, id: Uuid, now: DateTime<Utc>) -> Result<()> {
    sqlx::query("UPDATE tasks SET status = 'done', completed_at = ?, updated_at = ? WHERE id = ?")
        .bind(now)
        .bind(now)
        .bind(id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

/// Reset a task to in_progress, clearing its completion timestamp
pub async fn reset_to_in_progress(pool: &SqlitePool, id: Uuid, now: DateTime<Utc>) -> Result<()> {
    sqlx::query(
        "UPDATE tasks SET status = 'in_progress', completed_at = NULL, updated_at = ? WHERE id = ?",
    )
    .bind(now)
    .bind(id.to_string())
    .execute(pool)
    .await?;
    Ok(())
}

/// Delete a task. Returns false if it doesn't exist.
pub async fn delete_task(pool: &SqlitePool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Delete studio preparation tasks more than one day overdue (UTC),
/// regardless of status. Returns the number deleted.
pub async fn delete_stale_studio_prep(pool: &SqlitePool, now: DateTime<Utc>) -> Result<u64> {
    let cutoff = now - Duration::days(1);
    let result = sqlx::query(
        "DELETE FROM tasks WHERE type = 'studio_preparation' AND due_date IS NOT NULL AND due_date < ?",
    )
    .bind(cutoff)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}
