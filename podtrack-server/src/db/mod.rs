//! Database access for podtrack
//!
//! SQLite via sqlx. All datetimes are stored UTC-normalized; uniqueness of
//! automation-created rows is enforced at the store level (partial unique
//! index on the episode sync key, unique index on (episode_id, type) for
//! tasks) so concurrent workflow runs cannot create duplicates.

pub mod episodes;
pub mod podcasts;
pub mod tasks;
pub mod users;

use podtrack_common::Result;
use sqlx::SqlitePool;

/// Initialize database connection pool and create tables
pub async fn init_database_pool(db_url: &str) -> Result<SqlitePool> {
    tracing::debug!("Connecting to database: {}", db_url);
    let pool = SqlitePool::connect(db_url).await?;
    init_tables(&pool).await?;
    Ok(pool)
}

/// Create podtrack tables and indexes if they don't exist
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS podcasts (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            host TEXT,
            default_studio_settings TEXT,
            tasks_time_allowance TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_podcasts_name ON podcasts(name)")
        .execute(pool)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS podcast_aliases (
            id TEXT PRIMARY KEY,
            podcast_id TEXT NOT NULL REFERENCES podcasts(id) ON DELETE CASCADE,
            alias TEXT NOT NULL UNIQUE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_podcast_aliases_podcast ON podcast_aliases(podcast_id)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            email TEXT,
            role TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS episodes (
            id TEXT PRIMARY KEY,
            podcast_id TEXT NOT NULL REFERENCES podcasts(id),
            episode_number TEXT,
            recording_date TEXT,
            studio TEXT,
            guest_names TEXT,
            status TEXT NOT NULL DEFAULT 'not_started',
            episode_notes TEXT,
            reels_notes TEXT,
            studio_settings_override TEXT,
            client_approved_editing TEXT NOT NULL DEFAULT 'pending',
            client_approved_reels TEXT NOT NULL DEFAULT 'pending',
            recording_engineer_id TEXT REFERENCES users(id),
            editing_engineer_id TEXT REFERENCES users(id),
            reels_engineer_id TEXT REFERENCES users(id),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_episodes_podcast ON episodes(podcast_id)")
        .execute(pool)
        .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_episodes_recording_date ON episodes(recording_date)",
    )
    .execute(pool)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_episodes_status ON episodes(status)")
        .execute(pool)
        .await?;

    // Calendar sync match key: one episode per (podcast, number, recording day).
    // Partial: numberless or dateless episodes deliberately always insert new.
    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_episodes_sync_key
        ON episodes(podcast_id, episode_number, date(recording_date))
        WHERE episode_number IS NOT NULL AND recording_date IS NOT NULL
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tasks (
            id TEXT PRIMARY KEY,
            episode_id TEXT NOT NULL REFERENCES episodes(id) ON DELETE CASCADE,
            type TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'not_started',
            assigned_to TEXT REFERENCES users(id),
            due_date TEXT,
            completed_at TEXT,
            notes TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_tasks_episode_type ON tasks(episode_id, type)",
    )
    .execute(pool)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_tasks_assigned ON tasks(assigned_to)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_tasks_due ON tasks(due_date)")
        .execute(pool)
        .await?;

    tracing::info!("Database tables initialized (podcasts, podcast_aliases, users, episodes, tasks)");

    Ok(())
}

/// Normalize an optional free-text field: trimmed, empty becomes NULL.
pub(crate) fn clean_text(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim().to_string();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    })
}
