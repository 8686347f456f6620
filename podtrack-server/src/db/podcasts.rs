//! Podcast persistence

use chrono::Utc;
use podtrack_common::models::Podcast;
use podtrack_common::{Error, Result};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::clean_text;

/// Fields accepted when creating or replacing a podcast
#[derive(Debug, Clone, Default)]
pub struct PodcastInput {
    pub name: String,
    pub host: Option<String>,
    pub default_studio_settings: Option<String>,
    pub tasks_time_allowance: Option<String>,
    pub aliases: Vec<String>,
}

fn podcast_from_row(row: &sqlx::sqlite::SqliteRow, aliases: Vec<String>) -> Result<Podcast> {
    let id: String = row.get("id");
    Ok(Podcast {
        id: Uuid::parse_str(&id).map_err(|e| Error::Internal(format!("bad podcast id: {}", e)))?,
        name: row.get("name"),
        host: row.get("host"),
        default_studio_settings: row.get("default_studio_settings"),
        tasks_time_allowance: row.get("tasks_time_allowance"),
        aliases,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

async fn load_aliases(pool: &SqlitePool, podcast_id: Uuid) -> Result<Vec<String>> {
    let rows = sqlx::query("SELECT alias FROM podcast_aliases WHERE podcast_id = ? ORDER BY alias")
        .bind(podcast_id.to_string())
        .fetch_all(pool)
        .await?;
    Ok(rows.iter().map(|r| r.get("alias")).collect())
}

/// Replace the alias set of a podcast
pub async fn set_aliases(pool: &SqlitePool, podcast_id: Uuid, aliases: &[String]) -> Result<()> {
    sqlx::query("DELETE FROM podcast_aliases WHERE podcast_id = ?")
        .bind(podcast_id.to_string())
        .execute(pool)
        .await?;
    for alias in aliases {
        let alias = alias.trim();
        if alias.is_empty() {
            continue;
        }
        sqlx::query(
            "INSERT INTO podcast_aliases (id, podcast_id, alias) VALUES (?, ?, ?)
             ON CONFLICT(alias) DO NOTHING",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(podcast_id.to_string())
        .bind(alias)
        .execute(pool)
        .await?;
    }
    Ok(())
}

/// Create a new podcast
pub async fn create_podcast(pool: &SqlitePool, input: PodcastInput) -> Result<Podcast> {
    let name = input.name.trim().to_string();
    if name.is_empty() {
        return Err(Error::InvalidInput("Podcast name must not be empty".to_string()));
    }
    let id = Uuid::new_v4();
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO podcasts (id, name, host, default_studio_settings, tasks_time_allowance, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(&name)
    .bind(clean_text(input.host))
    .bind(clean_text(input.default_studio_settings))
    .bind(clean_text(input.tasks_time_allowance))
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    set_aliases(pool, id, &input.aliases).await?;

    load_podcast(pool, id)
        .await?
        .ok_or_else(|| Error::Internal("Podcast vanished after insert".to_string()))
}

/// Load podcast by id (aliases included)
pub async fn load_podcast(pool: &SqlitePool, id: Uuid) -> Result<Option<Podcast>> {
    let row = sqlx::query("SELECT * FROM podcasts WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;
    match row {
        Some(row) => {
            let aliases = load_aliases(pool, id).await?;
            Ok(Some(podcast_from_row(&row, aliases)?))
        }
        None => Ok(None),
    }
}

/// List podcasts ordered by name
pub async fn list_podcasts(pool: &SqlitePool, skip: i64, limit: i64) -> Result<Vec<Podcast>> {
    let rows = sqlx::query("SELECT * FROM podcasts ORDER BY name LIMIT ? OFFSET ?")
        .bind(limit)
        .bind(skip)
        .fetch_all(pool)
        .await?;
    let mut podcasts = Vec::with_capacity(rows.len());
    for row in &rows {
        let id: String = row.get("id");
        let id = Uuid::parse_str(&id).map_err(|e| Error::Internal(format!("bad podcast id: {}", e)))?;
        let aliases = load_aliases(pool, id).await?;
        podcasts.push(podcast_from_row(row, aliases)?);
    }
    Ok(podcasts)
}

/// Fields accepted on update; `None` leaves the column unchanged, an empty
/// string clears it.
#[derive(Debug, Clone, Default)]
pub struct PodcastUpdate {
    pub name: Option<String>,
    pub host: Option<String>,
    pub default_studio_settings: Option<String>,
    pub tasks_time_allowance: Option<String>,
    pub aliases: Option<Vec<String>>,
}

/// Update a podcast; returns the updated record or None if it doesn't exist
pub async fn update_podcast(
    pool: &SqlitePool,
    id: Uuid,
    update: PodcastUpdate,
) -> Result<Option<Podcast>> {
    let Some(existing) = load_podcast(pool, id).await? else {
        return Ok(None);
    };

    let name = match update.name {
        Some(n) if !n.trim().is_empty() => n.trim().to_string(),
        Some(_) => return Err(Error::InvalidInput("Podcast name must not be empty".to_string())),
        None => existing.name,
    };
    let host = match update.host {
        Some(v) => clean_text(Some(v)),
        None => existing.host,
    };
    let default_studio_settings = match update.default_studio_settings {
        Some(v) => clean_text(Some(v)),
        None => existing.default_studio_settings,
    };
    let tasks_time_allowance = match update.tasks_time_allowance {
        Some(v) => clean_text(Some(v)),
        None => existing.tasks_time_allowance,
    };

    sqlx::query(
        r#"
        UPDATE podcasts
        SET name = ?, host = ?, default_studio_settings = ?, tasks_time_allowance = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&name)
    .bind(&host)
    .bind(&default_studio_settings)
    .bind(&tasks_time_allowance)
    .bind(Utc::now())
    .bind(id.to_string())
    .execute(pool)
    .await?;

    if let Some(aliases) = update.aliases {
        set_aliases(pool, id, &aliases).await?;
    }

    load_podcast(pool, id).await
}

/// Delete a podcast and cascade to its episodes and their tasks.
/// Returns false if the podcast doesn't exist.
pub async fn delete_podcast(pool: &SqlitePool, id: Uuid) -> Result<bool> {
    let exists = sqlx::query("SELECT 1 FROM podcasts WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?
        .is_some();
    if !exists {
        return Ok(false);
    }

    // Explicit cascade: tasks -> episodes -> aliases -> podcast
    sqlx::query(
        "DELETE FROM tasks WHERE episode_id IN (SELECT id FROM episodes WHERE podcast_id = ?)",
    )
    .bind(id.to_string())
    .execute(pool)
    .await?;
    sqlx::query("DELETE FROM episodes WHERE podcast_id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;
    sqlx::query("DELETE FROM podcast_aliases WHERE podcast_id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;
    sqlx::query("DELETE FROM podcasts WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");
        crate::db::init_tables(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_create_and_load_podcast() {
        let pool = test_pool().await;
        let podcast = create_podcast(
            &pool,
            PodcastInput {
                name: "Tech Talk".to_string(),
                host: Some("Dana".to_string()),
                aliases: vec!["טק טוק".to_string()],
                ..Default::default()
            },
        )
        .await
        .expect("Failed to create podcast");

        let loaded = load_podcast(&pool, podcast.id)
            .await
            .unwrap()
            .expect("Podcast not found");
        assert_eq!(loaded.name, "Tech Talk");
        assert_eq!(loaded.host.as_deref(), Some("Dana"));
        assert_eq!(loaded.aliases, vec!["טק טוק".to_string()]);
    }

    #[tokio::test]
    async fn test_update_clears_field_with_empty_string() {
        let pool = test_pool().await;
        let podcast = create_podcast(
            &pool,
            PodcastInput {
                name: "Show".to_string(),
                default_studio_settings: Some("two mics".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let updated = update_podcast(
            &pool,
            podcast.id,
            PodcastUpdate {
                default_studio_settings: Some("".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(updated.default_studio_settings, None);
        assert_eq!(updated.name, "Show");
    }

    #[tokio::test]
    async fn test_delete_cascades_episodes_and_tasks() {
        let pool = test_pool().await;
        let podcast = create_podcast(
            &pool,
            PodcastInput {
                name: "Show".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let episode = crate::db::episodes::create_episode(
            &pool,
            crate::db::episodes::EpisodeInput {
                podcast_id: podcast.id,
                episode_number: Some("1".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert!(delete_podcast(&pool, podcast.id).await.unwrap());
        assert!(crate::db::episodes::load_episode(&pool, episode.id)
            .await
            .unwrap()
            .is_none());
        assert!(!delete_podcast(&pool, podcast.id).await.unwrap());
    }
}
