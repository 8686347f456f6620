//! User persistence

use chrono::Utc;
use podtrack_common::models::User;
use podtrack_common::{Error, Result};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::clean_text;

fn user_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
    let id: String = row.get("id");
    Ok(User {
        id: Uuid::parse_str(&id).map_err(|e| Error::Internal(format!("bad user id: {}", e)))?,
        name: row.get("name"),
        email: row.get("email"),
        role: row.get("role"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

/// Fields accepted when creating a user
#[derive(Debug, Clone, Default)]
pub struct UserInput {
    pub name: String,
    pub email: Option<String>,
    pub role: Option<String>,
}

/// Create a user. Names are unique.
pub async fn create_user(pool: &SqlitePool, input: UserInput) -> Result<User> {
    let name = input.name.trim().to_string();
    if name.is_empty() {
        return Err(Error::InvalidInput("User name must not be empty".to_string()));
    }
    let id = Uuid::new_v4();
    let now = Utc::now();

    let result = sqlx::query(
        "INSERT INTO users (id, name, email, role, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(id.to_string())
    .bind(&name)
    .bind(clean_text(input.email))
    .bind(clean_text(input.role))
    .bind(now)
    .bind(now)
    .execute(pool)
    .await;

    match result {
        Ok(_) => {}
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            return Err(Error::InvalidInput(format!("User '{}' already exists", name)));
        }
        Err(e) => return Err(e.into()),
    }

    load_user(pool, id)
        .await?
        .ok_or_else(|| Error::Internal("User vanished after insert".to_string()))
}

/// Load user by id
pub async fn load_user(pool: &SqlitePool, id: Uuid) -> Result<Option<User>> {
    let row = sqlx::query("SELECT * FROM users WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;
    row.map(|r| user_from_row(&r)).transpose()
}

/// List users ordered by name
pub async fn list_users(pool: &SqlitePool, skip: i64, limit: i64) -> Result<Vec<User>> {
    let rows = sqlx::query("SELECT * FROM users ORDER BY name LIMIT ? OFFSET ?")
        .bind(limit)
        .bind(skip)
        .fetch_all(pool)
        .await?;
    rows.iter().map(user_from_row).collect()
}

/// Fields accepted on update; `None` leaves the column unchanged, an empty
/// string clears it (name cannot be cleared).
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
}

/// Update a user; returns the updated record or None if it doesn't exist
pub async fn update_user(pool: &SqlitePool, id: Uuid, update: UserUpdate) -> Result<Option<User>> {
    let Some(existing) = load_user(pool, id).await? else {
        return Ok(None);
    };

    let name = match update.name {
        Some(n) if !n.trim().is_empty() => n.trim().to_string(),
        Some(_) => return Err(Error::InvalidInput("User name must not be empty".to_string())),
        None => existing.name,
    };
    let email = match update.email {
        Some(v) => clean_text(Some(v)),
        None => existing.email,
    };
    let role = match update.role {
        Some(v) => clean_text(Some(v)),
        None => existing.role,
    };

    let result = sqlx::query(
        "UPDATE users SET name = ?, email = ?, role = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&name)
    .bind(&email)
    .bind(&role)
    .bind(Utc::now())
    .bind(id.to_string())
    .execute(pool)
    .await;

    match result {
        Ok(_) => {}
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            return Err(Error::InvalidInput(format!("User '{}' already exists", name)));
        }
        Err(e) => return Err(e.into()),
    }

    load_user(pool, id).await
}

/// Counts of rows unassigned when a user is deleted
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct UnassignmentCounts {
    pub tasks: u64,
    pub episodes: u64,
}

/// Delete a user, unassigning them from tasks and episode engineer slots
/// first. Returns None if the user doesn't exist.
pub async fn delete_user(pool: &SqlitePool, id: Uuid) -> Result<Option<UnassignmentCounts>> {
    if load_user(pool, id).await?.is_none() {
        return Ok(None);
    }
    let id_str = id.to_string();
    let now = Utc::now();

    let tasks = sqlx::query("UPDATE tasks SET assigned_to = NULL, updated_at = ? WHERE assigned_to = ?")
        .bind(now)
        .bind(&id_str)
        .execute(pool)
        .await?
        .rows_affected();

    let episodes = sqlx::query(
        r#"
        UPDATE episodes SET
            recording_engineer_id = CASE WHEN recording_engineer_id = ?1 THEN NULL ELSE recording_engineer_id END,
            editing_engineer_id = CASE WHEN editing_engineer_id = ?1 THEN NULL ELSE editing_engineer_id END,
            reels_engineer_id = CASE WHEN reels_engineer_id = ?1 THEN NULL ELSE reels_engineer_id END,
            updated_at = ?2
        WHERE recording_engineer_id = ?1 OR editing_engineer_id = ?1 OR reels_engineer_id = ?1
        "#,
    )
    .bind(&id_str)
    .bind(now)
    .execute(pool)
    .await?
    .rows_affected();

    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(&id_str)
        .execute(pool)
        .await?;

    Ok(Some(UnassignmentCounts { tasks, episodes }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::episodes::{create_episode, load_episode, EpisodeInput};
    use crate::db::podcasts::{create_podcast, PodcastInput};
    use crate::db::tasks::{create_task, load_task, TaskInput};
    use podtrack_common::models::{TaskStatus, TaskType};

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");
        crate::db::init_tables(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let pool = test_pool().await;
        create_user(
            &pool,
            UserInput {
                name: "Noa".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let err = create_user(
            &pool,
            UserInput {
                name: "Noa".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_delete_unassigns_tasks_and_episodes() {
        let pool = test_pool().await;
        let user = create_user(
            &pool,
            UserInput {
                name: "Noa".to_string(),
                role: Some("editing_engineer".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let podcast = create_podcast(
            &pool,
            PodcastInput {
                name: "Show".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let episode = create_episode(
            &pool,
            EpisodeInput {
                podcast_id: podcast.id,
                episode_number: Some("1".to_string()),
                editing_engineer_id: Some(user.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let task = create_task(
            &pool,
            TaskInput {
                episode_id: episode.id,
                task_type: TaskType::Editing,
                status: TaskStatus::NotStarted,
                assigned_to: Some(user.id),
                due_date: None,
                notes: None,
            },
        )
        .await
        .unwrap();

        let counts = delete_user(&pool, user.id).await.unwrap().unwrap();
        assert_eq!(counts.tasks, 1);
        assert_eq!(counts.episodes, 1);

        let task = load_task(&pool, task.id).await.unwrap().unwrap();
        assert_eq!(task.assigned_to, None);
        let episode = load_episode(&pool, episode.id).await.unwrap().unwrap();
        assert_eq!(episode.editing_engineer_id, None);
        assert!(load_user(&pool, user.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_missing_user() {
        let pool = test_pool().await;
        assert!(delete_user(&pool, Uuid::new_v4()).await.unwrap().is_none());
    }
}
