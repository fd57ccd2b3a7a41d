/// Bookmark index
///
/// Unique (account, event) pairs. Duplicate adds conflict, removing an
/// absent bookmark is a not-found.
use crate::{
    error::{ApiError, ApiResult},
    event::{Event, EventManager},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

/// Bookmark record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: String,
    pub account_id: String,
    pub event_id: String,
    pub created_at: DateTime<Utc>,
}

/// Bookmark manager
#[derive(Clone)]
pub struct BookmarkManager {
    db: SqlitePool,
}

impl BookmarkManager {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Bookmark an event for an account
    pub async fn add(&self, account_id: &str, event_id: &str) -> ApiResult<Bookmark> {
        let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM event WHERE id = ?1")
            .bind(event_id)
            .fetch_one(&self.db)
            .await
            .map_err(ApiError::Database)?;
        if exists == 0 {
            return Err(ApiError::NotFound("Event not found".to_string()));
        }

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO bookmark (id, account_id, event_id, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&id)
        .bind(account_id)
        .bind(event_id)
        .bind(now)
        .execute(&self.db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return ApiError::Conflict("Event already bookmarked".to_string());
                }
            }
            ApiError::Database(e)
        })?;

        Ok(Bookmark {
            id,
            account_id: account_id.to_string(),
            event_id: event_id.to_string(),
            created_at: now,
        })
    }

    /// Remove a bookmark
    pub async fn remove(&self, account_id: &str, event_id: &str) -> ApiResult<()> {
        let result = sqlx::query("DELETE FROM bookmark WHERE account_id = ?1 AND event_id = ?2")
            .bind(account_id)
            .bind(event_id)
            .execute(&self.db)
            .await
            .map_err(ApiError::Database)?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("Bookmark not found".to_string()));
        }

        Ok(())
    }

    /// Existence check for a pair
    pub async fn exists(&self, account_id: &str, event_id: &str) -> ApiResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM bookmark WHERE account_id = ?1 AND event_id = ?2",
        )
        .bind(account_id)
        .bind(event_id)
        .fetch_one(&self.db)
        .await
        .map_err(ApiError::Database)?;

        Ok(count > 0)
    }

    /// Events bookmarked by an account, newest bookmark first
    pub async fn list_events(&self, account_id: &str) -> ApiResult<Vec<Event>> {
        let rows = sqlx::query(
            "SELECT e.* FROM event e
             JOIN bookmark b ON b.event_id = e.id
             WHERE b.account_id = ?1
             ORDER BY b.created_at DESC",
        )
        .bind(account_id)
        .fetch_all(&self.db)
        .await
        .map_err(ApiError::Database)?;

        rows.iter().map(EventManager::from_row).collect()
    }
}
