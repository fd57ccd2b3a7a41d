/// Organization registry
///
/// Societies and clubs, each with a designated head account. Created by
/// administrators; deactivation is a soft flag.
use crate::{
    account::Role,
    error::{ApiError, ApiResult},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;
use validator::Validate;

/// Organization record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: String,
    pub name: String,
    pub head_account_id: String,
    pub contact_email: Option<String>,
    pub description: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Organization creation request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateOrganizationRequest {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    pub head_account_id: String,
    #[validate(email(message = "must be a valid email address"))]
    pub contact_email: Option<String>,
    pub description: Option<String>,
}

/// Organization manager
#[derive(Clone)]
pub struct OrganizationManager {
    db: SqlitePool,
}

impl OrganizationManager {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Create an organization. The head must resolve to an existing account;
    /// a student head is promoted to organizer.
    pub async fn create(&self, req: CreateOrganizationRequest) -> ApiResult<Organization> {
        let head: Option<String> = sqlx::query_scalar("SELECT id FROM account WHERE id = ?1")
            .bind(&req.head_account_id)
            .fetch_optional(&self.db)
            .await
            .map_err(ApiError::Database)?;
        if head.is_none() {
            return Err(ApiError::NotFound("Head account not found".to_string()));
        }

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO organization (id, name, head_account_id, contact_email, description, active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)",
        )
        .bind(&id)
        .bind(req.name.trim())
        .bind(&req.head_account_id)
        .bind(&req.contact_email)
        .bind(&req.description)
        .bind(now)
        .execute(&self.db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return ApiError::Conflict(format!(
                        "Organization name '{}' already taken",
                        req.name.trim()
                    ));
                }
            }
            ApiError::Database(e)
        })?;

        // Heads get the organizer role; existing organizers and admins keep theirs
        sqlx::query("UPDATE account SET role = ?1 WHERE id = ?2 AND role = ?3")
            .bind(Role::Organizer.as_str())
            .bind(&req.head_account_id)
            .bind(Role::Student.as_str())
            .execute(&self.db)
            .await
            .map_err(ApiError::Database)?;

        self.get(&id).await
    }

    /// Get organization by id
    pub async fn get(&self, id: &str) -> ApiResult<Organization> {
        let row = sqlx::query("SELECT * FROM organization WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .map_err(ApiError::Database)?
            .ok_or_else(|| ApiError::NotFound("Organization not found".to_string()))?;

        Self::from_row(&row)
    }

    /// List organizations
    pub async fn list(&self, include_inactive: bool) -> ApiResult<Vec<Organization>> {
        let query = if include_inactive {
            "SELECT * FROM organization ORDER BY name"
        } else {
            "SELECT * FROM organization WHERE active = 1 ORDER BY name"
        };

        let rows = sqlx::query(query)
            .fetch_all(&self.db)
            .await
            .map_err(ApiError::Database)?;

        rows.iter().map(Self::from_row).collect()
    }

    /// Soft-deactivate an organization
    pub async fn deactivate(&self, id: &str) -> ApiResult<()> {
        let result = sqlx::query("UPDATE organization SET active = 0 WHERE id = ?1")
            .bind(id)
            .execute(&self.db)
            .await
            .map_err(ApiError::Database)?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("Organization not found".to_string()));
        }

        Ok(())
    }

    fn from_row(row: &SqliteRow) -> ApiResult<Organization> {
        Ok(Organization {
            id: row.get("id"),
            name: row.get("name"),
            head_account_id: row.get("head_account_id"),
            contact_email: row.get("contact_email"),
            description: row.get("description"),
            active: row.get("active"),
            created_at: row.get("created_at"),
        })
    }
}
