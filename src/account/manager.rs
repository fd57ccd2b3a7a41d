/// Account manager implementation using runtime queries
/// Runtime query building keeps the build independent of a live DATABASE_URL.

use crate::{
    account::{RegisterRequest, Role, ValidatedSession},
    config::ServerConfig,
    db::account::{Account, Session},
    error::{ApiError, ApiResult},
};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use std::sync::Arc;
use uuid::Uuid;

/// JWT claims carried in access and refresh tokens
#[derive(Debug, Serialize, Deserialize)]
struct TokenClaims {
    sub: String,
    sid: String,
    role: String,
    scope: String,
    iat: i64,
    exp: i64,
}

/// Account manager service
pub struct AccountManager {
    db: SqlitePool,
    config: Arc<ServerConfig>,
}

impl AccountManager {
    /// Create a new account manager
    pub fn new(db: SqlitePool, config: Arc<ServerConfig>) -> Self {
        Self { db, config }
    }

    /// Create a new account
    pub async fn register(&self, req: RegisterRequest) -> ApiResult<Account> {
        let email = req.email.trim().to_lowercase();

        if self.email_exists(&email).await? {
            return Err(ApiError::Conflict("Email already registered".to_string()));
        }

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(req.password.as_bytes(), &salt)
            .map_err(|e| ApiError::Internal(format!("Password hashing failed: {}", e)))?
            .to_string();

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO account (id, name, email, password_hash, role, department, phone, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(&id)
        .bind(&req.name)
        .bind(&email)
        .bind(&password_hash)
        .bind(Role::Student.as_str())
        .bind(&req.department)
        .bind(&req.phone)
        .bind(now)
        .execute(&self.db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return ApiError::Conflict("Email already registered".to_string());
                }
            }
            ApiError::Database(e)
        })?;

        Ok(Account {
            id,
            name: req.name,
            email,
            password_hash,
            role: Role::Student.as_str().to_string(),
            department: req.department,
            phone: req.phone,
            created_at: now,
        })
    }

    /// Authenticate account and create session
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<(Account, Session)> {
        let account = self
            .get_account_by_email(&email.trim().to_lowercase())
            .await?
            .ok_or_else(|| ApiError::Authentication("Invalid credentials".to_string()))?;

        let parsed = PasswordHash::new(&account.password_hash)
            .map_err(|e| ApiError::Internal(format!("Corrupt password hash: {}", e)))?;
        if Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_err()
        {
            return Err(ApiError::Authentication("Invalid credentials".to_string()));
        }

        let session = self.create_session(&account).await?;

        Ok((account, session))
    }

    /// Effective role: configured admin emails act as admin regardless of
    /// the stored role
    pub fn effective_role(&self, account: &Account) -> Role {
        if self.config.is_admin_email(&account.email) {
            Role::Admin
        } else {
            account.role()
        }
    }

    /// Create a session for an account
    pub async fn create_session(&self, account: &Account) -> ApiResult<Session> {
        let session_id = Uuid::new_v4().to_string();
        let role = self.effective_role(account);

        let now = Utc::now();
        let expires_at = now + Duration::minutes(self.config.authentication.access_token_ttl_minutes);
        let refresh_expires = now + Duration::days(self.config.authentication.refresh_token_ttl_days);

        let access_token =
            self.mint_token(&account.id, &session_id, role, "access", now, expires_at)?;
        let refresh_token =
            self.mint_token(&account.id, &session_id, role, "refresh", now, refresh_expires)?;

        sqlx::query(
            "INSERT INTO session (id, account_id, access_token, refresh_token, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&session_id)
        .bind(&account.id)
        .bind(&access_token)
        .bind(&refresh_token)
        .bind(now)
        .bind(expires_at)
        .execute(&self.db)
        .await
        .map_err(ApiError::Database)?;

        sqlx::query(
            "INSERT INTO refresh_token (id, account_id, token, created_at, expires_at, used)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&account.id)
        .bind(&refresh_token)
        .bind(now)
        .bind(refresh_expires)
        .bind(false)
        .execute(&self.db)
        .await
        .map_err(ApiError::Database)?;

        Ok(Session {
            id: session_id,
            account_id: account.id.clone(),
            access_token,
            refresh_token,
            created_at: now,
            expires_at,
        })
    }

    /// Validate access token and return session info
    pub async fn validate_access_token(&self, token: &str) -> ApiResult<ValidatedSession> {
        let row = sqlx::query("SELECT id, account_id, expires_at FROM session WHERE access_token = ?1")
            .bind(token)
            .fetch_optional(&self.db)
            .await
            .map_err(ApiError::Database)?
            .ok_or_else(|| ApiError::Authentication("Invalid or expired session".to_string()))?;

        let session_id: String = row.get("id");
        let account_id: String = row.get("account_id");
        let expires_at: DateTime<Utc> = row.get("expires_at");

        if Utc::now() > expires_at {
            return Err(ApiError::Authentication("Session expired".to_string()));
        }

        let account = self.get_account(&account_id).await?;

        Ok(ValidatedSession {
            account_id,
            session_id,
            role: self.effective_role(&account),
        })
    }

    /// Delete a session (logout)
    pub async fn delete_session(&self, session_id: &str) -> ApiResult<()> {
        sqlx::query("DELETE FROM session WHERE id = ?1")
            .bind(session_id)
            .execute(&self.db)
            .await
            .map_err(ApiError::Database)?;

        Ok(())
    }

    /// Refresh session tokens; each refresh token is single-use
    pub async fn refresh_session(&self, refresh_token: &str) -> ApiResult<(Account, Session)> {
        let row = sqlx::query(
            "SELECT id, account_id, expires_at, used FROM refresh_token WHERE token = ?1",
        )
        .bind(refresh_token)
        .fetch_optional(&self.db)
        .await
        .map_err(ApiError::Database)?
        .ok_or_else(|| ApiError::Authentication("Invalid refresh token".to_string()))?;

        let token_id: String = row.get("id");
        let account_id: String = row.get("account_id");
        let expires_at: DateTime<Utc> = row.get("expires_at");
        let used: bool = row.get("used");

        if used {
            return Err(ApiError::Authentication(
                "Refresh token already used".to_string(),
            ));
        }
        if Utc::now() > expires_at {
            return Err(ApiError::Authentication("Refresh token expired".to_string()));
        }

        sqlx::query("UPDATE refresh_token SET used = 1, used_at = ?1 WHERE id = ?2")
            .bind(Utc::now())
            .bind(&token_id)
            .execute(&self.db)
            .await
            .map_err(ApiError::Database)?;

        let account = self.get_account(&account_id).await?;
        let session = self.create_session(&account).await?;

        Ok((account, session))
    }

    /// Get account by id
    pub async fn get_account(&self, id: &str) -> ApiResult<Account> {
        sqlx::query_as::<_, Account>(
            "SELECT id, name, email, password_hash, role, department, phone, created_at
             FROM account WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .map_err(ApiError::Database)?
        .ok_or_else(|| ApiError::NotFound("Account not found".to_string()))
    }

    /// Get account by email, if any
    pub async fn get_account_by_email(&self, email: &str) -> ApiResult<Option<Account>> {
        sqlx::query_as::<_, Account>(
            "SELECT id, name, email, password_hash, role, department, phone, created_at
             FROM account WHERE email = ?1",
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .map_err(ApiError::Database)
    }

    async fn email_exists(&self, email: &str) -> ApiResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM account WHERE email = ?1")
            .bind(email)
            .fetch_one(&self.db)
            .await
            .map_err(ApiError::Database)?;
        Ok(count > 0)
    }

    fn mint_token(
        &self,
        account_id: &str,
        session_id: &str,
        role: Role,
        scope: &str,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> ApiResult<String> {
        let claims = TokenClaims {
            sub: account_id.to_string(),
            sid: session_id.to_string(),
            role: role.as_str().to_string(),
            scope: scope.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.authentication.jwt_secret.as_bytes()),
        )
        .map_err(|e| ApiError::Jwt(format!("Token encoding failed: {}", e)))
    }
}
