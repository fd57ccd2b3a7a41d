/// Configuration management for the Campanile server
use crate::error::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub authentication: AuthConfig,
    pub email: Option<EmailConfig>,
    pub rate_limit: RateLimitConfig,
    pub logging: LoggingConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
    pub public_url: Option<String>,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_directory: PathBuf,
    pub database: PathBuf,
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// Emails granted the admin role regardless of their stored role
    /// (comma-separated in the environment)
    pub admin_emails: Vec<String>,
    pub access_token_ttl_minutes: i64,
    pub refresh_token_ttl_days: i64,
}

/// Email configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub smtp_url: String,
    pub from_address: String,
}

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub authenticated_rps: u32,
    pub unauthenticated_rps: u32,
    pub admin_rps: u32,
    pub burst_size: u32,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> ApiResult<Self> {
        dotenv::dotenv().ok();

        let hostname =
            env::var("CAMPANILE_HOSTNAME").unwrap_or_else(|_| "localhost".to_string());
        let port = env::var("CAMPANILE_PORT")
            .unwrap_or_else(|_| "4000".to_string())
            .parse()
            .map_err(|_| ApiError::Validation("Invalid port number".to_string()))?;
        let public_url = env::var("CAMPANILE_PUBLIC_URL").ok();

        let data_directory: PathBuf = env::var("CAMPANILE_DATA_DIRECTORY")
            .unwrap_or_else(|_| "./data".to_string())
            .into();
        let database = env::var("CAMPANILE_DATABASE_LOCATION")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_directory.join("campanile.sqlite"));

        let jwt_secret = env::var("CAMPANILE_JWT_SECRET")
            .map_err(|_| ApiError::Validation("JWT secret required".to_string()))?;

        // Parse admin emails from comma-separated list
        let admin_emails = env::var("CAMPANILE_ADMIN_EMAILS")
            .unwrap_or_else(|_| String::new())
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect::<Vec<String>>();

        let access_token_ttl_minutes = env_parse("CAMPANILE_ACCESS_TOKEN_TTL_MINUTES", 60);
        let refresh_token_ttl_days = env_parse("CAMPANILE_REFRESH_TOKEN_TTL_DAYS", 30);

        let email = if let Ok(smtp_url) = env::var("CAMPANILE_EMAIL_SMTP_URL") {
            Some(EmailConfig {
                smtp_url,
                from_address: env::var("CAMPANILE_EMAIL_FROM_ADDRESS")
                    .unwrap_or_else(|_| format!("noreply@{}", hostname)),
            })
        } else {
            None
        };

        let rate_limit = RateLimitConfig {
            enabled: env_parse("CAMPANILE_RATE_LIMITS_ENABLED", true),
            authenticated_rps: env_parse("CAMPANILE_RATE_LIMIT_AUTHENTICATED_RPS", 100),
            unauthenticated_rps: env_parse("CAMPANILE_RATE_LIMIT_UNAUTHENTICATED_RPS", 10),
            admin_rps: env_parse("CAMPANILE_RATE_LIMIT_ADMIN_RPS", 1000),
            burst_size: env_parse("CAMPANILE_RATE_LIMIT_BURST_SIZE", 50),
        };

        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(ServerConfig {
            service: ServiceConfig {
                hostname,
                port,
                public_url,
            },
            storage: StorageConfig {
                data_directory,
                database,
            },
            authentication: AuthConfig {
                jwt_secret,
                admin_emails,
                access_token_ttl_minutes,
                refresh_token_ttl_days,
            },
            email,
            rate_limit,
            logging: LoggingConfig { level: log_level },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> ApiResult<()> {
        if self.service.hostname.is_empty() {
            return Err(ApiError::Validation("Hostname cannot be empty".to_string()));
        }

        if self.authentication.jwt_secret.len() < 32 {
            return Err(ApiError::Validation(
                "JWT secret must be at least 32 characters".to_string(),
            ));
        }

        if self.authentication.access_token_ttl_minutes <= 0 {
            return Err(ApiError::Validation(
                "Access token TTL must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// Check whether an email is on the configured admin list
    pub fn is_admin_email(&self, email: &str) -> bool {
        self.authentication
            .admin_emails
            .iter()
            .any(|e| e.eq_ignore_ascii_case(email))
    }
}
