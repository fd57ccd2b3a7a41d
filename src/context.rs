/// Application context and dependency injection
use crate::{
    account::AccountManager,
    bookmark::BookmarkManager,
    config::ServerConfig,
    db,
    error::ApiResult,
    event::EventManager,
    mailer::Mailer,
    org::OrganizationManager,
    rate_limit::{RateLimitConfig, RateLimiter},
    registration::RegistrationManager,
};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub db: SqlitePool,
    pub account_manager: Arc<AccountManager>,
    pub org_manager: Arc<OrganizationManager>,
    pub event_manager: Arc<EventManager>,
    pub registration_manager: Arc<RegistrationManager>,
    pub bookmark_manager: Arc<BookmarkManager>,
    pub rate_limiter: Arc<RateLimiter>,
    pub mailer: Arc<Mailer>,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: ServerConfig) -> ApiResult<Self> {
        config.validate()?;

        if !config.storage.data_directory.exists() {
            tokio::fs::create_dir_all(&config.storage.data_directory).await?;
        }

        let pool = db::create_pool(&config.storage.database, db::DatabaseOptions::default()).await?;
        db::run_migrations(&pool).await?;
        db::test_connection(&pool).await?;

        let config = Arc::new(config);
        let account_manager = Arc::new(AccountManager::new(pool.clone(), Arc::clone(&config)));
        let org_manager = Arc::new(OrganizationManager::new(pool.clone()));
        let event_manager = Arc::new(EventManager::new(pool.clone()));
        let registration_manager = Arc::new(RegistrationManager::new(pool.clone()));
        let bookmark_manager = Arc::new(BookmarkManager::new(pool.clone()));
        let rate_limiter = Arc::new(RateLimiter::new(RateLimitConfig::from(&config.rate_limit)));
        let mailer = Arc::new(Mailer::new(config.email.clone())?);

        Ok(Self {
            config,
            db: pool,
            account_manager,
            org_manager,
            event_manager,
            registration_manager,
            bookmark_manager,
            rate_limiter,
            mailer,
        })
    }

    /// Get service URL
    pub fn service_url(&self) -> String {
        self.config.service.public_url.clone().unwrap_or_else(|| {
            format!(
                "http://{}:{}",
                self.config.service.hostname, self.config.service.port
            )
        })
    }
}
