/// Campanile - campus event management API
///
/// Accounts, societies, events with dynamic registration forms, individual
/// and team registrations with an invitation lifecycle, and bookmarks.

mod account;
mod api;
mod auth;
mod bookmark;
mod config;
mod context;
mod db;
mod error;
mod event;
mod mailer;
mod org;
mod rate_limit;
mod registration;
mod server;

use config::ServerConfig;
use context::AppContext;
use error::ApiResult;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ApiResult<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "campanile=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    print_banner();

    // Load configuration
    let config = ServerConfig::from_env()?;

    // Create application context
    let ctx = AppContext::new(config).await?;

    // Start server
    server::serve(ctx).await?;

    Ok(())
}

fn print_banner() {
    println!(
        r#"
   ____                                  _ _
  / ___|__ _ _ __ ___  _ __   __ _ _ __ (_) | ___
 | |   / _` | '_ ` _ \| '_ \ / _` | '_ \| | |/ _ \
 | |__| (_| | | | | | | |_) | (_| | | | | | |  __/
  \____\__,_|_| |_| |_| .__/ \__,_|_| |_|_|_|\___|
                      |_|
        Campus Event Management API v{}
        "#,
        env!("CARGO_PKG_VERSION")
    );
}
