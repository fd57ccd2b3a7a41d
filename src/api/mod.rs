/// API routes and handlers
pub mod account;
pub mod bookmark;
pub mod event;
pub mod middleware;
pub mod org;
pub mod registration;

use crate::context::AppContext;
use axum::Router;

/// Build API routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .merge(account::routes())
        .merge(org::routes())
        .merge(event::routes())
        .merge(registration::routes())
        .merge(bookmark::routes())
}
