/// Bookmark endpoints
use crate::{
    auth::AuthContext,
    bookmark::Bookmark,
    context::AppContext,
    error::ApiResult,
    event::Event,
};
use axum::{
    extract::{Path, State},
    routing::{get, put},
    Json, Router,
};

/// Build bookmark routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route(
            "/api/events/:event_id/bookmark",
            put(add_bookmark).delete(remove_bookmark),
        )
        .route("/api/bookmarks", get(list_bookmarks))
}

/// Add bookmark endpoint
async fn add_bookmark(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path(event_id): Path<String>,
) -> ApiResult<Json<Bookmark>> {
    let bookmark = ctx
        .bookmark_manager
        .add(auth.account_id(), &event_id)
        .await?;
    Ok(Json(bookmark))
}

/// Remove bookmark endpoint
async fn remove_bookmark(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path(event_id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    ctx.bookmark_manager
        .remove(auth.account_id(), &event_id)
        .await?;
    Ok(Json(serde_json::json!({})))
}

/// List bookmarked events endpoint
async fn list_bookmarks(
    State(ctx): State<AppContext>,
    auth: AuthContext,
) -> ApiResult<Json<Vec<Event>>> {
    let events = ctx.bookmark_manager.list_events(auth.account_id()).await?;
    Ok(Json(events))
}
