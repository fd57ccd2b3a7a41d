/// Event catalog endpoints
use crate::{
    account::Role,
    auth::{AuthContext, OptionalAuthContext},
    context::AppContext,
    error::{ApiError, ApiResult},
    event::{
        CreateEventRequest, Event, EventFilter, EventStatus, TransitionRequest, UpdateEventRequest,
    },
    require_role,
};
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};

/// Build event routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/events", post(create_event).get(list_events))
        .route("/api/events/:id", get(get_event).patch(update_event))
        .route("/api/events/:id/transition", post(transition_event))
        .route("/api/events/:id/cancel", post(cancel_event))
}

/// Create event endpoint (organizer or admin)
async fn create_event(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Json(req): Json<CreateEventRequest>,
) -> ApiResult<Json<Event>> {
    require_role!(auth, Role::Organizer);

    tracing::info!("create_event: '{}' by {}", req.title, auth.account_id());
    let event = ctx.event_manager.create(&auth.session, req).await?;

    Ok(Json(event))
}

/// List events endpoint
async fn list_events(
    State(ctx): State<AppContext>,
    auth: OptionalAuthContext,
    Query(filter): Query<EventFilter>,
) -> ApiResult<Json<Vec<Event>>> {
    let events = ctx
        .event_manager
        .list(auth.auth.as_ref().map(|a| &a.session), &filter)
        .await?;
    Ok(Json(events))
}

/// Get event endpoint; drafts are only visible to their organizer and admins
async fn get_event(
    State(ctx): State<AppContext>,
    auth: OptionalAuthContext,
    Path(id): Path<String>,
) -> ApiResult<Json<Event>> {
    let event = ctx.event_manager.get(&id).await?;

    if event.status == EventStatus::Draft {
        let visible = auth.auth.as_ref().is_some_and(|a| {
            a.account_id() == event.organizer_id || a.role().can_act_as(Role::Admin)
        });
        if !visible {
            return Err(ApiError::NotFound("Event not found".to_string()));
        }
    }

    Ok(Json(event))
}

/// Update event endpoint
async fn update_event(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path(id): Path<String>,
    Json(req): Json<UpdateEventRequest>,
) -> ApiResult<Json<Event>> {
    let event = ctx.event_manager.update(&auth.session, &id, req).await?;
    Ok(Json(event))
}

/// Lifecycle transition endpoint
async fn transition_event(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path(id): Path<String>,
    Json(req): Json<TransitionRequest>,
) -> ApiResult<Json<Event>> {
    tracing::info!(
        "transition_event: {} -> {} by {}",
        id,
        req.status.as_str(),
        auth.account_id()
    );
    let event = ctx
        .event_manager
        .transition(&auth.session, &id, req.status)
        .await?;
    Ok(Json(event))
}

/// Cancel (soft-delete) endpoint
async fn cancel_event(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> ApiResult<Json<Event>> {
    let event = ctx.event_manager.cancel(&auth.session, &id).await?;
    Ok(Json(event))
}
