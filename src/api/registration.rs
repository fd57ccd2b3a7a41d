/// Registration lifecycle endpoints
use crate::{
    auth::AuthContext,
    context::AppContext,
    error::ApiResult,
    registration::{
        AddMembersRequest, CreateRegistrationRequest, InviteStatus, Member, Registration,
        RegistrationFilter, RespondRequest,
    },
};
use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post},
    Json, Router,
};

/// Build registration routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/events/:event_id/registrations", post(create_registration))
        .route("/api/registrations", get(list_registrations))
        .route("/api/registrations/:id", get(get_registration))
        .route("/api/registrations/:id/respond", post(respond_to_invitation))
        .route("/api/registrations/:id/members", post(add_members))
        .route(
            "/api/registrations/:id/members/:member_id",
            delete(remove_member),
        )
        .route("/api/registrations/:id/cancel", post(cancel_registration))
}

/// Create registration endpoint
async fn create_registration(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path(event_id): Path<String>,
    Json(req): Json<CreateRegistrationRequest>,
) -> ApiResult<Json<Registration>> {
    tracing::info!(
        "create_registration: account {} registering for event {}",
        auth.account_id(),
        event_id
    );

    let registration = ctx
        .registration_manager
        .create(&auth.session, &event_id, req)
        .await
        .map_err(|e| {
            tracing::debug!("create_registration: rejected: {}", e);
            e
        })?;
    tracing::info!("create_registration: registration {} created", registration.id);

    // Invitation mail is best-effort; the registration is already committed
    notify_invitees(&ctx, &registration, &registration.members).await;

    Ok(Json(registration))
}

/// List registrations endpoint
async fn list_registrations(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Query(filter): Query<RegistrationFilter>,
) -> ApiResult<Json<Vec<Registration>>> {
    let registrations = ctx.registration_manager.list(&auth.session, &filter).await?;
    Ok(Json(registrations))
}

/// Get registration endpoint
async fn get_registration(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> ApiResult<Json<Registration>> {
    let registration = ctx.registration_manager.get(&auth.session, &id).await?;
    Ok(Json(registration))
}

/// Invitation response endpoint
async fn respond_to_invitation(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path(id): Path<String>,
    Json(req): Json<RespondRequest>,
) -> ApiResult<Json<Registration>> {
    let registration = ctx
        .registration_manager
        .respond(&auth.session, &id, req.action)
        .await?;
    Ok(Json(registration))
}

/// Member addition endpoint (leader only)
async fn add_members(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path(id): Path<String>,
    Json(req): Json<AddMembersRequest>,
) -> ApiResult<Json<Registration>> {
    let (registration, added) = ctx
        .registration_manager
        .add_members(&auth.session, &id, req)
        .await?;

    notify_invitees(&ctx, &registration, &added).await;

    Ok(Json(registration))
}

/// Member removal endpoint (leader only)
async fn remove_member(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path((id, member_id)): Path<(String, String)>,
) -> ApiResult<Json<Registration>> {
    let registration = ctx
        .registration_manager
        .remove_member(&auth.session, &id, &member_id)
        .await?;
    Ok(Json(registration))
}

/// Cancellation endpoint
async fn cancel_registration(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> ApiResult<Json<Registration>> {
    let registration = ctx.registration_manager.cancel(&auth.session, &id).await?;
    Ok(Json(registration))
}

/// Send invitation mail to freshly invited members. Failures are logged and
/// never fail the request.
async fn notify_invitees(ctx: &AppContext, registration: &Registration, members: &[Member]) {
    if !ctx.mailer.is_configured() {
        return;
    }

    let event = match ctx.event_manager.get(&registration.event_id).await {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!("notify_invitees: could not load event: {}", e);
            return;
        }
    };
    let leader_name = registration
        .members
        .first()
        .map(|m| m.identity.name().to_string())
        .unwrap_or_default();

    for member in members {
        if !matches!(
            member.invite_status,
            InviteStatus::Invited | InviteStatus::PendingRegistration
        ) {
            continue;
        }
        if let Err(e) = ctx
            .mailer
            .send_invitation_email(
                member.identity.email(),
                member.identity.name(),
                &leader_name,
                &event.title,
                registration.team_name.as_deref(),
            )
            .await
        {
            tracing::warn!("Failed to send invitation email: {}", e);
        }
    }
}
