/// Account and session endpoints
use crate::{
    account::{AccountView, LoginRequest, RefreshRequest, RegisterRequest, SessionResponse},
    auth::AuthContext,
    context::AppContext,
    error::ApiResult,
};
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use validator::Validate;

/// Build account routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/accounts", post(register))
        .route("/api/sessions", post(login))
        .route("/api/sessions/current", get(current_session).delete(logout))
        .route("/api/sessions/refresh", post(refresh))
}

/// Create account endpoint
async fn register(
    State(ctx): State<AppContext>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<Json<SessionResponse>> {
    req.validate()?;

    tracing::info!("register: creating account for {}", req.email);
    let account = ctx.account_manager.register(req).await?;
    let session = ctx.account_manager.create_session(&account).await?;
    tracing::info!("register: account {} created", account.id);

    Ok(Json(SessionResponse {
        account: account.into(),
        access_token: session.access_token,
        refresh_token: session.refresh_token,
    }))
}

/// Login endpoint
async fn login(
    State(ctx): State<AppContext>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let (account, session) = ctx.account_manager.login(&req.email, &req.password).await?;

    Ok(Json(SessionResponse {
        account: account.into(),
        access_token: session.access_token,
        refresh_token: session.refresh_token,
    }))
}

/// Current session info endpoint
async fn current_session(
    State(ctx): State<AppContext>,
    auth: AuthContext,
) -> ApiResult<Json<AccountView>> {
    let account = ctx.account_manager.get_account(auth.account_id()).await?;
    Ok(Json(account.into()))
}

/// Logout endpoint
async fn logout(
    State(ctx): State<AppContext>,
    auth: AuthContext,
) -> ApiResult<Json<serde_json::Value>> {
    ctx.account_manager
        .delete_session(&auth.session.session_id)
        .await?;
    Ok(Json(serde_json::json!({})))
}

/// Refresh session endpoint
async fn refresh(
    State(ctx): State<AppContext>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let (account, session) = ctx.account_manager.refresh_session(&req.refresh_token).await?;

    Ok(Json(SessionResponse {
        account: account.into(),
        access_token: session.access_token,
        refresh_token: session.refresh_token,
    }))
}
