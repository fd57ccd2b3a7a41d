/// Organization endpoints
use crate::{
    account::Role,
    auth::{AuthContext, OptionalAuthContext},
    context::AppContext,
    error::ApiResult,
    org::{CreateOrganizationRequest, Organization},
    require_role,
};
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use validator::Validate;

/// Build organization routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/admin/organizations", post(create_organization))
        .route(
            "/api/admin/organizations/:id/deactivate",
            post(deactivate_organization),
        )
        .route("/api/organizations", get(list_organizations))
        .route("/api/organizations/:id", get(get_organization))
}

#[derive(Debug, Deserialize)]
struct OrgListQuery {
    #[serde(default)]
    include_inactive: bool,
}

/// Create organization endpoint (admin only)
async fn create_organization(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Json(req): Json<CreateOrganizationRequest>,
) -> ApiResult<Json<Organization>> {
    require_role!(auth, Role::Admin);
    req.validate()?;

    tracing::info!("create_organization: {} by {}", req.name, auth.account_id());
    let org = ctx.org_manager.create(req).await?;

    Ok(Json(org))
}

/// Deactivate organization endpoint (admin only)
async fn deactivate_organization(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    require_role!(auth, Role::Admin);

    ctx.org_manager.deactivate(&id).await?;
    Ok(Json(serde_json::json!({})))
}

/// List organizations; inactive ones are only shown to admins
async fn list_organizations(
    State(ctx): State<AppContext>,
    auth: OptionalAuthContext,
    Query(query): Query<OrgListQuery>,
) -> ApiResult<Json<Vec<Organization>>> {
    let is_admin = auth
        .auth
        .as_ref()
        .is_some_and(|a| a.role().can_act_as(Role::Admin));
    let orgs = ctx
        .org_manager
        .list(query.include_inactive && is_admin)
        .await?;
    Ok(Json(orgs))
}

/// Get organization endpoint
async fn get_organization(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<Organization>> {
    let org = ctx.org_manager.get(&id).await?;
    Ok(Json(org))
}
