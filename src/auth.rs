/// Authentication extractors and utilities
use crate::{
    account::{Role, ValidatedSession},
    api::middleware::extract_bearer_token,
    context::AppContext,
    error::ApiError,
};
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

/// Authenticated context - extracts and validates session from request
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub session: ValidatedSession,
}

impl AuthContext {
    pub fn account_id(&self) -> &str {
        &self.session.account_id
    }

    pub fn role(&self) -> Role {
        self.session.role
    }
}

#[async_trait]
impl FromRequestParts<AppContext> for AuthContext {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers)
            .ok_or_else(|| ApiError::Authentication("Missing authorization header".to_string()))?;

        let session = state.account_manager.validate_access_token(&token).await?;

        Ok(AuthContext { session })
    }
}

/// Optional authenticated context - does not fail if no auth provided
#[derive(Debug, Clone)]
pub struct OptionalAuthContext {
    pub auth: Option<AuthContext>,
}

#[async_trait]
impl FromRequestParts<AppContext> for OptionalAuthContext {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        let auth = match extract_bearer_token(&parts.headers) {
            Some(token) => match state.account_manager.validate_access_token(&token).await {
                Ok(session) => Some(AuthContext { session }),
                // Invalid token - continue without session
                Err(_) => None,
            },
            None => None,
        };

        Ok(OptionalAuthContext { auth })
    }
}

/// Macro to require a minimum role
/// Usage: require_role!(auth, Role::Organizer);
#[macro_export]
macro_rules! require_role {
    ($auth:expr, $required:expr) => {
        if !$auth.role().can_act_as($required) {
            return Err($crate::error::ApiError::Forbidden(format!(
                "Requires {} role or higher",
                $required.as_str()
            )));
        }
    };
}
