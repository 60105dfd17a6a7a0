//! Role-based access checks over an already resolved session.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::warn;

use crate::metrics::AUTHZ_DENIED;
use crate::session::{Role, Session};

/// Roles admitted when the caller does not name any.
pub const DEFAULT_ROLES: &[Role] = &[Role::User];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthzError {
    #[error("authentication required")]
    Unauthorized,

    #[error("role not permitted")]
    Forbidden,
}

impl AuthzError {
    pub fn kind(&self) -> &'static str {
        match self {
            AuthzError::Unauthorized => "unauthorized",
            AuthzError::Forbidden => "forbidden",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AuthzError::Unauthorized => StatusCode::UNAUTHORIZED,
            AuthzError::Forbidden => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for AuthzError {
    fn into_response(self) -> Response {
        AUTHZ_DENIED.with_label_values(&[self.kind()]).inc();
        let body = serde_json::json!({
            "error": self.kind(),
            "message": self.to_string(),
        });
        (self.status(), Json(body)).into_response()
    }
}

/// Checks that `session` carries a user whose role is one of `roles`.
///
/// An empty `roles` slice only requires authentication. Matching is exact:
/// there is no role hierarchy, so ADMIN passes a `[USER]` gate only if listed.
pub fn require_role(session: Option<Session>, roles: &[Role]) -> Result<Session, AuthzError> {
    let Some(session) = session else {
        return Err(AuthzError::Unauthorized);
    };
    let Some(user) = session.user.as_ref() else {
        return Err(AuthzError::Unauthorized);
    };

    if !roles.is_empty() {
        let role = user.effective_role();
        if !roles.contains(&role) {
            warn!(user_id = %user.id, role = %role, "Role not permitted");
            return Err(AuthzError::Forbidden);
        }
    }

    Ok(session)
}

pub fn require_user(session: Option<Session>) -> Result<Session, AuthzError> {
    require_role(session, DEFAULT_ROLES)
}
