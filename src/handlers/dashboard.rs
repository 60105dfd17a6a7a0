use axum::Json;

use crate::authz::{AuthzError, require_role};
use crate::session::{CurrentSession, Role, Session};

// Any signed-in user, whatever the role
pub async fn session_handler(
    CurrentSession(session): CurrentSession,
) -> Result<Json<Session>, AuthzError> {
    require_role(session, &[]).map(Json)
}

pub async fn dashboard_handler(
    CurrentSession(session): CurrentSession,
) -> Result<Json<serde_json::Value>, AuthzError> {
    let session = require_role(session, &[Role::User, Role::Admin])?;
    let user = session.user.ok_or(AuthzError::Unauthorized)?;

    Ok(Json(serde_json::json!({
        "user_id": user.id,
        "role": user.effective_role(),
        "name": user.name,
    })))
}
