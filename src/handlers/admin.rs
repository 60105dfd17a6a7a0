use axum::{Json, extract::State};
use std::sync::Arc;
use tracing::{info, warn};

use crate::authz::{AuthzError, require_role};
use crate::error::ApiError;
use crate::session::{CurrentSession, Role};
use crate::state::AppState;

/// Admin view of the limiter. Also limited per admin user on top of the
/// per-IP limit.
pub async fn rate_limits_handler(
    State(state): State<Arc<AppState>>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<serde_json::Value>, ApiError> {
    let session = require_role(session, &[Role::Admin])?;
    let user = session.user.ok_or(AuthzError::Unauthorized)?;

    let key = format!("admin:user:{}", user.id);
    let decision = state
        .rate_limiter
        .check(&key, state.admin_rate_limit, state.rate_window);
    if !decision.allowed {
        warn!(user_id = %user.id, "Admin rate limit exceeded");
        return Err(ApiError::RateLimited(decision));
    }

    info!(user_id = %user.id, "Rate limiter inspected");
    Ok(Json(serde_json::json!({
        "tracked_keys": state.rate_limiter.len(),
        "limit": state.rate_limit,
        "window_ms": state.rate_window.as_millis() as u64,
    })))
}
