//! Per-client rate limiting for the API routes.

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{ApiError, rate_limit_headers};
use crate::metrics::{RATE_LIMIT_KEYS, REQUEST_TOTAL};
use crate::state::AppState;

/// Rate-limit key for the caller: `ip:<addr>`.
pub fn client_key(state: &AppState, request: &Request) -> String {
    if state.trust_forwarded_for {
        let forwarded = request
            .headers()
            .get("x-forwarded-for")
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.split(',').next())
            .map(str::trim)
            .filter(|s| !s.is_empty());
        if let Some(ip) = forwarded {
            return format!("ip:{}", ip);
        }
    }

    match request.extensions().get::<ConnectInfo<SocketAddr>>() {
        Some(ConnectInfo(addr)) => format!("ip:{}", addr.ip()),
        None => "ip:unknown".to_string(),
    }
}

pub async fn rate_limit_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    REQUEST_TOTAL.inc();

    let key = client_key(&state, &request);
    let decision = state
        .rate_limiter
        .check(&key, state.rate_limit, state.rate_window);
    RATE_LIMIT_KEYS.set(state.rate_limiter.len() as i64);

    if !decision.allowed {
        warn!(
            key = %key,
            count = decision.count,
            limit = decision.limit,
            "Rate limit exceeded"
        );
        return ApiError::RateLimited(decision).into_response();
    }

    debug!(key = %key, remaining = decision.remaining, "Request allowed");
    let response = next.run(request).await;
    (rate_limit_headers(&decision), response).into_response()
}
