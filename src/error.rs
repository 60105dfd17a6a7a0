use axum::{
    Json,
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::authz::AuthzError;
use crate::metrics::RATE_LIMITED;
use crate::rate_limit::RateDecision;

pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");

/// Error returned by API handlers and the rate-limit middleware.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Authz(#[from] AuthzError),

    #[error("rate limit exceeded")]
    RateLimited(RateDecision),
}

/// Whole seconds until the window resets, at least one.
pub fn retry_after_secs(decision: &RateDecision) -> u64 {
    let secs = decision.reset_after.as_secs();
    if decision.reset_after.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs.max(1)
    }
}

/// `X-RateLimit-*` headers describing `decision`.
pub fn rate_limit_headers(decision: &RateDecision) -> [(HeaderName, HeaderValue); 2] {
    [
        (X_RATELIMIT_LIMIT, HeaderValue::from(decision.limit)),
        (X_RATELIMIT_REMAINING, HeaderValue::from(decision.remaining)),
    ]
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Authz(err) => err.into_response(),
            ApiError::RateLimited(decision) => {
                RATE_LIMITED.inc();
                let retry_after = retry_after_secs(&decision);
                let body = serde_json::json!({
                    "error": "rate_limit_exceeded",
                    "message": "Too many requests. Please slow down.",
                    "retry_after_seconds": retry_after,
                });
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    [("Retry-After", retry_after.to_string())],
                    rate_limit_headers(&decision),
                    Json(body),
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn denied(reset_after: Duration) -> RateDecision {
        RateDecision {
            allowed: false,
            count: 4,
            limit: 3,
            remaining: 0,
            reset_after,
        }
    }

    #[test]
    fn retry_after_rounds_up() {
        assert_eq!(retry_after_secs(&denied(Duration::from_millis(1500))), 2);
        assert_eq!(retry_after_secs(&denied(Duration::from_secs(3))), 3);
        assert_eq!(retry_after_secs(&denied(Duration::ZERO)), 1);
    }

    #[test]
    fn rate_limited_response_has_headers() {
        let res = ApiError::RateLimited(denied(Duration::from_millis(600))).into_response();
        assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(res.headers()["retry-after"], "1");
        assert_eq!(res.headers()["x-ratelimit-limit"], "3");
        assert_eq!(res.headers()["x-ratelimit-remaining"], "0");
    }

    #[test]
    fn authz_errors_pass_through() {
        let res = ApiError::from(AuthzError::Forbidden).into_response();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }
}
