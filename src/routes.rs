use axum::{Router, middleware, routing::get};
use std::sync::Arc;

use crate::handlers::{
    dashboard_handler, health_handler, metrics_handler, rate_limits_handler, session_handler,
};
use crate::middleware::rate_limit_middleware;
use crate::state::AppState;

pub fn app(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/session", get(session_handler))
        .route("/dashboard", get(dashboard_handler))
        .route("/admin/rate-limits", get(rate_limits_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ));

    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .nest("/api", api)
        .with_state(state)
}
