//! Request guard for the dashboard API: a fixed-window rate limiter and a
//! role check over the caller's session, wired into an axum router.

pub mod authz;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod rate_limit;
pub mod routes;
pub mod session;
pub mod state;
