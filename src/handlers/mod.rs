mod admin;
mod dashboard;
mod health;
mod metrics;

pub use admin::rate_limits_handler;
pub use dashboard::{dashboard_handler, session_handler};
pub use health::health_handler;
pub use metrics::metrics_handler;
