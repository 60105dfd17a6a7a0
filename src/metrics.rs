use lazy_static::lazy_static;
use prometheus::{
    Counter, Histogram, IntCounterVec, IntGauge, register_counter, register_histogram,
    register_int_counter_vec, register_int_gauge,
};


lazy_static! {
    pub static ref REQUEST_TOTAL: Counter =
        register_counter!("guard_requests_total", "Total number of API requests").unwrap();
    pub static ref RATE_LIMITED: Counter =
        register_counter!("guard_rate_limited_total", "Requests rejected by the rate limiter").unwrap();
    pub static ref AUTHZ_DENIED: IntCounterVec = register_int_counter_vec!(
        "guard_authz_denied_total",
        "Requests rejected by the role guard",
        &["kind"]
    )
    .unwrap();
    pub static ref RATE_LIMIT_KEYS: IntGauge =
        register_int_gauge!("guard_rate_limit_keys", "Keys currently tracked by the rate limiter").unwrap();
    pub static ref SESSION_RESOLVE_SECONDS: Histogram = register_histogram!(
        "guard_session_resolve_seconds",
        "Session resolution latency in seconds"
    )
    .unwrap();
}
