use std::sync::Arc;
use std::time::Duration;
use crate::rate_limit::RateLimiter;
use crate::session::SessionProvider;
// app's shared state

pub struct AppState {
    pub rate_limiter: Arc<RateLimiter>,
    pub rate_limit: u32,       // max requests per IP per window
    pub rate_window: Duration, // duration of rate limit window
    pub admin_rate_limit: u32, // max admin-route requests per user per window
    pub trust_forwarded_for: bool,
    pub sessions: Arc<dyn SessionProvider>,
}
