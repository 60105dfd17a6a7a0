use clap::Parser;

// CLI argument structure
#[derive(Parser, Debug, Clone)]
#[command(name = "dashboard-guard")]
#[command(about = "Rate limiting and role checks in front of the dashboard API")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, env = "GUARD_PORT", default_value_t = 8080)]
    pub port: u16,

    // Identity provider base URL, session is read from {auth_url}/api/auth/session
    #[arg(short, long, env = "GUARD_AUTH_URL", default_value = "http://localhost:3000")]
    pub auth_url: String,

    // Session lookup timeout in milliseconds
    #[arg(long, env = "GUARD_SESSION_TIMEOUT_MS", default_value_t = 5000)]
    pub session_timeout_ms: u64,

    // Rate limit max requests per window, per client IP
    #[arg(long, env = "GUARD_RATE_LIMIT", default_value_t = 30)]
    pub rate_limit: u32,

    // Rate limit window in milliseconds
    #[arg(long, env = "GUARD_RATE_WINDOW_MS", default_value_t = 60_000)]
    pub rate_window_ms: u64,

    // Admin route limit per user, same window
    #[arg(long, env = "GUARD_ADMIN_RATE_LIMIT", default_value_t = 10)]
    pub admin_rate_limit: u32,

    // Key clients by the first X-Forwarded-For address (only behind a trusted proxy)
    #[arg(long, env = "GUARD_TRUST_FORWARDED_FOR", default_value_t = false)]
    pub trust_forwarded_for: bool,

    // Purge expired rate-limit keys every N seconds, 0 keeps them forever
    #[arg(long, env = "GUARD_PURGE_INTERVAL_SECS", default_value_t = 0)]
    pub purge_interval_secs: u64,
}
