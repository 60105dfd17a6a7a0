use anyhow::Context;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::time::{Duration, interval};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dashboard_guard::config::Args;
use dashboard_guard::metrics::RATE_LIMIT_KEYS;
use dashboard_guard::rate_limit::RateLimiter;
use dashboard_guard::routes;
use dashboard_guard::session::HttpSessionProvider;
use dashboard_guard::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dashboard_guard=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let sessions = HttpSessionProvider::new(
        reqwest::Client::new(),
        &args.auth_url,
        Duration::from_millis(args.session_timeout_ms),
    );
    info!(url = sessions.session_url(), "Resolving sessions from identity provider");

    let rate_limiter = Arc::new(RateLimiter::new());
    let rate_window = Duration::from_millis(args.rate_window_ms);

    let state = Arc::new(AppState {
        rate_limiter: Arc::clone(&rate_limiter),
        rate_limit: args.rate_limit,
        rate_window,
        admin_rate_limit: args.admin_rate_limit,
        trust_forwarded_for: args.trust_forwarded_for,
        sessions: Arc::new(sessions),
    });

    if args.purge_interval_secs > 0 {
        tokio::spawn(purge_loop(
            rate_limiter,
            rate_window,
            Duration::from_secs(args.purge_interval_secs),
        ));
    }

    let app = routes::app(state);

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!(port = args.port, "Guard running on http://localhost:{}", args.port);
    info!(
        limit = args.rate_limit,
        window_ms = args.rate_window_ms,
        admin_limit = args.admin_rate_limit,
        "Rate limit configured"
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("server error")?;

    Ok(())
}

// Drops rate-limit keys whose window has run out, every `every`
async fn purge_loop(rate_limiter: Arc<RateLimiter>, window: Duration, every: Duration) {
    let mut ticker = interval(every);
    info!(interval = ?every, "Rate-limit purge started");

    loop {
        ticker.tick().await;
        let removed = rate_limiter.purge_expired(window);
        RATE_LIMIT_KEYS.set(rate_limiter.len() as i64);
        if removed > 0 {
            info!(removed, remaining = rate_limiter.len(), "Purged expired rate-limit keys");
        }
    }
}
