use dashmap::DashMap;
use std::time::{Duration, Instant};

pub const DEFAULT_LIMIT: u32 = 30;
pub const DEFAULT_WINDOW: Duration = Duration::from_millis(60_000);

// Rate limit entry - tracks requests per IP/key
#[derive(Debug, Clone, Copy)]
pub struct RateLimitEntry {
    pub count: u32,
    pub window_start: Instant,
}

/// Outcome of a single rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    /// Requests seen for the key in the current window, this one included.
    pub count: u32,
    pub limit: u32,
    pub remaining: u32,
    /// Time until the current window can be reset by the next request.
    pub reset_after: Duration,
}

/// Fixed-window request counter keyed by an arbitrary string.
///
/// Keys are used as given (no trimming or case folding). Records are created
/// on first use and kept for the lifetime of the limiter; call
/// [`RateLimiter::purge_expired`] to drop stale ones.
#[derive(Debug, Default)]
pub struct RateLimiter {
    entries: DashMap<String, RateLimitEntry>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow(&self, key: &str, limit: u32, window: Duration) -> bool {
        self.check(key, limit, window).allowed
    }

    pub fn allow_at(&self, key: &str, limit: u32, window: Duration, now: Instant) -> bool {
        self.check_at(key, limit, window, now).allowed
    }

    pub fn allow_default(&self, key: &str) -> bool {
        self.allow(key, DEFAULT_LIMIT, DEFAULT_WINDOW)
    }

    pub fn check(&self, key: &str, limit: u32, window: Duration) -> RateDecision {
        self.check_at(key, limit, window, Instant::now())
    }

    /// Records one request for `key` at `now` and decides whether it fits in
    /// the window. The attempt is counted even when it is rejected.
    pub fn check_at(&self, key: &str, limit: u32, window: Duration, now: Instant) -> RateDecision {
        // the entry guard holds the shard lock until the end of this scope
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert(RateLimitEntry {
                count: 0,
                window_start: now,
            });

        // window expired..? reset it (exact boundary does not count as expired)
        if now.saturating_duration_since(entry.window_start) > window {
            entry.count = 0;
            entry.window_start = now;
        }

        entry.count = entry.count.saturating_add(1);

        RateDecision {
            allowed: entry.count <= limit,
            count: entry.count,
            limit,
            remaining: limit.saturating_sub(entry.count),
            reset_after: (entry.window_start + window).saturating_duration_since(now),
        }
    }

    /// Number of keys currently tracked.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<RateLimitEntry> {
        self.entries.get(key).map(|e| *e)
    }

    pub fn purge_expired(&self, window: Duration) -> usize {
        self.purge_expired_at(window, Instant::now())
    }

    /// Drops every record whose window has run out at `now`. Returns how many
    /// were removed.
    pub fn purge_expired_at(&self, window: Duration, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| now.saturating_duration_since(entry.window_start) <= window);
        before.saturating_sub(self.entries.len())
    }
}
