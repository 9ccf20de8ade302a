//! Fixed-window rate limiting keyed by client IP.
//!
//! # Responsibilities
//! - Track per-IP request counts in fixed time windows
//! - Expose one limiter instance per traffic class (general, auth, upload)
//! - Report limit/remaining/reset so handlers can attach standard headers
//!
//! # Design Decisions
//! - Counters live in process memory; loss on restart resets them, which is
//!   acceptable for advisory DoS protection
//! - The clock is injected so tests drive window expiry deterministically
//! - A counter never exceeds its cap within a live window; excess requests
//!   are rejected, not queued

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use axum::http::{HeaderMap, HeaderName, HeaderValue};

use crate::config::LimiterConfig;

/// Time source for window bookkeeping.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> Instant;
}

/// Wall clock used outside of tests.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Per-IP counter state for one window.
struct WindowCounter {
    count: u32,
    window_start: Instant,
}

/// Outcome of one limiter check. Header values derive from this, so it is
/// produced for allowed and rejected requests alike.
#[derive(Debug, Clone)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_secs: u64,
}

/// One independently configured rate limiter instance.
pub struct FixedWindowLimiter {
    name: &'static str,
    window: Duration,
    max_requests: u32,
    message: String,
    skip_suffixes: Vec<String>,
    counters: Mutex<HashMap<IpAddr, WindowCounter>>,
    clock: Box<dyn Clock>,
}

impl FixedWindowLimiter {
    pub fn new(name: &'static str, config: &LimiterConfig) -> Self {
        Self::with_clock(name, config, Box::new(SystemClock))
    }

    /// Construct with an explicit clock. Tests use this with a manual clock.
    pub fn with_clock(name: &'static str, config: &LimiterConfig, clock: Box<dyn Clock>) -> Self {
        Self {
            name,
            window: Duration::from_secs(config.window_secs),
            max_requests: config.max_requests,
            message: config.message.clone(),
            skip_suffixes: config.skip_path_suffixes.clone(),
            counters: Mutex::new(HashMap::new()),
            clock,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Message for the 429 body.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// True if the path bypasses counting for this limiter entirely.
    pub fn skips(&self, path: &str) -> bool {
        self.skip_suffixes.iter().any(|suffix| path.ends_with(suffix.as_str()))
    }

    /// Check the limiter for a request, or `None` when the path is exempt.
    pub fn evaluate(&self, ip: IpAddr, path: &str) -> Option<RateLimitDecision> {
        if self.skips(path) {
            return None;
        }
        Some(self.check(ip))
    }

    /// Count one request against the window for `ip`.
    pub fn check(&self, ip: IpAddr) -> RateLimitDecision {
        let now = self.clock.now();
        let mut counters = self.counters.lock().expect("rate limiter mutex poisoned");
        let counter = counters.entry(ip).or_insert(WindowCounter {
            count: 0,
            window_start: now,
        });

        if now.duration_since(counter.window_start) >= self.window {
            counter.count = 0;
            counter.window_start = now;
        }

        let allowed = counter.count < self.max_requests;
        if allowed {
            counter.count += 1;
        }

        let reset = self
            .window
            .saturating_sub(now.duration_since(counter.window_start));

        RateLimitDecision {
            allowed,
            limit: self.max_requests,
            remaining: self.max_requests - counter.count,
            reset_secs: reset.as_secs(),
        }
    }
}

static LIMIT: HeaderName = HeaderName::from_static("ratelimit-limit");
static REMAINING: HeaderName = HeaderName::from_static("ratelimit-remaining");
static RESET: HeaderName = HeaderName::from_static("ratelimit-reset");

/// Attach the standard draft rate-limit headers for one decision.
pub fn apply_rate_limit_headers(headers: &mut HeaderMap, decision: &RateLimitDecision) {
    headers.insert(&LIMIT, HeaderValue::from(decision.limit));
    headers.insert(&REMAINING, HeaderValue::from(decision.remaining));
    headers.insert(&RESET, HeaderValue::from(decision.reset_secs));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    /// Clock the tests advance by hand.
    struct ManualClock {
        base: Instant,
        offset: Mutex<Duration>,
    }

    impl ManualClock {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                base: Instant::now(),
                offset: Mutex::new(Duration::ZERO),
            })
        }

        fn advance(&self, by: Duration) {
            *self.offset.lock().unwrap() += by;
        }
    }

    impl Clock for Arc<ManualClock> {
        fn now(&self) -> Instant {
            self.base + *self.offset.lock().unwrap()
        }
    }

    fn limiter(max: u32, window_secs: u64, clock: Arc<ManualClock>) -> FixedWindowLimiter {
        let config = LimiterConfig {
            window_secs,
            max_requests: max,
            message: "limited".to_string(),
            skip_path_suffixes: vec!["/me".to_string()],
        };
        FixedWindowLimiter::with_clock("test", &config, Box::new(clock))
    }

    fn ip(last: u8) -> IpAddr {
        IpAddr::from([127, 0, 0, last])
    }

    #[test]
    fn rejects_after_cap_within_window() {
        let clock = ManualClock::new();
        let limiter = limiter(3, 60, clock);

        for _ in 0..3 {
            assert!(limiter.check(ip(1)).allowed);
        }
        let decision = limiter.check(ip(1));
        assert!(!decision.allowed);
        assert_eq!(decision.remaining, 0);
    }

    #[test]
    fn window_elapse_resets_the_counter() {
        let clock = ManualClock::new();
        let limiter = limiter(2, 60, clock.clone());

        assert!(limiter.check(ip(1)).allowed);
        assert!(limiter.check(ip(1)).allowed);
        assert!(!limiter.check(ip(1)).allowed);

        clock.advance(Duration::from_secs(60));
        let decision = limiter.check(ip(1));
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 1);
    }

    #[test]
    fn counters_are_isolated_per_ip() {
        let clock = ManualClock::new();
        let limiter = limiter(1, 60, clock);

        assert!(limiter.check(ip(1)).allowed);
        assert!(!limiter.check(ip(1)).allowed);
        assert!(limiter.check(ip(2)).allowed);
    }

    #[test]
    fn skip_suffix_bypasses_counting() {
        let clock = ManualClock::new();
        let limiter = limiter(1, 60, clock);

        assert!(limiter.evaluate(ip(1), "/api/auth/me").is_none());
        // Exempt traffic never consumed the budget.
        assert!(limiter.evaluate(ip(1), "/api/auth/login").unwrap().allowed);
        assert!(!limiter.evaluate(ip(1), "/api/auth/login").unwrap().allowed);
        // Still exempt after the cap is exhausted.
        assert!(limiter.evaluate(ip(1), "/api/auth/me").is_none());
    }

    #[test]
    fn reset_counts_down_as_the_window_ages() {
        let clock = ManualClock::new();
        let limiter = limiter(5, 60, clock.clone());

        assert_eq!(limiter.check(ip(1)).reset_secs, 60);
        clock.advance(Duration::from_secs(45));
        assert_eq!(limiter.check(ip(1)).reset_secs, 15);
    }

    #[test]
    fn decision_headers_are_attached() {
        let decision = RateLimitDecision {
            allowed: false,
            limit: 100,
            remaining: 0,
            reset_secs: 42,
        };
        let mut headers = HeaderMap::new();
        apply_rate_limit_headers(&mut headers, &decision);
        assert_eq!(headers["ratelimit-limit"], "100");
        assert_eq!(headers["ratelimit-remaining"], "0");
        assert_eq!(headers["ratelimit-reset"], "42");
    }
}
