use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::error::ApiError;
use crate::state::AppState;

/// Per-client-address sliding window rate limiter.
///
/// Tracks attempt timestamps in memory. Every check sweeps the whole map
/// and evicts addresses whose attempts have all aged out, so one-shot
/// clients do not accumulate for the process lifetime.
pub struct SlidingWindowLimiter {
    max_attempts: u32,
    window: Duration,
    attempts: Mutex<HashMap<IpAddr, Vec<Instant>>>,
}

impl SlidingWindowLimiter {
    pub fn new(max_attempts: u32, window: Duration) -> Self {
        Self {
            max_attempts,
            window,
            attempts: Mutex::new(HashMap::new()),
        }
    }

    /// Record an attempt for the address; returns false when the address
    /// has exhausted its budget inside the current window.
    pub fn allow(&self, addr: IpAddr) -> bool {
        self.allow_at(addr, Instant::now())
    }

    fn allow_at(&self, addr: IpAddr, now: Instant) -> bool {
        let mut attempts = self.attempts.lock().unwrap_or_else(|e| e.into_inner());

        attempts.retain(|_, stamps| {
            stamps.retain(|t| now.duration_since(*t) < self.window);
            !stamps.is_empty()
        });

        let entry = attempts.entry(addr).or_default();
        if entry.len() >= self.max_attempts as usize {
            return false;
        }

        entry.push(now);
        true
    }
}

/// Middleware gating the login route against credential stuffing.
pub async fn login_rate_limit(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !state.login_limiter.allow(addr.ip()) {
        tracing::warn!("Login rate limit exceeded for {}", addr.ip());
        return Err(ApiError::too_many_requests(
            "too many login attempts, try again in 15 minutes",
        ));
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr() -> IpAddr {
        "203.0.113.7".parse().unwrap()
    }

    #[test]
    fn blocks_after_max_attempts_in_window() {
        let limiter = SlidingWindowLimiter::new(10, Duration::from_secs(900));
        let now = Instant::now();

        for _ in 0..10 {
            assert!(limiter.allow_at(addr(), now));
        }
        assert!(!limiter.allow_at(addr(), now));
    }

    #[test]
    fn window_slides_and_frees_budget() {
        let limiter = SlidingWindowLimiter::new(2, Duration::from_secs(900));
        let start = Instant::now();

        assert!(limiter.allow_at(addr(), start));
        assert!(limiter.allow_at(addr(), start));
        assert!(!limiter.allow_at(addr(), start + Duration::from_secs(10)));

        // Both attempts have aged out of the 15-minute window.
        assert!(limiter.allow_at(addr(), start + Duration::from_secs(901)));
    }

    #[test]
    fn stale_addresses_are_evicted_from_the_map() {
        let limiter = SlidingWindowLimiter::new(2, Duration::from_secs(900));
        let start = Instant::now();

        assert!(limiter.allow_at("203.0.113.1".parse().unwrap(), start));

        // A later attempt from a different client sweeps the aged-out entry.
        assert!(limiter.allow_at("203.0.113.2".parse().unwrap(), start + Duration::from_secs(901)));

        let attempts = limiter.attempts.lock().unwrap();
        assert!(!attempts.contains_key(&"203.0.113.1".parse::<IpAddr>().unwrap()));
        assert_eq!(attempts.len(), 1);
    }

    #[test]
    fn addresses_are_tracked_independently() {
        let limiter = SlidingWindowLimiter::new(1, Duration::from_secs(900));
        let now = Instant::now();

        assert!(limiter.allow_at("203.0.113.1".parse().unwrap(), now));
        assert!(limiter.allow_at("203.0.113.2".parse().unwrap(), now));
        assert!(!limiter.allow_at("203.0.113.1".parse().unwrap(), now));
    }
}
