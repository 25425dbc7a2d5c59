use sqlx::PgPool;
use std::sync::Arc;

use crate::middleware::rate_limit::SlidingWindowLimiter;

/// Shared application state injected into every handler.
///
/// The pool is the explicitly-owned database resource; transactional
/// sequences acquire a connection from it and release on every exit path.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub login_limiter: Arc<SlidingWindowLimiter>,
}

impl AppState {
    pub fn new(pool: PgPool, login_limiter: SlidingWindowLimiter) -> Self {
        Self {
            pool,
            login_limiter: Arc::new(login_limiter),
        }
    }
}
