//! Application state shared across handlers.

use std::sync::Arc;

use database::Database;

use crate::config::Config;
use crate::mailer::Mailer;
use crate::rate_limit::RateLimiter;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Database connection.
    pub db: Database,
    /// Transactional email sender.
    pub mailer: Mailer,
    /// Fixed-window limiter for auth endpoints.
    pub limiter: RateLimiter,
    /// Static configuration.
    pub config: Arc<Config>,
}

impl AppState {
    /// Create new application state.
    pub fn new(db: Database, mailer: Mailer, config: Config) -> Self {
        Self {
            db,
            mailer,
            limiter: RateLimiter::new(),
            config: Arc::new(config),
        }
    }
}
