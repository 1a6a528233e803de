//! Fixed-window rate limiting for authentication endpoints.
//!
//! Budgets apply per client and per endpoint to blunt credential stuffing
//! and reset spam. Search and moderation traffic is deliberately unlimited.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::ApiError;
use crate::state::AppState;

/// In-memory fixed-window counter keyed by caller and endpoint.
#[derive(Clone, Default)]
pub struct RateLimiter {
    windows: Arc<Mutex<HashMap<String, Window>>>,
}

struct Window {
    count: u32,
    started: Instant,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one request against `key`. Returns false once `limit` requests
    /// have been seen inside the current window.
    pub fn try_acquire(&self, key: &str, limit: u32, window: Duration) -> bool {
        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();

        let entry = windows.entry(key.to_string()).or_insert(Window {
            count: 0,
            started: now,
        });
        if now.duration_since(entry.started) >= window {
            entry.count = 0;
            entry.started = now;
        }

        if entry.count >= limit {
            return false;
        }
        entry.count += 1;
        true
    }
}

/// Request budget for an auth endpoint, if it is limited at all.
fn policy(path: &str) -> Option<(u32, Duration)> {
    let endpoint = path.rsplit('/').next().unwrap_or(path);
    match endpoint {
        "register" => Some((5, Duration::from_secs(3600))),
        "login" => Some((5, Duration::from_secs(60))),
        "refresh" => Some((10, Duration::from_secs(60))),
        "request-password-reset" => Some((3, Duration::from_secs(900))),
        "reset-password" => Some((5, Duration::from_secs(900))),
        _ => None,
    }
}

fn client_key(req: &Request) -> String {
    req.headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|| "local".to_string())
}

/// Middleware applied to the auth router.
pub async fn limit_auth(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();
    if let Some((limit, window)) = policy(&path) {
        let key = format!("{}:{}", client_key(&req), path);
        if !state.limiter.try_acquire(&key, limit, window) {
            return ApiError::RateLimited("Too many requests, retry later".to_string())
                .into_response();
        }
    }
    next.run(req).await
}
