//! Maintenance gate.
//!
//! While the flag is enabled, everything outside health, auth and the
//! maintenance endpoints answers 503 unless the caller is an admin.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use care_core::Role;
use database::{maintenance, session};

use crate::auth::bearer_token;
use crate::error::ApiError;
use crate::state::AppState;

const OPEN_PREFIXES: &[&str] = &["/api/v1/health", "/api/v1/auth", "/api/v1/maintenance"];

/// Middleware blocking non-admin traffic during maintenance.
pub async fn maintenance_gate(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let path = req.uri().path();
    if OPEN_PREFIXES.iter().any(|prefix| path.starts_with(prefix)) {
        return next.run(req).await;
    }

    let active = match maintenance::is_active(state.db.pool()).await {
        Ok(active) => active,
        Err(err) => return ApiError::from(err).into_response(),
    };
    if !active {
        return next.run(req).await;
    }

    if let Some(token) = bearer_token(req.headers()) {
        if let Ok(Some(user)) = session::find_user_by_token(state.db.pool(), &token).await {
            if user.role == Role::Admin {
                return next.run(req).await;
            }
        }
    }

    ApiError::Unavailable("Maintenance in progress".to_string()).into_response()
}
