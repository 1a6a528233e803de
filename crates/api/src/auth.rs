//! Password hashing, bearer tokens and the caller extractors.
//!
//! Tokens are opaque random strings held in the sessions table rather than
//! signed claims; lookups hit storage on every authenticated request and a
//! deleted or expired row ends the session immediately.

use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use rand::distributions::Alphanumeric;
use rand::Rng;

use care_core::{Role, UserStatus};
use database::models::User;
use database::session;

use crate::error::ApiError;
use crate::state::AppState;

const TOKEN_LENGTH: usize = 48;

/// Hash a password with argon2id.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(format!("password hashing failed: {e}")))?;
    Ok(hash.to_string())
}

/// Check a password against a stored PHC hash. Malformed hashes verify as
/// false rather than erroring.
pub fn verify_password(stored_hash: &str, password: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Generate an opaque bearer token.
pub fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// Pull the bearer token out of the Authorization header.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

async fn resolve_user(state: &AppState, headers: &HeaderMap) -> Result<Option<User>, ApiError> {
    let Some(token) = bearer_token(headers) else {
        return Ok(None);
    };
    let user = session::find_user_by_token(state.db.pool(), &token).await?;
    Ok(user)
}

/// Required authentication. Rejects missing/expired tokens and disabled
/// accounts.
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = resolve_user(state, &parts.headers)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("Missing or invalid access token".to_string()))?;
        if user.status != UserStatus::Active {
            return Err(ApiError::Unauthorized("Account disabled".to_string()));
        }
        Ok(CurrentUser(user))
    }
}

/// Optional authentication. Anonymous and invalid/disabled callers resolve
/// to `None` instead of failing, so public endpoints can still shape their
/// response per caller.
pub struct OptionalCurrentUser(pub Option<User>);

#[async_trait]
impl FromRequestParts<AppState> for OptionalCurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = resolve_user(state, &parts.headers)
            .await?
            .filter(|u| u.status == UserStatus::Active);
        Ok(OptionalCurrentUser(user))
    }
}

/// Required admin authentication.
pub struct AdminUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if user.role != Role::Admin {
            return Err(ApiError::Forbidden("Admin role required".to_string()));
        }
        Ok(AdminUser(user))
    }
}
