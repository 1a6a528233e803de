//! Registration, login, token refresh and password reset.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use care_core::search::normalize_postal_code;
use care_core::{Role, UserStatus};
use database::family_profile::NewFamilyProfile;
use database::resource_profile::NewResourceProfile;
use database::{family_profile, maintenance, resource_profile, session, user, validation, NewUser};

use crate::auth::{bearer_token, generate_token, hash_password, verify_password, CurrentUser};
use crate::config::{RESET_TOKEN_TTL_SECONDS, SESSION_TTL_SECONDS};
use crate::error::{ApiError, Result};
use crate::routes::users::{sanitize, UserResponse};
use crate::state::AppState;

const NEXT_STEP_FOR_RESOURCE: &str =
    "Complete the onboarding payment to submit your profile for verification";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub role: Role,
    pub display_name: String,
    pub postal_code: String,
    pub city: String,
    pub region: String,
    pub bio: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: UserResponse,
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_step_for_resource: Option<&'static str>,
}

/// `POST /auth/register`
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>> {
    if body.role == Role::Admin {
        return Err(ApiError::Validation(
            "ADMIN registration is disabled".to_string(),
        ));
    }
    validation::validate_email(&body.email)?;
    validation::validate_password(&body.password)?;
    validation::validate_display_name(&body.display_name)?;

    let pool = state.db.pool();
    let email = body.email.trim().to_lowercase();
    if user::find_user_by_email(pool, &email).await?.is_some() {
        return Err(ApiError::Conflict("Email already in use".to_string()));
    }

    let new_user = NewUser {
        id: Uuid::new_v4().to_string(),
        email,
        password_hash: hash_password(&body.password)?,
        role: body.role,
        status: UserStatus::Active,
    };
    user::create_user(pool, &new_user).await?;

    let postal_code = normalize_postal_code(&body.postal_code);
    let tags = body.tags.unwrap_or_default();
    match body.role {
        Role::Family => {
            family_profile::create(
                pool,
                &NewFamilyProfile {
                    id: Uuid::new_v4().to_string(),
                    user_id: new_user.id.clone(),
                    display_name: body.display_name,
                    postal_code,
                    city: body.city,
                    region: body.region,
                    bio: body.bio,
                    needs_tags: tags,
                },
            )
            .await?;
        }
        Role::Resource => {
            resource_profile::create(
                pool,
                &NewResourceProfile {
                    id: Uuid::new_v4().to_string(),
                    user_id: new_user.id.clone(),
                    display_name: body.display_name,
                    postal_code,
                    city: body.city,
                    region: body.region,
                    bio: body.bio,
                    skills_tags: tags,
                },
            )
            .await?;
        }
        Role::Admin => unreachable!("rejected above"),
    }

    let created = user::get_user(pool, &new_user.id).await?;
    let access_token = open_session(&state, &created.id).await?;
    info!(user_id = %created.id, role = %created.role.as_str(), "Account registered");

    Ok(Json(AuthResponse {
        user: sanitize(&created),
        access_token,
        next_step_for_resource: (created.role == Role::Resource).then_some(NEXT_STEP_FOR_RESOURCE),
    }))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// `POST /auth/login`
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let pool = state.db.pool();

    let user = user::find_user_by_email(pool, body.email.trim()).await?;
    let Some(user) = user else {
        return Err(ApiError::Unauthorized(
            "Incorrect email or password".to_string(),
        ));
    };
    if user.status != UserStatus::Active {
        return Err(ApiError::Unauthorized(
            "Account disabled. Contact the administrator.".to_string(),
        ));
    }
    if !verify_password(&user.password_hash, &body.password) {
        return Err(ApiError::Unauthorized(
            "Incorrect email or password".to_string(),
        ));
    }
    if maintenance::is_active(pool).await? && user.role != Role::Admin {
        return Err(ApiError::Unavailable(
            "Sign-in is unavailable during maintenance".to_string(),
        ));
    }

    let access_token = open_session(&state, &user.id).await?;

    Ok(Json(AuthResponse {
        user: sanitize(&user),
        access_token,
        next_step_for_resource: None,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub access_token: String,
}

/// `POST /auth/refresh` — swap a still-valid token for a fresh one.
pub async fn refresh(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>> {
    let pool = state.db.pool();
    let new_token = generate_token();

    let user = session::rotate_session(pool, &body.access_token, &new_token, SESSION_TTL_SECONDS)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid or expired token".to_string()))?;

    if user.status != UserStatus::Active {
        session::delete_session(pool, &new_token).await?;
        return Err(ApiError::Unauthorized("Account disabled".to_string()));
    }
    if maintenance::is_active(pool).await? && user.role != Role::Admin {
        session::delete_session(pool, &new_token).await?;
        return Err(ApiError::Unavailable(
            "Sign-in is unavailable during maintenance".to_string(),
        ));
    }

    Ok(Json(AuthResponse {
        user: sanitize(&user),
        access_token: new_token,
        next_step_for_resource: None,
    }))
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// `POST /auth/logout`
pub async fn logout(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    headers: HeaderMap,
) -> Result<Json<SuccessResponse>> {
    if let Some(token) = bearer_token(&headers) {
        session::delete_session(state.db.pool(), &token).await?;
    }
    info!(user_id = %user.id, "Logged out");

    Ok(Json(SuccessResponse { success: true }))
}

#[derive(Debug, Deserialize)]
pub struct RequestPasswordResetRequest {
    pub email: String,
}

/// `POST /auth/request-password-reset`
///
/// Always answers with a success shape: unknown or disabled emails must be
/// indistinguishable from real ones to avoid account enumeration.
pub async fn request_password_reset(
    State(state): State<AppState>,
    Json(body): Json<RequestPasswordResetRequest>,
) -> Result<Json<SuccessResponse>> {
    let pool = state.db.pool();

    match user::find_user_by_email(pool, body.email.trim()).await? {
        Some(user) if user.status == UserStatus::Active => {
            let token = generate_token();
            session::replace_reset_token(pool, &user.id, &token, RESET_TOKEN_TTL_SECONDS).await?;

            let link = format!("{}/reset-password?token={}", state.config.frontend_url, token);
            state
                .mailer
                .send(
                    &user.email,
                    "Password reset",
                    format!("Reset your password using this link: {link}"),
                )
                .await;
        }
        _ => {
            info!("Password reset requested for unknown or inactive email");
        }
    }

    Ok(Json(SuccessResponse { success: true }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

/// `POST /auth/reset-password` — consumes the token and invalidates every
/// open session for the account.
pub async fn reset_password(
    State(state): State<AppState>,
    Json(body): Json<ResetPasswordRequest>,
) -> Result<Json<SuccessResponse>> {
    validation::validate_password(&body.new_password)?;

    let pool = state.db.pool();
    let user_id = session::consume_reset_token(pool, &body.token)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid or expired reset token".to_string()))?;

    let password_hash = hash_password(&body.new_password)?;
    user::update_password_hash(pool, &user_id, &password_hash).await?;
    session::delete_sessions_for_user(pool, &user_id).await?;
    info!(user_id = %user_id, "Password reset completed");

    Ok(Json(SuccessResponse { success: true }))
}

async fn open_session(state: &AppState, user_id: &str) -> Result<String> {
    let token = generate_token();
    session::create_session(state.db.pool(), &token, user_id, SESSION_TTL_SECONDS).await?;
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::test_state;
    use care_core::{OnboardingState, PublishStatus, VerificationStatus};

    fn resource_registration(email: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: "Password1!".to_string(),
            role: Role::Resource,
            display_name: "Alex".to_string(),
            postal_code: "h2x 2a1".to_string(),
            city: "Montreal".to_string(),
            region: "QC".to_string(),
            bio: Some("Gardiennage et transport.".to_string()),
            tags: Some(vec!["gardiennage".to_string()]),
        }
    }

    #[tokio::test]
    async fn resource_registration_starts_hidden_and_unverified() {
        let state = test_state().await;

        let Json(response) = register(
            State(state.clone()),
            Json(resource_registration("alex@example.com")),
        )
        .await
        .unwrap();
        assert!(response.next_step_for_resource.is_some());
        assert!(!response.access_token.is_empty());

        let profile =
            database::resource_profile::get_by_user(state.db.pool(), &response.user.id)
                .await
                .unwrap();
        assert_eq!(profile.onboarding_state, OnboardingState::PendingPayment);
        assert_eq!(profile.verification_status, VerificationStatus::Draft);
        assert_eq!(profile.publish_status, PublishStatus::Hidden);
        assert_eq!(profile.postal_code, "H2X2A1");
        assert!(!profile.is_search_eligible());
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let state = test_state().await;
        register(
            State(state.clone()),
            Json(resource_registration("dup@example.com")),
        )
        .await
        .unwrap();

        let result = register(
            State(state),
            Json(resource_registration("DUP@example.com")),
        )
        .await;
        assert!(matches!(result, Err(ApiError::Conflict(_))));
    }

    #[tokio::test]
    async fn admin_registration_is_rejected() {
        let state = test_state().await;
        let mut body = resource_registration("admin@example.com");
        body.role = Role::Admin;

        let result = register(State(state), Json(body)).await;
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }

    #[tokio::test]
    async fn login_checks_credentials_and_standing() {
        let state = test_state().await;
        let Json(registered) = register(
            State(state.clone()),
            Json(resource_registration("alex@example.com")),
        )
        .await
        .unwrap();

        let wrong = login(
            State(state.clone()),
            Json(LoginRequest {
                email: "alex@example.com".to_string(),
                password: "WrongPass1!".to_string(),
            }),
        )
        .await;
        assert!(matches!(wrong, Err(ApiError::Unauthorized(_))));

        let unknown = login(
            State(state.clone()),
            Json(LoginRequest {
                email: "nobody@example.com".to_string(),
                password: "Password1!".to_string(),
            }),
        )
        .await;
        assert!(matches!(unknown, Err(ApiError::Unauthorized(_))));

        let Json(ok) = login(
            State(state.clone()),
            Json(LoginRequest {
                email: "Alex@Example.com".to_string(),
                password: "Password1!".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(ok.user.id, registered.user.id);

        user::update_status(state.db.pool(), &registered.user.id, UserStatus::Banned)
            .await
            .unwrap();
        let banned = login(
            State(state),
            Json(LoginRequest {
                email: "alex@example.com".to_string(),
                password: "Password1!".to_string(),
            }),
        )
        .await;
        assert!(matches!(banned, Err(ApiError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn refresh_rotates_the_token() {
        let state = test_state().await;
        let Json(registered) = register(
            State(state.clone()),
            Json(resource_registration("alex@example.com")),
        )
        .await
        .unwrap();

        let Json(refreshed) = refresh(
            State(state.clone()),
            Json(RefreshRequest {
                access_token: registered.access_token.clone(),
            }),
        )
        .await
        .unwrap();
        assert_ne!(refreshed.access_token, registered.access_token);

        // The old token is gone.
        let stale = refresh(
            State(state),
            Json(RefreshRequest {
                access_token: registered.access_token,
            }),
        )
        .await;
        assert!(matches!(stale, Err(ApiError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn password_reset_never_reveals_account_existence() {
        let state = test_state().await;

        let Json(response) = request_password_reset(
            State(state),
            Json(RequestPasswordResetRequest {
                email: "nobody@example.com".to_string(),
            }),
        )
        .await
        .unwrap();
        assert!(response.success);
    }

    #[tokio::test]
    async fn password_reset_flow_replaces_credentials_and_sessions() {
        let state = test_state().await;
        let Json(registered) = register(
            State(state.clone()),
            Json(resource_registration("alex@example.com")),
        )
        .await
        .unwrap();

        request_password_reset(
            State(state.clone()),
            Json(RequestPasswordResetRequest {
                email: "alex@example.com".to_string(),
            }),
        )
        .await
        .unwrap();

        // The handler never exposes the token; read it back from storage the
        // way the emailed link would carry it.
        let token: String =
            sqlx::query_scalar("SELECT token FROM password_reset_tokens WHERE user_id = ?")
                .bind(&registered.user.id)
                .fetch_one(state.db.pool())
                .await
                .unwrap();

        let Json(reset) = reset_password(
            State(state.clone()),
            Json(ResetPasswordRequest {
                token: token.clone(),
                new_password: "Fresh$Pass2".to_string(),
            }),
        )
        .await
        .unwrap();
        assert!(reset.success);

        // Old sessions are dead, the token is one-shot, the new password works.
        assert!(session::find_user_by_token(state.db.pool(), &registered.access_token)
            .await
            .unwrap()
            .is_none());
        let again = reset_password(
            State(state.clone()),
            Json(ResetPasswordRequest {
                token,
                new_password: "Other$Pass3".to_string(),
            }),
        )
        .await;
        assert!(matches!(again, Err(ApiError::Unauthorized(_))));

        login(
            State(state),
            Json(LoginRequest {
                email: "alex@example.com".to_string(),
                password: "Fresh$Pass2".to_string(),
            }),
        )
        .await
        .unwrap();
    }
}
