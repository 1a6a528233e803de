//! Route handlers and the versioned router.

pub mod auth;
pub mod billing;
pub mod health;
pub mod maintenance;
pub mod messaging;
pub mod profiles;
pub mod search;
pub mod users;

use axum::middleware;
use axum::routing::{delete, get, patch, post};
use axum::Router;
use serde::Serialize;

use crate::state::AppState;
use crate::{error, guard, rate_limit};

/// Standard paginated listing envelope for the admin console.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
    pub items: Vec<T>,
}

impl<T> Paginated<T> {
    pub fn new(total: i64, page: i64, page_size: i64, items: Vec<T>) -> Self {
        Self {
            total,
            page,
            page_size,
            total_pages: database::listing::total_pages(total, page_size),
            items,
        }
    }
}

/// Build the application router with all routes under `/api/v1`.
pub fn router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/logout", post(auth::logout))
        .route("/request-password-reset", post(auth::request_password_reset))
        .route("/reset-password", post(auth::reset_password))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::limit_auth,
        ));

    let api = Router::new()
        .nest("/auth", auth_routes)
        .route("/health", get(health::health))
        // Profiles
        .route("/profiles/me", get(profiles::get_my_profile))
        .route("/profiles/family/me", patch(profiles::update_my_family_profile))
        .route(
            "/profiles/resource/me",
            patch(profiles::update_my_resource_profile),
        )
        .route("/profiles/resource/:resource_id", get(profiles::get_resource))
        .route(
            "/profiles/resource/:resource_id/moderation",
            patch(profiles::moderate_resource),
        )
        .route(
            "/profiles/resources/moderation/bulk",
            patch(profiles::bulk_moderate_resources),
        )
        .route(
            "/profiles/resources/admin",
            get(profiles::list_resources_for_admin),
        )
        // Search
        .route("/search/resources", get(search::search_resources))
        // Users and the admin console
        .route("/users/me", get(users::me))
        .route("/users/families", get(users::list_families))
        .route("/users/admin/audit", get(users::list_audit_logs))
        .route("/users/status/bulk", patch(users::bulk_update_status))
        .route("/users/:user_id/status", patch(users::update_status))
        .route("/users/:user_id/role", patch(users::update_role))
        .route("/users/:user_id", delete(users::delete_account))
        // Messaging
        .route(
            "/messaging/conversations",
            post(messaging::create_conversation).get(messaging::list_conversations),
        )
        .route(
            "/messaging/conversations/:conversation_id",
            get(messaging::get_conversation),
        )
        .route(
            "/messaging/conversations/:conversation_id/messages",
            post(messaging::send_message),
        )
        // Billing
        .route("/billing/webhook", post(billing::webhook))
        // Maintenance
        .route(
            "/maintenance",
            get(maintenance::get_state).put(maintenance::set_state),
        );

    Router::new()
        .nest("/api/v1", api)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            guard::maintenance_gate,
        ))
        .layer(middleware::from_fn(error::attach_error_context))
        .with_state(state)
}
