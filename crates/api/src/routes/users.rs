//! Account routes and the admin console (families, statuses, audit trail).

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

use care_core::{Role, UserStatus};
use database::listing::{clamp_page, clamp_page_size, SortOrder};
use database::models::{AuditLogEntry, Subscription, User};
use database::user::{FamilyListFilter, FamilySort};
use database::{audit_log, family_profile, subscription, user};

use crate::auth::{AdminUser, CurrentUser};
use crate::error::{ApiError, Result};
use crate::routes::Paginated;
use crate::state::AppState;

/// Account fields safe to put on the wire.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub role: Role,
    pub status: UserStatus,
    pub created_at: String,
    pub updated_at: String,
}

/// Strip the credential fields off an account.
pub fn sanitize(user: &User) -> UserResponse {
    UserResponse {
        id: user.id.clone(),
        email: user.email.clone(),
        role: user.role,
        status: user.status,
        created_at: user.created_at.clone(),
        updated_at: user.updated_at.clone(),
    }
}

/// `GET /users/me`
pub async fn me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(sanitize(&user))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyListQuery {
    pub query: Option<String>,
    pub status: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyAdminItem {
    #[serde(flatten)]
    pub user: UserResponse,
    pub profile: Option<FamilyProfileSummary>,
    pub subscription: Option<SubscriptionSummary>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyProfileSummary {
    pub id: String,
    pub display_name: String,
    pub city: String,
    pub region: String,
    pub postal_code: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionSummary {
    pub status: care_core::SubscriptionStatus,
    pub current_period_end: Option<String>,
    pub updated_at: String,
}

impl From<&Subscription> for SubscriptionSummary {
    fn from(sub: &Subscription) -> Self {
        SubscriptionSummary {
            status: sub.status,
            current_period_end: sub.current_period_end.clone(),
            updated_at: sub.updated_at.clone(),
        }
    }
}

/// `GET /users/families` — admin listing of family accounts with profile and
/// latest subscription summaries.
pub async fn list_families(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(params): Query<FamilyListQuery>,
) -> Result<Json<Paginated<FamilyAdminItem>>> {
    let pool = state.db.pool();
    // Unknown status strings are treated as absent, matching the resource
    // listing.
    let status = params
        .status
        .as_deref()
        .and_then(|s| UserStatus::parse(s).ok());

    let filter = FamilyListFilter {
        query: params.query.unwrap_or_default(),
        status,
        page: clamp_page(params.page),
        page_size: clamp_page_size(params.page_size, 10, 50),
        sort: FamilySort::parse(params.sort_by.as_deref()),
        sort_order: SortOrder::parse(params.sort_order.as_deref()),
    };

    let (total, families) = user::list_families(pool, &filter).await?;

    let mut items = Vec::with_capacity(families.len());
    for family in &families {
        let profile = family_profile::find_by_user(pool, &family.id)
            .await?
            .map(|p| FamilyProfileSummary {
                id: p.id,
                display_name: p.display_name,
                city: p.city,
                region: p.region,
                postal_code: p.postal_code,
            });
        let latest = subscription::latest_for_user(pool, &family.id).await?;
        items.push(FamilyAdminItem {
            user: sanitize(family),
            profile,
            subscription: latest.as_ref().map(SubscriptionSummary::from),
        });
    }

    Ok(Json(Paginated::new(
        total,
        filter.page,
        filter.page_size,
        items,
    )))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: UserStatus,
}

/// `PATCH /users/:user_id/status` — admin, audited.
pub async fn update_status(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(user_id): Path<String>,
    Json(body): Json<UpdateStatusRequest>,
) -> Result<Json<UserResponse>> {
    let pool = state.db.pool();
    let updated = user::update_status(pool, &user_id, body.status).await?;
    audit_log::record(
        pool,
        &admin.id,
        "USER_STATUS_UPDATED",
        "USER",
        &user_id,
        json!({ "status": body.status }),
    )
    .await?;

    Ok(Json(sanitize(&updated)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkUpdateStatusRequest {
    pub user_ids: Vec<String>,
    pub status: UserStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkUpdateResponse {
    pub updated_count: u64,
}

/// `PATCH /users/status/bulk` — admin; only FAMILY rows match, other ids are
/// skipped silently. Exactly one audit entry for the whole batch.
pub async fn bulk_update_status(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(body): Json<BulkUpdateStatusRequest>,
) -> Result<Json<BulkUpdateResponse>> {
    if body.user_ids.is_empty() {
        return Err(ApiError::Validation("userIds must not be empty".to_string()));
    }

    let pool = state.db.pool();
    let updated_count = user::bulk_update_status(pool, &body.user_ids, body.status).await?;
    audit_log::record(
        pool,
        &admin.id,
        "USER_STATUS_BULK_UPDATED",
        "USER",
        audit_log::BULK_TARGET,
        json!({ "userIds": body.user_ids, "status": body.status }),
    )
    .await?;

    Ok(Json(BulkUpdateResponse { updated_count }))
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: Role,
}

/// `PATCH /users/:user_id/role` — admin, audited.
pub async fn update_role(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(user_id): Path<String>,
    Json(body): Json<UpdateRoleRequest>,
) -> Result<Json<UserResponse>> {
    let pool = state.db.pool();
    let updated = user::update_role(pool, &user_id, body.role).await?;
    audit_log::record(
        pool,
        &admin.id,
        "USER_ROLE_UPDATED",
        "USER",
        &user_id,
        json!({ "role": body.role }),
    )
    .await?;

    Ok(Json(sanitize(&updated)))
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// `DELETE /users/:user_id` — admin account removal; profiles, sessions and
/// conversations cascade away with the user.
pub async fn delete_account(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(user_id): Path<String>,
) -> Result<Json<SuccessResponse>> {
    let pool = state.db.pool();
    user::delete_user(pool, &user_id).await?;
    audit_log::record(
        pool,
        &admin.id,
        "USER_DELETED",
        "USER",
        &user_id,
        json!({}),
    )
    .await?;

    Ok(Json(SuccessResponse { success: true }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditListQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// `GET /users/admin/audit` — reverse-chronological audit trail.
pub async fn list_audit_logs(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(params): Query<AuditListQuery>,
) -> Result<Json<Paginated<AuditLogEntry>>> {
    let page = clamp_page(params.page);
    let page_size = clamp_page_size(params.page_size, 20, 100);

    let (total, entries) = audit_log::list(state.db.pool(), page, page_size).await?;

    Ok(Json(Paginated::new(total, page, page_size, entries)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::{seed_family, seed_user, test_state};

    #[tokio::test]
    async fn bulk_status_update_audits_once_with_bulk_target() {
        let state = test_state().await;
        let admin = seed_user(&state, "admin", "admin@example.com", Role::Admin).await;
        seed_family(&state, "a", false).await;
        seed_family(&state, "b", false).await;

        let Json(response) = bulk_update_status(
            State(state.clone()),
            AdminUser(admin),
            Json(BulkUpdateStatusRequest {
                user_ids: vec![
                    "family-a".to_string(),
                    "family-b".to_string(),
                    "ghost".to_string(),
                ],
                status: UserStatus::Banned,
            }),
        )
        .await
        .unwrap();
        assert_eq!(response.updated_count, 2);

        let (total, entries) = audit_log::list(state.db.pool(), 1, 10).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(entries[0].target_id, audit_log::BULK_TARGET);
        assert_eq!(entries[0].action, "USER_STATUS_BULK_UPDATED");
    }

    #[tokio::test]
    async fn single_status_update_is_audited_per_target() {
        let state = test_state().await;
        let admin = seed_user(&state, "admin", "admin@example.com", Role::Admin).await;
        seed_family(&state, "a", false).await;

        let Json(updated) = update_status(
            State(state.clone()),
            AdminUser(admin),
            Path("family-a".to_string()),
            Json(UpdateStatusRequest {
                status: UserStatus::Banned,
            }),
        )
        .await
        .unwrap();
        assert_eq!(updated.status, UserStatus::Banned);

        let (_, entries) = audit_log::list(state.db.pool(), 1, 10).await.unwrap();
        assert_eq!(entries[0].target_id, "family-a");
        assert_eq!(entries[0].payload.0["status"], "BANNED");
    }

    #[tokio::test]
    async fn family_listing_carries_profile_and_subscription() {
        let state = test_state().await;
        let admin = seed_user(&state, "admin", "admin@example.com", Role::Admin).await;
        seed_family(&state, "paying", true).await;
        seed_family(&state, "free", false).await;

        let Json(page) = list_families(
            State(state),
            AdminUser(admin),
            Query(FamilyListQuery {
                query: None,
                status: None,
                page: None,
                page_size: None,
                sort_by: Some("email".to_string()),
                sort_order: Some("asc".to_string()),
            }),
        )
        .await
        .unwrap();

        assert_eq!(page.total, 2);
        let paying = page
            .items
            .iter()
            .find(|item| item.user.id == "family-paying")
            .unwrap();
        assert!(paying.subscription.is_some());
        assert_eq!(
            paying.profile.as_ref().unwrap().display_name,
            "Famille paying"
        );
        let free = page
            .items
            .iter()
            .find(|item| item.user.id == "family-free")
            .unwrap();
        assert!(free.subscription.is_none());
    }

    #[tokio::test]
    async fn audit_trail_pages_newest_first() {
        let state = test_state().await;
        let admin = seed_user(&state, "admin", "admin@example.com", Role::Admin).await;
        for i in 0..3 {
            audit_log::record(
                state.db.pool(),
                &admin.id,
                "RESOURCE_MODERATED",
                "RESOURCE_PROFILE",
                &format!("rp-{i}"),
                serde_json::json!({}),
            )
            .await
            .unwrap();
        }

        let Json(page) = list_audit_logs(
            State(state),
            AdminUser(admin),
            Query(AuditListQuery {
                page: Some(1),
                page_size: Some(2),
            }),
        )
        .await
        .unwrap();

        assert_eq!(page.total, 3);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].target_id, "rp-2");
    }

    #[tokio::test]
    async fn account_removal_cascades_and_audits() {
        let state = test_state().await;
        let admin = seed_user(&state, "admin", "admin@example.com", Role::Admin).await;
        seed_family(&state, "a", false).await;

        delete_account(
            State(state.clone()),
            AdminUser(admin),
            Path("family-a".to_string()),
        )
        .await
        .unwrap();

        let gone = user::get_user(state.db.pool(), "family-a").await;
        assert!(gone.is_err());
        let profile = family_profile::find_by_user(state.db.pool(), "family-a")
            .await
            .unwrap();
        assert!(profile.is_none());

        let (_, entries) = audit_log::list(state.db.pool(), 1, 10).await.unwrap();
        assert_eq!(entries[0].action, "USER_DELETED");
    }
}
