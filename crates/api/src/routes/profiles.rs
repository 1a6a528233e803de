//! Profile routes: self-service editing, the public/premium profile fetch,
//! and the admin moderation console.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use care_core::search::normalize_postal_code;
use care_core::visibility::resolve_view;
use care_core::{
    BackgroundCheckStatus, Caller, ModerationUpdate, OnboardingState, PublishStatus, Role,
    VerificationStatus,
};
use database::family_profile::FamilyProfileUpdate;
use database::listing::{clamp_page, clamp_page_size, SortOrder};
use database::models::FamilyProfile;
use database::resource_profile::{ResourceListFilter, ResourceProfileUpdate, ResourceSort};
use database::{audit_log, family_profile, resource_profile, subscription, user};

use crate::auth::{AdminUser, CurrentUser, OptionalCurrentUser};
use crate::error::{ApiError, Result};
use crate::routes::users::{sanitize, UserResponse};
use crate::routes::Paginated;
use crate::state::AppState;

/// `GET /profiles/me` — the caller's own profile. Shape depends on role.
pub async fn get_my_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Value>> {
    let pool = state.db.pool();
    match user.role {
        Role::Family => {
            let profile = family_profile::get_by_user(pool, &user.id).await?;
            Ok(Json(serde_json::to_value(profile).map_err(internal)?))
        }
        Role::Resource => {
            let profile = resource_profile::get_by_user(pool, &user.id).await?;
            let caller = Caller::new(user.id, Role::Resource);
            let view = resolve_view(&profile, Some(&caller));
            Ok(Json(serde_json::to_value(view).map_err(internal)?))
        }
        Role::Admin => Ok(Json(json!({ "userRole": "ADMIN" }))),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFamilyProfileRequest {
    pub display_name: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub bio: Option<String>,
    pub needs_tags: Option<Vec<String>>,
    pub availability: Option<Value>,
}

/// `PATCH /profiles/family/me`
pub async fn update_my_family_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<UpdateFamilyProfileRequest>,
) -> Result<Json<FamilyProfile>> {
    if user.role != Role::Family {
        return Err(ApiError::Forbidden(
            "Only FAMILY can update this profile".to_string(),
        ));
    }

    let update = FamilyProfileUpdate {
        display_name: body.display_name,
        postal_code: body.postal_code.as_deref().map(normalize_postal_code),
        city: body.city,
        region: body.region,
        bio: body.bio,
        needs_tags: body.needs_tags,
        availability: body.availability,
    };
    let updated = family_profile::update_by_user(state.db.pool(), &user.id, &update).await?;

    Ok(Json(updated))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResourceProfileRequest {
    pub display_name: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub bio: Option<String>,
    pub skills_tags: Option<Vec<String>>,
    pub hourly_rate: Option<f64>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub availability: Option<Value>,
    pub questionnaire_answers: Option<Value>,
    /// Allies may only commit to a check: NOT_REQUESTED to REQUESTED.
    pub background_check_status: Option<BackgroundCheckStatus>,
}

/// `PATCH /profiles/resource/me`
///
/// Never touches the lifecycle columns; those belong to moderation and the
/// payment webhook.
pub async fn update_my_resource_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<UpdateResourceProfileRequest>,
) -> Result<Json<Value>> {
    if user.role != Role::Resource {
        return Err(ApiError::Forbidden(
            "Only RESOURCE can update this profile".to_string(),
        ));
    }

    let pool = state.db.pool();
    let current = resource_profile::get_by_user(pool, &user.id).await?;

    if let Some(requested) = body.background_check_status {
        let allowed = current.background_check_status == BackgroundCheckStatus::NotRequested
            && requested == BackgroundCheckStatus::Requested;
        if !allowed && requested != current.background_check_status {
            return Err(ApiError::Forbidden(
                "Background check status can only move from NOT_REQUESTED to REQUESTED".to_string(),
            ));
        }
    }

    let update = ResourceProfileUpdate {
        display_name: body.display_name,
        postal_code: body.postal_code.as_deref().map(normalize_postal_code),
        city: body.city,
        region: body.region,
        bio: body.bio,
        skills_tags: body.skills_tags,
        hourly_rate: body.hourly_rate,
        contact_email: body.contact_email,
        contact_phone: body.contact_phone,
        availability: body.availability,
        questionnaire_answers: body.questionnaire_answers,
        background_check_status: body.background_check_status,
    };
    let updated = resource_profile::update_by_user(pool, &user.id, &update).await?;

    let caller = Caller::new(user.id, Role::Resource);
    let view = resolve_view(&updated, Some(&caller));
    Ok(Json(serde_json::to_value(view).map_err(internal)?))
}

/// `GET /profiles/resource/:resource_id` — public or premium view per the
/// caller's subscription standing.
pub async fn get_resource(
    State(state): State<AppState>,
    OptionalCurrentUser(user): OptionalCurrentUser,
    Path(resource_id): Path<String>,
) -> Result<Json<Value>> {
    let pool = state.db.pool();
    let profile = resource_profile::get(pool, &resource_id).await?;

    let caller = match user {
        Some(user) => {
            let premium = user.role == Role::Family
                && subscription::has_active_subscription(pool, &user.id).await?;
            Some(Caller::new(user.id, user.role).with_premium(premium))
        }
        None => None,
    };

    let view = resolve_view(&profile, caller.as_ref());
    Ok(Json(serde_json::to_value(view).map_err(internal)?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceAdminQuery {
    pub query: Option<String>,
    pub verification_status: Option<String>,
    pub publish_status: Option<String>,
    pub onboarding_state: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceAdminItem {
    pub id: String,
    pub user_id: String,
    pub display_name: String,
    pub city: String,
    pub region: String,
    pub postal_code: String,
    pub skills_tags: Vec<String>,
    pub verification_status: VerificationStatus,
    pub publish_status: PublishStatus,
    pub onboarding_state: OnboardingState,
    pub background_check_status: BackgroundCheckStatus,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub updated_at: String,
    pub user: UserResponse,
}

/// `GET /profiles/resources/admin` — moderation console listing.
///
/// Unknown enum filter values are treated as absent rather than rejected, so
/// a stale console build cannot lock admins out of the listing.
pub async fn list_resources_for_admin(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(params): Query<ResourceAdminQuery>,
) -> Result<Json<Paginated<ResourceAdminItem>>> {
    let pool = state.db.pool();

    let filter = ResourceListFilter {
        query: params.query.unwrap_or_default(),
        verification_status: params
            .verification_status
            .as_deref()
            .and_then(|s| VerificationStatus::parse(s).ok()),
        publish_status: params
            .publish_status
            .as_deref()
            .and_then(|s| PublishStatus::parse(s).ok()),
        onboarding_state: params
            .onboarding_state
            .as_deref()
            .and_then(|s| OnboardingState::parse(s).ok()),
        page: clamp_page(params.page),
        page_size: clamp_page_size(params.page_size, 10, 50),
        sort: Some(ResourceSort::parse(params.sort_by.as_deref())),
        sort_order: Some(SortOrder::parse(params.sort_order.as_deref())),
    };

    let (total, profiles) = resource_profile::list_for_admin(pool, &filter).await?;

    let mut items = Vec::with_capacity(profiles.len());
    for profile in profiles {
        let owner = user::get_user(pool, &profile.user_id).await?;
        items.push(ResourceAdminItem {
            id: profile.id,
            user_id: profile.user_id,
            display_name: profile.display_name,
            city: profile.city,
            region: profile.region,
            postal_code: profile.postal_code,
            skills_tags: profile.skills_tags,
            verification_status: profile.verification_status,
            publish_status: profile.publish_status,
            onboarding_state: profile.onboarding_state,
            background_check_status: profile.background_check_status,
            contact_email: profile.contact_email,
            contact_phone: profile.contact_phone,
            updated_at: profile.updated_at,
            user: sanitize(&owner),
        });
    }

    Ok(Json(Paginated::new(
        total,
        filter.page,
        filter.page_size,
        items,
    )))
}

/// `PATCH /profiles/resource/:resource_id/moderation`
///
/// Applies the submitted lifecycle fields as-is and appends exactly one
/// audit entry. A missing profile fails before anything is written.
pub async fn moderate_resource(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(resource_id): Path<String>,
    Json(update): Json<ModerationUpdate>,
) -> Result<Json<care_core::ResourceProfile>> {
    if update.is_empty() {
        return Err(ApiError::Validation(
            "At least one moderation field is required".to_string(),
        ));
    }

    let pool = state.db.pool();
    let updated = resource_profile::moderate(pool, &resource_id, &update).await?;
    audit_log::record(
        pool,
        &admin.id,
        "RESOURCE_MODERATED",
        "RESOURCE_PROFILE",
        &resource_id,
        serde_json::to_value(&update).map_err(internal)?,
    )
    .await?;

    Ok(Json(updated))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkModerateRequest {
    pub resource_ids: Vec<String>,
    #[serde(flatten)]
    pub update: ModerationUpdate,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkModerateResponse {
    pub updated_count: u64,
}

/// `PATCH /profiles/resources/moderation/bulk`
///
/// Ids without a matching profile are skipped silently; the whole batch
/// produces one audit entry with the id list in the payload.
pub async fn bulk_moderate_resources(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(body): Json<BulkModerateRequest>,
) -> Result<Json<BulkModerateResponse>> {
    if body.resource_ids.is_empty() {
        return Err(ApiError::Validation(
            "resourceIds must not be empty".to_string(),
        ));
    }
    if body.update.is_empty() {
        return Err(ApiError::Validation(
            "At least one moderation field is required".to_string(),
        ));
    }

    let pool = state.db.pool();
    let updated_count =
        resource_profile::bulk_moderate(pool, &body.resource_ids, &body.update).await?;

    let mut payload = serde_json::to_value(&body.update).map_err(internal)?;
    payload["resourceIds"] = json!(body.resource_ids);
    audit_log::record(
        pool,
        &admin.id,
        "RESOURCE_BULK_MODERATED",
        "RESOURCE_PROFILE",
        audit_log::BULK_TARGET,
        payload,
    )
    .await?;

    Ok(Json(BulkModerateResponse { updated_count }))
}

fn internal(err: serde_json::Error) -> ApiError {
    ApiError::Internal(format!("serialization failed: {err}"))
}
