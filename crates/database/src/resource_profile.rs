//! Resource (ally) profile storage: registration, self-service edits,
//! moderation and the directory candidate query.

use sqlx::types::Json;
use sqlx::SqlitePool;

use serde_json::Value;

use care_core::{BackgroundCheckStatus, LifecycleState, ModerationUpdate, ResourceProfile};

use crate::error::{DatabaseError, Result};
use crate::listing::SortOrder;
use crate::models::ResourceProfileRow;

const RESOURCE_COLUMNS: &str = "id, user_id, display_name, postal_code, city, region, bio, \
     skills_tags, hourly_rate, average_rating, contact_email, contact_phone, availability, \
     questionnaire_answers, onboarding_state, verification_status, publish_status, \
     background_check_status, created_at, updated_at";

/// Fields required to create a resource profile at registration. The
/// lifecycle columns always start at the registration defaults.
#[derive(Debug, Clone)]
pub struct NewResourceProfile {
    pub id: String,
    pub user_id: String,
    pub display_name: String,
    pub postal_code: String,
    pub city: String,
    pub region: String,
    pub bio: Option<String>,
    pub skills_tags: Vec<String>,
}

/// Partial self-service update. `None` keeps the stored value. Lifecycle
/// columns are deliberately absent: only moderation and the payment webhook
/// touch those.
#[derive(Debug, Clone, Default)]
pub struct ResourceProfileUpdate {
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
    pub background_check_status: Option<BackgroundCheckStatus>,
}

/// Create a resource profile in the draft state.
pub async fn create(pool: &SqlitePool, profile: &NewResourceProfile) -> Result<()> {
    let lifecycle = LifecycleState::registration_defaults();
    sqlx::query(
        r#"
        INSERT INTO resource_profiles
            (id, user_id, display_name, postal_code, city, region, bio, skills_tags,
             onboarding_state, verification_status, publish_status)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&profile.id)
    .bind(&profile.user_id)
    .bind(&profile.display_name)
    .bind(&profile.postal_code)
    .bind(&profile.city)
    .bind(&profile.region)
    .bind(&profile.bio)
    .bind(Json(&profile.skills_tags))
    .bind(lifecycle.onboarding_state.as_str())
    .bind(lifecycle.verification_status.as_str())
    .bind(lifecycle.publish_status.as_str())
    .execute(pool)
    .await?;

    Ok(())
}

/// Get a resource profile by ID.
pub async fn get(pool: &SqlitePool, id: &str) -> Result<ResourceProfile> {
    find(pool, id).await?.ok_or_else(|| DatabaseError::NotFound {
        entity: "ResourceProfile",
        id: id.to_string(),
    })
}

/// Look up a resource profile by ID, if any.
pub async fn find(pool: &SqlitePool, id: &str) -> Result<Option<ResourceProfile>> {
    let row = sqlx::query_as::<_, ResourceProfileRow>(&format!(
        "SELECT {RESOURCE_COLUMNS} FROM resource_profiles WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(ResourceProfile::try_from).transpose()
}

/// Get the profile owned by a user.
pub async fn get_by_user(pool: &SqlitePool, user_id: &str) -> Result<ResourceProfile> {
    find_by_user(pool, user_id)
        .await?
        .ok_or_else(|| DatabaseError::NotFound {
            entity: "ResourceProfile",
            id: user_id.to_string(),
        })
}

/// Look up the profile owned by a user, if any.
pub async fn find_by_user(pool: &SqlitePool, user_id: &str) -> Result<Option<ResourceProfile>> {
    let row = sqlx::query_as::<_, ResourceProfileRow>(&format!(
        "SELECT {RESOURCE_COLUMNS} FROM resource_profiles WHERE user_id = ?"
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    row.map(ResourceProfile::try_from).transpose()
}

/// Apply a partial self-service update to the profile owned by `user_id`.
pub async fn update_by_user(
    pool: &SqlitePool,
    user_id: &str,
    update: &ResourceProfileUpdate,
) -> Result<ResourceProfile> {
    let result = sqlx::query(
        r#"
        UPDATE resource_profiles
        SET display_name = COALESCE(?, display_name),
            postal_code = COALESCE(?, postal_code),
            city = COALESCE(?, city),
            region = COALESCE(?, region),
            bio = COALESCE(?, bio),
            skills_tags = COALESCE(?, skills_tags),
            hourly_rate = COALESCE(?, hourly_rate),
            contact_email = COALESCE(?, contact_email),
            contact_phone = COALESCE(?, contact_phone),
            availability = COALESCE(?, availability),
            questionnaire_answers = COALESCE(?, questionnaire_answers),
            background_check_status = COALESCE(?, background_check_status),
            updated_at = datetime('now')
        WHERE user_id = ?
        "#,
    )
    .bind(&update.display_name)
    .bind(&update.postal_code)
    .bind(&update.city)
    .bind(&update.region)
    .bind(&update.bio)
    .bind(update.skills_tags.as_ref().map(Json))
    .bind(update.hourly_rate)
    .bind(&update.contact_email)
    .bind(&update.contact_phone)
    .bind(update.availability.as_ref().map(Json))
    .bind(update.questionnaire_answers.as_ref().map(Json))
    .bind(update.background_check_status.map(|s| s.as_str()))
    .bind(user_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "ResourceProfile",
            id: user_id.to_string(),
        });
    }

    get_by_user(pool, user_id).await
}

/// Apply an admin moderation update to one profile.
///
/// Fails with not-found before anything is written when the ID is unknown.
/// No transition validation happens here: the submitted combination is
/// stored as-is and concurrent moderation is last-write-wins.
pub async fn moderate(
    pool: &SqlitePool,
    id: &str,
    update: &ModerationUpdate,
) -> Result<ResourceProfile> {
    let result = moderation_query(
        "UPDATE resource_profiles
         SET verification_status = COALESCE(?, verification_status),
             publish_status = COALESCE(?, publish_status),
             onboarding_state = COALESCE(?, onboarding_state),
             background_check_status = COALESCE(?, background_check_status),
             updated_at = datetime('now')
         WHERE id = ?",
        update,
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "ResourceProfile",
            id: id.to_string(),
        });
    }

    get(pool, id).await
}

/// Apply an admin moderation update to several profiles at once.
///
/// Ids without a matching profile are silently skipped; the returned count
/// covers rows actually updated.
pub async fn bulk_moderate(
    pool: &SqlitePool,
    ids: &[String],
    update: &ModerationUpdate,
) -> Result<u64> {
    if ids.is_empty() {
        return Ok(0);
    }

    let placeholders = vec!["?"; ids.len()].join(", ");
    let query = format!(
        "UPDATE resource_profiles
         SET verification_status = COALESCE(?, verification_status),
             publish_status = COALESCE(?, publish_status),
             onboarding_state = COALESCE(?, onboarding_state),
             background_check_status = COALESCE(?, background_check_status),
             updated_at = datetime('now')
         WHERE id IN ({placeholders})"
    );

    let mut q = moderation_query(&query, update);
    for id in ids {
        q = q.bind(id);
    }
    let result = q.execute(pool).await?;

    Ok(result.rows_affected())
}

fn moderation_query<'a>(
    sql: &'a str,
    update: &'a ModerationUpdate,
) -> sqlx::query::Query<'a, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'a>> {
    sqlx::query(sql)
        .bind(update.verification_status.map(|s| s.as_str()))
        .bind(update.publish_status.map(|s| s.as_str()))
        .bind(update.onboarding_state.map(|s| s.as_str()))
        .bind(update.background_check_status.map(|s| s.as_str()))
}

/// Move the profile owned by `user_id` into the post-payment state.
pub async fn mark_payment_completed(pool: &SqlitePool, user_id: &str) -> Result<()> {
    let lifecycle = LifecycleState::payment_completed();
    let result = sqlx::query(
        r#"
        UPDATE resource_profiles
        SET onboarding_state = ?, verification_status = ?, publish_status = ?,
            updated_at = datetime('now')
        WHERE user_id = ?
        "#,
    )
    .bind(lifecycle.onboarding_state.as_str())
    .bind(lifecycle.verification_status.as_str())
    .bind(lifecycle.publish_status.as_str())
    .bind(user_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "ResourceProfile",
            id: user_id.to_string(),
        });
    }

    Ok(())
}

/// Fetch directory candidates for a search: profiles whose lifecycle columns
/// allow listing and whose postal code matches exactly or by forward
/// sortation area prefix. Tag filtering, ordering and pagination happen in
/// the domain layer.
pub async fn search_candidates(
    pool: &SqlitePool,
    normalized_postal: &str,
    prefix: &str,
) -> Result<Vec<ResourceProfile>> {
    let rows = sqlx::query_as::<_, ResourceProfileRow>(&format!(
        r#"
        SELECT {RESOURCE_COLUMNS} FROM resource_profiles
        WHERE publish_status = 'PUBLISHED'
          AND verification_status = 'VERIFIED'
          AND onboarding_state IN ('VERIFIED', 'PUBLISHED')
          AND (postal_code = ? OR postal_code LIKE ? || '%')
        "#
    ))
    .bind(normalized_postal)
    .bind(prefix)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(ResourceProfile::try_from)
        .collect()
}

/// Sort key for the admin resource listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceSort {
    UpdatedAt,
    DisplayName,
    VerificationStatus,
    PublishStatus,
}

impl ResourceSort {
    fn column(&self) -> &'static str {
        match self {
            ResourceSort::UpdatedAt => "r.updated_at",
            ResourceSort::DisplayName => "r.display_name",
            ResourceSort::VerificationStatus => "r.verification_status",
            ResourceSort::PublishStatus => "r.publish_status",
        }
    }

    /// Parse a console-supplied sort key, defaulting to update time.
    pub fn parse(s: Option<&str>) -> Self {
        match s {
            Some("displayName") => ResourceSort::DisplayName,
            Some("verificationStatus") => ResourceSort::VerificationStatus,
            Some("publishStatus") => ResourceSort::PublishStatus,
            _ => ResourceSort::UpdatedAt,
        }
    }
}

/// Filters for the admin resource listing.
#[derive(Debug, Clone, Default)]
pub struct ResourceListFilter {
    /// Free-text match over display name, city, postal prefix and owner email.
    pub query: String,
    pub verification_status: Option<care_core::VerificationStatus>,
    pub publish_status: Option<care_core::PublishStatus>,
    pub onboarding_state: Option<care_core::OnboardingState>,
    pub page: i64,
    pub page_size: i64,
    pub sort: Option<ResourceSort>,
    pub sort_order: Option<SortOrder>,
}

/// List resource profiles for the admin console.
///
/// Returns the total count over the filter (ignoring pagination) and the
/// requested page.
pub async fn list_for_admin(
    pool: &SqlitePool,
    filter: &ResourceListFilter,
) -> Result<(i64, Vec<ResourceProfile>)> {
    let needle = filter.query.trim().to_lowercase();
    let postal_needle: String = filter
        .query
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();
    let verification = filter
        .verification_status
        .map(|s| s.as_str())
        .unwrap_or("");
    let publish = filter.publish_status.map(|s| s.as_str()).unwrap_or("");
    let onboarding = filter.onboarding_state.map(|s| s.as_str()).unwrap_or("");

    let where_clause = r#"
        (? = '' OR r.verification_status = ?)
        AND (? = '' OR r.publish_status = ?)
        AND (? = '' OR r.onboarding_state = ?)
        AND (
            ? = ''
            OR lower(r.display_name) LIKE '%' || ? || '%'
            OR lower(r.city) LIKE '%' || ? || '%'
            OR r.postal_code LIKE ? || '%'
            OR lower(u.email) LIKE '%' || ? || '%'
        )
    "#;

    let count_query = format!(
        "SELECT COUNT(*) FROM resource_profiles r JOIN users u ON u.id = r.user_id WHERE {where_clause}"
    );
    let total = sqlx::query_scalar::<_, i64>(&count_query)
        .bind(verification)
        .bind(verification)
        .bind(publish)
        .bind(publish)
        .bind(onboarding)
        .bind(onboarding)
        .bind(&needle)
        .bind(&needle)
        .bind(&needle)
        .bind(&postal_needle)
        .bind(&needle)
        .fetch_one(pool)
        .await?;

    let sort = filter.sort.unwrap_or(ResourceSort::UpdatedAt);
    let order = filter.sort_order.unwrap_or(SortOrder::Desc);
    let columns: String = RESOURCE_COLUMNS
        .split(", ")
        .map(|c| format!("r.{}", c.trim()))
        .collect::<Vec<_>>()
        .join(", ");
    let page_query = format!(
        r#"
        SELECT {columns}
        FROM resource_profiles r JOIN users u ON u.id = r.user_id
        WHERE {where_clause}
        ORDER BY {column} {order}, r.updated_at DESC
        LIMIT ? OFFSET ?
        "#,
        column = sort.column(),
        order = order.as_sql(),
    );
    let rows = sqlx::query_as::<_, ResourceProfileRow>(&page_query)
        .bind(verification)
        .bind(verification)
        .bind(publish)
        .bind(publish)
        .bind(onboarding)
        .bind(onboarding)
        .bind(&needle)
        .bind(&needle)
        .bind(&needle)
        .bind(&postal_needle)
        .bind(&needle)
        .bind(filter.page_size)
        .bind((filter.page - 1) * filter.page_size)
        .fetch_all(pool)
        .await?;

    let profiles = rows
        .into_iter()
        .map(ResourceProfile::try_from)
        .collect::<Result<Vec<_>>>()?;

    Ok((total, profiles))
}
