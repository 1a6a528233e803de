//! Database models and row-to-domain conversions.
//!
//! Enum-valued columns are stored as their string form; the row structs keep
//! raw strings and convert into the typed domain structs, rejecting unknown
//! variants instead of carrying them further.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::FromRow;

use care_core::{
    BackgroundCheckStatus, OnboardingState, PublishStatus, ResourceProfile, Role,
    SubscriptionStatus, UserStatus, VerificationStatus,
};

use crate::error::DatabaseError;

/// A registered account. Never serialized directly: the password hash must
/// not reach the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub status: UserStatus,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct UserRow {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<UserRow> for User {
    type Error = DatabaseError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            role: Role::parse(&row.role)?,
            status: UserStatus::parse(&row.status)?,
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// A family (care recipient) profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyProfile {
    pub id: String,
    pub user_id: String,
    pub display_name: String,
    pub postal_code: String,
    pub city: String,
    pub region: String,
    pub bio: Option<String>,
    pub needs_tags: Vec<String>,
    pub availability: Option<Value>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct FamilyProfileRow {
    pub id: String,
    pub user_id: String,
    pub display_name: String,
    pub postal_code: String,
    pub city: String,
    pub region: String,
    pub bio: Option<String>,
    pub needs_tags: Json<Vec<String>>,
    pub availability: Option<Json<Value>>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<FamilyProfileRow> for FamilyProfile {
    fn from(row: FamilyProfileRow) -> Self {
        FamilyProfile {
            id: row.id,
            user_id: row.user_id,
            display_name: row.display_name,
            postal_code: row.postal_code,
            city: row.city,
            region: row.region,
            bio: row.bio,
            needs_tags: row.needs_tags.0,
            availability: row.availability.map(|a| a.0),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct ResourceProfileRow {
    pub id: String,
    pub user_id: String,
    pub display_name: String,
    pub postal_code: String,
    pub city: String,
    pub region: String,
    pub bio: Option<String>,
    pub skills_tags: Json<Vec<String>>,
    pub hourly_rate: Option<f64>,
    pub average_rating: Option<f64>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub availability: Option<Json<Value>>,
    pub questionnaire_answers: Option<Json<Value>>,
    pub onboarding_state: String,
    pub verification_status: String,
    pub publish_status: String,
    pub background_check_status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<ResourceProfileRow> for ResourceProfile {
    type Error = DatabaseError;

    fn try_from(row: ResourceProfileRow) -> Result<Self, Self::Error> {
        Ok(ResourceProfile {
            onboarding_state: OnboardingState::parse(&row.onboarding_state)?,
            verification_status: VerificationStatus::parse(&row.verification_status)?,
            publish_status: PublishStatus::parse(&row.publish_status)?,
            background_check_status: BackgroundCheckStatus::parse(&row.background_check_status)?,
            id: row.id,
            user_id: row.user_id,
            display_name: row.display_name,
            postal_code: row.postal_code,
            city: row.city,
            region: row.region,
            bio: row.bio,
            skills_tags: row.skills_tags.0,
            hourly_rate: row.hourly_rate,
            average_rating: row.average_rating,
            contact_email: row.contact_email,
            contact_phone: row.contact_phone,
            availability: row.availability.map(|a| a.0),
            questionnaire_answers: row.questionnaire_answers.map(|q| q.0),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// A paid family subscription.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: String,
    pub user_id: String,
    pub status: SubscriptionStatus,
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: Option<String>,
    pub current_period_end: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct SubscriptionRow {
    pub id: String,
    pub user_id: String,
    pub status: String,
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: Option<String>,
    pub current_period_end: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = DatabaseError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        Ok(Subscription {
            status: SubscriptionStatus::parse(&row.status)?,
            id: row.id,
            user_id: row.user_id,
            stripe_customer_id: row.stripe_customer_id,
            stripe_subscription_id: row.stripe_subscription_id,
            current_period_end: row.current_period_end,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// A family-to-resource conversation. One row per unique pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    pub family_id: String,
    pub resource_id: String,
    pub created_at: String,
    pub updated_at: String,
}

/// A message inside a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub conversation_id: String,
    pub sender_user_id: String,
    pub content: String,
    pub created_at: String,
}

/// An append-only admin action record, joined with the actor's email for
/// console display.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    pub id: i64,
    pub actor_user_id: String,
    pub actor_email: Option<String>,
    pub action: String,
    pub target_type: String,
    pub target_id: String,
    pub payload: Json<Value>,
    pub created_at: String,
}

/// The singleton maintenance flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceState {
    pub enabled: bool,
    pub updated_by: Option<String>,
    pub updated_at: String,
}
