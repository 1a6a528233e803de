//! Plain-data resource profile used by the policy and search functions.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::lifecycle::{
    BackgroundCheckStatus, LifecycleState, OnboardingState, PublishStatus, VerificationStatus,
};

/// A resource (ally) profile, decoupled from storage.
///
/// Timestamps are the stored `datetime('now')` strings; they sort
/// chronologically under plain string comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceProfile {
    pub id: String,
    pub user_id: String,
    pub display_name: String,
    pub postal_code: String,
    pub city: String,
    pub region: String,
    pub bio: Option<String>,
    pub skills_tags: Vec<String>,
    pub hourly_rate: Option<f64>,
    pub average_rating: Option<f64>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub availability: Option<Value>,
    pub questionnaire_answers: Option<Value>,
    pub onboarding_state: OnboardingState,
    pub verification_status: VerificationStatus,
    pub publish_status: PublishStatus,
    pub background_check_status: BackgroundCheckStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl ResourceProfile {
    /// Current lifecycle snapshot.
    pub fn lifecycle(&self) -> LifecycleState {
        LifecycleState {
            onboarding_state: self.onboarding_state,
            verification_status: self.verification_status,
            publish_status: self.publish_status,
        }
    }

    /// True when the profile may appear in directory search results.
    pub fn is_search_eligible(&self) -> bool {
        self.lifecycle().is_search_eligible()
    }
}
