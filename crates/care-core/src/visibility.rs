//! Field-level visibility policy for resource profiles.
//!
//! Three views exist over the same entity. Contact details are the paywalled
//! part: they require an authenticated family caller with an active
//! subscription. The owning user sees everything, including the internal
//! lifecycle columns.

use serde::Serialize;
use serde_json::Value;

use crate::caller::{Caller, Role};
use crate::lifecycle::{PublishStatus, VerificationStatus};
use crate::profile::ResourceProfile;

/// What anyone may see, authenticated or not.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfileView {
    pub id: String,
    pub display_name: String,
    pub city: String,
    pub region: String,
    pub postal_code: String,
    pub skills_tags: Vec<String>,
    pub hourly_rate: Option<f64>,
    pub average_rating: Option<f64>,
    pub bio: Option<String>,
    pub verification_status: VerificationStatus,
    pub publish_status: PublishStatus,
}

/// Public view plus contact details, for premium families.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PremiumProfileView {
    #[serde(flatten)]
    pub public: PublicProfileView,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
}

/// Everything, for the owning user only.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivateProfileView {
    #[serde(flatten)]
    pub premium: PremiumProfileView,
    pub user_id: String,
    pub onboarding_state: crate::lifecycle::OnboardingState,
    pub background_check_status: crate::lifecycle::BackgroundCheckStatus,
    pub availability: Option<Value>,
    pub questionnaire_answers: Option<Value>,
    pub created_at: String,
    pub updated_at: String,
}

/// One of the three views of a resource profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResourceProfileView {
    Private(Box<PrivateProfileView>),
    Premium(PremiumProfileView),
    Public(PublicProfileView),
}

impl ResourceProfileView {
    /// True when the view exposes contact details.
    pub fn has_contact_fields(&self) -> bool {
        !matches!(self, ResourceProfileView::Public(_))
    }
}

/// Decide which view of `profile` the caller may see.
///
/// - The owning user always gets the private view.
/// - An authenticated family with an active subscription gets the premium view.
/// - Everyone else, including resources browsing other allies and anonymous
///   visitors, gets the public view.
pub fn resolve_view(profile: &ResourceProfile, caller: Option<&Caller>) -> ResourceProfileView {
    match caller {
        Some(c) if c.user_id == profile.user_id => {
            ResourceProfileView::Private(Box::new(private_view(profile)))
        }
        Some(c) if c.role == Role::Family && c.premium => {
            ResourceProfileView::Premium(premium_view(profile))
        }
        _ => ResourceProfileView::Public(public_view(profile)),
    }
}

fn public_view(profile: &ResourceProfile) -> PublicProfileView {
    PublicProfileView {
        id: profile.id.clone(),
        display_name: profile.display_name.clone(),
        city: profile.city.clone(),
        region: profile.region.clone(),
        postal_code: profile.postal_code.clone(),
        skills_tags: profile.skills_tags.clone(),
        hourly_rate: profile.hourly_rate,
        average_rating: profile.average_rating,
        bio: profile.bio.clone(),
        verification_status: profile.verification_status,
        publish_status: profile.publish_status,
    }
}

fn premium_view(profile: &ResourceProfile) -> PremiumProfileView {
    PremiumProfileView {
        public: public_view(profile),
        contact_email: profile.contact_email.clone(),
        contact_phone: profile.contact_phone.clone(),
    }
}

fn private_view(profile: &ResourceProfile) -> PrivateProfileView {
    PrivateProfileView {
        premium: premium_view(profile),
        user_id: profile.user_id.clone(),
        onboarding_state: profile.onboarding_state,
        background_check_status: profile.background_check_status,
        availability: profile.availability.clone(),
        questionnaire_answers: profile.questionnaire_answers.clone(),
        created_at: profile.created_at.clone(),
        updated_at: profile.updated_at.clone(),
    }
}
