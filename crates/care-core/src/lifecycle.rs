//! Resource profile lifecycle enums and moderation transitions.
//!
//! A resource profile carries three independent lifecycle columns
//! (onboarding, verification, publication) plus an advisory background-check
//! status. The columns are kept independent to match the stored data model:
//! admin moderation may submit any combination, and no transition validation
//! is performed beyond rejecting unknown variant strings at the boundary.

use serde::{Deserialize, Serialize};

use crate::UnknownVariant;

/// Onboarding progress for a resource profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OnboardingState {
    PendingPayment,
    PendingVerification,
    Verified,
    Published,
    Suspended,
}

impl OnboardingState {
    /// Stored string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            OnboardingState::PendingPayment => "PENDING_PAYMENT",
            OnboardingState::PendingVerification => "PENDING_VERIFICATION",
            OnboardingState::Verified => "VERIFIED",
            OnboardingState::Published => "PUBLISHED",
            OnboardingState::Suspended => "SUSPENDED",
        }
    }

    /// Parse the stored string form.
    pub fn parse(s: &str) -> Result<Self, UnknownVariant> {
        match s {
            "PENDING_PAYMENT" => Ok(OnboardingState::PendingPayment),
            "PENDING_VERIFICATION" => Ok(OnboardingState::PendingVerification),
            "VERIFIED" => Ok(OnboardingState::Verified),
            "PUBLISHED" => Ok(OnboardingState::Published),
            "SUSPENDED" => Ok(OnboardingState::Suspended),
            other => Err(UnknownVariant {
                field: "onboardingState",
                value: other.to_string(),
            }),
        }
    }
}

/// Identity verification status for a resource profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationStatus {
    Draft,
    PendingVerification,
    Verified,
    Rejected,
}

impl VerificationStatus {
    /// Stored string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Draft => "DRAFT",
            VerificationStatus::PendingVerification => "PENDING_VERIFICATION",
            VerificationStatus::Verified => "VERIFIED",
            VerificationStatus::Rejected => "REJECTED",
        }
    }

    /// Parse the stored string form.
    pub fn parse(s: &str) -> Result<Self, UnknownVariant> {
        match s {
            "DRAFT" => Ok(VerificationStatus::Draft),
            "PENDING_VERIFICATION" => Ok(VerificationStatus::PendingVerification),
            "VERIFIED" => Ok(VerificationStatus::Verified),
            "REJECTED" => Ok(VerificationStatus::Rejected),
            other => Err(UnknownVariant {
                field: "verificationStatus",
                value: other.to_string(),
            }),
        }
    }
}

/// Whether a resource profile is listed in the public directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PublishStatus {
    Hidden,
    Published,
    Suspended,
}

impl PublishStatus {
    /// Stored string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            PublishStatus::Hidden => "HIDDEN",
            PublishStatus::Published => "PUBLISHED",
            PublishStatus::Suspended => "SUSPENDED",
        }
    }

    /// Parse the stored string form.
    pub fn parse(s: &str) -> Result<Self, UnknownVariant> {
        match s {
            "HIDDEN" => Ok(PublishStatus::Hidden),
            "PUBLISHED" => Ok(PublishStatus::Published),
            "SUSPENDED" => Ok(PublishStatus::Suspended),
            other => Err(UnknownVariant {
                field: "publishStatus",
                value: other.to_string(),
            }),
        }
    }
}

/// Background-check progress. Advisory only: it never gates search
/// eligibility or contact visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BackgroundCheckStatus {
    NotRequested,
    Requested,
    Pending,
    Received,
}

impl BackgroundCheckStatus {
    /// Stored string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            BackgroundCheckStatus::NotRequested => "NOT_REQUESTED",
            BackgroundCheckStatus::Requested => "REQUESTED",
            BackgroundCheckStatus::Pending => "PENDING",
            BackgroundCheckStatus::Received => "RECEIVED",
        }
    }

    /// Parse the stored string form.
    pub fn parse(s: &str) -> Result<Self, UnknownVariant> {
        match s {
            "NOT_REQUESTED" => Ok(BackgroundCheckStatus::NotRequested),
            "REQUESTED" => Ok(BackgroundCheckStatus::Requested),
            "PENDING" => Ok(BackgroundCheckStatus::Pending),
            "RECEIVED" => Ok(BackgroundCheckStatus::Received),
            other => Err(UnknownVariant {
                field: "backgroundCheckStatus",
                value: other.to_string(),
            }),
        }
    }
}

/// Snapshot of the three lifecycle columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleState {
    pub onboarding_state: OnboardingState,
    pub verification_status: VerificationStatus,
    pub publish_status: PublishStatus,
}

impl LifecycleState {
    /// State assigned to every resource profile at registration.
    pub fn registration_defaults() -> Self {
        Self {
            onboarding_state: OnboardingState::PendingPayment,
            verification_status: VerificationStatus::Draft,
            publish_status: PublishStatus::Hidden,
        }
    }

    /// State after the payment provider reports the onboarding fee settled.
    /// Publication stays hidden until an admin verifies the profile.
    pub fn payment_completed() -> Self {
        Self {
            onboarding_state: OnboardingState::PendingVerification,
            verification_status: VerificationStatus::PendingVerification,
            publish_status: PublishStatus::Hidden,
        }
    }

    /// True when a profile in this state may appear in directory search
    /// results and be contacted.
    pub fn is_search_eligible(&self) -> bool {
        self.publish_status == PublishStatus::Published
            && self.verification_status == VerificationStatus::Verified
            && matches!(
                self.onboarding_state,
                OnboardingState::Verified | OnboardingState::Published
            )
    }
}

/// Admin-supplied partial update of the lifecycle columns.
///
/// Fields left as `None` keep their current value. Any submitted combination
/// is accepted; the moderation console is trusted to know what it is doing,
/// and concurrent moderation of the same profile is last-write-wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_status: Option<VerificationStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish_status: Option<PublishStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub onboarding_state: Option<OnboardingState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_check_status: Option<BackgroundCheckStatus>,
}

impl ModerationUpdate {
    /// True when no field was submitted.
    pub fn is_empty(&self) -> bool {
        self.verification_status.is_none()
            && self.publish_status.is_none()
            && self.onboarding_state.is_none()
            && self.background_check_status.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_defaults_are_hidden_draft() {
        let state = LifecycleState::registration_defaults();
        assert_eq!(state.onboarding_state, OnboardingState::PendingPayment);
        assert_eq!(state.verification_status, VerificationStatus::Draft);
        assert_eq!(state.publish_status, PublishStatus::Hidden);
        assert!(!state.is_search_eligible());
    }

    #[test]
    fn payment_completed_moves_to_pending_verification() {
        let state = LifecycleState::payment_completed();
        assert_eq!(state.onboarding_state, OnboardingState::PendingVerification);
        assert_eq!(
            state.verification_status,
            VerificationStatus::PendingVerification
        );
        assert_eq!(state.publish_status, PublishStatus::Hidden);
        assert!(!state.is_search_eligible());
    }

    #[test]
    fn eligibility_requires_all_three_columns() {
        let eligible = LifecycleState {
            onboarding_state: OnboardingState::Published,
            verification_status: VerificationStatus::Verified,
            publish_status: PublishStatus::Published,
        };
        assert!(eligible.is_search_eligible());

        let onboarding_verified = LifecycleState {
            onboarding_state: OnboardingState::Verified,
            ..eligible
        };
        assert!(onboarding_verified.is_search_eligible());

        let suspended = LifecycleState {
            publish_status: PublishStatus::Suspended,
            ..eligible
        };
        assert!(!suspended.is_search_eligible());

        let unverified = LifecycleState {
            verification_status: VerificationStatus::PendingVerification,
            ..eligible
        };
        assert!(!unverified.is_search_eligible());

        let pending_payment = LifecycleState {
            onboarding_state: OnboardingState::PendingPayment,
            ..eligible
        };
        assert!(!pending_payment.is_search_eligible());
    }

    #[test]
    fn enum_round_trip() {
        for state in [
            OnboardingState::PendingPayment,
            OnboardingState::PendingVerification,
            OnboardingState::Verified,
            OnboardingState::Published,
            OnboardingState::Suspended,
        ] {
            assert_eq!(OnboardingState::parse(state.as_str()), Ok(state));
        }
        assert!(OnboardingState::parse("ACTIVE").is_err());
        assert!(VerificationStatus::parse("draft").is_err());
        assert_eq!(
            PublishStatus::parse("PUBLISHED"),
            Ok(PublishStatus::Published)
        );
        assert_eq!(
            BackgroundCheckStatus::parse("RECEIVED"),
            Ok(BackgroundCheckStatus::Received)
        );
    }

    #[test]
    fn moderation_update_reports_empty() {
        assert!(ModerationUpdate::default().is_empty());
        let update = ModerationUpdate {
            publish_status: Some(PublishStatus::Published),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }

    #[test]
    fn moderation_update_deserializes_camel_case() {
        let update: ModerationUpdate = serde_json::from_str(
            r#"{"verificationStatus":"VERIFIED","publishStatus":"PUBLISHED","onboardingState":"PUBLISHED"}"#,
        )
        .unwrap();
        assert_eq!(
            update.verification_status,
            Some(VerificationStatus::Verified)
        );
        assert_eq!(update.publish_status, Some(PublishStatus::Published));
        assert_eq!(update.onboarding_state, Some(OnboardingState::Published));
        assert_eq!(update.background_check_status, None);
    }
}
