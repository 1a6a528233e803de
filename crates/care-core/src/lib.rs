//! Domain rules for the care marketplace.
//!
//! This crate holds the logic that does not touch storage or HTTP:
//!
//! - [`lifecycle`] - Resource profile lifecycle enums and moderation transitions
//! - [`caller`] - Roles and the explicit caller context threaded through policies
//! - [`visibility`] - Field-level visibility policy for resource profiles
//! - [`search`] - Postal-code matching, ordering, pagination and result projection
//!
//! Everything here is a pure function over plain data so that policies can be
//! tested with fixed inputs. Subscription standing is resolved by the caller
//! and passed in via [`caller::Caller::premium`].

pub mod caller;
pub mod lifecycle;
pub mod profile;
pub mod search;
pub mod visibility;

pub use caller::{Caller, Role, SubscriptionStatus, UserStatus};
pub use lifecycle::{
    BackgroundCheckStatus, LifecycleState, ModerationUpdate, OnboardingState, PublishStatus,
    VerificationStatus,
};
pub use profile::ResourceProfile;
pub use search::{SearchQuery, SearchResponse, PREMIUM_PAGE_SIZE, PREVIEW_LIMIT};
pub use visibility::{resolve_view, ResourceProfileView};

use thiserror::Error;

/// Raised when a stored or submitted enum value is not a known variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {field} value: {value}")]
pub struct UnknownVariant {
    /// Field the value was read for.
    pub field: &'static str,
    /// The offending value.
    pub value: String,
}
