//! Account roles and the caller context passed into policy functions.

use serde::{Deserialize, Serialize};

use crate::UnknownVariant;

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Care recipient account.
    Family,
    /// Care provider (ally) account.
    Resource,
    /// Moderation console account.
    Admin,
}

impl Role {
    /// Stored string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Family => "FAMILY",
            Role::Resource => "RESOURCE",
            Role::Admin => "ADMIN",
        }
    }

    /// Parse the stored string form.
    pub fn parse(s: &str) -> Result<Self, UnknownVariant> {
        match s {
            "FAMILY" => Ok(Role::Family),
            "RESOURCE" => Ok(Role::Resource),
            "ADMIN" => Ok(Role::Admin),
            other => Err(UnknownVariant {
                field: "role",
                value: other.to_string(),
            }),
        }
    }
}

/// Account standing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    Active,
    Banned,
}

impl UserStatus {
    /// Stored string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "ACTIVE",
            UserStatus::Banned => "BANNED",
        }
    }

    /// Parse the stored string form.
    pub fn parse(s: &str) -> Result<Self, UnknownVariant> {
        match s {
            "ACTIVE" => Ok(UserStatus::Active),
            "BANNED" => Ok(UserStatus::Banned),
            other => Err(UnknownVariant {
                field: "status",
                value: other.to_string(),
            }),
        }
    }
}

/// Paid subscription standing for a family account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionStatus {
    Active,
    Canceled,
    Expired,
}

impl SubscriptionStatus {
    /// Stored string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "ACTIVE",
            SubscriptionStatus::Canceled => "CANCELED",
            SubscriptionStatus::Expired => "EXPIRED",
        }
    }

    /// Parse the stored string form.
    pub fn parse(s: &str) -> Result<Self, UnknownVariant> {
        match s {
            "ACTIVE" => Ok(SubscriptionStatus::Active),
            "CANCELED" => Ok(SubscriptionStatus::Canceled),
            "EXPIRED" => Ok(SubscriptionStatus::Expired),
            other => Err(UnknownVariant {
                field: "subscriptionStatus",
                value: other.to_string(),
            }),
        }
    }
}

/// Explicit caller context for policy and query functions.
///
/// `premium` is resolved up front from subscription storage (one ACTIVE row
/// suffices) so the functions consuming a `Caller` stay pure. A caller that
/// is not a family is never premium, whatever its subscription rows say.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: String,
    pub role: Role,
    pub premium: bool,
}

impl Caller {
    /// Caller context without any subscription standing.
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
            premium: false,
        }
    }

    /// Attach resolved subscription standing. Ignored for non-family roles.
    pub fn with_premium(mut self, premium: bool) -> Self {
        self.premium = premium && self.role == Role::Family;
        self
    }

    /// True when this caller unlocks premium visibility.
    pub fn is_premium_family(&self) -> bool {
        self.role == Role::Family && self.premium
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trip() {
        for role in [Role::Family, Role::Resource, Role::Admin] {
            assert_eq!(Role::parse(role.as_str()), Ok(role));
        }
        assert!(Role::parse("family").is_err());
    }

    #[test]
    fn premium_only_applies_to_families() {
        let family = Caller::new("u1", Role::Family).with_premium(true);
        assert!(family.is_premium_family());

        let resource = Caller::new("u2", Role::Resource).with_premium(true);
        assert!(!resource.is_premium_family());

        let lapsed = Caller::new("u3", Role::Family).with_premium(false);
        assert!(!lapsed.is_premium_family());
    }
}
