//! Account profile domain models.
//!
//! A profile is created once a user verifies their email. Its `hub_id` and
//! `pending_hub_id` fields drive the hub membership state machine; the two
//! are mutually exclusive at every observable instant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

/// Self-reported gender on a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Female,
    Male,
    Other,
    Unset,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Female => "female",
            Gender::Male => "male",
            Gender::Other => "other",
            Gender::Unset => "unset",
        }
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "female" => Ok(Gender::Female),
            "male" => Ok(Gender::Male),
            "other" => Ok(Gender::Other),
            "unset" | "" => Ok(Gender::Unset),
            _ => Err(format!("Invalid gender: {}", s)),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An account profile, one per verified user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AccountProfile {
    pub user_id: Uuid,
    pub display_name: String,
    pub gender: Gender,
    pub age: Option<i32>,
    pub avatar_index: i32,
    pub hub_id: Option<Uuid>,
    pub pending_hub_id: Option<Uuid>,
    pub notifications_enabled: bool,
    pub family_alerts_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Where a profile stands in the hub membership lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipState {
    /// Neither member nor requester of any hub.
    NoHub,
    /// A join request is awaiting the hub creator's decision.
    PendingApproval(Uuid),
    /// An active member of a hub.
    ActiveMember(Uuid),
}

impl MembershipState {
    /// Derives the membership state from the two profile fields.
    ///
    /// `hub_id` wins if both are somehow set; write paths keep the fields
    /// mutually exclusive, so that branch only covers corrupt data.
    pub fn of(hub_id: Option<Uuid>, pending_hub_id: Option<Uuid>) -> Self {
        match (hub_id, pending_hub_id) {
            (Some(hub), _) => MembershipState::ActiveMember(hub),
            (None, Some(hub)) => MembershipState::PendingApproval(hub),
            (None, None) => MembershipState::NoHub,
        }
    }
}

impl AccountProfile {
    pub fn membership_state(&self) -> MembershipState {
        MembershipState::of(self.hub_id, self.pending_hub_id)
    }
}

/// Request payload for updating a profile.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct UpdateProfileRequest {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Display name must be between 1 and 100 characters"
    ))]
    pub display_name: Option<String>,

    pub gender: Option<Gender>,

    #[validate(range(min = 1, max = 130, message = "Age must be between 1 and 130"))]
    pub age: Option<i32>,

    #[validate(range(min = 0, max = 10, message = "Avatar index must be between 0 and 10"))]
    pub avatar_index: Option<i32>,

    pub notifications_enabled: Option<bool>,

    pub family_alerts_enabled: Option<bool>,
}

/// Public profile info shown to other hub members (no contact details).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ProfilePublic {
    pub user_id: Uuid,
    pub display_name: String,
    pub avatar_index: i32,
}

impl From<&AccountProfile> for ProfilePublic {
    fn from(p: &AccountProfile) -> Self {
        Self {
            user_id: p.user_id,
            display_name: p.display_name.clone(),
            avatar_index: p.avatar_index,
        }
    }
}

/// Full profile response for the owning user.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ProfileResponse {
    pub user_id: Uuid,
    pub display_name: String,
    pub gender: Gender,
    pub age: Option<i32>,
    pub avatar_index: i32,
    pub hub_id: Option<Uuid>,
    pub pending_hub_id: Option<Uuid>,
    pub notifications_enabled: bool,
    pub family_alerts_enabled: bool,
    pub created_at: DateTime<Utc>,
}

impl From<AccountProfile> for ProfileResponse {
    fn from(p: AccountProfile) -> Self {
        Self {
            user_id: p.user_id,
            display_name: p.display_name,
            gender: p.gender,
            age: p.age,
            avatar_index: p.avatar_index,
            hub_id: p.hub_id,
            pending_hub_id: p.pending_hub_id,
            notifications_enabled: p.notifications_enabled,
            family_alerts_enabled: p.family_alerts_enabled,
            created_at: p.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gender_as_str() {
        assert_eq!(Gender::Female.as_str(), "female");
        assert_eq!(Gender::Male.as_str(), "male");
        assert_eq!(Gender::Other.as_str(), "other");
        assert_eq!(Gender::Unset.as_str(), "unset");
    }

    #[test]
    fn test_gender_from_str() {
        assert_eq!(Gender::from_str("female").unwrap(), Gender::Female);
        assert_eq!(Gender::from_str("MALE").unwrap(), Gender::Male);
        assert_eq!(Gender::from_str("").unwrap(), Gender::Unset);
        assert!(Gender::from_str("invalid").is_err());
    }

    #[test]
    fn test_membership_state_no_hub() {
        assert_eq!(MembershipState::of(None, None), MembershipState::NoHub);
    }

    #[test]
    fn test_membership_state_pending() {
        let hub = Uuid::new_v4();
        assert_eq!(
            MembershipState::of(None, Some(hub)),
            MembershipState::PendingApproval(hub)
        );
    }

    #[test]
    fn test_membership_state_active() {
        let hub = Uuid::new_v4();
        assert_eq!(
            MembershipState::of(Some(hub), None),
            MembershipState::ActiveMember(hub)
        );
    }

    #[test]
    fn test_membership_state_active_wins_over_corrupt_pending() {
        let hub = Uuid::new_v4();
        let other = Uuid::new_v4();
        assert_eq!(
            MembershipState::of(Some(hub), Some(other)),
            MembershipState::ActiveMember(hub)
        );
    }

    #[test]
    fn test_update_profile_request_validation() {
        let valid = UpdateProfileRequest {
            display_name: Some("Maya Lin".to_string()),
            gender: Some(Gender::Female),
            age: Some(67),
            avatar_index: Some(3),
            notifications_enabled: Some(true),
            family_alerts_enabled: None,
        };
        assert!(valid.validate().is_ok());

        let bad_age = UpdateProfileRequest {
            display_name: None,
            gender: None,
            age: Some(200),
            avatar_index: None,
            notifications_enabled: None,
            family_alerts_enabled: None,
        };
        assert!(bad_age.validate().is_err());

        let bad_avatar = UpdateProfileRequest {
            display_name: None,
            gender: None,
            age: None,
            avatar_index: Some(11),
            notifications_enabled: None,
            family_alerts_enabled: None,
        };
        assert!(bad_avatar.validate().is_err());
    }
}
