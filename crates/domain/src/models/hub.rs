//! Hub domain models: the family group sharing one medication board.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::profile::ProfilePublic;

/// A family hub. Membership lives in two uuid arrays; a user id appears in
/// at most one of them at a time, and the creator is always a member.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Hub {
    pub id: Uuid,
    pub name: String,
    pub join_code: String,
    pub creator_id: Uuid,
    pub members: Vec<Uuid>,
    pub pending_members: Vec<Uuid>,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Hub {
    pub fn is_member(&self, user_id: Uuid) -> bool {
        self.members.contains(&user_id)
    }

    pub fn is_pending(&self, user_id: Uuid) -> bool {
        self.pending_members.contains(&user_id)
    }

    pub fn is_creator(&self, user_id: Uuid) -> bool {
        self.creator_id == user_id
    }
}

/// Request payload for creating a hub.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateHubRequest {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Hub name must be between 1 and 100 characters"
    ))]
    pub name: String,
}

/// Request payload for joining a hub by code.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct JoinHubRequest {
    /// The 6-character hub code, as typed. Normalized before lookup.
    #[validate(length(min = 6, max = 8, message = "Hub codes are 6 characters long"))]
    pub code: String,
}

/// Response after creating a hub.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct CreateHubResponse {
    pub id: Uuid,
    pub name: String,
    pub join_code: String,
    pub creator_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Response after submitting a join request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct JoinHubResponse {
    pub hub_id: Uuid,
    pub hub_name: String,
    pub pending: bool,
}

/// Hub detail for members: the board header plus both membership lists,
/// resolved to public profiles in array (listing) order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct HubDetail {
    pub id: Uuid,
    pub name: String,
    pub join_code: String,
    pub creator_id: Uuid,
    pub members: Vec<ProfilePublic>,
    pub pending_members: Vec<ProfilePublic>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hub_with(members: Vec<Uuid>, pending: Vec<Uuid>) -> Hub {
        Hub {
            id: Uuid::new_v4(),
            name: "The Lins".to_string(),
            join_code: "AB23CD".to_string(),
            creator_id: members.first().copied().unwrap_or_else(Uuid::new_v4),
            members,
            pending_members: pending,
            archived: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_membership_checks() {
        let member = Uuid::new_v4();
        let pending = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let hub = hub_with(vec![member], vec![pending]);

        assert!(hub.is_member(member));
        assert!(!hub.is_member(pending));
        assert!(hub.is_pending(pending));
        assert!(!hub.is_pending(stranger));
        assert!(hub.is_creator(member));
    }

    #[test]
    fn test_create_hub_request_validation() {
        assert!(CreateHubRequest {
            name: "Grandma's Team".to_string()
        }
        .validate()
        .is_ok());
        assert!(CreateHubRequest {
            name: String::new()
        }
        .validate()
        .is_err());
        assert!(CreateHubRequest {
            name: "x".repeat(101)
        }
        .validate()
        .is_err());
    }

    #[test]
    fn test_join_hub_request_validation() {
        assert!(JoinHubRequest {
            code: "AB23CD".to_string()
        }
        .validate()
        .is_ok());
        assert!(JoinHubRequest {
            code: "AB2".to_string()
        }
        .validate()
        .is_err());
    }
}
