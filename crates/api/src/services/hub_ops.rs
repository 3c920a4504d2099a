//! Hub lifecycle operations.
//!
//! Every membership transition touches two records: the hub's member arrays
//! and the requesting or affected profile's pointer columns. The two writes
//! run back to back without a transaction, hub first, profile second, which
//! matches how clients observe the change feed: the roster updates a beat
//! before the member's own pointer does. A failure between the writes leaves
//! the hub updated and the profile stale; the caller sees an error and
//! retries, and every write here is idempotent under replay.
//!
//! Dissolving a hub deletes the hub row and the creator's pointer only.
//! Remaining members keep a hub_id that resolves to nothing, which readers
//! treat as having no hub.

use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use domain::models::hub::{Hub, HubDetail};
use domain::models::profile::ProfilePublic;
use domain::services::policy::{authorize, Capability, PolicyError};
use persistence::changes::{ChangeEvent, ChangeFeed};
use persistence::repositories::{HubRepository, ProfileRepository};
use shared::join_code::normalize_join_code;

use crate::middleware::metrics::record_change_published;

/// Errors from hub lifecycle operations.
#[derive(Debug, Error)]
pub enum HubOpsError {
    #[error("Profile not found")]
    ProfileNotFound,

    #[error("Hub not found")]
    HubNotFound,

    #[error("Invalid join code")]
    InvalidJoinCode,

    #[error("This join code has expired")]
    JoinCodeExpired,

    #[error("Already a member of a hub")]
    AlreadyInHub,

    #[error("User has no pending request for this hub")]
    NoPendingRequest,

    #[error("{0}")]
    Denied(#[from] PolicyError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Hub lifecycle service.
///
/// Holds the repositories and the change feed; each operation publishes one
/// event per record it wrote, after the write succeeds.
pub struct HubOperations {
    hubs: HubRepository,
    profiles: ProfileRepository,
    changes: ChangeFeed,
}

impl HubOperations {
    pub fn new(hubs: HubRepository, profiles: ProfileRepository, changes: ChangeFeed) -> Self {
        Self {
            hubs,
            profiles,
            changes,
        }
    }

    /// Create a hub and make the creator its first active member.
    pub async fn create_hub(&self, creator_id: Uuid, name: &str) -> Result<Hub, HubOpsError> {
        let profile = self
            .profiles
            .find_by_user_id(creator_id)
            .await?
            .ok_or(HubOpsError::ProfileNotFound)?;

        if profile.hub_id.is_some() {
            return Err(HubOpsError::AlreadyInHub);
        }

        let join_code = self.hubs.generate_unique_join_code().await?;
        let hub = self.hubs.create_hub(name, &join_code, creator_id).await?;

        self.profiles.set_hub(creator_id, hub.id).await?;

        self.publish_hub(hub.id, false);
        self.publish_profile(creator_id);

        info!(hub_id = %hub.id, creator_id = %creator_id, "Hub created");

        Ok(hub.into())
    }

    /// Request to join a hub by its code. The requester goes onto the
    /// pending list and their profile records the pending hub.
    pub async fn join_hub(&self, user_id: Uuid, raw_code: &str) -> Result<Hub, HubOpsError> {
        let profile = self
            .profiles
            .find_by_user_id(user_id)
            .await?
            .ok_or(HubOpsError::ProfileNotFound)?;

        if profile.hub_id.is_some() {
            return Err(HubOpsError::AlreadyInHub);
        }

        let code = normalize_join_code(raw_code);
        let hub = self
            .hubs
            .find_by_join_code(&code)
            .await?
            .ok_or(HubOpsError::InvalidJoinCode)?;

        if hub.archived {
            return Err(HubOpsError::JoinCodeExpired);
        }

        let hub = self
            .hubs
            .add_pending_member(hub.id, user_id)
            .await?
            .ok_or(HubOpsError::HubNotFound)?;

        self.profiles.set_pending_hub(user_id, hub.id).await?;

        self.publish_hub(hub.id, false);
        self.publish_profile(user_id);

        info!(hub_id = %hub.id, user_id = %user_id, "Join request submitted");

        Ok(hub.into())
    }

    /// Approve a pending join request. Creator only.
    pub async fn approve_request(
        &self,
        approver_id: Uuid,
        hub_id: Uuid,
        user_id: Uuid,
    ) -> Result<Hub, HubOpsError> {
        let hub: Hub = self
            .hubs
            .find_by_id(hub_id)
            .await?
            .ok_or(HubOpsError::HubNotFound)?
            .into();

        authorize(Capability::ManageJoinRequests, approver_id, &hub, None)?;

        // A retry of an approval that failed between the two writes finds
        // the user already in the member array. Run the writes again so the
        // profile pointer catches up; both are no-ops where already applied.
        if !hub.is_pending(user_id) && !hub.is_member(user_id) {
            return Err(HubOpsError::NoPendingRequest);
        }

        let hub = self
            .hubs
            .accept_member(hub_id, user_id)
            .await?
            .ok_or(HubOpsError::HubNotFound)?;

        self.profiles.set_hub(user_id, hub_id).await?;

        self.publish_hub(hub_id, false);
        self.publish_profile(user_id);

        info!(hub_id = %hub_id, user_id = %user_id, approver_id = %approver_id, "Join request approved");

        Ok(hub.into())
    }

    /// Decline a pending join request. Creator only.
    pub async fn decline_request(
        &self,
        decliner_id: Uuid,
        hub_id: Uuid,
        user_id: Uuid,
    ) -> Result<Hub, HubOpsError> {
        let hub: Hub = self
            .hubs
            .find_by_id(hub_id)
            .await?
            .ok_or(HubOpsError::HubNotFound)?
            .into();

        authorize(Capability::ManageJoinRequests, decliner_id, &hub, None)?;

        // A user already moved to the member array was approved, not
        // declined. One absent from both arrays may be a decline retried
        // after a partial failure; run the writes again to finish clearing
        // the requester's pointer.
        if hub.is_member(user_id) {
            return Err(HubOpsError::NoPendingRequest);
        }

        let hub = self
            .hubs
            .remove_pending_member(hub_id, user_id)
            .await?
            .ok_or(HubOpsError::HubNotFound)?;

        // Only clear the pointer if it still references this hub
        if let Some(profile) = self.profiles.find_by_user_id(user_id).await? {
            if profile.pending_hub_id == Some(hub_id) {
                self.profiles.clear_hub_state(user_id).await?;
            }
        }

        self.publish_hub(hub_id, false);
        self.publish_profile(user_id);

        info!(hub_id = %hub_id, user_id = %user_id, "Join request declined");

        Ok(hub.into())
    }

    /// Withdraw one's own pending join request.
    pub async fn cancel_request(&self, user_id: Uuid, hub_id: Uuid) -> Result<(), HubOpsError> {
        let profile = self
            .profiles
            .find_by_user_id(user_id)
            .await?
            .ok_or(HubOpsError::ProfileNotFound)?;

        if profile.pending_hub_id != Some(hub_id) {
            return Err(HubOpsError::NoPendingRequest);
        }

        self.hubs.remove_pending_member(hub_id, user_id).await?;
        self.profiles.clear_hub_state(user_id).await?;

        self.publish_hub(hub_id, false);
        self.publish_profile(user_id);

        info!(hub_id = %hub_id, user_id = %user_id, "Join request cancelled");

        Ok(())
    }

    /// Leave a hub. Members are removed from the roster; the creator
    /// dissolves the whole hub instead.
    pub async fn leave_hub(&self, user_id: Uuid, hub_id: Uuid) -> Result<(), HubOpsError> {
        let hub: Hub = self
            .hubs
            .find_by_id(hub_id)
            .await?
            .ok_or(HubOpsError::HubNotFound)?
            .into();

        if !hub.is_member(user_id) {
            return Err(HubOpsError::Denied(PolicyError::NotMember));
        }

        if hub.is_creator(user_id) {
            self.hubs.delete_hub(hub_id).await?;
            self.profiles.clear_hub_state(user_id).await?;

            self.publish_hub(hub_id, true);
            self.publish_profile(user_id);

            info!(hub_id = %hub_id, creator_id = %user_id, "Hub dissolved by creator");
        } else {
            self.hubs.remove_member(hub_id, user_id).await?;
            self.profiles.clear_hub_state(user_id).await?;

            self.publish_hub(hub_id, false);
            self.publish_profile(user_id);

            info!(hub_id = %hub_id, user_id = %user_id, "Member left hub");
        }

        Ok(())
    }

    /// Load a hub with its rosters resolved to public profiles, preserving
    /// the membership arrays' order.
    pub async fn hub_detail(&self, viewer_id: Uuid, hub_id: Uuid) -> Result<HubDetail, HubOpsError> {
        let hub: Hub = self
            .hubs
            .find_by_id(hub_id)
            .await?
            .ok_or(HubOpsError::HubNotFound)?
            .into();

        if !hub.is_member(viewer_id) && !hub.is_pending(viewer_id) {
            return Err(HubOpsError::Denied(PolicyError::NotMember));
        }

        let members = self.roster(&hub.members).await?;
        let pending_members = self.roster(&hub.pending_members).await?;

        Ok(HubDetail {
            id: hub.id,
            name: hub.name,
            join_code: hub.join_code,
            creator_id: hub.creator_id,
            members,
            pending_members,
            created_at: hub.created_at,
        })
    }

    /// Resolve an ordered list of user IDs to public profiles, skipping any
    /// without a profile row.
    pub async fn roster(&self, user_ids: &[Uuid]) -> Result<Vec<ProfilePublic>, HubOpsError> {
        let rows = self.profiles.find_by_user_ids(user_ids).await?;
        let mut by_id: std::collections::HashMap<Uuid, ProfilePublic> = rows
            .into_iter()
            .map(|entity| {
                let profile: domain::models::AccountProfile = entity.into();
                (profile.user_id, ProfilePublic::from(&profile))
            })
            .collect();

        Ok(user_ids
            .iter()
            .filter_map(|id| by_id.remove(id))
            .collect())
    }

    fn publish_hub(&self, hub_id: Uuid, deleted: bool) {
        self.changes.publish(ChangeEvent::Hub { hub_id, deleted });
        record_change_published("hubs");
    }

    fn publish_profile(&self, user_id: Uuid) {
        self.changes.publish(ChangeEvent::Profile { user_id });
        record_change_published("profiles");
    }
}
