//! Capability checks for hub and medication actions.

use uuid::Uuid;

use crate::models::hub::Hub;
use crate::models::medication::MedicationEntry;

/// Actions gated on hub membership or ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    EditMedication,
    DeleteMedication,
    MarkTaken,
    ManageJoinRequests,
    DeleteHub,
}

/// Why a capability check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    #[error("User is not a member of this hub")]
    NotMember,
    #[error("Only the creator can perform this action")]
    NotCreator,
    #[error("Only the medication's creator can perform this action")]
    NotOwner,
}

/// Checks whether `user_id` holds `capability` in `hub`.
///
/// Edit and delete on a medication are reserved for the entry's creator, so
/// `medication` must be supplied for those checks. Every check requires hub
/// membership first.
pub fn authorize(
    capability: Capability,
    user_id: Uuid,
    hub: &Hub,
    medication: Option<&MedicationEntry>,
) -> Result<(), PolicyError> {
    if !hub.is_member(user_id) {
        return Err(PolicyError::NotMember);
    }
    match capability {
        Capability::MarkTaken => Ok(()),
        Capability::ManageJoinRequests | Capability::DeleteHub => {
            if hub.is_creator(user_id) {
                Ok(())
            } else {
                Err(PolicyError::NotCreator)
            }
        }
        Capability::EditMedication | Capability::DeleteMedication => match medication {
            Some(entry) if entry.created_by == user_id => Ok(()),
            _ => Err(PolicyError::NotOwner),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn hub_with(creator: Uuid, member: Uuid) -> Hub {
        Hub {
            id: Uuid::new_v4(),
            name: "Family".to_string(),
            join_code: "ABC234".to_string(),
            creator_id: creator,
            members: vec![creator, member],
            pending_members: vec![],
            archived: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn entry_by(hub: &Hub, author: Uuid) -> MedicationEntry {
        MedicationEntry {
            id: Uuid::new_v4(),
            hub_id: hub.id,
            name: "Aspirin".to_string(),
            dosage: "100mg".to_string(),
            time: "08:00".to_string(),
            assigned_to: author,
            created_by: author,
            remarks: None,
            image_url: None,
            last_taken: None,
            notified_on_time: false,
            notified_5_min: false,
            notified_10_min: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_any_member_may_mark_taken() {
        let creator = Uuid::new_v4();
        let member = Uuid::new_v4();
        let hub = hub_with(creator, member);
        assert!(authorize(Capability::MarkTaken, member, &hub, None).is_ok());
        assert!(authorize(Capability::MarkTaken, creator, &hub, None).is_ok());
    }

    #[test]
    fn test_non_member_is_rejected() {
        let hub = hub_with(Uuid::new_v4(), Uuid::new_v4());
        let outsider = Uuid::new_v4();
        assert_eq!(
            authorize(Capability::MarkTaken, outsider, &hub, None),
            Err(PolicyError::NotMember)
        );
        assert_eq!(
            authorize(Capability::DeleteHub, outsider, &hub, None),
            Err(PolicyError::NotMember)
        );
    }

    #[test]
    fn test_only_creator_manages_requests_and_deletes_hub() {
        let creator = Uuid::new_v4();
        let member = Uuid::new_v4();
        let hub = hub_with(creator, member);
        assert!(authorize(Capability::ManageJoinRequests, creator, &hub, None).is_ok());
        assert_eq!(
            authorize(Capability::ManageJoinRequests, member, &hub, None),
            Err(PolicyError::NotCreator)
        );
        assert!(authorize(Capability::DeleteHub, creator, &hub, None).is_ok());
        assert_eq!(
            authorize(Capability::DeleteHub, member, &hub, None),
            Err(PolicyError::NotCreator)
        );
    }

    #[test]
    fn test_medication_edit_is_owner_only() {
        let creator = Uuid::new_v4();
        let member = Uuid::new_v4();
        let hub = hub_with(creator, member);
        let entry = entry_by(&hub, member);
        assert!(authorize(Capability::EditMedication, member, &hub, Some(&entry)).is_ok());
        assert_eq!(
            authorize(Capability::EditMedication, creator, &hub, Some(&entry)),
            Err(PolicyError::NotOwner)
        );
        assert_eq!(
            authorize(Capability::DeleteMedication, creator, &hub, Some(&entry)),
            Err(PolicyError::NotOwner)
        );
        assert_eq!(
            authorize(Capability::DeleteMedication, member, &hub, None),
            Err(PolicyError::NotOwner)
        );
    }
}
