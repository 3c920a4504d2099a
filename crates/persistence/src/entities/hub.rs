//! Hub entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the hubs table.
///
/// Membership is stored as uuid arrays on the hub row itself. Array order is
/// insertion order and is meaningful: the first member is the default
/// assignee for extracted medications.
#[derive(Debug, Clone, FromRow)]
pub struct HubEntity {
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

impl From<HubEntity> for domain::models::Hub {
    fn from(entity: HubEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            join_code: entity.join_code,
            creator_id: entity.creator_id,
            members: entity.members,
            pending_members: entity.pending_members,
            archived: entity.archived,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
