//! Profile entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::profile::Gender;
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for gender that maps to PostgreSQL enum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "gender", rename_all = "lowercase")]
pub enum GenderDb {
    Female,
    Male,
    Other,
    Unset,
}

impl From<GenderDb> for Gender {
    fn from(db: GenderDb) -> Self {
        match db {
            GenderDb::Female => Gender::Female,
            GenderDb::Male => Gender::Male,
            GenderDb::Other => Gender::Other,
            GenderDb::Unset => Gender::Unset,
        }
    }
}

impl From<Gender> for GenderDb {
    fn from(gender: Gender) -> Self {
        match gender {
            Gender::Female => GenderDb::Female,
            Gender::Male => GenderDb::Male,
            Gender::Other => GenderDb::Other,
            Gender::Unset => GenderDb::Unset,
        }
    }
}

/// Database row mapping for the profiles table.
///
/// `hub_id` and `pending_hub_id` are plain columns with no foreign key, so a
/// profile can keep pointing at a hub that no longer exists. Readers treat a
/// dangling reference the same as no hub.
#[derive(Debug, Clone, FromRow)]
pub struct ProfileEntity {
    pub user_id: Uuid,
    pub display_name: String,
    pub gender: GenderDb,
    pub age: Option<i32>,
    pub avatar_index: i32,
    pub hub_id: Option<Uuid>,
    pub pending_hub_id: Option<Uuid>,
    pub notifications_enabled: bool,
    pub family_alerts_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProfileEntity> for domain::models::AccountProfile {
    fn from(entity: ProfileEntity) -> Self {
        Self {
            user_id: entity.user_id,
            display_name: entity.display_name,
            gender: entity.gender.into(),
            age: entity.age,
            avatar_index: entity.avatar_index,
            hub_id: entity.hub_id,
            pending_hub_id: entity.pending_hub_id,
            notifications_enabled: entity.notifications_enabled,
            family_alerts_enabled: entity.family_alerts_enabled,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
