//! Medication entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the medications table.
#[derive(Debug, Clone, FromRow)]
pub struct MedicationEntity {
    pub id: Uuid,
    pub hub_id: Uuid,
    pub name: String,
    pub dosage: String,
    pub time: String,
    pub assigned_to: Uuid,
    pub created_by: Uuid,
    pub remarks: Option<String>,
    pub image_url: Option<String>,
    pub last_taken: Option<DateTime<Utc>>,
    pub notified_on_time: bool,
    pub notified_5_min: bool,
    pub notified_10_min: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<MedicationEntity> for domain::models::MedicationEntry {
    fn from(entity: MedicationEntity) -> Self {
        Self {
            id: entity.id,
            hub_id: entity.hub_id,
            name: entity.name,
            dosage: entity.dosage,
            time: entity.time,
            assigned_to: entity.assigned_to,
            created_by: entity.created_by,
            remarks: entity.remarks,
            image_url: entity.image_url,
            last_taken: entity.last_taken,
            notified_on_time: entity.notified_on_time,
            notified_5_min: entity.notified_5_min,
            notified_10_min: entity.notified_10_min,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
