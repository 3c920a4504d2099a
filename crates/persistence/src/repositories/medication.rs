//! Medication repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::MedicationEntity;
use crate::metrics::QueryTimer;

const MEDICATION_COLUMNS: &str = "id, hub_id, name, dosage, time, assigned_to, created_by, \
     remarks, image_url, last_taken, notified_on_time, notified_5_min, notified_10_min, \
     created_at, updated_at";

/// Repository for medication-related database operations.
#[derive(Clone)]
pub struct MedicationRepository {
    pool: PgPool,
}

impl MedicationRepository {
    /// Creates a new MedicationRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create a medication entry on a hub's board.
    #[allow(clippy::too_many_arguments)]
    pub async fn create_medication(
        &self,
        hub_id: Uuid,
        name: &str,
        dosage: &str,
        time: &str,
        assigned_to: Uuid,
        created_by: Uuid,
        remarks: Option<&str>,
        image_url: Option<&str>,
    ) -> Result<MedicationEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_medication");
        let result = sqlx::query_as::<_, MedicationEntity>(&format!(
            r#"
            INSERT INTO medications (hub_id, name, dosage, time, assigned_to, created_by, remarks, image_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {MEDICATION_COLUMNS}
            "#
        ))
        .bind(hub_id)
        .bind(name)
        .bind(dosage)
        .bind(time)
        .bind(assigned_to)
        .bind(created_by)
        .bind(remarks)
        .bind(image_url)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find a medication by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<MedicationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_medication_by_id");
        let result = sqlx::query_as::<_, MedicationEntity>(&format!(
            r#"
            SELECT {MEDICATION_COLUMNS}
            FROM medications
            WHERE id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// List a hub's board ordered by scheduled time of day. Times are
    /// fixed-width "HH:mm", so text ordering is chronological.
    pub async fn list_by_hub(&self, hub_id: Uuid) -> Result<Vec<MedicationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_medications_by_hub");
        let result = sqlx::query_as::<_, MedicationEntity>(&format!(
            r#"
            SELECT {MEDICATION_COLUMNS}
            FROM medications
            WHERE hub_id = $1
            ORDER BY time ASC, created_at ASC
            "#
        ))
        .bind(hub_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Update editable fields of an entry, scoped to its creator. Absent
    /// values keep the stored ones. Returns None if the entry does not exist
    /// or the caller did not create it.
    #[allow(clippy::too_many_arguments)]
    pub async fn update_medication(
        &self,
        id: Uuid,
        created_by: Uuid,
        name: Option<&str>,
        dosage: Option<&str>,
        time: Option<&str>,
        assigned_to: Option<Uuid>,
        remarks: Option<&str>,
        image_url: Option<&str>,
    ) -> Result<Option<MedicationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_medication");
        let result = sqlx::query_as::<_, MedicationEntity>(&format!(
            r#"
            UPDATE medications
            SET
                name = COALESCE($3, name),
                dosage = COALESCE($4, dosage),
                time = COALESCE($5, time),
                assigned_to = COALESCE($6, assigned_to),
                remarks = COALESCE($7, remarks),
                image_url = COALESCE($8, image_url),
                updated_at = NOW()
            WHERE id = $1 AND created_by = $2
            RETURNING {MEDICATION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(created_by)
        .bind(name)
        .bind(dosage)
        .bind(time)
        .bind(assigned_to)
        .bind(remarks)
        .bind(image_url)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Delete an entry, scoped to its creator.
    pub async fn delete_medication(&self, id: Uuid, created_by: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_medication");
        let result = sqlx::query(
            r#"
            DELETE FROM medications
            WHERE id = $1 AND created_by = $2
            "#,
        )
        .bind(id)
        .bind(created_by)
        .execute(&self.pool)
        .await?;
        timer.record();
        Ok(result.rows_affected())
    }

    /// Write the taken state. The three notified flags move in lockstep with
    /// last_taken in one statement: marked taken sets last_taken and raises
    /// all flags, unmarking clears all four.
    pub async fn set_taken(
        &self,
        id: Uuid,
        last_taken: Option<DateTime<Utc>>,
    ) -> Result<Option<MedicationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("set_medication_taken");
        let notified = last_taken.is_some();
        let result = sqlx::query_as::<_, MedicationEntity>(&format!(
            r#"
            UPDATE medications
            SET
                last_taken = $2,
                notified_on_time = $3,
                notified_5_min = $3,
                notified_10_min = $3,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {MEDICATION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(last_taken)
        .bind(notified)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

}

#[cfg(test)]
mod tests {
    // Note: MedicationRepository tests require a database connection. Toggle
    // and derivation semantics are covered by domain and service tests.
}
