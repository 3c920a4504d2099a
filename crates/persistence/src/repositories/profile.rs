//! Profile repository for database operations.

use domain::models::profile::Gender;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::profile::GenderDb;
use crate::entities::ProfileEntity;
use crate::metrics::QueryTimer;

const PROFILE_COLUMNS: &str = "user_id, display_name, gender, age, avatar_index, hub_id, \
     pending_hub_id, notifications_enabled, family_alerts_enabled, created_at, updated_at";

/// Repository for profile-related database operations.
///
/// A profile's `hub_id` and `pending_hub_id` are mutually exclusive. Every
/// setter here writes both columns in a single statement so no interleaving
/// of requests can leave a row with both populated.
#[derive(Clone)]
pub struct ProfileRepository {
    pool: PgPool,
}

impl ProfileRepository {
    /// Creates a new ProfileRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create a profile row for a verified account.
    pub async fn create_profile(
        &self,
        user_id: Uuid,
        display_name: &str,
    ) -> Result<ProfileEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_profile");
        let result = sqlx::query_as::<_, ProfileEntity>(&format!(
            r#"
            INSERT INTO profiles (user_id, display_name)
            VALUES ($1, $2)
            RETURNING {PROFILE_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(display_name)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find a profile by user ID.
    pub async fn find_by_user_id(
        &self,
        user_id: Uuid,
    ) -> Result<Option<ProfileEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_profile_by_user_id");
        let result = sqlx::query_as::<_, ProfileEntity>(&format!(
            r#"
            SELECT {PROFILE_COLUMNS}
            FROM profiles
            WHERE user_id = $1
            "#
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find profiles for a set of user IDs. Rows come back in no particular
    /// order; callers that care about roster order re-sort against the hub's
    /// member array.
    pub async fn find_by_user_ids(
        &self,
        user_ids: &[Uuid],
    ) -> Result<Vec<ProfileEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_profiles_by_user_ids");
        let result = sqlx::query_as::<_, ProfileEntity>(&format!(
            r#"
            SELECT {PROFILE_COLUMNS}
            FROM profiles
            WHERE user_id = ANY($1)
            "#
        ))
        .bind(user_ids)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Update editable profile fields. Absent values keep the stored ones.
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        display_name: Option<&str>,
        gender: Option<Gender>,
        age: Option<i32>,
        avatar_index: Option<i32>,
        notifications_enabled: Option<bool>,
        family_alerts_enabled: Option<bool>,
    ) -> Result<Option<ProfileEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_profile");
        let gender_db: Option<GenderDb> = gender.map(Into::into);
        let result = sqlx::query_as::<_, ProfileEntity>(&format!(
            r#"
            UPDATE profiles
            SET
                display_name = COALESCE($2, display_name),
                gender = COALESCE($3, gender),
                age = COALESCE($4, age),
                avatar_index = COALESCE($5, avatar_index),
                notifications_enabled = COALESCE($6, notifications_enabled),
                family_alerts_enabled = COALESCE($7, family_alerts_enabled),
                updated_at = NOW()
            WHERE user_id = $1
            RETURNING {PROFILE_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(display_name)
        .bind(gender_db)
        .bind(age)
        .bind(avatar_index)
        .bind(notifications_enabled)
        .bind(family_alerts_enabled)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Point the profile at an active hub, clearing any pending request.
    pub async fn set_hub(
        &self,
        user_id: Uuid,
        hub_id: Uuid,
    ) -> Result<Option<ProfileEntity>, sqlx::Error> {
        let timer = QueryTimer::new("set_profile_hub");
        let result = sqlx::query_as::<_, ProfileEntity>(&format!(
            r#"
            UPDATE profiles
            SET hub_id = $2, pending_hub_id = NULL, updated_at = NOW()
            WHERE user_id = $1
            RETURNING {PROFILE_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(hub_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Record a pending join request, clearing any active membership pointer.
    pub async fn set_pending_hub(
        &self,
        user_id: Uuid,
        hub_id: Uuid,
    ) -> Result<Option<ProfileEntity>, sqlx::Error> {
        let timer = QueryTimer::new("set_profile_pending_hub");
        let result = sqlx::query_as::<_, ProfileEntity>(&format!(
            r#"
            UPDATE profiles
            SET pending_hub_id = $2, hub_id = NULL, updated_at = NOW()
            WHERE user_id = $1
            RETURNING {PROFILE_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(hub_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Clear both membership pointers (declined, cancelled, or left).
    pub async fn clear_hub_state(
        &self,
        user_id: Uuid,
    ) -> Result<Option<ProfileEntity>, sqlx::Error> {
        let timer = QueryTimer::new("clear_profile_hub_state");
        let result = sqlx::query_as::<_, ProfileEntity>(&format!(
            r#"
            UPDATE profiles
            SET hub_id = NULL, pending_hub_id = NULL, updated_at = NOW()
            WHERE user_id = $1
            RETURNING {PROFILE_COLUMNS}
            "#
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }
}

#[cfg(test)]
mod tests {
    // Note: ProfileRepository tests require a database connection. The
    // mutual-exclusion rule for hub_id and pending_hub_id is covered by the
    // hub lifecycle integration tests in the api crate.
}
