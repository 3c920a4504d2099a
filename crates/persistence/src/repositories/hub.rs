//! Hub repository for database operations.

use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use crate::entities::HubEntity;
use crate::metrics::QueryTimer;

const HUB_COLUMNS: &str =
    "id, name, join_code, creator_id, members, pending_members, archived, created_at, updated_at";

const MAX_CODE_ATTEMPTS: u32 = 10;

/// Repository for hub-related database operations.
///
/// Membership lives in uuid array columns on the hub row. Mutations are
/// written as single statements using array_append/array_remove with a
/// membership guard, so replaying a request cannot duplicate an entry.
#[derive(Clone)]
pub struct HubRepository {
    pool: PgPool,
}

impl HubRepository {
    /// Creates a new HubRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create a hub with the creator as its only member.
    pub async fn create_hub(
        &self,
        name: &str,
        join_code: &str,
        creator_id: Uuid,
    ) -> Result<HubEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_hub");
        let result = sqlx::query_as::<_, HubEntity>(&format!(
            r#"
            INSERT INTO hubs (name, join_code, creator_id, members, pending_members)
            VALUES ($1, $2, $3, ARRAY[$3]::uuid[], ARRAY[]::uuid[])
            RETURNING {HUB_COLUMNS}
            "#
        ))
        .bind(name)
        .bind(join_code)
        .bind(creator_id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find a hub by ID, archived or not.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<HubEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_hub_by_id");
        let result = sqlx::query_as::<_, HubEntity>(&format!(
            r#"
            SELECT {HUB_COLUMNS}
            FROM hubs
            WHERE id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find a hub by its join code. Archived hubs are included so callers
    /// can distinguish an expired code from an unknown one.
    pub async fn find_by_join_code(&self, code: &str) -> Result<Option<HubEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_hub_by_join_code");
        let result = sqlx::query_as::<_, HubEntity>(&format!(
            r#"
            SELECT {HUB_COLUMNS}
            FROM hubs
            WHERE join_code = $1
            "#
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Add a user to the pending list. A user already pending or already a
    /// member is left untouched.
    pub async fn add_pending_member(
        &self,
        hub_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<HubEntity>, sqlx::Error> {
        let timer = QueryTimer::new("add_pending_member");
        let result = sqlx::query_as::<_, HubEntity>(&format!(
            r#"
            UPDATE hubs
            SET
                pending_members = CASE
                    WHEN $2 = ANY(pending_members) OR $2 = ANY(members) THEN pending_members
                    ELSE array_append(pending_members, $2)
                END,
                updated_at = NOW()
            WHERE id = $1 AND archived = false
            RETURNING {HUB_COLUMNS}
            "#
        ))
        .bind(hub_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Move a user from pending to members. Appending is guarded so a
    /// replayed approval changes nothing; the pending removal always runs.
    pub async fn accept_member(
        &self,
        hub_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<HubEntity>, sqlx::Error> {
        let timer = QueryTimer::new("accept_member");
        let result = sqlx::query_as::<_, HubEntity>(&format!(
            r#"
            UPDATE hubs
            SET
                members = CASE
                    WHEN $2 = ANY(members) THEN members
                    ELSE array_append(members, $2)
                END,
                pending_members = array_remove(pending_members, $2),
                updated_at = NOW()
            WHERE id = $1 AND archived = false
            RETURNING {HUB_COLUMNS}
            "#
        ))
        .bind(hub_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Remove a user from the pending list (declined or cancelled).
    pub async fn remove_pending_member(
        &self,
        hub_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<HubEntity>, sqlx::Error> {
        let timer = QueryTimer::new("remove_pending_member");
        let result = sqlx::query_as::<_, HubEntity>(&format!(
            r#"
            UPDATE hubs
            SET pending_members = array_remove(pending_members, $2), updated_at = NOW()
            WHERE id = $1
            RETURNING {HUB_COLUMNS}
            "#
        ))
        .bind(hub_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Remove a user from the member list (left the hub).
    pub async fn remove_member(
        &self,
        hub_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<HubEntity>, sqlx::Error> {
        let timer = QueryTimer::new("remove_member");
        let result = sqlx::query_as::<_, HubEntity>(&format!(
            r#"
            UPDATE hubs
            SET members = array_remove(members, $2), updated_at = NOW()
            WHERE id = $1
            RETURNING {HUB_COLUMNS}
            "#
        ))
        .bind(hub_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Delete a hub row entirely. Member profiles still pointing at it are
    /// not touched here.
    pub async fn delete_hub(&self, hub_id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_hub");
        let result = sqlx::query(
            r#"
            DELETE FROM hubs
            WHERE id = $1
            "#,
        )
        .bind(hub_id)
        .execute(&self.pool)
        .await?;
        timer.record();
        Ok(result.rows_affected())
    }

    /// Check if a join code is already taken.
    pub async fn join_code_exists(&self, code: &str) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("check_join_code_exists");
        let result = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(SELECT 1 FROM hubs WHERE join_code = $1)
            "#,
        )
        .bind(code)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Generate a join code not used by any existing hub.
    pub async fn generate_unique_join_code(&self) -> Result<String, sqlx::Error> {
        for attempt in 0..MAX_CODE_ATTEMPTS {
            let code = shared::join_code::generate_join_code();
            if !self.join_code_exists(&code).await? {
                return Ok(code);
            }
            warn!(attempt = attempt + 1, "Join code collision, retrying");
        }
        Err(sqlx::Error::Protocol(
            "Could not generate unique join code".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    // Note: HubRepository tests require a database connection. Membership
    // semantics over the arrays are covered by the hub lifecycle
    // integration tests in the api crate.
}
