/// Session model
///
/// A session is created on sign-in and referenced by the `sid` claim of every
/// token issued for it. Revoking the session invalidates all of those tokens
/// at once, which is how sign-out works with otherwise stateless JWTs.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE sessions (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     expires_at TIMESTAMPTZ NOT NULL,
///     revoked_at TIMESTAMPTZ
/// );
/// ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

/// Server-side session
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Opens a session lasting `ttl`
    pub async fn create<'e, E>(executor: E, user_id: Uuid, ttl: Duration) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (user_id, expires_at)
            VALUES ($1, $2)
            RETURNING id, user_id, created_at, expires_at, revoked_at
            "#,
        )
        .bind(user_id)
        .bind(Utc::now() + ttl)
        .fetch_one(executor)
        .await
    }

    /// Finds a session that is neither revoked nor expired
    pub async fn find_active<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Session>(
            r#"
            SELECT id, user_id, created_at, expires_at, revoked_at
            FROM sessions
            WHERE id = $1 AND revoked_at IS NULL AND expires_at > NOW()
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Revokes a session
    ///
    /// Returns `false` if it was already revoked or doesn't exist.
    pub async fn revoke<'e, E>(executor: E, id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            "UPDATE sessions SET revoked_at = NOW() WHERE id = $1 AND revoked_at IS NULL",
        )
        .bind(id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

