/// Profile model
///
/// Holds the borrower-facing identity of a user. Loans and items reference
/// profiles, not users, so the display name can be joined in directly.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE profiles (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
///     full_name VARCHAR(255) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

/// User profile
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub full_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Creates the profile for a newly registered user
    pub async fn create<'e, E>(executor: E, user_id: Uuid, full_name: &str) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Profile>(
            r#"
            INSERT INTO profiles (user_id, full_name)
            VALUES ($1, $2)
            RETURNING id, user_id, full_name, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(full_name)
        .fetch_one(executor)
        .await
    }

    /// Finds the profile belonging to a user
    pub async fn find_by_user_id<'e, E>(executor: E, user_id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Profile>(
            "SELECT id, user_id, full_name, created_at, updated_at FROM profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(executor)
        .await
    }
}
