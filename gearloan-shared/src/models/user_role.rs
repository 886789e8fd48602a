/// Role assignment model
///
/// Every user has exactly one role. New accounts start as `student`.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE app_role AS ENUM ('student', 'staff', 'admin');
///
/// CREATE TABLE user_roles (
///     user_id UUID PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
///     role app_role NOT NULL DEFAULT 'student',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Roles
///
/// - **student**: Browse inventory and borrow equipment
/// - **staff**: Manage inventory, mark items returned, view all loans
/// - **admin**: Everything staff can do, plus assign roles

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

/// Application role
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "app_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Student,
    Staff,
    Admin,
}

impl Role {
    /// Converts role to string for display and token claims
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Staff => "staff",
            Role::Admin => "admin",
        }
    }

    /// Only students borrow equipment
    pub fn can_borrow(&self) -> bool {
        matches!(self, Role::Student)
    }

    /// Staff and admins manage inventory and returns
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Staff | Role::Admin)
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

/// A user's role assignment
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserRole {
    pub user_id: Uuid,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRole {
    /// Assigns a role, replacing any existing assignment
    pub async fn assign<'e, E>(executor: E, user_id: Uuid, role: Role) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, UserRole>(
            r#"
            INSERT INTO user_roles (user_id, role)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE
                SET role = EXCLUDED.role, updated_at = NOW()
            RETURNING user_id, role, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(role)
        .fetch_one(executor)
        .await
    }

    /// Looks up a user's role
    ///
    /// Returns `None` if the user has no assignment (or does not exist).
    pub async fn find_role<'e, E>(executor: E, user_id: Uuid) -> Result<Option<Role>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar::<_, Role>("SELECT role FROM user_roles WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(executor)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_predicates() {
        assert!(Role::Student.can_borrow());
        assert!(!Role::Staff.can_borrow());
        assert!(!Role::Admin.can_borrow());

        assert!(!Role::Student.is_staff());
        assert!(Role::Staff.is_staff());
        assert!(Role::Admin.is_staff());

        assert!(Role::Admin.is_admin());
        assert!(!Role::Staff.is_admin());
    }

    #[test]
    fn test_default_role_is_student() {
        assert_eq!(Role::default(), Role::Student);
    }

    #[test]
    fn test_role_serde() {
        assert_eq!(serde_json::to_string(&Role::Staff).unwrap(), "\"staff\"");
        let role: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, Role::Admin);
    }
}
