/// Loan ledger model
///
/// # Schema
///
/// ```sql
/// CREATE TYPE loan_status AS ENUM ('active', 'returned');
///
/// CREATE TABLE loans (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     item_id UUID NOT NULL REFERENCES items(id) ON DELETE CASCADE,
///     borrower_id UUID NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
///     borrowed_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     due_date TIMESTAMPTZ NOT NULL,
///     returned_at TIMESTAMPTZ,
///     status loan_status NOT NULL DEFAULT 'active',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE UNIQUE INDEX loans_one_active_per_item ON loans(item_id) WHERE status = 'active';
/// ```
///
/// Loans are never deleted on their own; they go away with their item or
/// borrower.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

/// Name of the partial unique index guarding one active loan per item
pub const ONE_ACTIVE_LOAN_INDEX: &str = "loans_one_active_per_item";

/// Number of loans shown in the "recent" list
pub const RECENT_LOANS_LIMIT: i64 = 5;

/// Loan state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "loan_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    Active,
    Returned,
}

impl LoanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Active => "active",
            LoanStatus::Returned => "returned",
        }
    }
}

/// An active loan is overdue once its due date has passed
pub fn is_overdue_at(status: LoanStatus, due_date: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    status == LoanStatus::Active && due_date < now
}

/// One borrowing of one item
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Loan {
    pub id: Uuid,
    pub item_id: Uuid,
    pub borrower_id: Uuid,
    pub borrowed_at: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    pub status: LoanStatus,
    pub created_at: DateTime<Utc>,
}

/// Loan joined with its item name and borrower name
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LoanDetails {
    pub id: Uuid,
    pub item_id: Uuid,
    pub item_name: String,
    pub borrower_id: Uuid,
    pub borrower_name: String,
    pub borrowed_at: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    pub status: LoanStatus,
    pub created_at: DateTime<Utc>,

    #[sqlx(skip)]
    pub is_overdue: bool,
}

/// Row of the borrowed-equipment table
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ActiveLoan {
    pub loan_id: Uuid,
    pub item_id: Uuid,
    pub equipment_name: String,
    pub borrowed_by_name: String,
    pub borrowed_at: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub status: LoanStatus,

    #[sqlx(skip)]
    pub is_overdue: bool,
}

const LOAN_COLUMNS: &str = "id, item_id, borrower_id, borrowed_at, due_date, returned_at, status, created_at";

impl Loan {
    /// Records a new active loan
    ///
    /// # Errors
    ///
    /// Fails with a unique violation on [`ONE_ACTIVE_LOAN_INDEX`] if the item
    /// already has an active loan.
    pub async fn create<'e, E>(
        executor: E,
        item_id: Uuid,
        borrower_id: Uuid,
        due_date: DateTime<Utc>,
    ) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Loan>(&format!(
            r#"
            INSERT INTO loans (item_id, borrower_id, due_date, status)
            VALUES ($1, $2, $3, 'active')
            RETURNING {}
            "#,
            LOAN_COLUMNS
        ))
        .bind(item_id)
        .bind(borrower_id)
        .bind(due_date)
        .fetch_one(executor)
        .await
    }

    /// Finds a loan by ID
    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Loan>(&format!("SELECT {} FROM loans WHERE id = $1", LOAN_COLUMNS))
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Finds the active loan of an item, if any
    pub async fn find_active_for_item<'e, E>(executor: E, item_id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Loan>(&format!(
            "SELECT {} FROM loans WHERE item_id = $1 AND status = 'active' LIMIT 1",
            LOAN_COLUMNS
        ))
        .bind(item_id)
        .fetch_optional(executor)
        .await
    }

    /// Marks every active loan of an item returned now
    ///
    /// Returns the loans that were closed (possibly none).
    pub async fn mark_returned_for_item<'e, E>(executor: E, item_id: Uuid) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Loan>(&format!(
            r#"
            UPDATE loans
            SET status = 'returned', returned_at = NOW()
            WHERE item_id = $1 AND status = 'active'
            RETURNING {}
            "#,
            LOAN_COLUMNS
        ))
        .bind(item_id)
        .fetch_all(executor)
        .await
    }

    /// Most recently created loans, newest first
    ///
    /// When `borrower_id` is set only that borrower's loans are returned.
    pub async fn recent<'e, E>(
        executor: E,
        borrower_id: Option<Uuid>,
        limit: i64,
    ) -> Result<Vec<LoanDetails>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let mut loans = sqlx::query_as::<_, LoanDetails>(
            r#"
            SELECT l.id, l.item_id, i.name AS item_name,
                   l.borrower_id, p.full_name AS borrower_name,
                   l.borrowed_at, l.due_date, l.returned_at, l.status, l.created_at
            FROM loans l
            JOIN items i ON i.id = l.item_id
            JOIN profiles p ON p.id = l.borrower_id
            WHERE $1::UUID IS NULL OR l.borrower_id = $1
            ORDER BY l.created_at DESC
            LIMIT $2
            "#,
        )
        .bind(borrower_id)
        .bind(limit)
        .fetch_all(executor)
        .await?;

        let now = Utc::now();
        for loan in &mut loans {
            loan.is_overdue = is_overdue_at(loan.status, loan.due_date, now);
        }

        Ok(loans)
    }

    /// All active loans, most recently borrowed first
    pub async fn active<'e, E>(executor: E) -> Result<Vec<ActiveLoan>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let mut loans = sqlx::query_as::<_, ActiveLoan>(
            r#"
            SELECT l.id AS loan_id, l.item_id, i.name AS equipment_name,
                   p.full_name AS borrowed_by_name,
                   l.borrowed_at, l.due_date, l.status
            FROM loans l
            JOIN items i ON i.id = l.item_id
            JOIN profiles p ON p.id = l.borrower_id
            WHERE l.status = 'active'
            ORDER BY l.borrowed_at DESC
            "#,
        )
        .fetch_all(executor)
        .await?;

        let now = Utc::now();
        for loan in &mut loans {
            loan.is_overdue = is_overdue_at(loan.status, loan.due_date, now);
        }

        Ok(loans)
    }

    /// Number of active loans past their due date, optionally for one borrower
    pub async fn count_overdue<'e, E>(
        executor: E,
        borrower_id: Option<Uuid>,
    ) -> Result<i64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM loans
            WHERE status = 'active' AND due_date < NOW()
              AND ($1::UUID IS NULL OR borrower_id = $1)
            "#,
        )
        .bind(borrower_id)
        .fetch_one(executor)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_overdue_only_when_active_and_past_due() {
        let now = Utc::now();
        let past = now - Duration::hours(1);
        let future = now + Duration::hours(1);

        assert!(is_overdue_at(LoanStatus::Active, past, now));
        assert!(!is_overdue_at(LoanStatus::Active, future, now));
        assert!(!is_overdue_at(LoanStatus::Returned, past, now));
        assert!(!is_overdue_at(LoanStatus::Active, now, now));
    }

    #[test]
    fn test_active_loan_serializes_flat() {
        let now = Utc::now();
        let row = ActiveLoan {
            loan_id: Uuid::new_v4(),
            item_id: Uuid::new_v4(),
            equipment_name: "Tripod".to_string(),
            borrowed_by_name: "Ada Student".to_string(),
            borrowed_at: now,
            due_date: now,
            status: LoanStatus::Active,
            is_overdue: false,
        };

        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(value["equipment_name"], "Tripod");
        assert_eq!(value["borrowed_by_name"], "Ada Student");
        assert_eq!(value["status"], "active");
        assert_eq!(value["is_overdue"], false);
    }
}
