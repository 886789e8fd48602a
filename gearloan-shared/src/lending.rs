/// Borrow and return workflow
///
/// Each operation runs in a single transaction holding a row lock on the item,
/// so concurrent borrows of the same item are serialised and a failed step
/// leaves nothing behind. The partial unique index
/// [`ONE_ACTIVE_LOAN_INDEX`] backs up the active-loan check at the schema level.
///
/// # Borrow
///
/// 1. Lock the item; it must exist and be `available`
/// 2. It must not already have an active loan
/// 3. Insert an active loan due `loan_duration` from now
/// 4. Mark the item `borrowed` by the borrower
///
/// # Return
///
/// 1. Lock the item
/// 2. Mark all of its active loans `returned`
/// 3. Mark the item `available` (even if no loan was active)
///
/// # Example
///
/// ```no_run
/// use gearloan_shared::lending::LendingService;
/// use chrono::Duration;
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, item_id: Uuid, profile_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let lending = LendingService::new(pool, Duration::hours(8));
///
/// let borrowed = lending.borrow(item_id, profile_id).await?;
/// println!("Due back at {}", borrowed.loan.due_date);
///
/// let returned = lending.return_item(item_id).await?;
/// assert_eq!(returned.returned_loans.len(), 1);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{
    item::{Item, ItemStatus},
    loan::{Loan, ONE_ACTIVE_LOAN_INDEX},
};

/// Borrow/return errors
#[derive(Debug, thiserror::Error)]
pub enum LoanError {
    #[error("Item not found")]
    ItemNotFound,

    #[error("This item is no longer available")]
    NotAvailable,

    #[error("This item already has an active loan")]
    ActiveLoanExists,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl LoanError {
    /// Maps a loan insert failure, recognising a lost race on the active-loan index
    fn from_insert(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.constraint() == Some(ONE_ACTIVE_LOAN_INDEX) {
                return LoanError::ActiveLoanExists;
            }
        }
        LoanError::Database(err)
    }
}

/// Result of a successful borrow
#[derive(Debug, Clone)]
pub struct Borrowed {
    pub loan: Loan,
    pub item: Item,
}

/// Result of a return
#[derive(Debug, Clone)]
pub struct Returned {
    pub item: Item,

    /// Loans closed by this return (empty if none was active)
    pub returned_loans: Vec<Loan>,
}

/// Runs the borrow and return workflows
#[derive(Debug, Clone)]
pub struct LendingService {
    pool: PgPool,
    loan_duration: Duration,
}

impl LendingService {
    pub fn new(pool: PgPool, loan_duration: Duration) -> Self {
        Self { pool, loan_duration }
    }

    /// Borrows an item for the borrower profile `borrower_id`
    ///
    /// # Errors
    ///
    /// - [`LoanError::ItemNotFound`] if the item doesn't exist
    /// - [`LoanError::NotAvailable`] if the item isn't `available`
    /// - [`LoanError::ActiveLoanExists`] if the item already has an active loan
    pub async fn borrow(&self, item_id: Uuid, borrower_id: Uuid) -> Result<Borrowed, LoanError> {
        let mut tx = self.pool.begin().await?;

        let item = Item::find_for_update(&mut *tx, item_id)
            .await?
            .ok_or(LoanError::ItemNotFound)?;

        if item.status != ItemStatus::Available {
            tracing::info!(
                item_id = %item_id,
                status = item.status.as_str(),
                "Borrow rejected: item not available"
            );
            return Err(LoanError::NotAvailable);
        }

        if let Some(existing) = Loan::find_active_for_item(&mut *tx, item_id).await? {
            tracing::warn!(
                item_id = %item_id,
                loan_id = %existing.id,
                "Borrow rejected: available item has an active loan"
            );
            return Err(LoanError::ActiveLoanExists);
        }

        let due_date = Utc::now() + self.loan_duration;
        let loan = Loan::create(&mut *tx, item_id, borrower_id, due_date)
            .await
            .map_err(LoanError::from_insert)?;

        let item = Item::mark_borrowed(&mut *tx, item_id, borrower_id).await?;

        tx.commit().await?;

        tracing::info!(
            item_id = %item_id,
            loan_id = %loan.id,
            borrower_id = %borrower_id,
            due_date = %loan.due_date,
            "Item borrowed"
        );

        Ok(Borrowed { loan, item })
    }

    /// Marks an item returned
    ///
    /// # Errors
    ///
    /// [`LoanError::ItemNotFound`] if the item doesn't exist.
    pub async fn return_item(&self, item_id: Uuid) -> Result<Returned, LoanError> {
        let mut tx = self.pool.begin().await?;

        Item::find_for_update(&mut *tx, item_id)
            .await?
            .ok_or(LoanError::ItemNotFound)?;

        let returned_loans = Loan::mark_returned_for_item(&mut *tx, item_id).await?;
        let item = Item::mark_available(&mut *tx, item_id).await?;

        tx.commit().await?;

        tracing::info!(
            item_id = %item_id,
            returned_loans = returned_loans.len(),
            "Item returned"
        );

        Ok(Returned {
            item,
            returned_loans,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_facing_messages() {
        assert_eq!(
            LoanError::NotAvailable.to_string(),
            "This item is no longer available"
        );
        assert_eq!(
            LoanError::ActiveLoanExists.to_string(),
            "This item already has an active loan"
        );
    }

    #[test]
    fn test_non_constraint_insert_error_stays_database() {
        let err = LoanError::from_insert(sqlx::Error::RowNotFound);
        assert!(matches!(err, LoanError::Database(sqlx::Error::RowNotFound)));
    }
}
