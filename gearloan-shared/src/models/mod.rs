/// Database models for GearLoan
///
/// Each model is a `sqlx::FromRow` struct with its queries as associated
/// functions. Every query takes a generic `PgExecutor`, so the same call works
/// against the pool or inside a transaction (`&mut *tx`).
///
/// # Models
///
/// - `user`: Accounts and credentials
/// - `profile`: Display name, 1:1 with a user
/// - `user_role`: Student / staff / admin assignment
/// - `session`: Server-side sessions backing issued tokens
/// - `item`: Equipment inventory
/// - `loan`: Loan ledger
///
/// # Example
///
/// ```no_run
/// use gearloan_shared::models::item::Item;
/// use gearloan_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::new(std::env::var("DATABASE_URL")?, 5)).await?;
///
/// for item in Item::list(&pool).await? {
///     println!("{} ({})", item.name, item.status.as_str());
/// }
/// # Ok(())
/// # }
/// ```

pub mod item;
pub mod loan;
pub mod profile;
pub mod session;
pub mod user;
pub mod user_role;
