/// Equipment inventory model
///
/// # Schema
///
/// ```sql
/// CREATE TYPE item_status AS ENUM ('available', 'borrowed', 'maintenance');
///
/// CREATE TABLE items (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     category VARCHAR(50) NOT NULL,   -- one of ItemCategory
///     description TEXT,
///     serial_number VARCHAR(255),
///     status item_status NOT NULL DEFAULT 'available',
///     borrowed_by UUID REFERENCES profiles(id) ON DELETE SET NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Status lifecycle
///
/// - `available` → `borrowed` only through the borrow workflow
/// - `borrowed` → `available` only through the return workflow
/// - `available` ↔ `maintenance` through a staff update
///
/// # Example
///
/// ```no_run
/// use gearloan_shared::models::item::{CreateItem, Item, ItemCategory};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let item = Item::create(&pool, CreateItem {
///     name: "Oscilloscope".to_string(),
///     category: ItemCategory::Laboratory,
///     description: None,
///     serial_number: Some("OSC-0042".to_string()),
/// }).await?;
///
/// let matches: Vec<Item> = Item::list(&pool)
///     .await?
///     .into_iter()
///     .filter(|i| i.matches_query("scope"))
///     .collect();
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use std::fmt;
use uuid::Uuid;

/// Item availability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "item_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Available,
    Borrowed,
    Maintenance,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Available => "available",
            ItemStatus::Borrowed => "borrowed",
            ItemStatus::Maintenance => "maintenance",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        [ItemStatus::Available, ItemStatus::Borrowed, ItemStatus::Maintenance]
            .into_iter()
            .find(|s| s.as_str() == value)
    }

    /// Whether staff may set this status directly
    ///
    /// `borrowed` is owned by the borrow/return workflow.
    pub fn is_assignable(&self) -> bool {
        !matches!(self, ItemStatus::Borrowed)
    }
}

/// Equipment category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemCategory {
    Electronics,
    Tools,
    Sports,
    Office,
    Laboratory,
    Other,
}

impl ItemCategory {
    pub const ALL: [ItemCategory; 6] = [
        ItemCategory::Electronics,
        ItemCategory::Tools,
        ItemCategory::Sports,
        ItemCategory::Office,
        ItemCategory::Laboratory,
        ItemCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemCategory::Electronics => "Electronics",
            ItemCategory::Tools => "Tools",
            ItemCategory::Sports => "Sports",
            ItemCategory::Office => "Office",
            ItemCategory::Laboratory => "Laboratory",
            ItemCategory::Other => "Other",
        }
    }

    /// Parses a stored category name (exact match)
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == value)
    }
}

impl fmt::Display for ItemCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A piece of equipment
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Item {
    pub id: Uuid,
    pub name: String,

    /// Category name, constrained to [`ItemCategory`] by a CHECK constraint
    pub category: String,

    pub description: Option<String>,
    pub serial_number: Option<String>,
    pub status: ItemStatus,

    /// Profile of the current borrower while `status` is `borrowed`
    pub borrowed_by: Option<Uuid>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for adding equipment
#[derive(Debug, Clone)]
pub struct CreateItem {
    pub name: String,
    pub category: ItemCategory,
    pub description: Option<String>,
    pub serial_number: Option<String>,
}

/// Partial update of an item
///
/// `None` leaves a field unchanged. For the optional text fields, an empty
/// string clears the stored value.
#[derive(Debug, Clone, Default)]
pub struct UpdateItem {
    pub name: Option<String>,
    pub category: Option<ItemCategory>,
    pub description: Option<String>,
    pub serial_number: Option<String>,
    pub status: Option<ItemStatus>,
}

/// Counts shown on the dashboard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryStats {
    pub total: usize,
    pub available: usize,
    pub borrowed: usize,
    pub overdue: usize,
}

impl InventoryStats {
    /// Tallies item statuses; `overdue` is the number of overdue active loans
    pub fn from_items(items: &[Item], overdue: usize) -> Self {
        let count = |status: ItemStatus| items.iter().filter(|i| i.status == status).count();

        Self {
            total: items.len(),
            available: count(ItemStatus::Available),
            borrowed: count(ItemStatus::Borrowed),
            overdue,
        }
    }
}

/// Maps blank optional text to `None`
pub fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

const ITEM_COLUMNS: &str = "id, name, category, description, serial_number, status, borrowed_by, created_at, updated_at";

impl Item {
    /// Case-insensitive substring match on name or category
    ///
    /// An empty query matches everything.
    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }

        self.name.to_lowercase().contains(&query) || self.category.to_lowercase().contains(&query)
    }

    /// Lists all items ordered by name
    pub async fn list<'e, E>(executor: E) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Item>(&format!("SELECT {} FROM items ORDER BY name", ITEM_COLUMNS))
            .fetch_all(executor)
            .await
    }

    /// Finds an item by ID
    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Item>(&format!("SELECT {} FROM items WHERE id = $1", ITEM_COLUMNS))
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Finds an item and locks its row until the surrounding transaction ends
    pub async fn find_for_update<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Item>(&format!(
            "SELECT {} FROM items WHERE id = $1 FOR UPDATE",
            ITEM_COLUMNS
        ))
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Adds equipment with status `available`
    pub async fn create<'e, E>(executor: E, data: CreateItem) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Item>(&format!(
            r#"
            INSERT INTO items (name, category, description, serial_number)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            ITEM_COLUMNS
        ))
        .bind(data.name.trim())
        .bind(data.category.as_str())
        .bind(blank_to_none(data.description))
        .bind(blank_to_none(data.serial_number))
        .fetch_one(executor)
        .await
    }

    /// Applies a partial update
    ///
    /// Does not enforce status rules; callers check [`ItemStatus::is_assignable`]
    /// and the current status first.
    pub async fn update<'e, E>(executor: E, id: Uuid, data: UpdateItem) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Item>(&format!(
            r#"
            UPDATE items
            SET name = COALESCE($2, name),
                category = COALESCE($3, category),
                description = CASE WHEN $4::TEXT IS NULL THEN description ELSE NULLIF(TRIM($4), '') END,
                serial_number = CASE WHEN $5::TEXT IS NULL THEN serial_number ELSE NULLIF(TRIM($5), '') END,
                status = COALESCE($6, status),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            ITEM_COLUMNS
        ))
        .bind(id)
        .bind(data.name.as_deref().map(str::trim))
        .bind(data.category.map(|c| c.as_str()))
        .bind(data.description)
        .bind(data.serial_number)
        .bind(data.status)
        .fetch_optional(executor)
        .await
    }

    /// Marks an item borrowed by `profile_id`
    pub async fn mark_borrowed<'e, E>(executor: E, id: Uuid, profile_id: Uuid) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Item>(&format!(
            r#"
            UPDATE items
            SET status = 'borrowed', borrowed_by = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            ITEM_COLUMNS
        ))
        .bind(id)
        .bind(profile_id)
        .fetch_one(executor)
        .await
    }

    /// Marks an item available and clears its borrower
    pub async fn mark_available<'e, E>(executor: E, id: Uuid) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Item>(&format!(
            r#"
            UPDATE items
            SET status = 'available', borrowed_by = NULL, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            ITEM_COLUMNS
        ))
        .bind(id)
        .fetch_one(executor)
        .await
    }

    /// Deletes an item together with its loan history
    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
