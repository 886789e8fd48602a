/// Equipment inventory endpoints
///
/// ```text
/// GET    /v1/items?q=         any signed-in user
/// GET    /v1/items/:id        any signed-in user
/// POST   /v1/items            staff
/// PATCH  /v1/items/:id        staff
/// DELETE /v1/items/:id        staff
/// ```

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use gearloan_shared::{
    auth::{authorization::require_staff, middleware::AuthContext},
    models::item::{CreateItem, Item, ItemCategory, ItemStatus, UpdateItem},
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Default, Deserialize)]
pub struct ListItemsQuery {
    /// Case-insensitive search on name or category
    pub q: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateItemRequest {
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,

    /// One of the [`ItemCategory`] names
    pub category: String,

    pub description: Option<String>,

    #[validate(length(max = 255, message = "Serial number must be at most 255 characters"))]
    pub serial_number: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateItemRequest {
    #[validate(length(min = 1, max = 255, message = "Name cannot be empty"))]
    pub name: Option<String>,

    pub category: Option<String>,

    pub description: Option<String>,

    #[validate(length(max = 255, message = "Serial number must be at most 255 characters"))]
    pub serial_number: Option<String>,

    /// `available` or `maintenance`
    pub status: Option<String>,
}

fn not_found() -> ApiError {
    ApiError::NotFound("Item not found".to_string())
}

fn parse_category(value: &str) -> ApiResult<ItemCategory> {
    ItemCategory::parse(value.trim()).ok_or_else(|| {
        let names: Vec<&str> = ItemCategory::ALL.iter().map(|c| c.as_str()).collect();
        ApiError::invalid_field(
            "category",
            format!("Category must be one of: {}", names.join(", ")),
        )
    })
}

/// Parses a status staff may set directly
fn parse_assignable_status(value: &str) -> ApiResult<ItemStatus> {
    ItemStatus::parse(value.trim())
        .filter(ItemStatus::is_assignable)
        .ok_or_else(|| {
            ApiError::invalid_field(
                "status",
                "Status can only be set to available or maintenance",
            )
        })
}

pub async fn list_items(
    State(state): State<AppState>,
    Query(query): Query<ListItemsQuery>,
) -> ApiResult<Json<Vec<Item>>> {
    let items = Item::list(&state.db).await?;

    let items = match query.q.as_deref() {
        Some(q) => items.into_iter().filter(|i| i.matches_query(q)).collect(),
        None => items,
    };

    Ok(Json(items))
}

pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Item>> {
    let item = Item::find_by_id(&state.db, id).await?.ok_or_else(not_found)?;
    Ok(Json(item))
}

pub async fn create_item(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateItemRequest>,
) -> ApiResult<(StatusCode, Json<Item>)> {
    require_staff(&auth)?;
    req.validate()?;

    if req.name.trim().is_empty() {
        return Err(ApiError::invalid_field("name", "Name is required"));
    }

    let category = parse_category(&req.category)?;

    let item = Item::create(
        &state.db,
        CreateItem {
            name: req.name,
            category,
            description: req.description,
            serial_number: req.serial_number,
        },
    )
    .await?;

    tracing::info!(item_id = %item.id, name = %item.name, created_by = %auth.user_id, "Item created");

    Ok((StatusCode::CREATED, Json(item)))
}

/// Updates item details
///
/// Status may only be set to `available` or `maintenance`, and not at all
/// while the item is borrowed.
pub async fn update_item(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateItemRequest>,
) -> ApiResult<Json<Item>> {
    require_staff(&auth)?;
    req.validate()?;

    if req.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(ApiError::invalid_field("name", "Name cannot be empty"));
    }

    let category = req.category.as_deref().map(parse_category).transpose()?;
    let status = req.status.as_deref().map(parse_assignable_status).transpose()?;

    let mut tx = state.db.begin().await?;

    let current = Item::find_for_update(&mut *tx, id).await?.ok_or_else(not_found)?;

    if status.is_some_and(|s| s != current.status) && current.status == ItemStatus::Borrowed {
        return Err(ApiError::Conflict(
            "Item is borrowed; mark it returned first".to_string(),
        ));
    }

    let item = Item::update(
        &mut *tx,
        id,
        UpdateItem {
            name: req.name,
            category,
            description: req.description,
            serial_number: req.serial_number,
            status,
        },
    )
    .await?
    .ok_or_else(not_found)?;

    tx.commit().await?;

    tracing::info!(item_id = %id, status = item.status.as_str(), updated_by = %auth.user_id, "Item updated");

    Ok(Json(item))
}

/// Deletes an item and its loan history
pub async fn delete_item(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    require_staff(&auth)?;

    if !Item::delete(&state.db, id).await? {
        return Err(not_found());
    }

    tracing::info!(item_id = %id, deleted_by = %auth.user_id, "Item deleted");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_of(err: ApiError) -> String {
        match err {
            ApiError::ValidationError(details) => details[0].field.clone(),
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_category() {
        assert_eq!(parse_category("Tools").unwrap(), ItemCategory::Tools);
        assert_eq!(parse_category(" Laboratory ").unwrap(), ItemCategory::Laboratory);
        assert_eq!(field_of(parse_category("Furniture").unwrap_err()), "category");
    }

    #[test]
    fn test_parse_assignable_status() {
        assert_eq!(parse_assignable_status("maintenance").unwrap(), ItemStatus::Maintenance);
        assert_eq!(parse_assignable_status("available").unwrap(), ItemStatus::Available);
        assert_eq!(field_of(parse_assignable_status("borrowed").unwrap_err()), "status");
        assert_eq!(field_of(parse_assignable_status("lost").unwrap_err()), "status");
    }

    #[test]
    fn test_create_request_requires_name() {
        let req = CreateItemRequest {
            name: String::new(),
            category: "Other".to_string(),
            description: None,
            serial_number: None,
        };
        assert!(req.validate().is_err());
    }
}
