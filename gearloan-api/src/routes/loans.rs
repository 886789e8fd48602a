/// Borrow, return and loan listing endpoints
///
/// ```text
/// POST /v1/items/:id/borrow   student
/// POST /v1/items/:id/return   staff
/// GET  /v1/loans/recent       any signed-in user (students see their own)
/// GET  /v1/loans/active       staff
/// ```

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use gearloan_shared::{
    auth::{
        authorization::{require_borrower, require_staff},
        middleware::AuthContext,
    },
    models::{
        item::Item,
        loan::{ActiveLoan, Loan, LoanDetails, RECENT_LOANS_LIMIT},
        profile::Profile,
    },
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct BorrowResponse {
    pub loan: Loan,
    pub item: Item,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReturnResponse {
    pub item: Item,
    pub returned_loans: Vec<Loan>,
}

/// Profile of the caller, required to borrow
async fn caller_profile(pool: &PgPool, auth: &AuthContext) -> ApiResult<Profile> {
    Profile::find_by_user_id(pool, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Profile not found".to_string()))
}

/// Borrower filter for loan views: students see only their own loans
pub(crate) async fn borrower_scope(pool: &PgPool, auth: &AuthContext) -> ApiResult<Option<Uuid>> {
    if auth.role.is_staff() {
        return Ok(None);
    }

    Ok(Some(caller_profile(pool, auth).await?.id))
}

/// Borrows an item for the caller
///
/// Fails with 409 if the item is not available or already has an active loan.
pub async fn borrow_item(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(item_id): Path<Uuid>,
) -> ApiResult<(StatusCode, Json<BorrowResponse>)> {
    require_borrower(&auth)?;

    let profile = caller_profile(&state.db, &auth).await?;
    let borrowed = state.lending.borrow(item_id, profile.id).await?;

    Ok((
        StatusCode::CREATED,
        Json(BorrowResponse {
            loan: borrowed.loan,
            item: borrowed.item,
        }),
    ))
}

/// Marks an item returned
pub async fn return_item(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(item_id): Path<Uuid>,
) -> ApiResult<Json<ReturnResponse>> {
    require_staff(&auth)?;

    let returned = state.lending.return_item(item_id).await?;

    tracing::debug!(item_id = %item_id, returned_by = %auth.user_id, "Return recorded");

    Ok(Json(ReturnResponse {
        item: returned.item,
        returned_loans: returned.returned_loans,
    }))
}

/// Five most recent loans
pub async fn recent_loans(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<LoanDetails>>> {
    let borrower = borrower_scope(&state.db, &auth).await?;
    Ok(Json(Loan::recent(&state.db, borrower, RECENT_LOANS_LIMIT).await?))
}

/// All active loans with borrower names
pub async fn active_loans(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<ActiveLoan>>> {
    require_staff(&auth)?;
    Ok(Json(Loan::active(&state.db).await?))
}
