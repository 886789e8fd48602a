/// Dashboard endpoint
///
/// ```text
/// GET /v1/dashboard
/// ```
///
/// Combines the inventory, recent loans, active loans (staff only) and the
/// headline counts into one response. Recent loans and the overdue count are
/// limited to the caller's own loans for students.

use crate::{app::AppState, error::ApiResult, routes::loans::borrower_scope};
use axum::{extract::State, Extension, Json};
use gearloan_shared::{
    auth::middleware::AuthContext,
    models::{
        item::{InventoryStats, Item},
        loan::{ActiveLoan, Loan, LoanDetails, RECENT_LOANS_LIMIT},
        user_role::Role,
    },
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct DashboardResponse {
    pub role: Role,
    pub stats: InventoryStats,
    pub items: Vec<Item>,
    pub recent_loans: Vec<LoanDetails>,

    /// Empty for students
    pub active_loans: Vec<ActiveLoan>,
}

pub async fn dashboard(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<DashboardResponse>> {
    let borrower = borrower_scope(&state.db, &auth).await?;

    let (items, recent_loans) = tokio::try_join!(
        Item::list(&state.db),
        Loan::recent(&state.db, borrower, RECENT_LOANS_LIMIT),
    )?;

    // Same scope as recent_loans, so a student's count matches their list
    let overdue = Loan::count_overdue(&state.db, borrower).await?;
    let stats = InventoryStats::from_items(&items, overdue as usize);

    let active_loans = if auth.role.is_staff() {
        Loan::active(&state.db).await?
    } else {
        Vec::new()
    };

    Ok(Json(DashboardResponse {
        role: auth.role,
        stats,
        items,
        recent_loans,
        active_loans,
    }))
}
