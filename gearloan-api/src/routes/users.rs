/// Role assignment
///
/// ```text
/// PUT /v1/users/:id/role   admin
/// ```
///
/// Request body: `{"role": "staff"}`

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use gearloan_shared::{
    auth::{authorization::require_admin, middleware::AuthContext},
    models::{
        user::User,
        user_role::{Role, UserRole},
    },
};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct AssignRoleRequest {
    pub role: Role,
}

pub async fn assign_role(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<AssignRoleRequest>,
) -> ApiResult<Json<UserRole>> {
    require_admin(&auth)?;

    if user_id == auth.user_id && req.role != Role::Admin {
        return Err(ApiError::BadRequest(
            "Admins cannot remove their own admin role".to_string(),
        ));
    }

    User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let assignment = UserRole::assign(&state.db, user_id, req.role).await?;

    tracing::info!(
        user_id = %user_id,
        role = req.role.as_str(),
        assigned_by = %auth.user_id,
        "Role assigned"
    );

    Ok(Json(assignment))
}
