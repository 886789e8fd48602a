/// Authentication endpoints
///
/// ```text
/// POST /v1/auth/register   public
/// POST /v1/auth/login      public
/// POST /v1/auth/refresh    public (refresh token in body)
/// POST /v1/auth/logout     bearer
/// GET  /v1/auth/session    bearer
/// GET  /v1/auth/events     bearer, text/event-stream
/// ```
///
/// Register and login open a server-side session and return an access and
/// refresh token bound to it. Logout revokes the session, which invalidates
/// both tokens.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::State,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Extension, Json,
};
use futures::{Stream, StreamExt};
use gearloan_shared::{
    auth::{
        events::{AuthEvent, AuthEventKind},
        jwt::{self, TokenType},
        middleware::AuthContext,
        password,
    },
    models::{
        profile::Profile,
        session::Session,
        user::{CreateUser, User},
        user_role::{Role, UserRole},
    },
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,

    #[validate(length(min = 1, max = 255, message = "Full name is required"))]
    pub full_name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Tokens issued on register and login
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user_id: Uuid,
    pub session_id: Uuid,
    pub role: Role,
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,

    /// Access token lifetime in seconds
    pub expires_in: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Current session with user, profile and role
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub user_id: Uuid,
    pub email: String,
    pub session_id: Uuid,
    pub role: Role,
    pub profile: Profile,
}

fn auth_response(state: &AppState, user_id: Uuid, session_id: Uuid, role: Role) -> ApiResult<AuthResponse> {
    let (access_token, refresh_token) = jwt::issue_token_pair(user_id, session_id, state.jwt_secret())?;

    Ok(AuthResponse {
        user_id,
        session_id,
        role,
        access_token,
        refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: TokenType::Access.default_expiration().num_seconds(),
    })
}

/// Signs up a new user
///
/// Creates the user, profile, role and session in one transaction. The role
/// is `student` unless the email is the configured bootstrap admin.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    req.validate()?;

    password::validate_password_strength(&req.password)
        .map_err(|msg| ApiError::invalid_field("password", msg))?;

    let full_name = req.full_name.trim();
    if full_name.is_empty() {
        return Err(ApiError::invalid_field("full_name", "Full name is required"));
    }

    let email = req.email.trim().to_string();
    let role = if state.config.lending.is_bootstrap_admin(&email) {
        Role::Admin
    } else {
        Role::Student
    };

    let password_hash = password::hash_password(&req.password)?;

    let mut tx = state.db.begin().await?;

    let user = User::create(
        &mut *tx,
        CreateUser {
            email,
            password_hash,
        },
    )
    .await?;
    Profile::create(&mut *tx, user.id, full_name).await?;
    UserRole::assign(&mut *tx, user.id, role).await?;
    let session = Session::create(&mut *tx, user.id, jwt::session_lifetime()).await?;

    tx.commit().await?;

    tracing::info!(user_id = %user.id, role = role.as_str(), "User registered");

    let response = auth_response(&state, user.id, session.id, role)?;
    state
        .events
        .publish(AuthEvent::new(AuthEventKind::SignedIn, user.id, session.id));

    Ok((StatusCode::CREATED, Json(response)))
}

/// Signs in with email and password
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    req.validate()?;

    let invalid = || ApiError::Unauthorized("Invalid email or password".to_string());

    let Some(user) = User::find_by_email(&state.db, req.email.trim()).await? else {
        password::verify_dummy_password(&req.password);
        tracing::info!("Login failed: unknown email");
        return Err(invalid());
    };

    if !password::verify_password(&req.password, &user.password_hash)? {
        tracing::info!(user_id = %user.id, "Login failed: wrong password");
        return Err(invalid());
    }

    let role = UserRole::find_role(&state.db, user.id)
        .await?
        .ok_or_else(|| ApiError::InternalError(format!("User {} has no role", user.id)))?;

    let session = Session::create(&state.db, user.id, jwt::session_lifetime()).await?;
    User::update_last_login(&state.db, user.id).await?;

    tracing::info!(user_id = %user.id, session_id = %session.id, "User signed in");

    let response = auth_response(&state, user.id, session.id, role)?;
    state
        .events
        .publish(AuthEvent::new(AuthEventKind::SignedIn, user.id, session.id));

    Ok(Json(response))
}

/// Exchanges a refresh token for a new access token
///
/// The refresh token's session must still be active.
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let claims = jwt::validate_refresh_token(&req.refresh_token, state.jwt_secret())?;

    Session::find_active(&state.db, claims.sid)
        .await?
        .filter(|s| s.user_id == claims.sub)
        .ok_or_else(|| ApiError::Unauthorized("Session is no longer active".to_string()))?;

    let access = jwt::Claims::new(claims.sub, claims.sid, TokenType::Access);
    let access_token = jwt::create_token(&access, state.jwt_secret())?;

    state.events.publish(AuthEvent::new(
        AuthEventKind::TokenRefreshed,
        claims.sub,
        claims.sid,
    ));

    Ok(Json(RefreshResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: TokenType::Access.default_expiration().num_seconds(),
    }))
}

/// Signs out by revoking the current session
pub async fn logout(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<StatusCode> {
    sign_out(&state, &auth).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn sign_out(state: &AppState, auth: &AuthContext) -> ApiResult<()> {
    if Session::revoke(&state.db, auth.session_id).await? {
        tracing::info!(user_id = %auth.user_id, session_id = %auth.session_id, "User signed out");
        state.events.publish(AuthEvent::new(
            AuthEventKind::SignedOut,
            auth.user_id,
            auth.session_id,
        ));
    }
    Ok(())
}

/// Returns the current user, profile and role
///
/// A session whose user has no profile is signed out.
pub async fn session(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<SessionResponse>> {
    let user = User::find_by_id(&state.db, auth.user_id).await?;
    let profile = Profile::find_by_user_id(&state.db, auth.user_id).await?;

    let (user, profile) = match (user, profile) {
        (Some(user), Some(profile)) => (user, profile),
        _ => {
            tracing::warn!(user_id = %auth.user_id, "Profile missing, signing out");
            sign_out(&state, &auth).await?;
            return Err(ApiError::Unauthorized("Profile not found".to_string()));
        }
    };

    Ok(Json(SessionResponse {
        user_id: user.id,
        email: user.email,
        session_id: auth.session_id,
        role: auth.role,
        profile,
    }))
}

/// Streams the caller's auth-state changes as server-sent events
///
/// Event names are `signed_in`, `signed_out` and `token_refreshed`; the data
/// is the JSON-encoded event.
pub async fn events(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    tracing::debug!(user_id = %auth.user_id, "Auth event stream opened");

    let stream = state
        .events
        .stream_for_user(auth.user_id)
        .map(|event| Event::default().event(event.kind.as_str()).json_data(&event));

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_validation() {
        let valid = RegisterRequest {
            email: "student@school.edu".to_string(),
            password: "Borrow2day".to_string(),
            full_name: "Ada Student".to_string(),
        };
        assert!(valid.validate().is_ok());

        let bad_email = RegisterRequest {
            email: "not-an-email".to_string(),
            ..valid
        };
        assert!(bad_email.validate().is_err());
    }

    #[test]
    fn test_login_request_requires_password() {
        let req = LoginRequest {
            email: "student@school.edu".to_string(),
            password: String::new(),
        };
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password"));
    }
}
