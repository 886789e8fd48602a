/// Application state and router builder
///
/// # Route Layout
///
/// ```text
/// /health                      public
/// /v1/auth/{register,login,refresh}   public
/// /v1/auth/{logout,session,events}    bearer
/// /v1/items[/:id[/borrow|/return]]    bearer (+ role checks in handlers)
/// /v1/loans/{recent,active}           bearer
/// /v1/dashboard                       bearer
/// /v1/users/:id/role                  bearer (admin)
/// ```
///
/// # Middleware Stack (outermost first)
///
/// 1. Security headers
/// 2. CORS
/// 3. Request tracing
/// 4. Bearer authentication (protected routes only)

use crate::{config::Config, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post, put},
    Router,
};
use gearloan_shared::{
    auth::{events::AuthEventBus, middleware::authenticate},
    lending::LendingService,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,

    /// Auth-state change bus
    pub events: AuthEventBus,

    pub lending: LendingService,
}

impl AppState {
    pub fn new(db: PgPool, config: Config) -> Self {
        let lending = LendingService::new(db.clone(), config.lending.loan_duration());

        Self {
            db,
            config: Arc::new(config),
            events: AuthEventBus::default(),
            lending,
        }
    }

    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete router
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let auth_layer = axum::middleware::from_fn_with_state(state.clone(), jwt_auth_layer);

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let public_auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh));

    let session_routes = Router::new()
        .route("/logout", post(routes::auth::logout))
        .route("/session", get(routes::auth::session))
        .route("/events", get(routes::auth::events))
        .layer(auth_layer.clone());

    let item_routes = Router::new()
        .route(
            "/",
            get(routes::items::list_items).post(routes::items::create_item),
        )
        .route(
            "/:id",
            get(routes::items::get_item)
                .patch(routes::items::update_item)
                .delete(routes::items::delete_item),
        )
        .route("/:id/borrow", post(routes::loans::borrow_item))
        .route("/:id/return", post(routes::loans::return_item))
        .layer(auth_layer.clone());

    let loan_routes = Router::new()
        .route("/recent", get(routes::loans::recent_loans))
        .route("/active", get(routes::loans::active_loans))
        .layer(auth_layer.clone());

    let dashboard_routes = Router::new()
        .route("/", get(routes::dashboard::dashboard))
        .layer(auth_layer.clone());

    let user_routes = Router::new()
        .route("/:id/role", put(routes::users::assign_role))
        .layer(auth_layer);

    let v1_routes = Router::new()
        .nest("/auth", public_auth_routes.merge(session_routes))
        .nest("/items", item_routes)
        .nest("/loans", loan_routes)
        .nest("/dashboard", dashboard_routes)
        .nest("/users", user_routes);

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config))
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.api.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

/// Authenticates the bearer token and inserts the
/// [`AuthContext`](gearloan_shared::auth::middleware::AuthContext)
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, crate::error::ApiError> {
    let auth = authenticate(&state.db, state.jwt_secret(), req.headers()).await?;

    tracing::debug!(
        user_id = %auth.user_id,
        role = auth.role.as_str(),
        "Request authenticated"
    );

    req.extensions_mut().insert(auth);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiConfig, DatabaseConfig, JwtConfig, LendingConfig, LogFormat};

    fn config(origins: &[&str]) -> Config {
        Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                production: false,
                cors_origins: origins.iter().map(|s| s.to_string()).collect(),
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/gearloan".to_string(),
                max_connections: 1,
            },
            jwt: JwtConfig {
                secret: "test-secret-key-at-least-32-bytes-long".to_string(),
            },
            lending: LendingConfig {
                loan_duration_hours: 8,
                bootstrap_admin_email: None,
            },
            log_format: LogFormat::Pretty,
        }
    }

    #[test]
    fn test_cors_layer_builds_for_wildcard_and_list() {
        let _ = cors_layer(&config(&["*"]));
        let _ = cors_layer(&config(&["https://lab.example", "not a header\n"]));
    }
}
