//! Common test utilities for integration tests
//!
//! Requires `DATABASE_URL` and `JWT_SECRET`. Each [`TestContext`] creates its
//! own student, staff and admin accounts plus a unique tag used in item names,
//! so tests can run concurrently against one database and clean up after
//! themselves.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use gearloan_api::app::{build_router, AppState};
use gearloan_api::config::Config;
use gearloan_shared::auth::jwt::{issue_token_pair, session_lifetime};
use gearloan_shared::models::item::{CreateItem, Item, ItemCategory};
use gearloan_shared::models::profile::Profile;
use gearloan_shared::models::session::Session;
use gearloan_shared::models::user::{CreateUser, User};
use gearloan_shared::models::user_role::{Role, UserRole};
use serde_json::Value;
use sqlx::PgPool;
use tower::Service as _;
use uuid::Uuid;

/// A signed-in test account
pub struct TestUser {
    pub user: User,
    pub profile: Profile,
    pub session_id: Uuid,
    pub access_token: String,
    pub refresh_token: String,
}

impl TestUser {
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: PgPool,
    pub app: axum::Router,
    pub config: Config,
    pub tag: String,
    pub student: TestUser,
    pub staff: TestUser,
    pub admin: TestUser,
}

impl TestContext {
    pub async fn new() -> anyhow::Result<Self> {
        let config = Config::from_env()?;

        let db = PgPool::connect(&config.database.url).await?;
        gearloan_shared::db::migrations::run_migrations(&db).await?;

        let tag = Uuid::new_v4().simple().to_string()[..8].to_string();

        let student = create_user(&db, &config, &tag, Role::Student).await?;
        let staff = create_user(&db, &config, &tag, Role::Staff).await?;
        let admin = create_user(&db, &config, &tag, Role::Admin).await?;

        let state = AppState::new(db.clone(), config.clone());
        let app = build_router(state);

        Ok(TestContext {
            db,
            app,
            config,
            tag,
            student,
            staff,
            admin,
        })
    }

    /// Item name unique to this context
    pub fn item_name(&self, name: &str) -> String {
        format!("{} {}", name, self.tag)
    }

    /// Inserts an available item directly
    pub async fn create_item(&self, name: &str, category: ItemCategory) -> anyhow::Result<Item> {
        Ok(Item::create(
            &self.db,
            CreateItem {
                name: self.item_name(name),
                category,
                description: None,
                serial_number: None,
            },
        )
        .await?)
    }

    /// Sends a request and returns status plus JSON body (`Null` if empty)
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        user: Option<&TestUser>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(user) = user {
            builder = builder.header("authorization", user.auth_header());
        }

        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().call(request).await.unwrap();
        let status = response.status();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        (status, json)
    }

    /// Deletes this context's items and users (loans cascade)
    pub async fn cleanup(&self) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM items WHERE name LIKE '%' || $1")
            .bind(&self.tag)
            .execute(&self.db)
            .await?;

        for user in [&self.student, &self.staff, &self.admin] {
            User::delete(&self.db, user.user.id).await?;
        }

        Ok(())
    }
}

/// Creates a user with profile, role and an active session
pub async fn create_user(
    db: &PgPool,
    config: &Config,
    tag: &str,
    role: Role,
) -> anyhow::Result<TestUser> {
    let user = User::create(
        db,
        CreateUser {
            email: format!("{}-{}-{}@school.test", role.as_str(), tag, Uuid::new_v4()),
            password_hash: "not-used".to_string(),
        },
    )
    .await?;

    let profile = Profile::create(db, user.id, &format!("Test {} {}", role.as_str(), tag)).await?;
    UserRole::assign(db, user.id, role).await?;
    let session = Session::create(db, user.id, session_lifetime()).await?;

    let (access_token, refresh_token) = issue_token_pair(user.id, session.id, &config.jwt.secret)?;

    Ok(TestUser {
        user,
        profile,
        session_id: session.id,
        access_token,
        refresh_token,
    })
}
