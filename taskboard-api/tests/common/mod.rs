//! Common test utilities for integration tests
//!
//! - Database connection and migrations (`DATABASE_URL`)
//! - Router built exactly as in `main`, with its own realtime hub
//! - Helpers to register users and drive the API through `oneshot`

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use sqlx::PgPool;
use std::{net::SocketAddr, sync::Arc};
use taskboard_api::{
    app::{build_router, AppState},
    config::Config,
};
use taskboard_shared::realtime::RealtimeHub;
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "integration-test-secret-at-least-32-bytes";

pub struct TestContext {
    pub db: PgPool,
    pub hub: Arc<RealtimeHub>,
    pub app: Router,
    pub config: Config,
    users: std::sync::Mutex<Vec<i64>>,
    tenants: std::sync::Mutex<Vec<i64>>,
}

/// A user registered through the API
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: i64,
    pub email: String,
    pub token: String,
}

impl TestUser {
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

impl TestContext {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config::from_lookup(|key| match std::env::var(key) {
            Ok(value) => Some(value),
            Err(_) if key == "JWT_SECRET" => Some(TEST_JWT_SECRET.to_string()),
            Err(_) => None,
        })?;

        let db = PgPool::connect(&config.database.url).await?;

        // Path is relative to this crate's Cargo.toml
        sqlx::migrate!("../migrations").run(&db).await?;

        let hub = Arc::new(RealtimeHub::new(config.realtime.channel_capacity));
        let state = AppState::new(db.clone(), config.clone(), hub.clone());
        let app = build_router(state);

        Ok(TestContext {
            db,
            hub,
            app,
            config,
            users: Default::default(),
            tenants: Default::default(),
        })
    }

    /// Serves the router on an ephemeral local port
    pub async fn spawn_server(&self) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = self.app.clone();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        addr
    }

    /// Sends a request and returns the status and JSON body (`Null` if empty)
    pub async fn send(
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

        self.send_request(request).await
    }

    pub async fn send_request(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        (status, body)
    }

    pub async fn register(&self) -> TestUser {
        self.register_with_password("correct-horse-battery").await
    }

    pub async fn register_with_password(&self, password: &str) -> TestUser {
        let email = unique_email();
        let (status, body) = self
            .send(
                "POST",
                "/api/auth/register",
                None,
                Some(serde_json::json!({ "email": email, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");

        let user = TestUser {
            id: body["user"]["id"].as_i64().unwrap(),
            email: body["user"]["email"].as_str().unwrap().to_string(),
            token: body["token"].as_str().unwrap().to_string(),
        };
        self.users.lock().unwrap().push(user.id);
        user
    }

    pub async fn create_tenant(&self, owner: &TestUser) -> i64 {
        let (status, body) = self
            .send(
                "POST",
                "/api/tenants",
                Some(owner),
                Some(serde_json::json!({ "name": format!("Tenant {}", Uuid::new_v4()) })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create tenant failed: {body}");

        let id = body["id"].as_i64().unwrap();
        self.tenants.lock().unwrap().push(id);
        id
    }

    pub async fn create_project(&self, owner: &TestUser, tenant_id: i64) -> i64 {
        let (status, body) = self
            .send(
                "POST",
                &format!("/api/tenants/{tenant_id}/projects"),
                Some(owner),
                Some(serde_json::json!({ "name": "Board", "description": "Test board" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create project failed: {body}");

        body["id"].as_i64().unwrap()
    }

    pub async fn add_member(&self, admin: &TestUser, tenant_id: i64, member: &TestUser) {
        let (status, body) = self
            .send(
                "POST",
                &format!("/api/tenants/{tenant_id}/users"),
                Some(admin),
                Some(serde_json::json!({ "email": member.email })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "add member failed: {body}");
    }

    /// Deletes every tenant and user this context created
    pub async fn cleanup(&self) -> anyhow::Result<()> {
        let tenants = std::mem::take(&mut *self.tenants.lock().unwrap());
        let users = std::mem::take(&mut *self.users.lock().unwrap());

        sqlx::query("DELETE FROM tenants WHERE id = ANY($1)")
            .bind(&tenants)
            .execute(&self.db)
            .await?;
        sqlx::query("DELETE FROM users WHERE id = ANY($1)")
            .bind(&users)
            .execute(&self.db)
            .await?;

        Ok(())
    }
}

pub fn unique_email() -> String {
    format!("user-{}@example.com", Uuid::new_v4())
}
