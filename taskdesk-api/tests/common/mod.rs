/// Common test utilities for integration tests
///
/// Builds the full router over an in-process [`MemoryStore`] and offers
/// request helpers that return the status and the decoded envelope.

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use serde_json::{json, Value};
use taskdesk_api::app::{build_router, AppState};
use taskdesk_api::config::{ApiConfig, Config, Environment};
use taskdesk_shared::auth::jwt::JwtConfig;
use taskdesk_shared::db::memory::MemoryStore;
use taskdesk_shared::db::pool::DatabaseConfig;
use tower::Service as _;

pub const TEST_SECRET: &str = "integration-test-secret-key-32-bytes!!";

/// Test context containing all necessary resources
pub struct TestContext {
    pub store: MemoryStore,
    pub app: axum::Router,
    pub config: Config,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_environment(Environment::Development)
    }

    pub fn with_environment(environment: Environment) -> Self {
        let config = Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                environment,
            },
            database: DatabaseConfig::default(),
            jwt: JwtConfig::new(TEST_SECRET),
        };

        let store = MemoryStore::new();
        let app = build_router(AppState::new(store.clone(), config.clone()));

        Self { store, app, config }
    }

    /// Sends one request and returns status plus parsed body
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let (status, _, body) = self.send_with_headers(method, uri, token, body).await;
        (status, body)
    }

    /// Like [`send`](Self::send), also returning the response headers
    pub async fn send_with_headers(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, HeaderMap, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
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
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, headers, body)
    }

    pub async fn register(&self, username: &str, email: &str, password: &str) -> (StatusCode, Value) {
        self.send(
            "POST",
            "/api/users/register",
            None,
            Some(json!({
                "username": username,
                "email": email,
                "password": password,
                "confirmPassword": password,
            })),
        )
        .await
    }

    pub async fn login(&self, login: &str, password: &str) -> (StatusCode, Value) {
        self.send(
            "POST",
            "/api/users/login",
            None,
            Some(json!({ "login": login, "password": password })),
        )
        .await
    }

    /// Registers a user and returns a bearer token for them
    pub async fn signed_in(&self, username: &str, email: &str) -> String {
        let (status, _) = self.register(username, email, "secret1").await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = self.login(username, "secret1").await;
        assert_eq!(status, StatusCode::OK);
        body["data"]["token"].as_str().unwrap().to_string()
    }

    /// Creates a task and returns its id
    pub async fn create_task(&self, token: &str, body: Value) -> String {
        let (status, body) = self.send("POST", "/api/tasks", Some(token), Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "unexpected body: {}", body);
        body["data"]["id"].as_str().unwrap().to_string()
    }
}
