use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt; // for `oneshot`

use quill::{
    auth::token::TokenConfig,
    comment::repository::InMemoryCommentRepository,
    post::repository::InMemoryPostRepository,
    routes::api_router,
    shared::AppState,
    user::repository::InMemoryUserRepository,
};

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

/// The real router wired to in-memory repositories and a test signing
/// secret.
pub struct TestSetup {
    pub app: Router,
}

pub struct TestSetupBuilder {
    secret: String,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            secret: "test-secret".to_string(),
        }
    }

    #[allow(dead_code)]
    pub fn with_secret(mut self, secret: &str) -> Self {
        self.secret = secret.to_string();
        self
    }

    pub fn build(self) -> TestSetup {
        let state = AppState::new(
            Arc::new(InMemoryUserRepository::new()),
            Arc::new(InMemoryPostRepository::new()),
            Arc::new(InMemoryCommentRepository::new()),
            TokenConfig::new(self.secret),
        );

        TestSetup {
            app: api_router(state),
        }
    }
}

impl Default for TestSetupBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Request Helpers
// ============================================================================

impl TestSetup {
    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(
            Request::builder().uri(uri).body(Body::empty()).unwrap(),
        )
        .await
    }

    pub async fn get_with_token(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .uri(uri)
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn put_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .method("PUT")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn put(&self, uri: &str) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .method("PUT")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .method("DELETE")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, body)
    }

    // ========================================================================
    // Convenience Action Methods
    // ========================================================================

    /// Registers a user and returns its id
    pub async fn register_user(&self, email: &str, password: &str, name: &str, role: &str) -> i64 {
        let (status, body) = self
            .post_json(
                "/auth/register",
                serde_json::json!({
                    "email": email,
                    "password": password,
                    "name": name,
                    "role": role,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "registration failed: {body}");
        body["id"].as_i64().unwrap()
    }

    /// Logs in and returns the issued token
    pub async fn login(&self, email: &str, password: &str) -> String {
        let (status, body) = self
            .post_json(
                "/auth/login",
                serde_json::json!({ "email": email, "password": password }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["token"].as_str().unwrap().to_string()
    }

    /// Creates a post for the given author email and returns its id
    pub async fn create_post(&self, title: &str, content: &str, author_email: &str) -> i64 {
        let (status, body) = self
            .post_json(
                "/post",
                serde_json::json!({
                    "title": title,
                    "content": content,
                    "authorEmail": author_email,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "post creation failed: {body}");
        body["id"].as_i64().unwrap()
    }
}
