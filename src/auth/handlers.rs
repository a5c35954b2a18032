use axum::{extract::State, http::StatusCode, Extension, Json};
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    service::AuthService,
    types::{AuthClaims, LoginRequest, RegisterRequest, TokenResponse},
};
use crate::shared::{AppError, AppState};
use crate::user::types::UserResponse;

/// HTTP handler for registering a new user
///
/// POST /auth/register
/// Returns the created user with the password hashed and never echoed
#[instrument(name = "register", skip(state, request))]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    info!("Handling registration request");

    let service = AuthService::new(
        Arc::clone(&state.user_repository),
        state.token_config.clone(),
    );
    let user = service.register(request).await?;

    info!(user_id = user.id, "Registration completed");

    Ok((StatusCode::CREATED, Json(user)))
}

/// HTTP handler for logging a user in
///
/// POST /auth/login
/// Returns a signed token on success
#[instrument(name = "login", skip(state, request))]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    info!("Handling login request");

    let service = AuthService::new(
        Arc::clone(&state.user_repository),
        state.token_config.clone(),
    );
    let response = service.login(request).await?;

    Ok(Json(response))
}

/// HTTP handler returning the authenticated user
///
/// GET /auth/me (requires a Bearer token)
#[instrument(name = "me", skip(state, claims))]
pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<AuthClaims>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state
        .user_repository
        .get_user(claims.sub)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(UserResponse::from(user)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::middleware::jwt_auth;
    use crate::shared::test_utils::AppStateBuilder;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        middleware, Router,
    };
    use tower::ServiceExt; // for `oneshot`

    fn test_router(app_state: AppState) -> Router {
        Router::new()
            .route(
                "/auth/me",
                axum::routing::get(me).layer(middleware::from_fn_with_state(
                    app_state.clone(),
                    jwt_auth,
                )),
            )
            .route("/auth/register", axum::routing::post(register))
            .route("/auth/login", axum::routing::post(login))
            .with_state(app_state)
    }

    fn json_request(method: &str, uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_register_handler_creates_user() {
        let app = test_router(AppStateBuilder::new().build());

        let body = r#"{"email": "a@x.com", "password": "pw", "name": "A", "role": "user"}"#;
        let response = app
            .oneshot(json_request("POST", "/auth/register", body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let user = body_json(response).await;
        assert_eq!(user["email"], "a@x.com");
        assert_eq!(user["name"], "A");
        assert_eq!(user["role"], "user");
        assert!(user["id"].as_i64().unwrap() > 0);
        // The hash never leaves the server
        assert!(user.get("password_hash").is_none());
        assert!(user.get("password").is_none());
    }

    #[tokio::test]
    async fn test_register_handler_missing_field_is_bad_request() {
        let app = test_router(AppStateBuilder::new().build());

        let body = r#"{"email": "a@x.com", "password": "pw", "name": "A"}"#;
        let response = app
            .oneshot(json_request("POST", "/auth/register", body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let error = body_json(response).await;
        assert_eq!(error["error"], "Email, password, name, and role are required");
    }

    #[tokio::test]
    async fn test_login_handler_returns_token() {
        let app = test_router(AppStateBuilder::new().build());

        let register_body = r#"{"email": "a@x.com", "password": "pw", "name": "A", "role": "user"}"#;
        app.clone()
            .oneshot(json_request("POST", "/auth/register", register_body))
            .await
            .unwrap();

        let login_body = r#"{"email": "a@x.com", "password": "pw"}"#;
        let response = app
            .oneshot(json_request("POST", "/auth/login", login_body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let token = body["token"].as_str().unwrap();
        assert!(token.contains('.')); // JWT has dots
    }

    #[tokio::test]
    async fn test_login_handler_wrong_password_is_unauthorized() {
        let app = test_router(AppStateBuilder::new().build());

        let register_body = r#"{"email": "a@x.com", "password": "pw", "name": "A", "role": "user"}"#;
        app.clone()
            .oneshot(json_request("POST", "/auth/register", register_body))
            .await
            .unwrap();

        let login_body = r#"{"email": "a@x.com", "password": "nope"}"#;
        let response = app
            .oneshot(json_request("POST", "/auth/login", login_body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_me_handler_roundtrip() {
        let app = test_router(AppStateBuilder::new().build());

        let register_body = r#"{"email": "a@x.com", "password": "pw", "name": "A", "role": "user"}"#;
        app.clone()
            .oneshot(json_request("POST", "/auth/register", register_body))
            .await
            .unwrap();

        let login_body = r#"{"email": "a@x.com", "password": "pw"}"#;
        let login_response = app
            .clone()
            .oneshot(json_request("POST", "/auth/login", login_body))
            .await
            .unwrap();
        let token = body_json(login_response).await["token"]
            .as_str()
            .unwrap()
            .to_string();

        let request = Request::builder()
            .method("GET")
            .uri("/auth/me")
            .header("Authorization", format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let user = body_json(response).await;
        assert_eq!(user["email"], "a@x.com");
    }

    #[tokio::test]
    async fn test_me_handler_without_token_is_unauthorized() {
        let app = test_router(AppStateBuilder::new().build());

        let request = Request::builder()
            .method("GET")
            .uri("/auth/me")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_me_handler_garbage_token_is_unauthorized() {
        let app = test_router(AppStateBuilder::new().build());

        let request = Request::builder()
            .method("GET")
            .uri("/auth/me")
            .header("Authorization", "Bearer not.a.token")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
