use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::{info, instrument};

use super::{service::UserService, types::CreateUserRequest, types::UserResponse};
use crate::shared::{AppError, AppState};

/// HTTP handler for listing all users
///
/// GET /users
#[instrument(name = "list_users", skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let service = UserService::new(Arc::clone(&state.user_repository));
    let users = service.list_users().await?;

    Ok(Json(users))
}

/// HTTP handler for fetching one user
///
/// GET /users/:id
/// Returns 404 when the user does not exist
#[instrument(name = "get_user", skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<UserResponse>, AppError> {
    let service = UserService::new(Arc::clone(&state.user_repository));
    let user = service.get_user(id).await?;

    Ok(Json(user))
}

/// HTTP handler for creating a user without credentials
///
/// POST /user
#[instrument(name = "create_user", skip(state, request))]
pub async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    info!("Creating new user");

    let service = UserService::new(Arc::clone(&state.user_repository));
    let user = service.create_user(request).await?;

    info!(user_id = user.id, "User created successfully");

    Ok((StatusCode::CREATED, Json(user)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_utils::AppStateBuilder;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        Router,
    };
    use tower::ServiceExt; // for `oneshot`

    fn test_router() -> Router {
        Router::new()
            .route("/users", axum::routing::get(list_users))
            .route("/users/:id", axum::routing::get(get_user))
            .route("/user", axum::routing::post(create_user))
            .with_state(AppStateBuilder::new().build())
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_create_and_list_users() {
        let app = test_router();

        let request = Request::builder()
            .method("POST")
            .uri("/user")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"email": "new@x.com", "name": "New User"}"#))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let created = body_json(response).await;
        assert_eq!(created["email"], "new@x.com");
        assert_eq!(created["name"], "New User");

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/users")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let users = body_json(response).await;
        assert_eq!(users.as_array().unwrap().len(), 1);
        assert_eq!(users[0]["email"], "new@x.com");
    }

    #[tokio::test]
    async fn test_get_user_by_id() {
        let app = test_router();

        let request = Request::builder()
            .method("POST")
            .uri("/user")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"email": "a@x.com", "name": "A"}"#))
            .unwrap();
        let created = body_json(app.clone().oneshot(request).await.unwrap()).await;
        let id = created["id"].as_i64().unwrap();

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/users/{}", id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["id"], id);
    }

    #[tokio::test]
    async fn test_get_unknown_user_is_not_found() {
        let app = test_router();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/users/999")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_json(response).await;
        assert_eq!(body["error"], "User not found");
    }

    #[tokio::test]
    async fn test_create_user_missing_field_is_bad_request() {
        let app = test_router();

        let request = Request::builder()
            .method("POST")
            .uri("/user")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"email": "a@x.com"}"#))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
