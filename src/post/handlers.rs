use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    service::PostService,
    types::{CreatePostRequest, PostResponse, PostWithAuthor, SearchParams, UpdatePostRequest},
};
use crate::shared::{AppError, AppState};

fn service(state: &AppState) -> PostService {
    PostService::new(
        Arc::clone(&state.post_repository),
        Arc::clone(&state.user_repository),
        Arc::clone(&state.comment_repository),
    )
}

/// HTTP handler for the public feed
///
/// GET /posts
/// Returns published posts with their authors
#[instrument(name = "list_published_posts", skip(state))]
pub async fn list_published_posts(
    State(state): State<AppState>,
) -> Result<Json<Vec<PostWithAuthor>>, AppError> {
    let posts = service(&state).list_published().await?;

    Ok(Json(posts))
}

/// HTTP handler for the admin listing
///
/// GET /posts/admin
/// Returns all posts with their authors, drafts included
#[instrument(name = "list_all_posts", skip(state))]
pub async fn list_all_posts(
    State(state): State<AppState>,
) -> Result<Json<Vec<PostWithAuthor>>, AppError> {
    let posts = service(&state).list_all().await?;

    Ok(Json(posts))
}

/// HTTP handler for fetching one post
///
/// GET /post/:id
/// Returns 404 when the post does not exist
#[instrument(name = "get_post", skip(state))]
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PostResponse>, AppError> {
    let post = service(&state).get_post(id).await?;

    Ok(Json(post))
}

/// HTTP handler for searching posts by title or content
///
/// GET /posts/search?query=...
/// Returns 400 when the query parameter is missing
#[instrument(name = "search_posts", skip(state, params))]
pub async fn search_posts(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<PostResponse>>, AppError> {
    let posts = service(&state).search(params.query).await?;

    Ok(Json(posts))
}

/// HTTP handler for creating a post
///
/// POST /post
/// The author is resolved from authorEmail; the post starts unpublished
#[instrument(name = "create_post", skip(state, request))]
pub async fn create_post(
    State(state): State<AppState>,
    Json(request): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<PostResponse>), AppError> {
    info!("Creating new post");

    let post = service(&state).create_post(request).await?;

    info!(post_id = post.id, "Post created successfully");

    Ok((StatusCode::CREATED, Json(post)))
}

/// HTTP handler for publishing a post
///
/// PUT /post/publish/:id
/// Idempotent: publishing twice leaves the post published
#[instrument(name = "publish_post", skip(state))]
pub async fn publish_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PostResponse>, AppError> {
    let post = service(&state).publish_post(id).await?;

    Ok(Json(post))
}

/// HTTP handler for replacing a post's fields
///
/// PUT /post/:id
#[instrument(name = "update_post", skip(state, request))]
pub async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdatePostRequest>,
) -> Result<Json<PostResponse>, AppError> {
    let post = service(&state).update_post(id, request).await?;

    Ok(Json(post))
}

/// HTTP handler for deleting a post and its comments
///
/// DELETE /post/:id
/// Returns the deleted post; 404 when it does not exist
#[instrument(name = "delete_post", skip(state))]
pub async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PostResponse>, AppError> {
    info!(post_id = id, "Deleting post");

    let post = service(&state).delete_post(id).await?;

    info!(post_id = id, "Post deleted successfully");

    Ok(Json(post))
}
