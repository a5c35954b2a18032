use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    service::CommentService,
    types::{CommentResponse, CommentWithAuthor, CreateCommentRequest},
};
use crate::shared::{AppError, AppState};

fn service(state: &AppState) -> CommentService {
    CommentService::new(
        Arc::clone(&state.comment_repository),
        Arc::clone(&state.post_repository),
        Arc::clone(&state.user_repository),
    )
}

/// HTTP handler for listing a post's comments
///
/// GET /posts/:id/comments
/// Returns comments with their authors
#[instrument(name = "list_comments", skip(state))]
pub async fn list_comments(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
) -> Result<Json<Vec<CommentWithAuthor>>, AppError> {
    let comments = service(&state).list_for_post(post_id).await?;

    Ok(Json(comments))
}

/// HTTP handler for commenting on a post
///
/// POST /posts/:id/comments
#[instrument(name = "create_comment", skip(state, request))]
pub async fn create_comment(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    Json(request): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<CommentResponse>), AppError> {
    info!(post_id, "Creating new comment");

    let comment = service(&state).create_comment(post_id, request).await?;

    info!(comment_id = comment.id, "Comment created successfully");

    Ok((StatusCode::CREATED, Json(comment)))
}
