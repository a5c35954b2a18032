use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::models::CommentModel;
use crate::user::types::UserResponse;

/// Request body for POST /posts/:id/comments
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCommentRequest {
    pub content: Option<String>,
    #[serde(rename = "authorId")]
    pub author_id: Option<i64>,
}

/// Comment representation returned to clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommentResponse {
    pub id: i64,
    pub content: String,
    pub post_id: i64,
    pub author_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CommentModel> for CommentResponse {
    fn from(comment: CommentModel) -> Self {
        Self {
            id: comment.id,
            content: comment.content,
            post_id: comment.post_id,
            author_id: comment.author_id,
            created_at: comment.created_at,
            updated_at: comment.updated_at,
        }
    }
}

/// Comment with its author embedded, for the per-post listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommentWithAuthor {
    #[serde(flatten)]
    pub comment: CommentResponse,
    pub author: UserResponse,
}
