use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::{
    repository::{CommentRepository, NewComment},
    types::{CommentResponse, CommentWithAuthor, CreateCommentRequest},
};
use crate::post::repository::PostRepository;
use crate::shared::AppError;
use crate::user::{repository::UserRepository, types::UserResponse};

/// Service for handling comment business logic
pub struct CommentService {
    comments: Arc<dyn CommentRepository + Send + Sync>,
    posts: Arc<dyn PostRepository + Send + Sync>,
    users: Arc<dyn UserRepository + Send + Sync>,
}

impl CommentService {
    pub fn new(
        comments: Arc<dyn CommentRepository + Send + Sync>,
        posts: Arc<dyn PostRepository + Send + Sync>,
        users: Arc<dyn UserRepository + Send + Sync>,
    ) -> Self {
        Self {
            comments,
            posts,
            users,
        }
    }

    /// Lists a post's comments with their authors
    ///
    /// An unknown post id yields an empty list, not an error.
    #[instrument(skip(self))]
    pub async fn list_for_post(&self, post_id: i64) -> Result<Vec<CommentWithAuthor>, AppError> {
        let comments = self.comments.list_comments(post_id).await?;

        info!(post_id, comment_count = comments.len(), "Comments listed");

        let mut result = Vec::with_capacity(comments.len());
        for comment in comments {
            let author = self
                .users
                .get_user(comment.author_id)
                .await?
                .ok_or_else(|| {
                    AppError::Database(format!(
                        "comment {} references missing author {}",
                        comment.id, comment.author_id
                    ))
                })?;

            result.push(CommentWithAuthor {
                comment: CommentResponse::from(comment),
                author: UserResponse::from(author),
            });
        }
        Ok(result)
    }

    /// Creates a comment under a post
    ///
    /// The referenced post and author must both exist; a dangling
    /// reference is a constraint failure regardless of the backing store.
    #[instrument(skip(self, request))]
    pub async fn create_comment(
        &self,
        post_id: i64,
        request: CreateCommentRequest,
    ) -> Result<CommentResponse, AppError> {
        let (content, author_id) = match (
            request.content.filter(|v| !v.trim().is_empty()),
            request.author_id,
        ) {
            (Some(content), Some(author_id)) => (content, author_id),
            _ => {
                return Err(AppError::Validation(
                    "Content and authorId are required".to_string(),
                ))
            }
        };

        if self.posts.get_post(post_id).await?.is_none() {
            warn!(post_id, "Comment creation for unknown post");
            return Err(AppError::Constraint(format!(
                "no post with id {}",
                post_id
            )));
        }
        if self.users.get_user(author_id).await?.is_none() {
            warn!(author_id, "Comment creation for unknown author");
            return Err(AppError::Constraint(format!(
                "no user with id {}",
                author_id
            )));
        }

        let comment = self
            .comments
            .create_comment(&NewComment {
                content,
                post_id,
                author_id,
            })
            .await?;

        info!(comment_id = comment.id, post_id, "Comment created");

        Ok(CommentResponse::from(comment))
    }
}
