use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::models::CommentModel;
use crate::shared::AppError;

/// Fields required to insert a comment
#[derive(Debug, Clone)]
pub struct NewComment {
    pub content: String,
    pub post_id: i64,
    pub author_id: i64,
}

/// Trait for comment repository operations
#[async_trait]
pub trait CommentRepository {
    async fn list_comments(&self, post_id: i64) -> Result<Vec<CommentModel>, AppError>;
    async fn create_comment(&self, comment: &NewComment) -> Result<CommentModel, AppError>;

    /// Removes every comment under a post, returning how many went away.
    /// Called before deleting the post itself.
    async fn delete_comments_for_post(&self, post_id: i64) -> Result<u64, AppError>;
}

/// In-memory implementation of CommentRepository for development and testing
pub struct InMemoryCommentRepository {
    inner: Mutex<InMemoryComments>,
}

struct InMemoryComments {
    comments: HashMap<i64, CommentModel>,
    next_id: i64,
}

impl Default for InMemoryCommentRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCommentRepository {
    /// Creates a new empty in-memory repository
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(InMemoryComments {
                comments: HashMap::new(),
                next_id: 1,
            }),
        }
    }

    /// Returns the current number of comments in the repository
    pub fn comment_count(&self) -> usize {
        self.inner.lock().unwrap().comments.len()
    }
}

#[async_trait]
impl CommentRepository for InMemoryCommentRepository {
    #[instrument(skip(self))]
    async fn list_comments(&self, post_id: i64) -> Result<Vec<CommentModel>, AppError> {
        debug!(post_id, "Listing comments from memory");

        let inner = self.inner.lock().unwrap();
        let mut comments: Vec<CommentModel> = inner
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by_key(|c| c.id);

        Ok(comments)
    }

    #[instrument(skip(self, comment))]
    async fn create_comment(&self, comment: &NewComment) -> Result<CommentModel, AppError> {
        debug!(
            post_id = comment.post_id,
            author_id = comment.author_id,
            "Creating comment in memory"
        );

        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_id;
        inner.next_id += 1;
        let now = Utc::now();

        let model = CommentModel {
            id,
            content: comment.content.clone(),
            post_id: comment.post_id,
            author_id: comment.author_id,
            created_at: now,
            updated_at: now,
        };
        inner.comments.insert(id, model.clone());

        debug!(comment_id = id, "Comment created in memory");
        Ok(model)
    }

    #[instrument(skip(self))]
    async fn delete_comments_for_post(&self, post_id: i64) -> Result<u64, AppError> {
        debug!(post_id, "Deleting comments for post from memory");

        let mut inner = self.inner.lock().unwrap();
        let initial_count = inner.comments.len();
        inner.comments.retain(|_, c| c.post_id != post_id);
        let removed = (initial_count - inner.comments.len()) as u64;

        debug!(post_id, removed, "Comments deleted from memory");
        Ok(removed)
    }
}

/// PostgreSQL implementation of the comment repository
pub struct PostgresCommentRepository {
    pool: PgPool,
}

impl PostgresCommentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    #[instrument(skip(self))]
    async fn list_comments(&self, post_id: i64) -> Result<Vec<CommentModel>, AppError> {
        debug!(post_id, "Listing comments from database");

        sqlx::query_as::<_, CommentModel>(
            "SELECT id, content, post_id, author_id, created_at, updated_at \
             FROM comments WHERE post_id = $1 ORDER BY id",
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, post_id, "Failed to list comments");
            AppError::Database(e.to_string())
        })
    }

    #[instrument(skip(self, comment))]
    async fn create_comment(&self, comment: &NewComment) -> Result<CommentModel, AppError> {
        debug!(
            post_id = comment.post_id,
            author_id = comment.author_id,
            "Creating comment in database"
        );

        let now = Utc::now();
        sqlx::query_as::<_, CommentModel>(
            "INSERT INTO comments (content, post_id, author_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, content, post_id, author_id, created_at, updated_at",
        )
        .bind(&comment.content)
        .bind(comment.post_id)
        .bind(comment.author_id)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to create comment");
            if e.as_database_error()
                .is_some_and(|db| db.is_foreign_key_violation())
            {
                AppError::Constraint("comment references a missing post or user".to_string())
            } else {
                AppError::Database(e.to_string())
            }
        })
    }

    #[instrument(skip(self))]
    async fn delete_comments_for_post(&self, post_id: i64) -> Result<u64, AppError> {
        debug!(post_id, "Deleting comments for post from database");

        let result = sqlx::query("DELETE FROM comments WHERE post_id = $1")
            .bind(post_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, post_id, "Failed to delete comments");
                AppError::Database(e.to_string())
            })?;

        let removed = result.rows_affected();
        debug!(post_id, removed, "Comments deleted from database");
        Ok(removed)
    }
}
