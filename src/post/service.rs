use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::{
    models::PostModel,
    repository::{NewPost, PostFilter, PostRepository, PostUpdate},
    types::{CreatePostRequest, PostResponse, PostWithAuthor, UpdatePostRequest},
};
use crate::comment::repository::CommentRepository;
use crate::shared::AppError;
use crate::user::{repository::UserRepository, types::UserResponse};

/// Service for handling post business logic
pub struct PostService {
    posts: Arc<dyn PostRepository + Send + Sync>,
    users: Arc<dyn UserRepository + Send + Sync>,
    comments: Arc<dyn CommentRepository + Send + Sync>,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostRepository + Send + Sync>,
        users: Arc<dyn UserRepository + Send + Sync>,
        comments: Arc<dyn CommentRepository + Send + Sync>,
    ) -> Self {
        Self {
            posts,
            users,
            comments,
        }
    }

    /// Lists published posts with their authors (the public feed)
    #[instrument(skip(self))]
    pub async fn list_published(&self) -> Result<Vec<PostWithAuthor>, AppError> {
        let posts = self
            .posts
            .list_posts(&PostFilter {
                published_only: true,
                search: None,
            })
            .await?;

        info!(post_count = posts.len(), "Published posts listed");

        self.with_authors(posts).await
    }

    /// Lists every post regardless of publish state (the admin view)
    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<PostWithAuthor>, AppError> {
        let posts = self.posts.list_posts(&PostFilter::default()).await?;

        info!(post_count = posts.len(), "All posts listed");

        self.with_authors(posts).await
    }

    /// Gets a single post by id
    #[instrument(skip(self))]
    pub async fn get_post(&self, id: i64) -> Result<PostResponse, AppError> {
        let post = self
            .posts
            .get_post(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

        Ok(PostResponse::from(post))
    }

    /// Searches title and content, case-insensitively
    #[instrument(skip(self, query))]
    pub async fn search(&self, query: Option<String>) -> Result<Vec<PostResponse>, AppError> {
        let query = query.filter(|q| !q.trim().is_empty()).ok_or_else(|| {
            AppError::Validation("Query string is required".to_string())
        })?;

        debug!(query = %query, "Searching posts");

        let posts = self
            .posts
            .list_posts(&PostFilter {
                published_only: false,
                search: Some(query),
            })
            .await?;

        Ok(posts.into_iter().map(PostResponse::from).collect())
    }

    /// Creates an unpublished post, resolving the author from their email
    #[instrument(skip(self, request))]
    pub async fn create_post(&self, request: CreatePostRequest) -> Result<PostResponse, AppError> {
        let (title, content, author_email) = match (
            request.title.filter(|v| !v.trim().is_empty()),
            request.content.filter(|v| !v.trim().is_empty()),
            request.author_email.filter(|v| !v.trim().is_empty()),
        ) {
            (Some(title), Some(content), Some(email)) => (title, content, email),
            _ => {
                return Err(AppError::Validation(
                    "Title, content, and authorEmail are required".to_string(),
                ))
            }
        };

        // The author must exist before anything is written
        let author = self
            .users
            .get_user_by_email(&author_email)
            .await?
            .ok_or_else(|| {
                warn!(email = %author_email, "Post creation with unknown author email");
                AppError::Constraint(format!("no user with email {}", author_email))
            })?;

        let post = self
            .posts
            .create_post(&NewPost {
                title,
                content,
                author_id: author.id,
            })
            .await?;

        info!(post_id = post.id, author_id = author.id, "Post created");

        Ok(PostResponse::from(post))
    }

    /// Replaces a post's title, content and published flag
    #[instrument(skip(self, request))]
    pub async fn update_post(
        &self,
        id: i64,
        request: UpdatePostRequest,
    ) -> Result<PostResponse, AppError> {
        let update = match (
            request.title.filter(|v| !v.trim().is_empty()),
            request.content.filter(|v| !v.trim().is_empty()),
            request.published,
        ) {
            (Some(title), Some(content), Some(published)) => PostUpdate {
                title,
                content,
                published,
            },
            _ => {
                return Err(AppError::Validation(
                    "Title, content, and published are required".to_string(),
                ))
            }
        };

        let post = self
            .posts
            .update_post(id, &update)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

        info!(post_id = id, "Post updated");

        Ok(PostResponse::from(post))
    }

    /// Marks a post as published. Re-publishing is a no-op.
    #[instrument(skip(self))]
    pub async fn publish_post(&self, id: i64) -> Result<PostResponse, AppError> {
        let post = self
            .posts
            .publish_post(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

        info!(post_id = id, "Post published");

        Ok(PostResponse::from(post))
    }

    /// Deletes a post and its comments, comments first
    ///
    /// The two deletes are not wrapped in a transaction; a crash between
    /// them leaves the post without comments rather than orphaning
    /// comments.
    #[instrument(skip(self))]
    pub async fn delete_post(&self, id: i64) -> Result<PostResponse, AppError> {
        if self.posts.get_post(id).await?.is_none() {
            return Err(AppError::NotFound("Post not found".to_string()));
        }

        let removed_comments = self.comments.delete_comments_for_post(id).await?;
        debug!(
            post_id = id,
            removed_comments, "Dependent comments deleted"
        );

        let post = self
            .posts
            .delete_post(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

        info!(post_id = id, "Post deleted");

        Ok(PostResponse::from(post))
    }

    /// Attaches each post's author, failing on dangling author ids
    async fn with_authors(&self, posts: Vec<PostModel>) -> Result<Vec<PostWithAuthor>, AppError> {
        let mut result = Vec::with_capacity(posts.len());
        for post in posts {
            let author = self.users.get_user(post.author_id).await?.ok_or_else(|| {
                AppError::Database(format!(
                    "post {} references missing author {}",
                    post.id, post.author_id
                ))
            })?;

            result.push(PostWithAuthor {
                post: PostResponse::from(post),
                author: UserResponse::from(author),
            });
        }
        Ok(result)
    }
}
