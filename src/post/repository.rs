use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::models::PostModel;
use crate::shared::AppError;

/// Fields required to insert a post. Posts always start unpublished.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub author_id: i64,
}

/// Full replacement of a post's mutable fields (PUT semantics)
#[derive(Debug, Clone)]
pub struct PostUpdate {
    pub title: String,
    pub content: String,
    pub published: bool,
}

/// Listing filter: the feed sets published_only, search sets a
/// case-insensitive substring matched against title OR content.
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    pub published_only: bool,
    pub search: Option<String>,
}

/// Trait for post repository operations
#[async_trait]
pub trait PostRepository {
    async fn list_posts(&self, filter: &PostFilter) -> Result<Vec<PostModel>, AppError>;
    async fn get_post(&self, id: i64) -> Result<Option<PostModel>, AppError>;
    async fn create_post(&self, post: &NewPost) -> Result<PostModel, AppError>;

    /// Replaces title, content and published; returns None for an absent id
    async fn update_post(&self, id: i64, update: &PostUpdate)
        -> Result<Option<PostModel>, AppError>;

    /// Sets published = true; already-published posts are left as-is
    async fn publish_post(&self, id: i64) -> Result<Option<PostModel>, AppError>;

    /// Removes the post, returning the deleted row
    async fn delete_post(&self, id: i64) -> Result<Option<PostModel>, AppError>;
}

/// In-memory implementation of PostRepository for development and testing
pub struct InMemoryPostRepository {
    inner: Mutex<InMemoryPosts>,
}

struct InMemoryPosts {
    posts: HashMap<i64, PostModel>,
    next_id: i64,
}

impl Default for InMemoryPostRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryPostRepository {
    /// Creates a new empty in-memory repository
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(InMemoryPosts {
                posts: HashMap::new(),
                next_id: 1,
            }),
        }
    }

    /// Returns the current number of posts in the repository
    pub fn post_count(&self) -> usize {
        self.inner.lock().unwrap().posts.len()
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    #[instrument(skip(self, filter))]
    async fn list_posts(&self, filter: &PostFilter) -> Result<Vec<PostModel>, AppError> {
        debug!(
            published_only = filter.published_only,
            has_search = filter.search.is_some(),
            "Listing posts from memory"
        );

        let inner = self.inner.lock().unwrap();
        let mut posts: Vec<PostModel> = inner
            .posts
            .values()
            .filter(|p| !filter.published_only || p.published)
            .filter(|p| match &filter.search {
                Some(query) => p.matches(query),
                None => true,
            })
            .cloned()
            .collect();
        posts.sort_by_key(|p| p.id);

        Ok(posts)
    }

    #[instrument(skip(self))]
    async fn get_post(&self, id: i64) -> Result<Option<PostModel>, AppError> {
        debug!(post_id = id, "Fetching post from memory");

        let inner = self.inner.lock().unwrap();
        Ok(inner.posts.get(&id).cloned())
    }

    #[instrument(skip(self, post))]
    async fn create_post(&self, post: &NewPost) -> Result<PostModel, AppError> {
        debug!(title = %post.title, author_id = post.author_id, "Creating post in memory");

        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_id;
        inner.next_id += 1;
        let now = Utc::now();

        let model = PostModel {
            id,
            title: post.title.clone(),
            content: post.content.clone(),
            published: false,
            author_id: post.author_id,
            created_at: now,
            updated_at: now,
        };
        inner.posts.insert(id, model.clone());

        debug!(post_id = id, "Post created in memory");
        Ok(model)
    }

    #[instrument(skip(self, update))]
    async fn update_post(
        &self,
        id: i64,
        update: &PostUpdate,
    ) -> Result<Option<PostModel>, AppError> {
        debug!(post_id = id, "Updating post in memory");

        let mut inner = self.inner.lock().unwrap();
        let post = match inner.posts.get_mut(&id) {
            Some(post) => post,
            None => {
                debug!(post_id = id, "Post not found for update");
                return Ok(None);
            }
        };

        post.title = update.title.clone();
        post.content = update.content.clone();
        post.published = update.published;
        post.updated_at = Utc::now();

        Ok(Some(post.clone()))
    }

    #[instrument(skip(self))]
    async fn publish_post(&self, id: i64) -> Result<Option<PostModel>, AppError> {
        debug!(post_id = id, "Publishing post in memory");

        let mut inner = self.inner.lock().unwrap();
        let post = match inner.posts.get_mut(&id) {
            Some(post) => post,
            None => {
                debug!(post_id = id, "Post not found for publish");
                return Ok(None);
            }
        };

        post.published = true;
        post.updated_at = Utc::now();

        Ok(Some(post.clone()))
    }

    #[instrument(skip(self))]
    async fn delete_post(&self, id: i64) -> Result<Option<PostModel>, AppError> {
        debug!(post_id = id, "Deleting post from memory");

        let mut inner = self.inner.lock().unwrap();
        Ok(inner.posts.remove(&id))
    }
}

/// PostgreSQL implementation of the post repository
pub struct PostgresPostRepository {
    pool: PgPool,
}

impl PostgresPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const POST_COLUMNS: &str = "id, title, content, published, author_id, created_at, updated_at";

#[async_trait]
impl PostRepository for PostgresPostRepository {
    #[instrument(skip(self, filter))]
    async fn list_posts(&self, filter: &PostFilter) -> Result<Vec<PostModel>, AppError> {
        debug!(
            published_only = filter.published_only,
            has_search = filter.search.is_some(),
            "Listing posts from database"
        );

        let result = match &filter.search {
            Some(query) => {
                let pattern = format!("%{}%", query);
                let sql = if filter.published_only {
                    format!(
                        "SELECT {POST_COLUMNS} FROM posts \
                         WHERE published = TRUE AND (title ILIKE $1 OR content ILIKE $1) \
                         ORDER BY id"
                    )
                } else {
                    format!(
                        "SELECT {POST_COLUMNS} FROM posts \
                         WHERE title ILIKE $1 OR content ILIKE $1 ORDER BY id"
                    )
                };
                sqlx::query_as::<_, PostModel>(&sql)
                    .bind(pattern)
                    .fetch_all(&self.pool)
                    .await
            }
            None => {
                let sql = if filter.published_only {
                    format!("SELECT {POST_COLUMNS} FROM posts WHERE published = TRUE ORDER BY id")
                } else {
                    format!("SELECT {POST_COLUMNS} FROM posts ORDER BY id")
                };
                sqlx::query_as::<_, PostModel>(&sql)
                    .fetch_all(&self.pool)
                    .await
            }
        };

        result.map_err(|e| {
            warn!(error = %e, "Failed to list posts");
            AppError::Database(e.to_string())
        })
    }

    #[instrument(skip(self))]
    async fn get_post(&self, id: i64) -> Result<Option<PostModel>, AppError> {
        debug!(post_id = id, "Fetching post from database");

        sqlx::query_as::<_, PostModel>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, post_id = id, "Failed to fetch post");
            AppError::Database(e.to_string())
        })
    }

    #[instrument(skip(self, post))]
    async fn create_post(&self, post: &NewPost) -> Result<PostModel, AppError> {
        debug!(title = %post.title, author_id = post.author_id, "Creating post in database");

        let now = Utc::now();
        sqlx::query_as::<_, PostModel>(&format!(
            "INSERT INTO posts (title, content, published, author_id, created_at, updated_at) \
             VALUES ($1, $2, FALSE, $3, $4, $5) RETURNING {POST_COLUMNS}"
        ))
        .bind(&post.title)
        .bind(&post.content)
        .bind(post.author_id)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to create post");
            if e.as_database_error()
                .is_some_and(|db| db.is_foreign_key_violation())
            {
                AppError::Constraint(format!("author {} does not exist", post.author_id))
            } else {
                AppError::Database(e.to_string())
            }
        })
    }

    #[instrument(skip(self, update))]
    async fn update_post(
        &self,
        id: i64,
        update: &PostUpdate,
    ) -> Result<Option<PostModel>, AppError> {
        debug!(post_id = id, "Updating post in database");

        sqlx::query_as::<_, PostModel>(&format!(
            "UPDATE posts SET title = $2, content = $3, published = $4, updated_at = $5 \
             WHERE id = $1 RETURNING {POST_COLUMNS}"
        ))
        .bind(id)
        .bind(&update.title)
        .bind(&update.content)
        .bind(update.published)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, post_id = id, "Failed to update post");
            AppError::Database(e.to_string())
        })
    }

    #[instrument(skip(self))]
    async fn publish_post(&self, id: i64) -> Result<Option<PostModel>, AppError> {
        debug!(post_id = id, "Publishing post in database");

        sqlx::query_as::<_, PostModel>(&format!(
            "UPDATE posts SET published = TRUE, updated_at = $2 \
             WHERE id = $1 RETURNING {POST_COLUMNS}"
        ))
        .bind(id)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, post_id = id, "Failed to publish post");
            AppError::Database(e.to_string())
        })
    }

    #[instrument(skip(self))]
    async fn delete_post(&self, id: i64) -> Result<Option<PostModel>, AppError> {
        debug!(post_id = id, "Deleting post from database");

        sqlx::query_as::<_, PostModel>(&format!(
            "DELETE FROM posts WHERE id = $1 RETURNING {POST_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, post_id = id, "Failed to delete post");
            AppError::Database(e.to_string())
        })
    }
}
