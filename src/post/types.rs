use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::models::PostModel;
use crate::user::types::UserResponse;

/// Request body for POST /post
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreatePostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    #[serde(rename = "authorEmail")]
    pub author_email: Option<String>,
}

/// Request body for PUT /post/:id
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub published: Option<bool>,
}

/// Query parameters for GET /posts/search
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
}

/// Post representation returned to clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PostResponse {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub published: bool,
    pub author_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PostModel> for PostResponse {
    fn from(post: PostModel) -> Self {
        Self {
            id: post.id,
            title: post.title,
            content: post.content,
            published: post.published,
            author_id: post.author_id,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

/// Post with its author embedded, for the feed and admin listings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PostWithAuthor {
    #[serde(flatten)]
    pub post: PostResponse,
    pub author: UserResponse,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_post_request_uses_author_email_key() {
        let raw = r#"{"title": "T", "content": "C", "authorEmail": "a@x.com"}"#;
        let request: CreatePostRequest = serde_json::from_str(raw).unwrap();
        assert_eq!(request.author_email.as_deref(), Some("a@x.com"));
    }

    #[test]
    fn test_post_with_author_flattens_post_fields() {
        let post = PostResponse {
            id: 1,
            title: "T".to_string(),
            content: "C".to_string(),
            published: true,
            author_id: 2,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let author = UserResponse {
            id: 2,
            email: "a@x.com".to_string(),
            name: "A".to_string(),
            role: "user".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let value = serde_json::to_value(PostWithAuthor { post, author }).unwrap();
        // Post fields at the top level, author nested
        assert_eq!(value["title"], "T");
        assert_eq!(value["author"]["email"], "a@x.com");
    }
}
