use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Database model for the posts table
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PostModel {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub published: bool, // New posts start unpublished
    pub author_id: i64,  // Fixed at creation, never reassigned
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PostModel {
    /// Case-insensitive substring match over title or content
    pub fn matches(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        self.title.to_lowercase().contains(&needle)
            || self.content.to_lowercase().contains(&needle)
    }
}
