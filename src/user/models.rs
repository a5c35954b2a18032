use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Database model for the users table
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserModel {
    pub id: i64,
    pub email: String, // Unique natural key, used to resolve authors
    pub name: String,
    pub password_hash: Option<String>, // Only set for users created via /auth/register
    pub role: String,                  // "admin" or "user"
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserModel {
    /// Whether this user can authenticate at all
    pub fn has_credentials(&self) -> bool {
        self.password_hash.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_credentials() {
        let mut user = UserModel {
            id: 1,
            email: "a@x.com".to_string(),
            name: "A".to_string(),
            password_hash: None,
            role: "user".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(!user.has_credentials());

        user.password_hash = Some("$2b$10$hash".to_string());
        assert!(user.has_credentials());
    }
}
