use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::{
    repository::{NewUser, UserRepository},
    types::{CreateUserRequest, UserResponse},
};
use crate::shared::AppError;

/// Role assigned to users created without explicit credentials
const DEFAULT_ROLE: &str = "user";

/// Service for handling user business logic
pub struct UserService {
    repository: Arc<dyn UserRepository + Send + Sync>,
}

impl UserService {
    pub fn new(repository: Arc<dyn UserRepository + Send + Sync>) -> Self {
        Self { repository }
    }

    /// Lists all users
    #[instrument(skip(self))]
    pub async fn list_users(&self) -> Result<Vec<UserResponse>, AppError> {
        debug!("Listing all users");

        let users = self.repository.list_users().await?;

        info!(user_count = users.len(), "Users listed successfully");

        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    /// Gets a single user by id
    #[instrument(skip(self))]
    pub async fn get_user(&self, id: i64) -> Result<UserResponse, AppError> {
        let user = self
            .repository
            .get_user(id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        Ok(UserResponse::from(user))
    }

    /// Creates a user without credentials (the plain POST /user flow)
    #[instrument(skip(self, request))]
    pub async fn create_user(&self, request: CreateUserRequest) -> Result<UserResponse, AppError> {
        let (email, name) = match (
            request.email.filter(|v| !v.trim().is_empty()),
            request.name.filter(|v| !v.trim().is_empty()),
        ) {
            (Some(email), Some(name)) => (email, name),
            _ => {
                return Err(AppError::Validation(
                    "Email and name are required".to_string(),
                ))
            }
        };

        let user = self
            .repository
            .create_user(&NewUser {
                email,
                name,
                password_hash: None,
                role: DEFAULT_ROLE.to_string(),
            })
            .await?;

        info!(user_id = user.id, email = %user.email, "User created");

        Ok(UserResponse::from(user))
    }
}
