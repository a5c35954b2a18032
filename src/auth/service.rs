use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::{
    password::{hash_password, verify_password},
    token::TokenConfig,
    types::{LoginRequest, RegisterRequest, TokenResponse},
};
use crate::shared::AppError;
use crate::user::{
    repository::{NewUser, UserRepository},
    types::UserResponse,
};

/// Service for handling registration and login
pub struct AuthService {
    repository: Arc<dyn UserRepository + Send + Sync>,
    token_config: TokenConfig,
}

impl AuthService {
    pub fn new(
        repository: Arc<dyn UserRepository + Send + Sync>,
        token_config: TokenConfig,
    ) -> Self {
        Self {
            repository,
            token_config,
        }
    }

    /// Registers a new user with a hashed password
    #[instrument(skip(self, request))]
    pub async fn register(&self, request: RegisterRequest) -> Result<UserResponse, AppError> {
        let (email, password, name, role) = match (
            non_empty(request.email),
            non_empty(request.password),
            non_empty(request.name),
            non_empty(request.role),
        ) {
            (Some(email), Some(password), Some(name), Some(role)) => (email, password, name, role),
            _ => {
                return Err(AppError::Validation(
                    "Email, password, name, and role are required".to_string(),
                ))
            }
        };

        let password_hash = hash_password(&password)?;

        let user = self
            .repository
            .create_user(&NewUser {
                email,
                name,
                password_hash: Some(password_hash),
                role,
            })
            .await?;

        info!(user_id = user.id, email = %user.email, "User registered");

        Ok(UserResponse::from(user))
    }

    /// Authenticates a user and issues a signed token
    ///
    /// Unknown email, missing credentials, and wrong password all produce
    /// the same unauthorized response to avoid user enumeration.
    #[instrument(skip(self, request))]
    pub async fn login(&self, request: LoginRequest) -> Result<TokenResponse, AppError> {
        let (email, password) = match (non_empty(request.email), non_empty(request.password)) {
            (Some(email), Some(password)) => (email, password),
            _ => {
                return Err(AppError::Validation(
                    "Email and password are required".to_string(),
                ))
            }
        };

        let user = self
            .repository
            .get_user_by_email(&email)
            .await?
            .ok_or_else(|| {
                warn!(email = %email, "Login attempt for unknown email");
                AppError::Unauthorized("Invalid email or password".to_string())
            })?;

        // Users created through POST /user carry no credentials and
        // cannot log in.
        let hash = user.password_hash.as_deref().ok_or_else(|| {
            warn!(user_id = user.id, "Login attempt for user without credentials");
            AppError::Unauthorized("Invalid email or password".to_string())
        })?;

        if !verify_password(&password, hash)? {
            warn!(user_id = user.id, "Login attempt with wrong password");
            return Err(AppError::Unauthorized(
                "Invalid email or password".to_string(),
            ));
        }

        let token = self.token_config.issue_token(&user)?;

        info!(user_id = user.id, "User logged in");

        Ok(TokenResponse { token })
    }
}

/// Treats absent and blank fields the same way, returning the trimmed-for
/// -presence original value otherwise.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
