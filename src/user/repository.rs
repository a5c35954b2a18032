use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::models::UserModel;
use crate::shared::AppError;

/// Fields required to insert a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password_hash: Option<String>,
    pub role: String, // "admin" or "user"
}

/// Trait for user repository operations
#[async_trait]
pub trait UserRepository {
    async fn list_users(&self) -> Result<Vec<UserModel>, AppError>;
    async fn get_user(&self, id: i64) -> Result<Option<UserModel>, AppError>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<UserModel>, AppError>;
    async fn create_user(&self, user: &NewUser) -> Result<UserModel, AppError>;
}

/// In-memory implementation of UserRepository for development and testing
///
/// Ids are assigned from a monotonic counter so they stay positive and
/// unique, matching what BIGSERIAL produces in Postgres. Data is lost on
/// restart.
pub struct InMemoryUserRepository {
    inner: Mutex<InMemoryUsers>,
}

struct InMemoryUsers {
    users: HashMap<i64, UserModel>,
    next_id: i64,
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryUserRepository {
    /// Creates a new empty in-memory repository
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(InMemoryUsers {
                users: HashMap::new(),
                next_id: 1,
            }),
        }
    }

    /// Returns the current number of users in the repository
    pub fn user_count(&self) -> usize {
        self.inner.lock().unwrap().users.len()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    #[instrument(skip(self))]
    async fn list_users(&self) -> Result<Vec<UserModel>, AppError> {
        debug!("Listing users from memory");

        let inner = self.inner.lock().unwrap();
        let mut users: Vec<UserModel> = inner.users.values().cloned().collect();
        users.sort_by_key(|u| u.id);

        Ok(users)
    }

    #[instrument(skip(self))]
    async fn get_user(&self, id: i64) -> Result<Option<UserModel>, AppError> {
        debug!(user_id = id, "Fetching user from memory");

        let inner = self.inner.lock().unwrap();
        Ok(inner.users.get(&id).cloned())
    }

    #[instrument(skip(self))]
    async fn get_user_by_email(&self, email: &str) -> Result<Option<UserModel>, AppError> {
        debug!(email = %email, "Fetching user by email from memory");

        let inner = self.inner.lock().unwrap();
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }

    #[instrument(skip(self, user))]
    async fn create_user(&self, user: &NewUser) -> Result<UserModel, AppError> {
        debug!(email = %user.email, "Creating user in memory");

        let mut inner = self.inner.lock().unwrap();
        if inner.users.values().any(|u| u.email == user.email) {
            warn!(email = %user.email, "Email already taken");
            return Err(AppError::Constraint(format!(
                "email {} already exists",
                user.email
            )));
        }

        let id = inner.next_id;
        inner.next_id += 1;
        let now = Utc::now();

        let model = UserModel {
            id,
            email: user.email.clone(),
            name: user.name.clone(),
            password_hash: user.password_hash.clone(),
            role: user.role.clone(),
            created_at: now,
            updated_at: now,
        };
        inner.users.insert(id, model.clone());

        debug!(user_id = id, "User created in memory");
        Ok(model)
    }
}

/// PostgreSQL implementation of the user repository
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    #[instrument(skip(self))]
    async fn list_users(&self) -> Result<Vec<UserModel>, AppError> {
        debug!("Listing users from database");

        sqlx::query_as::<_, UserModel>(
            "SELECT id, email, name, password_hash, role, created_at, updated_at \
             FROM users ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to list users");
            AppError::Database(e.to_string())
        })
    }

    #[instrument(skip(self))]
    async fn get_user(&self, id: i64) -> Result<Option<UserModel>, AppError> {
        debug!(user_id = id, "Fetching user from database");

        sqlx::query_as::<_, UserModel>(
            "SELECT id, email, name, password_hash, role, created_at, updated_at \
             FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, user_id = id, "Failed to fetch user");
            AppError::Database(e.to_string())
        })
    }

    #[instrument(skip(self))]
    async fn get_user_by_email(&self, email: &str) -> Result<Option<UserModel>, AppError> {
        debug!(email = %email, "Fetching user by email from database");

        sqlx::query_as::<_, UserModel>(
            "SELECT id, email, name, password_hash, role, created_at, updated_at \
             FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to fetch user by email");
            AppError::Database(e.to_string())
        })
    }

    #[instrument(skip(self, user))]
    async fn create_user(&self, user: &NewUser) -> Result<UserModel, AppError> {
        debug!(email = %user.email, "Creating user in database");

        let now = Utc::now();
        sqlx::query_as::<_, UserModel>(
            "INSERT INTO users (email, name, password_hash, role, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id, email, name, password_hash, role, created_at, updated_at",
        )
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(&user.role)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, email = %user.email, "Failed to create user");
            // The unique index on email surfaces as a constraint failure
            if e.as_database_error()
                .is_some_and(|db| db.is_unique_violation())
            {
                AppError::Constraint(format!("email {} already exists", user.email))
            } else {
                AppError::Database(e.to_string())
            }
        })
    }
}
