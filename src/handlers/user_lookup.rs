use async_trait::async_trait;
use log::error;
use sqlx::PgPool;
use std::collections::HashMap;
use thiserror::Error;

use crate::models::user::User;

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("user not found")]
    NotFound,
    #[error("user store unavailable: {0}")]
    Backend(String),
}

/// Resolves a subject id to a user. Implementations are shared read-only
/// across workers.
#[async_trait]
pub trait UserLookup: Send + Sync {
    async fn get_by_id(&self, id: &str) -> Result<User, LookupError>;
}

/// Fixed set of users, populated before the lookup is shared.
#[derive(Debug, Default, Clone)]
pub struct InMemoryUserLookup {
    users: HashMap<String, User>,
}

impl InMemoryUserLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, user: User) -> Self {
        self.seed(user);
        self
    }

    pub fn seed(&mut self, user: User) {
        self.users.insert(user.id.clone(), user);
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl UserLookup for InMemoryUserLookup {
    async fn get_by_id(&self, id: &str) -> Result<User, LookupError> {
        self.users.get(id).cloned().ok_or(LookupError::NotFound)
    }
}

/// Postgres-backed lookup over the `users` table
pub struct PgUserLookup {
    pool: PgPool,
}

impl PgUserLookup {
    pub fn new(pool: PgPool) -> Self {
        PgUserLookup { pool }
    }
}

#[async_trait]
impl UserLookup for PgUserLookup {
    async fn get_by_id(&self, id: &str) -> Result<User, LookupError> {
        let query = "SELECT user_id, name, role FROM users WHERE user_id = $1";

        sqlx::query_as::<_, User>(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("user lookup query failed: {}", e);
                LookupError::Backend(e.to_string())
            })?
            .ok_or(LookupError::NotFound)
    }
}
