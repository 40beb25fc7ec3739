//! Identity resolution — map a bearer or session token to a user id.
//!
//! ARCHITECTURE
//! ============
//! Sign-in lives outside this service. Whatever issues sessions writes them to
//! the `sessions` table (postgres backend) or they are configured up front
//! (memory backend). Handlers only ever see the resolved user id, never a
//! user id supplied in a request body.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::ErrorCode;
use crate::ids::EntityId;

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("session lookup failed: {0}")]
    Database(#[from] sqlx::Error),
}

impl ErrorCode for IdentityError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Database(_) => "E_IDENTITY",
        }
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve `token` to a user id. `Ok(None)` means unknown or expired.
    async fn resolve(&self, token: &str) -> Result<Option<EntityId>, IdentityError>;
}

/// Sessions stored in Postgres.
#[derive(Clone)]
pub struct PgSessions {
    pool: PgPool,
}

impl PgSessions {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityProvider for PgSessions {
    async fn resolve(&self, token: &str) -> Result<Option<EntityId>, IdentityError> {
        let user_id = sqlx::query_scalar::<_, String>(
            "SELECT user_id FROM sessions WHERE token = $1 AND expires_at > now()",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user_id.map(EntityId::new))
    }
}

/// Fixed token table for the memory backend and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticSessions {
    tokens: HashMap<String, EntityId>,
}

impl StaticSessions {
    #[must_use]
    pub fn new(pairs: impl IntoIterator<Item = (String, EntityId)>) -> Self {
        Self { tokens: pairs.into_iter().collect() }
    }
}

#[async_trait]
impl IdentityProvider for StaticSessions {
    async fn resolve(&self, token: &str) -> Result<Option<EntityId>, IdentityError> {
        Ok(self.tokens.get(token).cloned())
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
