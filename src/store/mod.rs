//! Transactional record store.
//!
//! DESIGN
//! ======
//! Services never touch storage directly. They open a [`StoreTx`] from a
//! [`RecordStore`], issue loads and writes through it, and finish with
//! `commit` or `rollback`. A transaction that is dropped without commit is
//! rolled back, so a cancelled request can never publish partial writes.
//!
//! CONCURRENCY
//! ===========
//! Loads taken with [`LoadMode::ForUpdate`] must serialize concurrent writers
//! to the same record until the owning transaction ends. The Postgres store
//! uses row locks; the memory store serializes whole transactions.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;
use crate::ids::EntityId;

// =============================================================================
// RECORDS
// =============================================================================

/// Mutable view of a game. Only the fields this service writes are loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    pub id: EntityId,
    /// Top-level comment ids in creation order.
    pub comments: Vec<EntityId>,
    /// User ids that upvoted the game.
    pub upvotes: Vec<EntityId>,
}

impl GameRecord {
    #[must_use]
    pub fn new(id: EntityId) -> Self {
        Self { id, comments: Vec::new(), upvotes: Vec::new() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRecord {
    pub id: EntityId,
    pub game_id: EntityId,
    pub parent_id: Option<EntityId>,
    pub author: EntityId,
    pub content: String,
    /// Reply ids in creation order.
    pub children: Vec<EntityId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// Plain read, no lock held.
    Read,
    /// Read and hold a write lock until the transaction ends.
    ForUpdate,
}

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Concurrent writer conflict (serialization failure, deadlock, lock timeout).
    #[error("write conflict: {0}")]
    Conflict(String),
    #[error("record id already taken: {0}")]
    DuplicateId(EntityId),
    #[error("record vanished during transaction: {0}")]
    Missing(EntityId),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl ErrorCode for StoreError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Conflict(_) => "E_CONFLICT",
            Self::DuplicateId(_) => "E_DUPLICATE_ID",
            Self::Missing(_) => "E_STORAGE",
            Self::Unavailable(_) => "E_STORE_UNAVAILABLE",
            Self::Database(_) => "E_STORAGE",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Conflict(_) | Self::DuplicateId(_))
    }
}

const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";
const LOCK_NOT_AVAILABLE: &str = "55P03";

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        let sqlstate = err
            .as_database_error()
            .and_then(|db| db.code())
            .map(|code| code.into_owned());
        match sqlstate.as_deref() {
            Some(SERIALIZATION_FAILURE | DEADLOCK_DETECTED | LOCK_NOT_AVAILABLE) => {
                Self::Conflict(err.to_string())
            }
            _ => match err {
                sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                    Self::Unavailable(err.to_string())
                }
                other => Self::Database(other),
            },
        }
    }
}

// =============================================================================
// TRAITS
// =============================================================================

/// Source of transactions.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Open a new transaction.
    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError>;

    /// Short backend name for logs.
    fn backend(&self) -> &'static str;
}

/// One open transaction. Dropping it without `commit` discards every write.
#[async_trait]
pub trait StoreTx: Send {
    async fn load_game(&mut self, id: &EntityId, mode: LoadMode) -> Result<Option<GameRecord>, StoreError>;

    async fn load_comment(&mut self, id: &EntityId, mode: LoadMode) -> Result<Option<CommentRecord>, StoreError>;

    /// All comments that belong to a game, in no particular order.
    async fn comments_for_game(&mut self, game_id: &EntityId) -> Result<Vec<CommentRecord>, StoreError>;

    /// Insert a new comment. Fails with [`StoreError::DuplicateId`] if the id exists.
    async fn insert_comment(&mut self, comment: &CommentRecord) -> Result<(), StoreError>;

    /// Persist a game's `comments` and `upvotes`.
    async fn save_game(&mut self, game: &GameRecord) -> Result<(), StoreError>;

    /// Persist a comment's `children`. Other comment fields are immutable.
    async fn save_comment(&mut self, comment: &CommentRecord) -> Result<(), StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
