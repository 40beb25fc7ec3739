//! In-memory record store.
//!
//! DESIGN
//! ======
//! Every transaction holds the store-wide mutex from `begin` until it ends, so
//! transactions are fully serialized. Writes are staged in an overlay and
//! merged into the shared tables on commit; rollback (or drop) discards the
//! overlay. Used by tests and by the `memory` backend for local development.

use std::collections::HashMap;
use std::sync::Arc;
#[cfg(test)]
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use super::{CommentRecord, GameRecord, LoadMode, RecordStore, StoreError, StoreTx};
use crate::ids::EntityId;

#[derive(Debug, Default, Clone)]
struct Tables {
    games: HashMap<EntityId, GameRecord>,
    comments: HashMap<EntityId, CommentRecord>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    /// Number of upcoming commits that should fail with a conflict.
    #[cfg(test)]
    failing_commits: Arc<AtomicUsize>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an empty game if it does not exist yet.
    pub async fn seed_game(&self, id: EntityId) {
        let mut tables = self.tables.lock().await;
        tables.games.entry(id.clone()).or_insert_with(|| GameRecord::new(id));
    }

    #[cfg(test)]
    pub(crate) async fn put_game(&self, game: GameRecord) {
        self.tables.lock().await.games.insert(game.id.clone(), game);
    }

    #[cfg(test)]
    pub(crate) async fn game(&self, id: &EntityId) -> Option<GameRecord> {
        self.tables.lock().await.games.get(id).cloned()
    }

    #[cfg(test)]
    pub(crate) async fn comment(&self, id: &EntityId) -> Option<CommentRecord> {
        self.tables.lock().await.comments.get(id).cloned()
    }

    #[cfg(test)]
    pub(crate) async fn comment_count(&self) -> usize {
        self.tables.lock().await.comments.len()
    }

    #[cfg(test)]
    pub(crate) fn fail_next_commits(&self, n: usize) {
        self.failing_commits.store(n, Ordering::SeqCst);
    }

    #[cfg(test)]
    fn take_commit_failure(&self) -> bool {
        self.failing_commits
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError> {
        let guard = Arc::clone(&self.tables).lock_owned().await;
        Ok(Box::new(MemoryTx {
            guard,
            staged: Tables::default(),
            #[cfg(test)]
            fail_commit: self.take_commit_failure(),
        }))
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

pub struct MemoryTx {
    guard: OwnedMutexGuard<Tables>,
    staged: Tables,
    #[cfg(test)]
    fail_commit: bool,
}

impl MemoryTx {
    fn game(&self, id: &EntityId) -> Option<&GameRecord> {
        self.staged.games.get(id).or_else(|| self.guard.games.get(id))
    }

    fn comment(&self, id: &EntityId) -> Option<&CommentRecord> {
        self.staged.comments.get(id).or_else(|| self.guard.comments.get(id))
    }

    #[cfg(test)]
    fn injected_failure(&self) -> Option<StoreError> {
        self.fail_commit
            .then(|| StoreError::Conflict("injected commit failure".into()))
    }

    #[cfg(not(test))]
    #[allow(clippy::unused_self)]
    fn injected_failure(&self) -> Option<StoreError> {
        None
    }
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn load_game(&mut self, id: &EntityId, _mode: LoadMode) -> Result<Option<GameRecord>, StoreError> {
        Ok(self.game(id).cloned())
    }

    async fn load_comment(&mut self, id: &EntityId, _mode: LoadMode) -> Result<Option<CommentRecord>, StoreError> {
        Ok(self.comment(id).cloned())
    }

    async fn comments_for_game(&mut self, game_id: &EntityId) -> Result<Vec<CommentRecord>, StoreError> {
        let mut merged: HashMap<&EntityId, &CommentRecord> = self.guard.comments.iter().collect();
        merged.extend(self.staged.comments.iter());
        Ok(merged
            .into_values()
            .filter(|c| c.game_id == *game_id)
            .cloned()
            .collect())
    }

    async fn insert_comment(&mut self, comment: &CommentRecord) -> Result<(), StoreError> {
        if self.comment(&comment.id).is_some() {
            return Err(StoreError::DuplicateId(comment.id.clone()));
        }
        self.staged.comments.insert(comment.id.clone(), comment.clone());
        Ok(())
    }

    async fn save_game(&mut self, game: &GameRecord) -> Result<(), StoreError> {
        if self.game(&game.id).is_none() {
            return Err(StoreError::Missing(game.id.clone()));
        }
        self.staged.games.insert(game.id.clone(), game.clone());
        Ok(())
    }

    async fn save_comment(&mut self, comment: &CommentRecord) -> Result<(), StoreError> {
        let Some(current) = self.comment(&comment.id) else {
            return Err(StoreError::Missing(comment.id.clone()));
        };
        let updated = CommentRecord { children: comment.children.clone(), ..current.clone() };
        self.staged.comments.insert(updated.id.clone(), updated);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let mut this = *self;
        if let Some(err) = this.injected_failure() {
            return Err(err);
        }
        let staged = std::mem::take(&mut this.staged);
        debug!(games = staged.games.len(), comments = staged.comments.len(), "memory commit");
        this.guard.games.extend(staged.games);
        this.guard.comments.extend(staged.comments);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        debug!(
            games = self.staged.games.len(),
            comments = self.staged.comments.len(),
            "memory rollback"
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;
