//! Thread view — a game's comments expanded into a nested tree.
//!
//! Reads happen in one transaction so the tree reflects a single committed
//! state. Order comes from the containers (`games.comments`,
//! `comments.children`), not from the comment rows.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::warn;

use crate::ids::EntityId;
use crate::services::tx::{self, MutationError, RecordKind};
use crate::store::{CommentRecord, LoadMode, RecordStore};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentNode {
    pub id: EntityId,
    pub author: EntityId,
    pub content: String,
    pub children: Vec<CommentNode>,
}

/// Load the comment tree of `game_id`.
///
/// # Errors
///
/// - [`MutationError::NotFound`] if the game does not exist.
/// - [`MutationError::Storage`] if the store fails.
pub async fn load_thread(store: &dyn RecordStore, game_id: &EntityId) -> Result<Vec<CommentNode>, MutationError> {
    let mut txn = store.begin().await?;
    let result = async {
        let game = txn
            .load_game(game_id, LoadMode::Read)
            .await?
            .ok_or_else(|| MutationError::not_found(RecordKind::Game, game_id))?;
        let comments = txn.comments_for_game(game_id).await?;
        Ok::<_, MutationError>((game.comments, comments))
    }
    .await;
    let (roots, comments) = tx::finish(txn, result).await?;

    let by_id: HashMap<EntityId, CommentRecord> = comments.into_iter().map(|c| (c.id.clone(), c)).collect();
    let mut visited = HashSet::new();
    Ok(build_nodes(game_id, &roots, &by_id, &mut visited))
}

fn build_nodes(
    game_id: &EntityId,
    ids: &[EntityId],
    by_id: &HashMap<EntityId, CommentRecord>,
    visited: &mut HashSet<EntityId>,
) -> Vec<CommentNode> {
    let mut nodes = Vec::with_capacity(ids.len());
    for id in ids {
        // EDGE: a corrupted container could list an id twice or form a cycle.
        if !visited.insert(id.clone()) {
            warn!(%game_id, comment_id = %id, "comment linked more than once; skipping");
            continue;
        }
        let Some(record) = by_id.get(id) else {
            warn!(%game_id, comment_id = %id, "linked comment missing from store; skipping");
            continue;
        };
        nodes.push(CommentNode {
            id: record.id.clone(),
            author: record.author.clone(),
            content: record.content.clone(),
            children: build_nodes(game_id, &record.children, by_id, visited),
        });
    }
    nodes
}

#[cfg(test)]
#[path = "thread_test.rs"]
mod tests;
