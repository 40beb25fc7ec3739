//! Comment service — create a comment and link it into its game's tree.
//!
//! DESIGN
//! ======
//! The tree has two kinds of containers: a game's `comments` list holds
//! top-level comments, and a comment's `children` list holds its replies.
//! Every comment id is linked into exactly one container, in the same
//! transaction that inserts the comment.
//!
//! Rows are locked game first, then parent comment. Every creation takes the
//! locks in that order, so concurrent creations on one game never deadlock.

use tracing::info;

use crate::ids::{self, EntityId};
use crate::services::tx::{self, MutationError, RecordKind, TxPolicy};
use crate::store::{CommentRecord, LoadMode, RecordStore, StoreTx};

/// Validated input for [`create_comment`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub game_id: EntityId,
    pub parent_id: Option<EntityId>,
    /// Authenticated caller, never taken from the request body.
    pub author: EntityId,
    pub content: String,
}

/// Create a comment and return its id once the transaction has committed.
///
/// A fresh id is minted for every attempt, so an id returned from a failed
/// attempt is never referenced anywhere.
///
/// # Errors
///
/// - [`MutationError::NotFound`] if the game or parent comment does not exist.
/// - [`MutationError::Validation`] if the parent belongs to another game.
/// - [`MutationError::Storage`] if the store fails; nothing is committed.
pub async fn create_comment(
    store: &dyn RecordStore,
    policy: TxPolicy,
    input: &NewComment,
) -> Result<EntityId, MutationError> {
    let id = tx::with_retry(policy, "create_comment", move |_attempt| async move {
        let id = ids::new_record_id();
        let mut txn = store.begin().await?;
        let result = link_new_comment(txn.as_mut(), &id, input).await;
        tx::finish(txn, result).await?;
        Ok::<_, MutationError>(id)
    })
    .await?;

    info!(
        comment_id = %id,
        game_id = %input.game_id,
        parent_id = ?input.parent_id.as_ref().map(EntityId::as_str),
        "comment created"
    );
    Ok(id)
}

async fn link_new_comment(tx: &mut dyn StoreTx, id: &EntityId, input: &NewComment) -> Result<(), MutationError> {
    let mut game = tx
        .load_game(&input.game_id, LoadMode::ForUpdate)
        .await?
        .ok_or_else(|| MutationError::not_found(RecordKind::Game, &input.game_id))?;

    let parent = match &input.parent_id {
        Some(parent_id) => {
            let parent = tx
                .load_comment(parent_id, LoadMode::ForUpdate)
                .await?
                .ok_or_else(|| MutationError::not_found(RecordKind::Comment, parent_id))?;
            if parent.game_id != input.game_id {
                return Err(MutationError::Validation(format!(
                    "parent comment {parent_id} belongs to another game"
                )));
            }
            Some(parent)
        }
        None => None,
    };

    tx.insert_comment(&CommentRecord {
        id: id.clone(),
        game_id: input.game_id.clone(),
        parent_id: input.parent_id.clone(),
        author: input.author.clone(),
        content: input.content.clone(),
        children: Vec::new(),
    })
    .await?;

    match parent {
        Some(mut parent) => {
            push_unique(&mut parent.children, id);
            tx.save_comment(&parent).await?;
        }
        None => {
            push_unique(&mut game.comments, id);
            tx.save_game(&game).await?;
        }
    }
    Ok(())
}

fn push_unique(list: &mut Vec<EntityId>, id: &EntityId) {
    if !list.contains(id) {
        list.push(id.clone());
    }
}

#[cfg(test)]
#[path = "comment_test.rs"]
mod tests;
