//! Vote service — toggle a user's upvote on a game.
//!
//! DESIGN
//! ======
//! The upvote set lives on the game row and is the only source of truth for
//! the count. A toggle locks the row, flips membership, persists, and reports
//! `count = |upvotes|` from the same transaction. There is no separate
//! counter that could drift from the set.

use std::collections::HashSet;

use serde::Serialize;
use tracing::info;

use crate::ids::EntityId;
use crate::services::tx::{self, MutationError, RecordKind, TxPolicy};
use crate::store::{LoadMode, RecordStore};

/// Membership state after a toggle, or as currently stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VoteState {
    /// Whether the user's upvote is present.
    pub state: bool,
    /// Number of distinct users that upvoted the game.
    pub count: usize,
}

/// Toggle `user_id`'s upvote on `game_id`.
///
/// # Errors
///
/// - [`MutationError::NotFound`] if the game does not exist.
/// - [`MutationError::Storage`] if the store fails; nothing is committed.
pub async fn toggle_upvote(
    store: &dyn RecordStore,
    policy: TxPolicy,
    game_id: &EntityId,
    user_id: &EntityId,
) -> Result<VoteState, MutationError> {
    let outcome = tx::with_retry(policy, "toggle_upvote", move |_attempt| async move {
        let mut txn = store.begin().await?;
        let result = async {
            let mut game = txn
                .load_game(game_id, LoadMode::ForUpdate)
                .await?
                .ok_or_else(|| MutationError::not_found(RecordKind::Game, game_id))?;
            let state = toggle_member(&mut game.upvotes, user_id);
            txn.save_game(&game).await?;
            Ok::<_, MutationError>(VoteState { state, count: game.upvotes.len() })
        }
        .await;
        tx::finish(txn, result).await
    })
    .await?;

    info!(%game_id, %user_id, state = outcome.state, count = outcome.count, "upvote toggled");
    Ok(outcome)
}

/// Report whether `user_id` currently upvotes `game_id`, without mutating.
///
/// # Errors
///
/// - [`MutationError::NotFound`] if the game does not exist.
/// - [`MutationError::Storage`] if the store fails.
pub async fn upvote_status(
    store: &dyn RecordStore,
    game_id: &EntityId,
    user_id: &EntityId,
) -> Result<VoteState, MutationError> {
    let mut txn = store.begin().await?;
    let result = async {
        let game = txn
            .load_game(game_id, LoadMode::Read)
            .await?
            .ok_or_else(|| MutationError::not_found(RecordKind::Game, game_id))?;
        let mut voters = game.upvotes;
        dedup_in_place(&mut voters);
        Ok::<_, MutationError>(VoteState { state: voters.contains(user_id), count: voters.len() })
    }
    .await;
    tx::finish(txn, result).await
}

/// Flip membership of `user_id` in `voters`. Returns the new membership.
///
/// Duplicate entries already present are collapsed first, so the set holds
/// each user at most once afterwards whichever way the toggle goes.
pub(crate) fn toggle_member(voters: &mut Vec<EntityId>, user_id: &EntityId) -> bool {
    dedup_in_place(voters);
    if let Some(pos) = voters.iter().position(|v| v == user_id) {
        voters.remove(pos);
        false
    } else {
        voters.push(user_id.clone());
        true
    }
}

fn dedup_in_place(voters: &mut Vec<EntityId>) {
    let mut seen = HashSet::with_capacity(voters.len());
    voters.retain(|v| seen.insert(v.clone()));
}

#[cfg(test)]
#[path = "vote_test.rs"]
mod tests;
