//! Upvote routes.

use axum::extract::{Path, State};
use axum::response::Json;
use serde::Serialize;

use crate::error::ApiError;
use crate::ids::EntityId;
use crate::routes::auth::AuthUser;
use crate::routes::comments::parse_id;
use crate::services::vote::{self, VoteState};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct UpvoteResponse {
    pub id: EntityId,
    pub state: bool,
    pub count: usize,
}

fn to_response(id: EntityId, vote: VoteState) -> UpvoteResponse {
    UpvoteResponse { id, state: vote.state, count: vote.count }
}

/// `POST /api/custom/upvotes/{id}` — toggle the caller's upvote on a game.
pub async fn toggle_upvote(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(game_id): Path<String>,
) -> Result<Json<UpvoteResponse>, ApiError> {
    let game_id = parse_id("game id", &game_id)?;
    let vote = vote::toggle_upvote(state.store.as_ref(), state.tx_policy, &game_id, &auth.user_id).await?;
    Ok(Json(to_response(game_id, vote)))
}

/// `GET /api/custom/upvotes/{id}` — the caller's current upvote state.
pub async fn upvote_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(game_id): Path<String>,
) -> Result<Json<UpvoteResponse>, ApiError> {
    let game_id = parse_id("game id", &game_id)?;
    let vote = vote::upvote_status(state.store.as_ref(), &game_id, &auth.user_id).await?;
    Ok(Json(to_response(game_id, vote)))
}

#[cfg(test)]
#[path = "upvotes_test.rs"]
mod tests;
