//! Comment routes — create a comment, read a game's thread.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::Json;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::ids::EntityId;
use crate::routes::auth::AuthUser;
use crate::services::comment::{self, NewComment};
use crate::services::thread::{self, CommentNode};
use crate::services::tx::MutationError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateCommentBody {
    pub game_id: Option<String>,
    pub parent_id: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreatedComment {
    pub id: EntityId,
}

/// `POST /api/custom/comments` — create a comment as the authenticated user.
pub async fn create_comment(
    State(state): State<AppState>,
    auth: AuthUser,
    body: Result<Json<CreateCommentBody>, JsonRejection>,
) -> Result<Json<CreatedComment>, ApiError> {
    let Json(body) = body.map_err(|e| MutationError::Validation(e.body_text()))?;
    let input = parse_new_comment(body, auth.user_id)?;
    let id = comment::create_comment(state.store.as_ref(), state.tx_policy, &input).await?;
    Ok(Json(CreatedComment { id }))
}

/// `GET /api/custom/games/{id}/comments` — nested comment thread.
pub async fn game_thread(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
) -> Result<Json<Vec<CommentNode>>, ApiError> {
    let game_id = parse_id("game id", &game_id)?;
    let nodes = thread::load_thread(state.store.as_ref(), &game_id).await?;
    Ok(Json(nodes))
}

/// Validate a request body into service input. No transaction is opened for
/// malformed input.
pub(crate) fn parse_new_comment(body: CreateCommentBody, author: EntityId) -> Result<NewComment, MutationError> {
    let game_id = match body.game_id.as_deref() {
        Some(raw) => parse_id("game_id", raw)?,
        None => return Err(MutationError::Validation("game_id is required".into())),
    };
    // An empty parent_id means top-level, the same as an absent one.
    let parent_id = match body.parent_id.as_deref().map(str::trim) {
        Some("") | None => None,
        Some(raw) => Some(parse_id("parent_id", raw)?),
    };
    // Content is opaque; any present string, empty included, is stored as sent.
    let content = body
        .content
        .ok_or_else(|| MutationError::Validation("content is required".into()))?;
    Ok(NewComment { game_id, parent_id, author, content })
}

pub(crate) fn parse_id(field: &str, raw: &str) -> Result<EntityId, MutationError> {
    EntityId::parse(raw).map_err(|e| MutationError::Validation(format!("{field}: {e}")))
}

#[cfg(test)]
#[path = "comments_test.rs"]
mod tests;
