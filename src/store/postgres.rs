//! Postgres record store.
//!
//! Games and comments live in plain tables; ordered id lists (`comments`,
//! `children`, `upvotes`) are `TEXT[]` columns. Writers lock the rows they
//! mutate with `SELECT ... FOR UPDATE`, which serializes concurrent appends
//! and toggles on the same game under read-committed isolation.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;

use super::{CommentRecord, GameRecord, LoadMode, RecordStore, StoreError, StoreTx};
use crate::ids::EntityId;

const UNIQUE_VIOLATION: &str = "23505";

const SELECT_GAME: &str = "SELECT id, comments, upvotes FROM games WHERE id = $1";
const SELECT_GAME_FOR_UPDATE: &str = "SELECT id, comments, upvotes FROM games WHERE id = $1 FOR UPDATE";
const SELECT_COMMENT: &str =
    "SELECT id, game_id, parent_id, author, content, children FROM comments WHERE id = $1";
const SELECT_COMMENT_FOR_UPDATE: &str =
    "SELECT id, game_id, parent_id, author, content, children FROM comments WHERE id = $1 FOR UPDATE";

type GameRow = (String, Vec<String>, Vec<String>);
type CommentRow = (String, String, Option<String>, String, String, Vec<String>);

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for PgStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTx { tx }))
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}

pub struct PgTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTx for PgTx {
    async fn load_game(&mut self, id: &EntityId, mode: LoadMode) -> Result<Option<GameRecord>, StoreError> {
        let sql = match mode {
            LoadMode::Read => SELECT_GAME,
            LoadMode::ForUpdate => SELECT_GAME_FOR_UPDATE,
        };
        let row = sqlx::query_as::<_, GameRow>(sql)
            .bind(id.as_str())
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row.map(game_from_row))
    }

    async fn load_comment(&mut self, id: &EntityId, mode: LoadMode) -> Result<Option<CommentRecord>, StoreError> {
        let sql = match mode {
            LoadMode::Read => SELECT_COMMENT,
            LoadMode::ForUpdate => SELECT_COMMENT_FOR_UPDATE,
        };
        let row = sqlx::query_as::<_, CommentRow>(sql)
            .bind(id.as_str())
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row.map(comment_from_row))
    }

    async fn comments_for_game(&mut self, game_id: &EntityId) -> Result<Vec<CommentRecord>, StoreError> {
        let rows = sqlx::query_as::<_, CommentRow>(
            "SELECT id, game_id, parent_id, author, content, children
             FROM comments
             WHERE game_id = $1
             ORDER BY created_at ASC, id ASC",
        )
        .bind(game_id.as_str())
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(rows.into_iter().map(comment_from_row).collect())
    }

    async fn insert_comment(&mut self, comment: &CommentRecord) -> Result<(), StoreError> {
        let result = sqlx::query(
            "INSERT INTO comments (id, game_id, parent_id, author, content, children)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(comment.id.as_str())
        .bind(comment.game_id.as_str())
        .bind(comment.parent_id.as_ref().map(EntityId::as_str))
        .bind(comment.author.as_str())
        .bind(&comment.content)
        .bind(id_strings(&comment.children))
        .execute(&mut *self.tx)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(StoreError::DuplicateId(comment.id.clone())),
            Err(e) => Err(e.into()),
        }
    }

    async fn save_game(&mut self, game: &GameRecord) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE games SET comments = $2, upvotes = $3, updated_at = now() WHERE id = $1")
            .bind(game.id.as_str())
            .bind(id_strings(&game.comments))
            .bind(id_strings(&game.upvotes))
            .execute(&mut *self.tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::Missing(game.id.clone()));
        }
        Ok(())
    }

    async fn save_comment(&mut self, comment: &CommentRecord) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE comments SET children = $2, updated_at = now() WHERE id = $1")
            .bind(comment.id.as_str())
            .bind(id_strings(&comment.children))
            .execute(&mut *self.tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::Missing(comment.id.clone()));
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        debug!("postgres rollback");
        self.tx.rollback().await?;
        Ok(())
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| code == UNIQUE_VIOLATION)
}

fn id_strings(ids: &[EntityId]) -> Vec<String> {
    ids.iter().map(|id| id.as_str().to_owned()).collect()
}

fn ids_from_strings(raw: Vec<String>) -> Vec<EntityId> {
    raw.into_iter().map(EntityId::new).collect()
}

fn game_from_row((id, comments, upvotes): GameRow) -> GameRecord {
    GameRecord { id: EntityId::new(id), comments: ids_from_strings(comments), upvotes: ids_from_strings(upvotes) }
}

fn comment_from_row((id, game_id, parent_id, author, content, children): CommentRow) -> CommentRecord {
    CommentRecord {
        id: EntityId::new(id),
        game_id: EntityId::new(game_id),
        parent_id: parent_id.map(EntityId::new),
        author: EntityId::new(author),
        content,
        children: ids_from_strings(children),
    }
}

#[cfg(test)]
#[path = "postgres_test.rs"]
mod tests;
