//! Transaction helpers shared by the comment and vote services.
//!
//! DESIGN
//! ======
//! A service operation is a transaction script: open, load, mutate, commit.
//! [`finish`] commits on success and rolls back on any error, so no script
//! ever publishes partial state. [`with_retry`] reruns a whole script when the
//! store reports a retryable conflict; each attempt re-reads current state.
//!
//! TRADE-OFFS
//! ==========
//! Retries are bounded and use linear back-off. Conflicts that survive every
//! attempt are surfaced to the caller rather than queued.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::ErrorCode;
use crate::ids::EntityId;
use crate::store::{StoreError, StoreTx};

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Game,
    Comment,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Game => "game",
            Self::Comment => "comment",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MutationError {
    #[error("invalid request: {0}")]
    Validation(String),
    #[error("referenced {kind} not found: {id}")]
    NotFound { kind: RecordKind, id: EntityId },
    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl MutationError {
    pub(crate) fn not_found(kind: RecordKind, id: &EntityId) -> Self {
        Self::NotFound { kind, id: id.clone() }
    }
}

impl ErrorCode for MutationError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "E_VALIDATION",
            Self::NotFound { .. } => "E_NOT_FOUND",
            Self::Storage(e) => e.error_code(),
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Storage(e) => e.retryable(),
            _ => false,
        }
    }
}

// =============================================================================
// POLICY
// =============================================================================

/// Retry policy for transaction scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxPolicy {
    /// Total attempts, including the first. Always at least 1.
    pub max_attempts: u32,
    /// Back-off before attempt `n + 1` is `n * retry_base_ms`.
    pub retry_base_ms: u64,
}

impl Default for TxPolicy {
    fn default() -> Self {
        Self {
            max_attempts: crate::config::DEFAULT_TX_MAX_ATTEMPTS,
            retry_base_ms: crate::config::DEFAULT_TX_RETRY_BASE_MS,
        }
    }
}

impl TxPolicy {
    /// Single attempt, no retry.
    #[must_use]
    pub fn once() -> Self {
        Self { max_attempts: 1, retry_base_ms: 0 }
    }
}

// =============================================================================
// HELPERS
// =============================================================================

/// Commit `tx` if `result` is `Ok`, otherwise roll it back and return the error.
///
/// # Errors
///
/// Returns the script error, or the commit error if commit fails.
pub async fn finish<T>(tx: Box<dyn StoreTx>, result: Result<T, MutationError>) -> Result<T, MutationError> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                // The transaction is discarded either way once the connection drops.
                warn!(error = %rollback_err, cause = %err, "rollback failed");
            }
            Err(err)
        }
    }
}

/// Run `script` until it succeeds, fails with a non-retryable error, or the
/// policy's attempts are exhausted.
///
/// # Errors
///
/// Returns the last error produced by `script`.
pub async fn with_retry<T, F, Fut>(policy: TxPolicy, operation: &'static str, mut script: F) -> Result<T, MutationError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, MutationError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match script(attempt).await {
            Err(e) if e.retryable() && attempt < max_attempts => {
                warn!(error = %e, operation, attempt, total = max_attempts, "transaction conflict; retrying");
                tokio::time::sleep(Duration::from_millis(u64::from(attempt) * policy.retry_base_ms)).await;
                attempt += 1;
            }
            other => return other,
        }
    }
}

#[cfg(test)]
#[path = "tx_test.rs"]
mod tests;
