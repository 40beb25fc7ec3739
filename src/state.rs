//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds the record store and the identity provider behind trait objects,
//! so the same handlers run against Postgres in production and the memory
//! backend in tests and local development.

use std::sync::Arc;

use crate::services::session::IdentityProvider;
use crate::services::tx::TxPolicy;
use crate::store::RecordStore;

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; every field is Arc-wrapped or Copy.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub tx_policy: TxPolicy,
}

impl AppState {
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>, identity: Arc<dyn IdentityProvider>, tx_policy: TxPolicy) -> Self {
        Self { store, identity, tx_policy }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
