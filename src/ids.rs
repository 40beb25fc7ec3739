//! Record identifiers.
//!
//! Ids are short opaque strings. New ids are minted by the service before any
//! store write, so a caller always knows the id it is about to create.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

pub const DEFAULT_ID_LENGTH: usize = 15;
pub const DEFAULT_ID_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
pub const MAX_ID_LENGTH: usize = 64;

/// Identifier of a stored record (game, comment, or user).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Wrap an id that is already known to be well formed.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Parse an id received from a client.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem if the id is empty, too long, or
    /// contains characters outside `[A-Za-z0-9_-]`.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err("id must not be empty".into());
        }
        if raw.len() > MAX_ID_LENGTH {
            return Err(format!("id longer than {MAX_ID_LENGTH} bytes"));
        }
        if !raw.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-') {
            return Err(format!("id {raw:?} contains invalid characters"));
        }
        Ok(Self(raw.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Mint a fresh random id of [`DEFAULT_ID_LENGTH`] characters.
#[must_use]
pub fn new_record_id() -> EntityId {
    random_id(DEFAULT_ID_LENGTH, DEFAULT_ID_ALPHABET)
}

pub(crate) fn random_id(length: usize, alphabet: &[u8]) -> EntityId {
    let mut rng = rand::rng();
    let id = (0..length)
        .map(|_| char::from(alphabet[rng.random_range(0..alphabet.len())]))
        .collect::<String>();
    EntityId(id)
}

#[cfg(test)]
#[path = "ids_test.rs"]
mod tests;
