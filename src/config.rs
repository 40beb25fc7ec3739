//! Server configuration parsed from environment variables.
//!
//! `main` loads an optional `.env` file first, then calls
//! [`ServerConfig::from_env`]. Parsing helpers take raw `Option<&str>` values
//! so they can be tested without touching the process environment.

use std::path::PathBuf;

use crate::ids::EntityId;
use crate::services::tx::TxPolicy;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_DB_ACQUIRE_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_TX_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_TX_RETRY_BASE_MS: u64 = 20;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required env var {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostgresConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout_ms: u64,
}

/// Seed data for the in-memory backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryConfig {
    pub seed_games: Vec<EntityId>,
    /// `(token, user_id)` pairs accepted by the in-memory identity provider.
    pub sessions: Vec<(String, EntityId)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres(PostgresConfig),
    Memory(MemoryConfig),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub backend: StoreBackend,
    pub tx_policy: TxPolicy,
    pub request_timeout_ms: u64,
    /// Directory of built frontend assets served as the router fallback.
    pub static_dir: Option<PathBuf>,
}

impl ServerConfig {
    /// Build typed server config from environment variables.
    ///
    /// Optional:
    /// - `PORT`: default 3000
    /// - `STORE_BACKEND`: `postgres` (default) or `memory`
    /// - `DATABASE_URL`: required for `postgres`
    /// - `DB_MAX_CONNECTIONS`: default 5
    /// - `DB_ACQUIRE_TIMEOUT_MS`: default 5000
    /// - `TX_MAX_ATTEMPTS`: default 3
    /// - `TX_RETRY_BASE_MS`: default 20
    /// - `REQUEST_TIMEOUT_MS`: default 10000
    /// - `STATIC_DIR`: unset disables static serving
    /// - `MEMORY_SEED_GAMES`: comma separated game ids
    /// - `MEMORY_SESSIONS`: comma separated `token:user_id` pairs
    ///
    /// # Errors
    ///
    /// Returns an error if a value is malformed or `DATABASE_URL` is missing
    /// for the postgres backend.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let backend = match get("STORE_BACKEND").as_deref().map(str::trim).unwrap_or("postgres") {
            "postgres" => StoreBackend::Postgres(PostgresConfig {
                database_url: get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
                max_connections: parse_or("DB_MAX_CONNECTIONS", get("DB_MAX_CONNECTIONS").as_deref(), DEFAULT_DB_MAX_CONNECTIONS)?,
                acquire_timeout_ms: parse_or(
                    "DB_ACQUIRE_TIMEOUT_MS",
                    get("DB_ACQUIRE_TIMEOUT_MS").as_deref(),
                    DEFAULT_DB_ACQUIRE_TIMEOUT_MS,
                )?,
            }),
            "memory" => StoreBackend::Memory(MemoryConfig {
                seed_games: parse_id_list("MEMORY_SEED_GAMES", get("MEMORY_SEED_GAMES").as_deref())?,
                sessions: parse_sessions(get("MEMORY_SESSIONS").as_deref())?,
            }),
            other => return Err(ConfigError::Invalid { key: "STORE_BACKEND", value: other.to_owned() }),
        };

        let max_attempts = parse_or("TX_MAX_ATTEMPTS", get("TX_MAX_ATTEMPTS").as_deref(), DEFAULT_TX_MAX_ATTEMPTS)?;
        if max_attempts == 0 {
            return Err(ConfigError::Invalid { key: "TX_MAX_ATTEMPTS", value: "0".into() });
        }

        Ok(Self {
            port: parse_or("PORT", get("PORT").as_deref(), DEFAULT_PORT)?,
            backend,
            tx_policy: TxPolicy {
                max_attempts,
                retry_base_ms: parse_or("TX_RETRY_BASE_MS", get("TX_RETRY_BASE_MS").as_deref(), DEFAULT_TX_RETRY_BASE_MS)?,
            },
            request_timeout_ms: parse_or(
                "REQUEST_TIMEOUT_MS",
                get("REQUEST_TIMEOUT_MS").as_deref(),
                DEFAULT_REQUEST_TIMEOUT_MS,
            )?,
            static_dir: get("STATIC_DIR").map(PathBuf::from),
        })
    }
}

pub(crate) fn parse_or<T>(key: &'static str, raw: Option<&str>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { key, value: value.to_owned() }),
    }
}

pub(crate) fn parse_id_list(key: &'static str, raw: Option<&str>) -> Result<Vec<EntityId>, ConfigError> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| EntityId::parse(part).map_err(|_| ConfigError::Invalid { key, value: part.to_owned() }))
        .collect()
}

pub(crate) fn parse_sessions(raw: Option<&str>) -> Result<Vec<(String, EntityId)>, ConfigError> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    let invalid = |part: &str| ConfigError::Invalid { key: "MEMORY_SESSIONS", value: part.to_owned() };
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            let (token, user) = part.split_once(':').ok_or_else(|| invalid(part))?;
            let token = token.trim();
            if token.is_empty() {
                return Err(invalid(part));
            }
            let user = EntityId::parse(user).map_err(|_| invalid(part))?;
            Ok((token.to_owned(), user))
        })
        .collect()
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
