use std::collections::HashMap;

use super::*;

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();
    move |key| map.get(key).cloned()
}

// =============================================================================
// parse_or
// =============================================================================

#[test]
fn parse_or_missing_returns_default() {
    assert_eq!(parse_or::<u16>("PORT", None, 42), Ok(42));
}

#[test]
fn parse_or_present_valid() {
    assert_eq!(parse_or::<u16>("PORT", Some(" 8080 "), 1), Ok(8080));
}

#[test]
fn parse_or_present_invalid_is_error() {
    let err = parse_or::<u16>("PORT", Some("eighty"), 1).unwrap_err();
    assert_eq!(err, ConfigError::Invalid { key: "PORT", value: "eighty".into() });
}

// =============================================================================
// parse_id_list / parse_sessions
// =============================================================================

#[test]
fn parse_id_list_splits_and_trims() {
    let ids = parse_id_list("MEMORY_SEED_GAMES", Some(" g1, g2 ,,g3")).unwrap();
    assert_eq!(ids, vec![EntityId::new("g1"), EntityId::new("g2"), EntityId::new("g3")]);
}

#[test]
fn parse_id_list_rejects_bad_ids() {
    assert!(parse_id_list("MEMORY_SEED_GAMES", Some("g1,bad id")).is_err());
}

#[test]
fn parse_sessions_parses_pairs() {
    let sessions = parse_sessions(Some("tok1:u1, tok2:u2")).unwrap();
    assert_eq!(
        sessions,
        vec![("tok1".to_owned(), EntityId::new("u1")), ("tok2".to_owned(), EntityId::new("u2"))]
    );
}

#[test]
fn parse_sessions_rejects_missing_separator() {
    assert!(parse_sessions(Some("tok1u1")).is_err());
}

#[test]
fn parse_sessions_rejects_empty_token() {
    assert!(parse_sessions(Some(":u1")).is_err());
}

#[test]
fn parse_sessions_none_is_empty() {
    assert!(parse_sessions(None).unwrap().is_empty());
}

// =============================================================================
// ServerConfig::from_lookup
// =============================================================================

#[test]
fn postgres_backend_requires_database_url() {
    let err = ServerConfig::from_lookup(lookup_from(&[])).unwrap_err();
    assert_eq!(err, ConfigError::Missing("DATABASE_URL"));
}

#[test]
fn postgres_defaults_match_constants() {
    let config = ServerConfig::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://localhost/cyoa")])).unwrap();
    assert_eq!(config.port, DEFAULT_PORT);
    assert_eq!(config.request_timeout_ms, DEFAULT_REQUEST_TIMEOUT_MS);
    assert_eq!(config.tx_policy.max_attempts, DEFAULT_TX_MAX_ATTEMPTS);
    assert_eq!(config.tx_policy.retry_base_ms, DEFAULT_TX_RETRY_BASE_MS);
    assert!(config.static_dir.is_none());
    let StoreBackend::Postgres(pg) = config.backend else {
        panic!("expected postgres backend");
    };
    assert_eq!(pg.database_url, "postgres://localhost/cyoa");
    assert_eq!(pg.max_connections, DEFAULT_DB_MAX_CONNECTIONS);
    assert_eq!(pg.acquire_timeout_ms, DEFAULT_DB_ACQUIRE_TIMEOUT_MS);
}

#[test]
fn memory_backend_reads_seed_data() {
    let config = ServerConfig::from_lookup(lookup_from(&[
        ("STORE_BACKEND", "memory"),
        ("MEMORY_SEED_GAMES", "g1,g2"),
        ("MEMORY_SESSIONS", "secret:u1"),
        ("PORT", "8091"),
        ("STATIC_DIR", "dist"),
    ]))
    .unwrap();
    assert_eq!(config.port, 8091);
    assert_eq!(config.static_dir, Some(PathBuf::from("dist")));
    let StoreBackend::Memory(memory) = config.backend else {
        panic!("expected memory backend");
    };
    assert_eq!(memory.seed_games.len(), 2);
    assert_eq!(memory.sessions, vec![("secret".to_owned(), EntityId::new("u1"))]);
}

#[test]
fn empty_values_are_treated_as_unset() {
    let config = ServerConfig::from_lookup(lookup_from(&[
        ("STORE_BACKEND", "memory"),
        ("PORT", "  "),
        ("STATIC_DIR", ""),
    ]))
    .unwrap();
    assert_eq!(config.port, DEFAULT_PORT);
    assert!(config.static_dir.is_none());
}

#[test]
fn unknown_backend_is_rejected() {
    let err = ServerConfig::from_lookup(lookup_from(&[("STORE_BACKEND", "sqlite")])).unwrap_err();
    assert_eq!(err, ConfigError::Invalid { key: "STORE_BACKEND", value: "sqlite".into() });
}

#[test]
fn zero_attempts_is_rejected() {
    let err = ServerConfig::from_lookup(lookup_from(&[("STORE_BACKEND", "memory"), ("TX_MAX_ATTEMPTS", "0")]))
        .unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { key: "TX_MAX_ATTEMPTS", .. }));
}
