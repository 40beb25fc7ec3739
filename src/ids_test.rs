use super::*;

// =============================================================================
// new_record_id
// =============================================================================

#[test]
fn new_record_id_has_default_length() {
    assert_eq!(new_record_id().as_str().len(), DEFAULT_ID_LENGTH);
}

#[test]
fn new_record_id_uses_lowercase_alphanumerics() {
    let id = new_record_id();
    assert!(id.as_str().bytes().all(|b| DEFAULT_ID_ALPHABET.contains(&b)));
}

#[test]
fn new_record_id_two_calls_differ() {
    assert_ne!(new_record_id(), new_record_id());
}

#[test]
fn random_id_respects_custom_alphabet() {
    let id = random_id(8, b"x");
    assert_eq!(id.as_str(), "xxxxxxxx");
}

// =============================================================================
// EntityId::parse
// =============================================================================

#[test]
fn parse_accepts_plain_id() {
    assert_eq!(EntityId::parse("g1").unwrap().as_str(), "g1");
}

#[test]
fn parse_trims_whitespace() {
    assert_eq!(EntityId::parse("  abc123  ").unwrap().as_str(), "abc123");
}

#[test]
fn parse_rejects_empty() {
    assert!(EntityId::parse("").is_err());
    assert!(EntityId::parse("   ").is_err());
}

#[test]
fn parse_rejects_invalid_characters() {
    assert!(EntityId::parse("a b").is_err());
    assert!(EntityId::parse("a/b").is_err());
    assert!(EntityId::parse("é").is_err());
}

#[test]
fn parse_rejects_overlong() {
    let raw = "a".repeat(MAX_ID_LENGTH + 1);
    assert!(EntityId::parse(&raw).is_err());
    assert!(EntityId::parse(&"a".repeat(MAX_ID_LENGTH)).is_ok());
}

#[test]
fn entity_id_serializes_as_plain_string() {
    let json = serde_json::to_string(&EntityId::new("c1")).unwrap();
    assert_eq!(json, "\"c1\"");
}
