// Token namespace tests
// Base namespace and owner-derived namespaces

use lockmint::identity::Keypair;
use lockmint::ledger::TokenId;

// ============================================================================
// DERIVATION
// ============================================================================

/// Test: deriving twice from the same owner gives the same namespace
#[test]
fn test_derivation_is_deterministic() {
    let keypair = Keypair::generate();

    let first = TokenId::derive(&keypair.public_key());
    let second = TokenId::derive(&keypair.public_key());

    assert_eq!(first, second);
}

/// Test: different owners get different namespaces
#[test]
fn test_distinct_owners_get_distinct_namespaces() {
    let a = Keypair::generate();
    let b = Keypair::generate();

    let token_a = TokenId::derive(&a.public_key());
    let token_b = TokenId::derive(&b.public_key());

    assert_ne!(token_a, token_b);
}

/// Test: a derived namespace is never the base namespace
#[test]
fn test_derived_namespace_is_not_base() {
    let keypair = Keypair::generate();

    let token = TokenId::derive(&keypair.public_key());

    assert!(!token.is_base());
    assert_ne!(token, TokenId::BASE);
}

#[test]
fn test_base_is_base() {
    assert!(TokenId::BASE.is_base());
}

// ============================================================================
// ENCODING
// ============================================================================

/// Test: byte round trip preserves the namespace
#[test]
fn test_byte_round_trip() {
    let keypair = Keypair::generate();
    let token = TokenId::derive(&keypair.public_key());

    let bytes = token.to_bytes();
    let restored = TokenId::from_bytes(&bytes).unwrap();

    assert_eq!(token, restored);
}

/// Test: hex round trip preserves the namespace
#[test]
fn test_hex_round_trip() {
    let keypair = Keypair::generate();
    let token = TokenId::derive(&keypair.public_key());

    let hex = token.to_hex();
    let restored = TokenId::from_hex(&hex).unwrap();

    assert_eq!(token, restored);
    assert_eq!(hex.len(), 64);
}

/// Test: malformed inputs are rejected
#[test]
fn test_invalid_encodings_are_rejected() {
    assert!(TokenId::from_bytes(&[1u8; 16]).is_err());
    assert!(TokenId::from_bytes(&[]).is_err());
    assert!(TokenId::from_hex("not hex at all").is_err());
    assert!(TokenId::from_hex("abcd").is_err());
}

/// Test: postcard round trip preserves the namespace
#[test]
fn test_postcard_round_trip() {
    let keypair = Keypair::generate();
    let token = TokenId::derive(&keypair.public_key());

    let encoded = postcard::to_allocvec(&token).unwrap();
    let decoded: TokenId = postcard::from_bytes(&encoded).unwrap();

    assert_eq!(token, decoded);
}
