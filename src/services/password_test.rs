use super::*;

#[test]
fn hash_then_verify_accepts_same_password() {
    let hash = hash_password("correct-horse-battery").expect("hashing should succeed");
    assert!(hash.starts_with("$argon2id$"), "expected argon2id PHC prefix");
    assert!(verify_password("correct-horse-battery", &hash).expect("verify should succeed"));
}

#[test]
fn verify_rejects_wrong_password() {
    let hash = hash_password("real-password").expect("hashing should succeed");
    assert!(!verify_password("wrong-password", &hash).expect("verify should succeed"));
}

#[test]
fn verify_malformed_hash_is_error() {
    assert!(verify_password("anything", "not-a-phc-string").is_err());
}

#[test]
fn hashes_are_salted() {
    let a = hash_password("same-password").unwrap();
    let b = hash_password("same-password").unwrap();
    assert_ne!(a, b);
}

#[test]
fn strength_rejects_short_password() {
    let err = validate_password_strength("short", 8).unwrap_err();
    assert!(err.contains("at least 8 characters"));
}

#[test]
fn strength_counts_characters_not_bytes() {
    assert!(validate_password_strength("ééééééé", 8).is_err());
    assert!(validate_password_strength("éééééééé", 8).is_ok());
}
