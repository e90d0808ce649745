use super::*;
#[cfg(feature = "live-db-tests")]
use crate::state::test_helpers;

// =============================================================================
// bytes_to_hex
// =============================================================================

#[test]
fn bytes_to_hex_empty() {
    assert_eq!(bytes_to_hex(&[]), "");
}

#[test]
fn bytes_to_hex_leading_zero() {
    assert_eq!(bytes_to_hex(&[0x0a]), "0a");
}

#[test]
fn bytes_to_hex_multi_byte() {
    assert_eq!(bytes_to_hex(&[0xde, 0xad, 0xbe, 0xef]), "deadbeef");
}

// =============================================================================
// generate_token / hash_token
// =============================================================================

#[test]
fn generate_token_is_64_hex_chars() {
    let token = generate_token();
    assert_eq!(token.len(), 64);
    assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn generate_token_two_calls_differ() {
    assert_ne!(generate_token(), generate_token());
}

#[test]
fn hash_token_is_stable_and_distinct_from_token() {
    let token = generate_token();
    let a = hash_token(&token);
    let b = hash_token(&token);
    assert_eq!(a, b);
    assert_ne!(a, token);
    assert_eq!(a.len(), 64);
}

#[test]
fn hash_token_known_vector() {
    assert_eq!(
        hash_token("abc"),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
}

// =============================================================================
// SessionUser
// =============================================================================

#[test]
fn session_user_serializes_admin_flag() {
    let user = SessionUser {
        id: Uuid::nil(),
        full_name: "Ada Admin".into(),
        email: "ada@example.com".into(),
        is_admin: true,
    };
    let json = serde_json::to_value(&user).unwrap();
    assert_eq!(json["full_name"], "Ada Admin");
    assert_eq!(json["is_admin"], true);
}

#[tokio::test]
async fn validate_session_without_database_is_error() {
    let state = crate::state::test_helpers::test_app_state();
    assert!(validate_session(&state.pool, "deadbeef").await.is_err());
}

#[tokio::test]
async fn create_session_without_database_is_error() {
    let state = crate::state::test_helpers::test_app_state();
    assert!(create_session(&state.pool, Uuid::new_v4(), 1).await.is_err());
}

// =============================================================================
// live database
// =============================================================================

#[cfg(feature = "live-db-tests")]
#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL/live Postgres"]
async fn create_session_purges_expired_rows() {
    let pool = test_helpers::integration_pool().await;
    let user_id = test_helpers::seed_user(&pool, false).await;
    let stale = hash_token(&generate_token());
    sqlx::query(
        "INSERT INTO sessions (token_hash, user_id, expires_at) VALUES ($1, $2, now() - interval '1 hour')",
    )
    .bind(&stale)
    .bind(user_id)
    .execute(&pool)
    .await
    .unwrap();

    let token = create_session(&pool, user_id, 1).await.unwrap();

    let stale_rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessions WHERE token_hash = $1")
        .bind(&stale)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(stale_rows, 0);
    let user = validate_session(&pool, &token).await.unwrap().expect("fresh session is valid");
    assert_eq!(user.id, user_id);
}
