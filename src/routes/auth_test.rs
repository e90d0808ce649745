use super::*;
use axum::http::HeaderValue;
use axum::http::header::COOKIE;

use crate::state::test_helpers;

fn headers(pairs: &[(axum::http::HeaderName, &str)]) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (name, value) in pairs {
        map.insert(name.clone(), HeaderValue::from_str(value).unwrap());
    }
    map
}

// =============================================================================
// request_token
// =============================================================================

#[test]
fn request_token_reads_cookie() {
    let map = headers(&[(COOKIE, "theme=dark; session_token=abc123")]);
    assert_eq!(request_token(&map).as_deref(), Some("abc123"));
}

#[test]
fn request_token_falls_back_to_bearer() {
    let map = headers(&[(AUTHORIZATION, "Bearer tok-456")]);
    assert_eq!(request_token(&map).as_deref(), Some("tok-456"));
}

#[test]
fn request_token_prefers_cookie_over_bearer() {
    let map = headers(&[(COOKIE, "session_token=from-cookie"), (AUTHORIZATION, "Bearer from-header")]);
    assert_eq!(request_token(&map).as_deref(), Some("from-cookie"));
}

#[test]
fn request_token_ignores_empty_and_non_bearer_values() {
    assert_eq!(request_token(&headers(&[(COOKIE, "session_token=")])), None);
    assert_eq!(request_token(&headers(&[(AUTHORIZATION, "Basic dXNlcjpwYXNz")])), None);
    assert_eq!(request_token(&headers(&[(AUTHORIZATION, "Bearer   ")])), None);
    assert_eq!(request_token(&HeaderMap::new()), None);
}

// =============================================================================
// cookies
// =============================================================================

#[test]
fn session_cookie_is_http_only_with_ttl() {
    let config = test_helpers::test_config();
    let cookie = session_cookie("tok".into(), &config);
    assert_eq!(cookie.name(), COOKIE_NAME);
    assert_eq!(cookie.value(), "tok");
    assert_eq!(cookie.http_only(), Some(true));
    assert_eq!(cookie.path(), Some("/"));
    assert_eq!(cookie.max_age(), Some(Duration::hours(config.session_ttl_hours)));
    assert_eq!(cookie.secure(), Some(false));
}

#[test]
fn session_cookie_honors_secure_flag() {
    let mut config = test_helpers::test_config();
    config.cookie_secure = true;
    assert_eq!(session_cookie("tok".into(), &config).secure(), Some(true));
}

#[test]
fn cleared_cookie_expires_immediately() {
    let cookie = cleared_cookie(&test_helpers::test_config());
    assert_eq!(cookie.value(), "");
    assert_eq!(cookie.max_age(), Some(Duration::ZERO));
}

// =============================================================================
// status mapping
// =============================================================================

#[test]
fn account_errors_map_to_statuses() {
    assert_eq!(account_error_to_status(&AccountError::InvalidEmail), StatusCode::BAD_REQUEST);
    assert_eq!(account_error_to_status(&AccountError::WeakPassword("short".into())), StatusCode::BAD_REQUEST);
    assert_eq!(account_error_to_status(&AccountError::EmailTaken), StatusCode::CONFLICT);
    assert_eq!(account_error_to_status(&AccountError::InvalidCredentials), StatusCode::UNAUTHORIZED);
    assert_eq!(account_error_to_status(&AccountError::NotFound(Uuid::nil())), StatusCode::NOT_FOUND);
    assert_eq!(
        account_error_to_status(&AccountError::Hashing("boom".into())),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

// =============================================================================
// extractors
// =============================================================================

fn parts_with(headers: HeaderMap) -> Parts {
    let mut request = axum::http::Request::builder().uri("/api/auth/me").body(()).unwrap();
    *request.headers_mut() = headers;
    request.into_parts().0
}

#[tokio::test]
async fn auth_user_without_token_is_unauthorized() {
    let state = test_helpers::test_app_state();
    let mut parts = parts_with(HeaderMap::new());
    let result = AuthUser::from_request_parts(&mut parts, &state).await;
    assert!(matches!(result.err(), Some(AuthError::Unauthorized)));
}

#[tokio::test]
async fn auth_user_lookup_failure_is_server_error() {
    let state = test_helpers::test_app_state();
    let mut parts = parts_with(headers(&[(COOKIE, "session_token=deadbeef")]));
    let result = AuthUser::from_request_parts(&mut parts, &state).await;
    assert!(matches!(result.err(), Some(AuthError::SessionLookup(_))));
}

#[tokio::test]
async fn admin_user_without_token_is_unauthorized() {
    let state = test_helpers::test_app_state();
    let mut parts = parts_with(HeaderMap::new());
    let result = AdminUser::from_request_parts(&mut parts, &state).await;
    assert!(matches!(result.err(), Some(AuthError::Unauthorized)));
}

// =============================================================================
// rejection bodies
// =============================================================================

async fn rejection_json(err: AuthError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn unauthorized_rejection_is_notice() {
    let (status, json) = rejection_json(AuthError::Unauthorized).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["ok"], false);
    assert_eq!(json["code"], "E_UNAUTHORIZED");
    assert_eq!(json["message"], "sign in required");
}

#[tokio::test]
async fn forbidden_rejection_is_notice() {
    let (status, json) = rejection_json(AuthError::Forbidden).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "E_FORBIDDEN");
}
