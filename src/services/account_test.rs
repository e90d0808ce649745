use super::*;
use crate::state::test_helpers;

#[test]
fn normalize_email_accepts_basic_address() {
    assert_eq!(normalize_email("  Renter@Example.com "), Some("renter@example.com".to_owned()));
}

#[test]
fn normalize_email_rejects_invalid_values() {
    assert_eq!(normalize_email(""), None);
    assert_eq!(normalize_email("renter"), None);
    assert_eq!(normalize_email("@example.com"), None);
    assert_eq!(normalize_email("renter@"), None);
    assert_eq!(normalize_email("a@b@c"), None);
}

#[test]
fn account_error_codes() {
    assert_eq!(AccountError::InvalidEmail.error_code(), "E_INVALID_EMAIL");
    assert_eq!(AccountError::EmailTaken.error_code(), "E_EMAIL_TAKEN");
    assert_eq!(AccountError::InvalidCredentials.error_code(), "E_INVALID_CREDENTIALS");
    assert_eq!(AccountError::NotFound(Uuid::nil()).error_code(), "E_USER_NOT_FOUND");
}

#[test]
fn invalid_credentials_message_does_not_reveal_which_part() {
    assert_eq!(AccountError::InvalidCredentials.to_string(), "invalid email or password");
}

#[test]
fn registration_defaults_optional_contact_fields() {
    let form: Registration =
        serde_json::from_str(r#"{"full_name":"Rita Renter","email":"rita@example.com","password":"hunter2hunter2"}"#)
            .unwrap();
    assert_eq!(form.phone_number, "");
    assert_eq!(form.address, "");
}

fn registration(email: &str, full_name: &str, password: &str) -> Registration {
    Registration {
        full_name: full_name.into(),
        email: email.into(),
        phone_number: "555-0100".into(),
        address: "1 Main St".into(),
        password: password.into(),
    }
}

// Validation happens before any database access, so these run without Postgres.

#[tokio::test]
async fn register_rejects_bad_email_before_touching_database() {
    let state = test_helpers::test_app_state();
    let err = register(&state.pool, &state.config, &registration("nope", "Rita", "long-enough-pw"))
        .await
        .unwrap_err();
    assert!(matches!(err, AccountError::InvalidEmail));
}

#[tokio::test]
async fn register_rejects_blank_name() {
    let state = test_helpers::test_app_state();
    let err = register(&state.pool, &state.config, &registration("rita@example.com", "   ", "long-enough-pw"))
        .await
        .unwrap_err();
    assert!(matches!(err, AccountError::MissingName));
}

#[tokio::test]
async fn register_rejects_short_password() {
    let state = test_helpers::test_app_state();
    let err = register(&state.pool, &state.config, &registration("rita@example.com", "Rita", "short"))
        .await
        .unwrap_err();
    assert!(matches!(err, AccountError::WeakPassword(_)));
}

#[tokio::test]
async fn authenticate_rejects_malformed_email_as_invalid_credentials() {
    let state = test_helpers::test_app_state();
    let err = authenticate(&state.pool, "not-an-email", "whatever").await.unwrap_err();
    assert!(matches!(err, AccountError::InvalidCredentials));
}
