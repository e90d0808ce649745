//! Account service: registration, password sign-in, profile lookup.

use serde::Serialize;
use sqlx::{PgPool, Row};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::db;
use crate::notice::ErrorCode;
use crate::services::password;

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("invalid email")]
    InvalidEmail,
    #[error("full name is required")]
    MissingName,
    #[error("{0}")]
    WeakPassword(String),
    #[error("email already registered")]
    EmailTaken,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("user not found: {0}")]
    NotFound(Uuid),
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ErrorCode for AccountError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidEmail => "E_INVALID_EMAIL",
            Self::MissingName => "E_MISSING_NAME",
            Self::WeakPassword(_) => "E_WEAK_PASSWORD",
            Self::EmailTaken => "E_EMAIL_TAKEN",
            Self::InvalidCredentials => "E_INVALID_CREDENTIALS",
            Self::NotFound(_) => "E_USER_NOT_FOUND",
            Self::Hashing(_) => "E_PASSWORD_HASH",
            Self::Database(_) => "E_DATABASE",
        }
    }
}

/// Registration form.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct Registration {
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub address: String,
    pub password: String,
}

/// Public view of a `users` row. Never carries the password hash.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
    pub address: String,
    pub is_admin: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[must_use]
pub fn normalize_email(email: &str) -> Option<String> {
    let normalized = email.trim().to_ascii_lowercase();
    let (local, domain) = normalized.split_once('@')?;
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return None;
    }
    Some(normalized)
}

/// Register a new customer (or admin, when the email is listed in config).
///
/// # Errors
///
/// Returns a validation error for bad input, `EmailTaken` for a duplicate
/// email, or a database error.
pub async fn register(pool: &PgPool, config: &AppConfig, form: &Registration) -> Result<UserProfile, AccountError> {
    let email = normalize_email(&form.email).ok_or(AccountError::InvalidEmail)?;
    let full_name = form.full_name.trim();
    if full_name.is_empty() {
        return Err(AccountError::MissingName);
    }
    password::validate_password_strength(&form.password, config.min_password_len)
        .map_err(AccountError::WeakPassword)?;
    let password_hash = password::hash_password(&form.password).map_err(|e| AccountError::Hashing(e.to_string()))?;
    let is_admin = config.is_admin_email(&email);

    let row = sqlx::query(
        r"INSERT INTO users (full_name, email, phone_number, address, is_admin, password_hash)
          VALUES ($1, $2, $3, $4, $5, $6)
          RETURNING id, full_name, email, phone_number, address, is_admin, created_at",
    )
    .bind(full_name)
    .bind(&email)
    .bind(form.phone_number.trim())
    .bind(form.address.trim())
    .bind(is_admin)
    .bind(password_hash)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        if db::violated_constraint(&e, db::UNIQUE_VIOLATION).is_some() {
            AccountError::EmailTaken
        } else {
            AccountError::Database(e)
        }
    })?;

    let profile = profile_from_row(&row);
    tracing::info!(user_id = %profile.id, is_admin, "user registered");
    Ok(profile)
}

/// Check credentials and return the user id.
///
/// # Errors
///
/// Returns `InvalidCredentials` for an unknown email or wrong password.
pub async fn authenticate(pool: &PgPool, email: &str, password_input: &str) -> Result<Uuid, AccountError> {
    let email = normalize_email(email).ok_or(AccountError::InvalidCredentials)?;
    let row = sqlx::query("SELECT id, password_hash FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(pool)
        .await?
        .ok_or(AccountError::InvalidCredentials)?;

    let user_id: Uuid = row.get("id");
    let hash: String = row.get("password_hash");
    let matches = password::verify_password(password_input, &hash).map_err(|e| AccountError::Hashing(e.to_string()))?;
    if !matches {
        tracing::warn!(%user_id, "password mismatch");
        return Err(AccountError::InvalidCredentials);
    }
    Ok(user_id)
}

/// Load one user's profile.
///
/// # Errors
///
/// Returns `NotFound` if the user does not exist, or a database error.
pub async fn fetch_profile(pool: &PgPool, user_id: Uuid) -> Result<UserProfile, AccountError> {
    let row = sqlx::query(
        "SELECT id, full_name, email, phone_number, address, is_admin, created_at FROM users WHERE id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AccountError::NotFound(user_id))?;
    Ok(profile_from_row(&row))
}

fn profile_from_row(row: &sqlx::postgres::PgRow) -> UserProfile {
    UserProfile {
        id: row.get("id"),
        full_name: row.get("full_name"),
        email: row.get("email"),
        phone_number: row.get("phone_number"),
        address: row.get("address"),
        is_admin: row.get("is_admin"),
        created_at: row.get("created_at"),
    }
}

#[cfg(test)]
#[path = "account_test.rs"]
mod tests;
