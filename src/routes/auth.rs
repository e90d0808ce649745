//! Auth routes: registration, password sign-in, session management.

use axum::extract::{FromRef, FromRequestParts, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use time::Duration;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::notice::{self, ErrorCode};
use crate::routes::extract::ApiJson;
use crate::services::account::{self, AccountError, Registration};
use crate::services::session;
use crate::state::AppState;

pub(crate) const COOKIE_NAME: &str = "session_token";

/// Session token from the `session_token` cookie, falling back to a bearer token.
pub(crate) fn request_token(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(COOKIE_NAME).filter(|c| !c.value().is_empty()) {
        return Some(cookie.value().to_owned());
    }
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
}

fn session_cookie(token: String, config: &AppConfig) -> Cookie<'static> {
    Cookie::build((COOKIE_NAME, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.cookie_secure)
        .max_age(Duration::hours(config.session_ttl_hours))
        .build()
}

fn cleared_cookie(config: &AppConfig) -> Cookie<'static> {
    Cookie::build((COOKIE_NAME, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.cookie_secure)
        .max_age(Duration::ZERO)
        .build()
}

// =============================================================================
// AUTH EXTRACTORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("sign in required")]
    Unauthorized,
    #[error("admin access required")]
    Forbidden,
    #[error("session lookup failed: {0}")]
    SessionLookup(#[from] sqlx::Error),
}

impl ErrorCode for AuthError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "E_UNAUTHORIZED",
            Self::Forbidden => "E_FORBIDDEN",
            Self::SessionLookup(_) => "E_DATABASE",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::SessionLookup(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        notice::error(status, &self)
    }
}

/// Authenticated user extracted from the session cookie or bearer token.
/// Use as a handler parameter to require authentication.
pub struct AuthUser {
    pub user: session::SessionUser,
    pub token: String,
}

impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = request_token(&parts.headers).ok_or(AuthError::Unauthorized)?;

        let app_state = AppState::from_ref(state);
        let user = session::validate_session(&app_state.pool, &token)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        Ok(Self { user, token })
    }
}

/// Authenticated user with the admin flag. Non-admins get 403.
pub struct AdminUser(pub AuthUser);

impl<S> FromRequestParts<S> for AdminUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth = AuthUser::from_request_parts(parts, state).await?;
        if !auth.user.is_admin {
            tracing::warn!(user_id = %auth.user.id, path = %parts.uri.path(), "admin route denied");
            return Err(AuthError::Forbidden);
        }
        Ok(Self(auth))
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// `POST /api/auth/register`: create the account and sign in.
pub async fn register(State(state): State<AppState>, ApiJson(form): ApiJson<Registration>) -> Response {
    match account::register(&state.pool, &state.config, &form).await {
        Ok(profile) => {
            let user_id = profile.id;
            start_session(&state, user_id, StatusCode::CREATED, "Registration successful", profile).await
        }
        Err(e) => notice::error(account_error_to_status(&e), &e),
    }
}

/// `POST /api/auth/login`: verify credentials, set the session cookie.
pub async fn login(State(state): State<AppState>, ApiJson(body): ApiJson<LoginRequest>) -> Response {
    let profile = match account::authenticate(&state.pool, &body.email, &body.password).await {
        Ok(user_id) => account::fetch_profile(&state.pool, user_id).await,
        Err(e) => Err(e),
    };
    match profile {
        Ok(profile) => {
            let user_id = profile.id;
            start_session(&state, user_id, StatusCode::OK, "Signed in", profile).await
        }
        Err(e) => notice::error(account_error_to_status(&e), &e),
    }
}

async fn start_session<T: Serialize>(
    state: &AppState,
    user_id: Uuid,
    status: StatusCode,
    message: &str,
    data: T,
) -> Response {
    match session::create_session(&state.pool, user_id, state.config.session_ttl_hours).await {
        Ok(token) => {
            tracing::info!(%user_id, "session started");
            let jar = CookieJar::new().add(session_cookie(token, &state.config));
            (jar, notice::success(status, message, data)).into_response()
        }
        Err(e) => {
            let err = AccountError::from(e);
            notice::error(account_error_to_status(&err), &err)
        }
    }
}

/// `GET /api/auth/me`: return current user.
pub async fn me(auth: AuthUser) -> Json<session::SessionUser> {
    Json(auth.user)
}

/// `POST /api/auth/logout`: delete session, clear cookie.
pub async fn logout(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    if let Err(e) = session::delete_session(&state.pool, &auth.token).await {
        tracing::warn!(error = %e, user_id = %auth.user.id, "session delete failed");
    }
    let jar = CookieJar::new().add(cleared_cookie(&state.config));
    (jar, StatusCode::NO_CONTENT)
}

pub(crate) fn account_error_to_status(err: &AccountError) -> StatusCode {
    match err {
        AccountError::InvalidEmail | AccountError::MissingName | AccountError::WeakPassword(_) => {
            StatusCode::BAD_REQUEST
        }
        AccountError::EmailTaken => StatusCode::CONFLICT,
        AccountError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        AccountError::NotFound(_) => StatusCode::NOT_FOUND,
        AccountError::Hashing(_) | AccountError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
