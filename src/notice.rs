//! Success/error notices returned to API clients.
//!
//! DESIGN
//! ======
//! Every mutation answers with a `Notice`: a success flag, a human-readable
//! message, and either the affected record or a stable error code. Error
//! messages are the raw `Display` text of the service error so clients can
//! show them verbatim, the way a toast would.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;

/// Stable machine-readable code for a service error.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;
}

#[derive(Debug, Clone, Serialize)]
pub struct Notice<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> Notice<T> {
    #[must_use]
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self { ok: true, code: None, message: message.into(), data: Some(data) }
    }
}

impl Notice<()> {
    #[must_use]
    pub fn failure(err: &(impl ErrorCode + ?Sized)) -> Self {
        Self { ok: false, code: Some(err.error_code()), message: err.to_string(), data: None }
    }
}

/// Build a success response carrying `data`.
pub fn success<T: Serialize>(status: StatusCode, message: impl Into<String>, data: T) -> Response {
    (status, Json(Notice::success(message, data))).into_response()
}

/// Build an error response. Server-side failures are logged; client errors are not.
pub fn error(status: StatusCode, err: &(impl ErrorCode + ?Sized)) -> Response {
    if status.is_server_error() {
        tracing::error!(code = err.error_code(), error = %err, "request failed");
    }
    (status, Json(Notice::failure(err))).into_response()
}

#[cfg(test)]
#[path = "notice_test.rs"]
mod tests;
