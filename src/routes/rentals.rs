//! Rental routes: booking, returns, and history.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Json, Response};
use serde::Deserialize;
use uuid::Uuid;

use crate::notice;
use crate::routes::auth::{AdminUser, AuthUser};
use crate::routes::extract::{ApiJson, ApiPath};
use crate::services::rental::{self, BookingRequest, RentalError, RentalListing};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ReturnRequest {
    #[serde(default)]
    pub damage_description: Option<String>,
}

/// `POST /api/rentals`: book a car for the signed-in user.
pub async fn book(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(body): ApiJson<BookingRequest>,
) -> Response {
    match rental::book_car(&state.pool, auth.user.id, &body).await {
        Ok(rental) => notice::success(StatusCode::CREATED, "Car rented successfully", rental),
        Err(e) => notice::error(rental_error_to_status(&e), &e),
    }
}

/// `GET /api/rentals`: every rental with car and renter.
pub async fn list_all(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<RentalListing>>, Response> {
    rental::list_all_rentals(&state.pool)
        .await
        .map(Json)
        .map_err(|e| notice::error(rental_error_to_status(&e), &e))
}

/// `GET /api/rentals/mine`
pub async fn mine(State(state): State<AppState>, auth: AuthUser) -> Result<Json<Vec<RentalListing>>, Response> {
    rental::list_user_rentals(&state.pool, auth.user.id)
        .await
        .map(Json)
        .map_err(|e| notice::error(rental_error_to_status(&e), &e))
}

/// `POST /api/rentals/{id}/return`: owner or admin. A non-blank
/// `damage_description` files a pending damage report.
pub async fn return_car(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(rental_id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<ReturnRequest>,
) -> Response {
    match rental::return_rental(&state.pool, &auth.user, rental_id, body.damage_description.as_deref()).await {
        Ok(outcome) => notice::success(StatusCode::OK, "Car returned successfully", outcome),
        Err(e) => notice::error(rental_error_to_status(&e), &e),
    }
}

pub(crate) fn rental_error_to_status(err: &RentalError) -> StatusCode {
    match err {
        RentalError::InvalidDates | RentalError::StartInPast(_) => StatusCode::BAD_REQUEST,
        RentalError::CarNotFound(_) | RentalError::NotFound(_) => StatusCode::NOT_FOUND,
        RentalError::CarUnavailable(_) | RentalError::NotActive(_) => StatusCode::CONFLICT,
        RentalError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
#[path = "rentals_test.rs"]
mod tests;
