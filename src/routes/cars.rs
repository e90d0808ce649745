//! Car inventory routes. Management is admin only; the available listing is
//! open to any signed-in user.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Json, Response};
use serde::Deserialize;
use uuid::Uuid;

use crate::notice;
use crate::routes::auth::{AdminUser, AuthUser};
use crate::routes::extract::{ApiJson, ApiPath, ApiQuery};
use crate::services::car::{self, Car, CarError, CarForm};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct DeleteQuery {
    #[serde(default)]
    pub confirm: bool,
}

/// `GET /api/cars`: every car, newest first.
pub async fn list(State(state): State<AppState>, _admin: AdminUser) -> Result<Json<Vec<Car>>, Response> {
    car::list_cars(&state.pool)
        .await
        .map(Json)
        .map_err(|e| notice::error(car_error_to_status(&e), &e))
}

/// `GET /api/cars/available`: bookable cars, cheapest first.
pub async fn available(State(state): State<AppState>, _auth: AuthUser) -> Result<Json<Vec<Car>>, Response> {
    car::list_available_cars(&state.pool)
        .await
        .map(Json)
        .map_err(|e| notice::error(car_error_to_status(&e), &e))
}

/// `POST /api/cars`
pub async fn create(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiJson(form): ApiJson<CarForm>,
) -> Response {
    match car::create_car(&state.pool, &form).await {
        Ok(car) => notice::success(StatusCode::CREATED, "Car added successfully", car),
        Err(e) => notice::error(car_error_to_status(&e), &e),
    }
}

/// `PUT /api/cars/{id}`: replace every editable field.
pub async fn update(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(car_id): ApiPath<Uuid>,
    ApiJson(form): ApiJson<CarForm>,
) -> Response {
    match car::update_car(&state.pool, car_id, &form).await {
        Ok(car) => notice::success(StatusCode::OK, "Car updated successfully", car),
        Err(e) => notice::error(car_error_to_status(&e), &e),
    }
}

/// `DELETE /api/cars/{id}?confirm=true`
pub async fn delete(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(car_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<DeleteQuery>,
) -> Response {
    match car::delete_car(&state.pool, car_id, query.confirm).await {
        Ok(()) => notice::success(StatusCode::OK, "Car deleted successfully", serde_json::json!({ "id": car_id })),
        Err(e) => notice::error(car_error_to_status(&e), &e),
    }
}

pub(crate) fn car_error_to_status(err: &CarError) -> StatusCode {
    match err {
        CarError::NotFound(_) => StatusCode::NOT_FOUND,
        CarError::Invalid(_) | CarError::ConfirmationRequired => StatusCode::BAD_REQUEST,
        CarError::DuplicatePlate(_) | CarError::InUse(_) | CarError::StatusLocked { .. } => StatusCode::CONFLICT,
        CarError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
#[path = "cars_test.rs"]
mod tests;
