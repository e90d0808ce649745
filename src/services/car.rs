//! Car inventory service: admin CRUD and the customer availability list.
//!
//! DESIGN
//! ======
//! Car status is the only lifecycle field mutated automatically. Booking
//! moves `available -> rented` and return moves it back; both happen in the
//! rental service. Admin edits may toggle `available <-> maintenance` but can
//! never move a car into or out of `rented`, which keeps the invariant
//! "status is rented iff exactly one active rental exists".

use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::db;
use crate::notice::ErrorCode;

pub const MIN_MODEL_YEAR: i32 = 1886;
pub const MAX_MODEL_YEAR: i32 = 2100;

const CAR_COLUMNS: &str = "id, brand, model, year, license_plate, daily_rate, status, created_at";

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CarStatus {
    Available,
    Rented,
    Maintenance,
}

impl CarStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Rented => "rented",
            Self::Maintenance => "maintenance",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "available" => Some(Self::Available),
            "rented" => Some(Self::Rented),
            "maintenance" => Some(Self::Maintenance),
            _ => None,
        }
    }

    /// Status after a booking; `None` unless the car is available.
    #[must_use]
    pub fn after_booking(self) -> Option<Self> {
        (self == Self::Available).then_some(Self::Rented)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CarError {
    #[error("car not found: {0}")]
    NotFound(Uuid),
    #[error("invalid car: {0}")]
    Invalid(String),
    #[error("license plate already registered: {0}")]
    DuplicatePlate(String),
    #[error("car {0} has rental history and cannot be deleted")]
    InUse(Uuid),
    #[error("car status cannot change from {from} to {to} by direct edit")]
    StatusLocked { from: &'static str, to: &'static str },
    #[error("deleting a car requires confirmation")]
    ConfirmationRequired,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ErrorCode for CarError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "E_CAR_NOT_FOUND",
            Self::Invalid(_) => "E_INVALID_CAR",
            Self::DuplicatePlate(_) => "E_DUPLICATE_PLATE",
            Self::InUse(_) => "E_CAR_IN_USE",
            Self::StatusLocked { .. } => "E_CAR_STATUS_LOCKED",
            Self::ConfirmationRequired => "E_CONFIRMATION_REQUIRED",
            Self::Database(_) => "E_DATABASE",
        }
    }
}

/// Row from the `cars` table.
#[derive(Debug, Clone, Serialize)]
pub struct Car {
    pub id: Uuid,
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub license_plate: String,
    pub daily_rate: f64,
    pub status: CarStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Admin create/edit form. Every field is required.
#[derive(Debug, Clone, Deserialize)]
pub struct CarForm {
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub license_plate: String,
    pub daily_rate: f64,
    pub status: CarStatus,
}

// =============================================================================
// VALIDATION
// =============================================================================

/// Trim text fields and check ranges. Returns the cleaned form.
///
/// # Errors
///
/// Returns `CarError::Invalid` naming the first offending field.
pub fn validate_form(form: &CarForm) -> Result<CarForm, CarError> {
    let brand = form.brand.trim();
    let model = form.model.trim();
    let plate = form.license_plate.trim();
    if brand.is_empty() {
        return Err(CarError::Invalid("brand is required".into()));
    }
    if model.is_empty() {
        return Err(CarError::Invalid("model is required".into()));
    }
    if plate.is_empty() {
        return Err(CarError::Invalid("license plate is required".into()));
    }
    if !(MIN_MODEL_YEAR..=MAX_MODEL_YEAR).contains(&form.year) {
        return Err(CarError::Invalid(format!(
            "year must be between {MIN_MODEL_YEAR} and {MAX_MODEL_YEAR}"
        )));
    }
    if !form.daily_rate.is_finite() || form.daily_rate <= 0.0 {
        return Err(CarError::Invalid("daily rate must be a positive number".into()));
    }
    Ok(CarForm {
        brand: brand.to_owned(),
        model: model.to_owned(),
        year: form.year,
        license_plate: plate.to_owned(),
        daily_rate: form.daily_rate,
        status: form.status,
    })
}

/// Check an admin status edit. `current` is `None` for a new car.
///
/// # Errors
///
/// Returns `CarError::StatusLocked` when the edit would move a car into or
/// out of `rented`.
pub fn check_status_edit(current: Option<CarStatus>, requested: CarStatus) -> Result<(), CarError> {
    let from = current.unwrap_or(CarStatus::Available);
    let locked = match (from, requested) {
        (CarStatus::Rented, CarStatus::Rented) => false,
        (CarStatus::Rented, _) | (_, CarStatus::Rented) => true,
        _ => false,
    };
    if locked {
        return Err(CarError::StatusLocked { from: from.as_str(), to: requested.as_str() });
    }
    Ok(())
}

// =============================================================================
// QUERIES
// =============================================================================

/// List all cars, newest first.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list_cars(pool: &PgPool) -> Result<Vec<Car>, CarError> {
    let rows = sqlx::query(&format!("SELECT {CAR_COLUMNS} FROM cars ORDER BY created_at DESC, id"))
        .fetch_all(pool)
        .await?;
    Ok(rows.iter().map(car_from_row).collect::<Result<Vec<_>, _>>()?)
}

/// List cars open for booking, cheapest first.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list_available_cars(pool: &PgPool) -> Result<Vec<Car>, CarError> {
    let rows = sqlx::query(&format!(
        "SELECT {CAR_COLUMNS} FROM cars WHERE status = $1 ORDER BY daily_rate ASC, created_at ASC, id"
    ))
    .bind(CarStatus::Available.as_str())
    .fetch_all(pool)
    .await?;
    Ok(rows.iter().map(car_from_row).collect::<Result<Vec<_>, _>>()?)
}

/// Create a car from an admin form.
///
/// # Errors
///
/// Returns a validation error, `DuplicatePlate`, or a database error.
pub async fn create_car(pool: &PgPool, form: &CarForm) -> Result<Car, CarError> {
    let form = validate_form(form)?;
    check_status_edit(None, form.status)?;

    let row = sqlx::query(&format!(
        "INSERT INTO cars (brand, model, year, license_plate, daily_rate, status)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING {CAR_COLUMNS}"
    ))
    .bind(&form.brand)
    .bind(&form.model)
    .bind(form.year)
    .bind(&form.license_plate)
    .bind(form.daily_rate)
    .bind(form.status.as_str())
    .fetch_one(pool)
    .await
    .map_err(|e| plate_conflict(e, &form.license_plate))?;

    let car = car_from_row(&row)?;
    tracing::info!(car_id = %car.id, plate = %car.license_plate, "car created");
    Ok(car)
}

/// Replace an existing car's fields.
///
/// # Errors
///
/// Returns `NotFound`, a validation error, `StatusLocked`, `DuplicatePlate`,
/// or a database error.
pub async fn update_car(pool: &PgPool, car_id: Uuid, form: &CarForm) -> Result<Car, CarError> {
    let form = validate_form(form)?;

    let mut tx = pool.begin().await?;
    let current = sqlx::query("SELECT status FROM cars WHERE id = $1 FOR UPDATE")
        .bind(car_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(CarError::NotFound(car_id))?;
    let current = status_from_row(&current)?;
    check_status_edit(Some(current), form.status)?;

    let row = sqlx::query(&format!(
        "UPDATE cars
         SET brand = $2, model = $3, year = $4, license_plate = $5, daily_rate = $6, status = $7
         WHERE id = $1
         RETURNING {CAR_COLUMNS}"
    ))
    .bind(car_id)
    .bind(&form.brand)
    .bind(&form.model)
    .bind(form.year)
    .bind(&form.license_plate)
    .bind(form.daily_rate)
    .bind(form.status.as_str())
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| plate_conflict(e, &form.license_plate))?;
    tx.commit().await?;

    let car = car_from_row(&row)?;
    tracing::info!(car_id = %car.id, status = car.status.as_str(), "car updated");
    Ok(car)
}

/// Delete a car. Requires explicit confirmation; cars referenced by rentals
/// are kept so rental history stays intact.
///
/// # Errors
///
/// Returns `ConfirmationRequired`, `NotFound`, `InUse`, or a database error.
pub async fn delete_car(pool: &PgPool, car_id: Uuid, confirmed: bool) -> Result<(), CarError> {
    if !confirmed {
        return Err(CarError::ConfirmationRequired);
    }

    let result = sqlx::query("DELETE FROM cars WHERE id = $1")
        .bind(car_id)
        .execute(pool)
        .await
        .map_err(|e| {
            if db::violated_constraint(&e, db::FOREIGN_KEY_VIOLATION).is_some() {
                CarError::InUse(car_id)
            } else {
                CarError::Database(e)
            }
        })?;

    if result.rows_affected() == 0 {
        return Err(CarError::NotFound(car_id));
    }
    tracing::info!(%car_id, "car deleted");
    Ok(())
}

// =============================================================================
// HELPERS
// =============================================================================

fn plate_conflict(err: sqlx::Error, plate: &str) -> CarError {
    if db::violated_constraint(&err, db::UNIQUE_VIOLATION).is_some() {
        CarError::DuplicatePlate(plate.to_owned())
    } else {
        CarError::Database(err)
    }
}

pub(crate) fn status_from_row(row: &PgRow) -> Result<CarStatus, sqlx::Error> {
    let raw: String = row.try_get("status")?;
    CarStatus::parse(&raw).ok_or_else(|| sqlx::Error::Decode(format!("unknown car status: {raw}").into()))
}

pub(crate) fn car_from_row(row: &PgRow) -> Result<Car, sqlx::Error> {
    Ok(Car {
        id: row.try_get("id")?,
        brand: row.try_get("brand")?,
        model: row.try_get("model")?,
        year: row.try_get("year")?,
        license_plate: row.try_get("license_plate")?,
        daily_rate: row.try_get("daily_rate")?,
        status: status_from_row(row)?,
        created_at: row.try_get("created_at")?,
    })
}

#[cfg(test)]
#[path = "car_test.rs"]
mod tests;
