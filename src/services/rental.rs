//! Rental service: booking, return, and rental listings.
//!
//! DESIGN
//! ======
//! Booking and return are each one SQL transaction. Booking locks the car
//! row, checks it is still available, prices the rental from the locked
//! rate, inserts the rental and flips the car to `rented`. Return completes
//! the rental, frees the car and optionally files a pending damage report.
//! Any failing step rolls the whole operation back, so a rental never exists
//! without its car being marked rented (and vice versa).
//!
//! CONCURRENCY
//! ===========
//! Two bookings racing for the same car serialize on `SELECT ... FOR UPDATE`;
//! the loser sees `rented` and gets `CarUnavailable`. The partial unique
//! index `rentals_one_active_per_car` backs this up at the schema level.

use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use time::{Date, Duration, OffsetDateTime};
use uuid::Uuid;

use crate::db;
use crate::notice::ErrorCode;
use crate::services::car::{self, CarStatus};
use crate::services::damage::{self, Damage};
use crate::services::session::SessionUser;

const SECONDS_PER_DAY: i64 = 86_400;

const LISTING_SELECT: &str = r"SELECT r.id, r.user_id, r.car_id, r.start_date, r.end_date, r.total_amount,
       r.status, r.created_at, r.returned_at,
       c.brand, c.model, c.license_plate,
       u.full_name, u.email
FROM rentals r
JOIN cars c ON c.id = r.car_id
JOIN users u ON u.id = r.user_id";

const RENTAL_COLUMNS: &str =
    "id, user_id, car_id, start_date, end_date, total_amount, status, created_at, returned_at";

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RentalStatus {
    Active,
    Completed,
}

impl RentalStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "active" => Some(Self::Active),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }

    /// Status after a return; `None` once completed (terminal).
    #[must_use]
    pub fn after_return(self) -> Option<Self> {
        (self == Self::Active).then_some(Self::Completed)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RentalError {
    #[error("end date must be after start date")]
    InvalidDates,
    #[error("start date {0} is in the past")]
    StartInPast(Date),
    #[error("car not found: {0}")]
    CarNotFound(Uuid),
    #[error("car {0} is not available for rent")]
    CarUnavailable(Uuid),
    #[error("rental not found: {0}")]
    NotFound(Uuid),
    #[error("rental {0} has already been returned")]
    NotActive(Uuid),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ErrorCode for RentalError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidDates => "E_INVALID_DATES",
            Self::StartInPast(_) => "E_START_IN_PAST",
            Self::CarNotFound(_) => "E_CAR_NOT_FOUND",
            Self::CarUnavailable(_) => "E_CAR_UNAVAILABLE",
            Self::NotFound(_) => "E_RENTAL_NOT_FOUND",
            Self::NotActive(_) => "E_RENTAL_NOT_ACTIVE",
            Self::Database(_) => "E_DATABASE",
        }
    }
}

/// Row from the `rentals` table.
#[derive(Debug, Clone, Serialize)]
pub struct Rental {
    pub id: Uuid,
    pub user_id: Uuid,
    pub car_id: Uuid,
    pub start_date: Date,
    pub end_date: Date,
    pub total_amount: f64,
    pub status: RentalStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub returned_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CarSummary {
    pub brand: String,
    pub model: String,
    pub license_plate: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RenterSummary {
    pub full_name: String,
    pub email: String,
}

/// Rental joined with its car and renter, as shown in history and audit tables.
#[derive(Debug, Clone, Serialize)]
pub struct RentalListing {
    #[serde(flatten)]
    pub rental: Rental,
    pub car: CarSummary,
    pub user: RenterSummary,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookingRequest {
    pub car_id: Uuid,
    pub start_date: Date,
    pub end_date: Date,
}

/// Result of a return: the completed rental and the damage report, if one was filed.
#[derive(Debug, Clone, Serialize)]
pub struct ReturnOutcome {
    pub rental: Rental,
    pub damage: Option<Damage>,
}

// =============================================================================
// PRICING
// =============================================================================

/// Whole days billed for a span; any partial day counts as a full day.
#[must_use]
pub fn billable_days(span: Duration) -> i64 {
    let seconds = span.whole_seconds();
    if seconds <= 0 {
        return 0;
    }
    (seconds + SECONDS_PER_DAY - 1) / SECONDS_PER_DAY
}

/// Price a booking: `ceil(end - start)` days times the daily rate.
///
/// # Errors
///
/// Returns `InvalidDates` unless `end_date` is after `start_date`.
#[allow(clippy::cast_precision_loss)]
pub fn quote(start_date: Date, end_date: Date, daily_rate: f64) -> Result<(i64, f64), RentalError> {
    let days = billable_days(end_date - start_date);
    if days == 0 {
        return Err(RentalError::InvalidDates);
    }
    Ok((days, days as f64 * daily_rate))
}

/// Check a requested booking window against `today` and return its billable days.
///
/// # Errors
///
/// Returns `InvalidDates` unless `end_date` is after `start_date`, or
/// `StartInPast` when `start_date` is before `today`.
pub fn check_booking_dates(start_date: Date, end_date: Date, today: Date) -> Result<i64, RentalError> {
    let (days, _) = quote(start_date, end_date, 0.0)?;
    if start_date < today {
        return Err(RentalError::StartInPast(start_date));
    }
    Ok(days)
}

/// Trimmed damage description, or `None` when nothing was reported.
#[must_use]
pub fn damage_note(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|note| !note.is_empty())
}

// =============================================================================
// LIFECYCLE
// =============================================================================

/// Book an available car for `user_id`.
///
/// # Errors
///
/// Returns `InvalidDates`, `StartInPast`, `CarNotFound`, `CarUnavailable`,
/// or a database error. On any error nothing is persisted.
pub async fn book_car(pool: &PgPool, user_id: Uuid, request: &BookingRequest) -> Result<Rental, RentalError> {
    // Reject bad dates before opening a transaction.
    let today = OffsetDateTime::now_utc().date();
    if let Err(e) = check_booking_dates(request.start_date, request.end_date, today) {
        tracing::warn!(%user_id, car_id = %request.car_id, error = %e, "booking rejected: bad dates");
        return Err(e);
    }

    let car_id = request.car_id;
    let mut tx = pool.begin().await?;

    let car_row = sqlx::query("SELECT status, daily_rate FROM cars WHERE id = $1 FOR UPDATE")
        .bind(car_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RentalError::CarNotFound(car_id))?;
    let status = car::status_from_row(&car_row)?;
    let daily_rate: f64 = car_row.try_get("daily_rate")?;

    let Some(next_status) = status.after_booking() else {
        tracing::warn!(%car_id, %user_id, status = status.as_str(), "booking rejected: car not available");
        return Err(RentalError::CarUnavailable(car_id));
    };
    let (days, total_amount) = quote(request.start_date, request.end_date, daily_rate)?;

    let row = sqlx::query(&format!(
        "INSERT INTO rentals (user_id, car_id, start_date, end_date, total_amount, status)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING {RENTAL_COLUMNS}"
    ))
    .bind(user_id)
    .bind(car_id)
    .bind(request.start_date)
    .bind(request.end_date)
    .bind(total_amount)
    .bind(RentalStatus::Active.as_str())
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        if db::violated_constraint(&e, db::UNIQUE_VIOLATION).is_some() {
            RentalError::CarUnavailable(car_id)
        } else {
            RentalError::Database(e)
        }
    })?;
    let rental = rental_from_row(&row)?;

    sqlx::query("UPDATE cars SET status = $2 WHERE id = $1")
        .bind(car_id)
        .bind(next_status.as_str())
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(rental_id = %rental.id, %car_id, %user_id, days, total_amount, "car booked");
    Ok(rental)
}

/// Return an active rental, freeing the car and filing a damage report when
/// `damage_description` has non-blank text.
///
/// Customers may only return their own rentals; admins may return any.
///
/// # Errors
///
/// Returns `NotFound` (also for other users' rentals), `NotActive`, or a
/// database error. On any error nothing is persisted.
pub async fn return_rental(
    pool: &PgPool,
    actor: &SessionUser,
    rental_id: Uuid,
    damage_description: Option<&str>,
) -> Result<ReturnOutcome, RentalError> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query(&format!("SELECT {RENTAL_COLUMNS} FROM rentals WHERE id = $1 FOR UPDATE"))
        .bind(rental_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RentalError::NotFound(rental_id))?;
    let current = rental_from_row(&row)?;
    if !actor.is_admin && current.user_id != actor.id {
        return Err(RentalError::NotFound(rental_id));
    }
    let next_status = current
        .status
        .after_return()
        .ok_or(RentalError::NotActive(rental_id))?;

    let row = sqlx::query(&format!(
        "UPDATE rentals SET status = $2, returned_at = now() WHERE id = $1 RETURNING {RENTAL_COLUMNS}"
    ))
    .bind(rental_id)
    .bind(next_status.as_str())
    .fetch_one(&mut *tx)
    .await?;
    let rental = rental_from_row(&row)?;

    sqlx::query("UPDATE cars SET status = $2 WHERE id = $1")
        .bind(rental.car_id)
        .bind(CarStatus::Available.as_str())
        .execute(&mut *tx)
        .await?;

    let damage = match damage_note(damage_description) {
        Some(note) => Some(damage::insert_pending(&mut *tx, rental_id, note).await?),
        None => None,
    };

    tx.commit().await?;

    tracing::info!(
        %rental_id,
        car_id = %rental.car_id,
        actor = %actor.id,
        damage_reported = damage.is_some(),
        "rental returned"
    );
    Ok(ReturnOutcome { rental, damage })
}

// =============================================================================
// LISTINGS
// =============================================================================

/// One user's rentals, newest first.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list_user_rentals(pool: &PgPool, user_id: Uuid) -> Result<Vec<RentalListing>, RentalError> {
    let rows = sqlx::query(&format!("{LISTING_SELECT} WHERE r.user_id = $1 ORDER BY r.created_at DESC, r.id"))
        .bind(user_id)
        .fetch_all(pool)
        .await?;
    Ok(rows.iter().map(listing_from_row).collect::<Result<Vec<_>, _>>()?)
}

/// One user's active rentals, newest first.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list_active_user_rentals(pool: &PgPool, user_id: Uuid) -> Result<Vec<RentalListing>, RentalError> {
    let rows = sqlx::query(&format!(
        "{LISTING_SELECT} WHERE r.user_id = $1 AND r.status = $2 ORDER BY r.created_at DESC, r.id"
    ))
    .bind(user_id)
    .bind(RentalStatus::Active.as_str())
    .fetch_all(pool)
    .await?;
    Ok(rows.iter().map(listing_from_row).collect::<Result<Vec<_>, _>>()?)
}

/// Every rental with car and renter, newest first (admin audit table).
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list_all_rentals(pool: &PgPool) -> Result<Vec<RentalListing>, RentalError> {
    let rows = sqlx::query(&format!("{LISTING_SELECT} ORDER BY r.created_at DESC, r.id"))
        .fetch_all(pool)
        .await?;
    Ok(rows.iter().map(listing_from_row).collect::<Result<Vec<_>, _>>()?)
}

// =============================================================================
// HELPERS
// =============================================================================

fn rental_from_row(row: &PgRow) -> Result<Rental, sqlx::Error> {
    let raw_status: String = row.try_get("status")?;
    let status = RentalStatus::parse(&raw_status)
        .ok_or_else(|| sqlx::Error::Decode(format!("unknown rental status: {raw_status}").into()))?;
    Ok(Rental {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        car_id: row.try_get("car_id")?,
        start_date: row.try_get("start_date")?,
        end_date: row.try_get("end_date")?,
        total_amount: row.try_get("total_amount")?,
        status,
        created_at: row.try_get("created_at")?,
        returned_at: row.try_get("returned_at")?,
    })
}

pub(crate) fn car_summary_from_row(row: &PgRow) -> Result<CarSummary, sqlx::Error> {
    Ok(CarSummary {
        brand: row.try_get("brand")?,
        model: row.try_get("model")?,
        license_plate: row.try_get("license_plate")?,
    })
}

pub(crate) fn renter_summary_from_row(row: &PgRow) -> Result<RenterSummary, sqlx::Error> {
    Ok(RenterSummary { full_name: row.try_get("full_name")?, email: row.try_get("email")? })
}

fn listing_from_row(row: &PgRow) -> Result<RentalListing, sqlx::Error> {
    Ok(RentalListing {
        rental: rental_from_row(row)?,
        car: car_summary_from_row(row)?,
        user: renter_summary_from_row(row)?,
    })
}

#[cfg(test)]
#[path = "rental_test.rs"]
mod tests;
