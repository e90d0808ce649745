//! Damage service: reports filed at return time and admin charging.
//!
//! A damage report starts `pending` when a customer describes damage while
//! returning a car. An admin later sets the repair cost, which moves it to
//! `charged`. Charged reports are final.

use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, PgPool, Row};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::notice::ErrorCode;
use crate::services::rental::{self, CarSummary, RenterSummary};

const DAMAGE_COLUMNS: &str = "id, rental_id, description, status, repair_cost, created_at, resolved_at";

const LISTING_SELECT: &str = r"SELECT d.id, d.rental_id, d.description, d.status, d.repair_cost,
       d.created_at, d.resolved_at,
       c.brand, c.model, c.license_plate,
       u.full_name, u.email
FROM damages d
JOIN rentals r ON r.id = d.rental_id
JOIN cars c ON c.id = r.car_id
JOIN users u ON u.id = r.user_id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DamageStatus {
    Pending,
    Charged,
}

impl DamageStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Charged => "charged",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(Self::Pending),
            "charged" => Some(Self::Charged),
            _ => None,
        }
    }

    /// Status after charging; `None` once charged (terminal).
    #[must_use]
    pub fn charge(self) -> Option<Self> {
        (self == Self::Pending).then_some(Self::Charged)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DamageError {
    #[error("damage report not found: {0}")]
    NotFound(Uuid),
    #[error("invalid repair cost: {0}")]
    InvalidRepairCost(String),
    #[error("damage report {0} has already been charged")]
    AlreadyCharged(Uuid),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ErrorCode for DamageError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "E_DAMAGE_NOT_FOUND",
            Self::InvalidRepairCost(_) => "E_INVALID_REPAIR_COST",
            Self::AlreadyCharged(_) => "E_DAMAGE_ALREADY_CHARGED",
            Self::Database(_) => "E_DATABASE",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Damage {
    pub id: Uuid,
    pub rental_id: Uuid,
    pub description: String,
    pub status: DamageStatus,
    pub repair_cost: Option<f64>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub resolved_at: Option<OffsetDateTime>,
}

/// Damage report with the rented car and the renter, for the admin table.
#[derive(Debug, Clone, Serialize)]
pub struct DamageListing {
    #[serde(flatten)]
    pub damage: Damage,
    pub car: CarSummary,
    pub user: RenterSummary,
}

/// Repair cost as submitted by a form or JSON client: `150.5` or `"150.50"`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RepairCostInput {
    Amount(f64),
    Text(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResolveRequest {
    pub repair_cost: RepairCostInput,
}

/// Parse a repair cost into a finite, non-negative amount.
///
/// # Errors
///
/// Returns `InvalidRepairCost` for text that is not a number, or for
/// negative, NaN, or infinite amounts.
pub fn parse_repair_cost(input: &RepairCostInput) -> Result<f64, DamageError> {
    let amount = match input {
        RepairCostInput::Amount(value) => *value,
        RepairCostInput::Text(raw) => raw
            .trim()
            .parse::<f64>()
            .map_err(|_| DamageError::InvalidRepairCost(raw.clone()))?,
    };
    if !amount.is_finite() || amount < 0.0 {
        return Err(DamageError::InvalidRepairCost(amount.to_string()));
    }
    Ok(amount)
}

/// List damage reports, newest first, optionally filtered by status.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list_damages(pool: &PgPool, status: Option<DamageStatus>) -> Result<Vec<DamageListing>, DamageError> {
    let rows = match status {
        Some(status) => {
            sqlx::query(&format!("{LISTING_SELECT} WHERE d.status = $1 ORDER BY d.created_at DESC, d.id"))
                .bind(status.as_str())
                .fetch_all(pool)
                .await?
        }
        None => {
            sqlx::query(&format!("{LISTING_SELECT} ORDER BY d.created_at DESC, d.id"))
                .fetch_all(pool)
                .await?
        }
    };
    Ok(rows.iter().map(listing_from_row).collect::<Result<Vec<_>, _>>()?)
}

/// Charge a pending damage report.
///
/// # Errors
///
/// Returns `InvalidRepairCost`, `NotFound`, `AlreadyCharged`, or a database error.
pub async fn resolve_damage(pool: &PgPool, damage_id: Uuid, cost: &RepairCostInput) -> Result<Damage, DamageError> {
    let repair_cost = parse_repair_cost(cost)?;
    let mut tx = pool.begin().await?;

    let raw_status: String = sqlx::query_scalar("SELECT status FROM damages WHERE id = $1 FOR UPDATE")
        .bind(damage_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(DamageError::NotFound(damage_id))?;
    let next_status = DamageStatus::parse(&raw_status)
        .and_then(DamageStatus::charge)
        .ok_or(DamageError::AlreadyCharged(damage_id))?;

    let row = sqlx::query(&format!(
        "UPDATE damages SET status = $2, repair_cost = $3, resolved_at = now()
         WHERE id = $1
         RETURNING {DAMAGE_COLUMNS}"
    ))
    .bind(damage_id)
    .bind(next_status.as_str())
    .bind(repair_cost)
    .fetch_one(&mut *tx)
    .await?;
    let damage = damage_from_row(&row)?;

    tx.commit().await?;

    tracing::info!(%damage_id, repair_cost, "damage charged");
    Ok(damage)
}

/// File a pending report inside the caller's transaction.
pub(crate) async fn insert_pending(
    conn: &mut PgConnection,
    rental_id: Uuid,
    description: &str,
) -> Result<Damage, sqlx::Error> {
    let row = sqlx::query(&format!(
        "INSERT INTO damages (rental_id, description, status) VALUES ($1, $2, $3) RETURNING {DAMAGE_COLUMNS}"
    ))
    .bind(rental_id)
    .bind(description)
    .bind(DamageStatus::Pending.as_str())
    .fetch_one(conn)
    .await?;
    damage_from_row(&row)
}

fn damage_from_row(row: &PgRow) -> Result<Damage, sqlx::Error> {
    let raw_status: String = row.try_get("status")?;
    let status = DamageStatus::parse(&raw_status)
        .ok_or_else(|| sqlx::Error::Decode(format!("unknown damage status: {raw_status}").into()))?;
    Ok(Damage {
        id: row.try_get("id")?,
        rental_id: row.try_get("rental_id")?,
        description: row.try_get("description")?,
        status,
        repair_cost: row.try_get("repair_cost")?,
        created_at: row.try_get("created_at")?,
        resolved_at: row.try_get("resolved_at")?,
    })
}

fn listing_from_row(row: &PgRow) -> Result<DamageListing, sqlx::Error> {
    Ok(DamageListing {
        damage: damage_from_row(row)?,
        car: rental::car_summary_from_row(row)?,
        user: rental::renter_summary_from_row(row)?,
    })
}

#[cfg(test)]
#[path = "damage_test.rs"]
mod tests;
