//! Dashboard aggregators. Read only.

use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::notice::ErrorCode;
use crate::services::account::{self, AccountError, UserProfile};
use crate::services::rental::{self, RentalError, RentalListing};

#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error(transparent)]
    Account(#[from] AccountError),
    #[error(transparent)]
    Rental(#[from] RentalError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ErrorCode for DashboardError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Account(e) => e.error_code(),
            Self::Rental(e) => e.error_code(),
            Self::Database(_) => "E_DATABASE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AdminStats {
    pub total_cars: i64,
    pub active_rentals: i64,
    pub total_users: i64,
    pub pending_damages: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub profile: UserProfile,
    pub active_rentals: Vec<RentalListing>,
}

/// Fleet-wide counts for the admin dashboard. The four queries run concurrently.
///
/// # Errors
///
/// Returns a database error if any count fails.
pub async fn admin_stats(pool: &PgPool) -> Result<AdminStats, DashboardError> {
    let (total_cars, active_rentals, total_users, pending_damages) = tokio::try_join!(
        count(pool, "SELECT COUNT(*) FROM cars"),
        count(pool, "SELECT COUNT(*) FROM rentals WHERE status = 'active'"),
        count(pool, "SELECT COUNT(*) FROM users"),
        count(pool, "SELECT COUNT(*) FROM damages WHERE status = 'pending'"),
    )?;
    Ok(AdminStats { total_cars, active_rentals, total_users, pending_damages })
}

/// Profile and active rentals for one user.
///
/// # Errors
///
/// Returns `Account(NotFound)` if the user is gone, or a database error.
pub async fn user_summary(pool: &PgPool, user_id: Uuid) -> Result<UserSummary, DashboardError> {
    let (profile, active_rentals) = tokio::try_join!(
        async { account::fetch_profile(pool, user_id).await.map_err(DashboardError::from) },
        async { rental::list_active_user_rentals(pool, user_id).await.map_err(DashboardError::from) },
    )?;
    Ok(UserSummary { profile, active_rentals })
}

async fn count(pool: &PgPool, sql: &'static str) -> Result<i64, DashboardError> {
    Ok(sqlx::query_scalar::<_, i64>(sql).fetch_one(pool).await?)
}

#[cfg(test)]
#[path = "dashboard_test.rs"]
mod tests;
