//! Dashboard routes.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Json, Response};

use crate::notice;
use crate::routes::auth::{AdminUser, AuthUser};
use crate::routes::{auth as auth_routes, rentals};
use crate::services::dashboard::{self, AdminStats, DashboardError, UserSummary};
use crate::state::AppState;

/// `GET /api/dashboard/admin`
pub async fn admin(State(state): State<AppState>, _admin: AdminUser) -> Result<Json<AdminStats>, Response> {
    dashboard::admin_stats(&state.pool)
        .await
        .map(Json)
        .map_err(|e| notice::error(dashboard_error_to_status(&e), &e))
}

/// `GET /api/dashboard/me`
pub async fn me(State(state): State<AppState>, auth: AuthUser) -> Result<Json<UserSummary>, Response> {
    dashboard::user_summary(&state.pool, auth.user.id)
        .await
        .map(Json)
        .map_err(|e| notice::error(dashboard_error_to_status(&e), &e))
}

pub(crate) fn dashboard_error_to_status(err: &DashboardError) -> StatusCode {
    match err {
        DashboardError::Account(e) => auth_routes::account_error_to_status(e),
        DashboardError::Rental(e) => rentals::rental_error_to_status(e),
        DashboardError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::account::AccountError;
    use crate::services::rental::RentalError;

    #[test]
    fn dashboard_errors_follow_their_source() {
        let err = DashboardError::Account(AccountError::NotFound(uuid::Uuid::nil()));
        assert_eq!(dashboard_error_to_status(&err), StatusCode::NOT_FOUND);
        let err = DashboardError::Rental(RentalError::InvalidDates);
        assert_eq!(dashboard_error_to_status(&err), StatusCode::BAD_REQUEST);
    }
}
