use super::*;
#[cfg(feature = "live-db-tests")]
use crate::state::test_helpers;

#[test]
fn dashboard_error_codes_delegate_to_source() {
    let err = DashboardError::from(AccountError::NotFound(Uuid::nil()));
    assert_eq!(err.error_code(), "E_USER_NOT_FOUND");
    let err = DashboardError::from(RentalError::InvalidDates);
    assert_eq!(err.error_code(), "E_INVALID_DATES");
}

#[test]
fn admin_stats_serializes_flat_counts() {
    let stats = AdminStats { total_cars: 4, active_rentals: 1, total_users: 9, pending_damages: 2 };
    let json = serde_json::to_value(stats).unwrap();
    assert_eq!(json["total_cars"], 4);
    assert_eq!(json["pending_damages"], 2);
}

#[tokio::test]
async fn admin_stats_without_database_is_error() {
    let state = crate::state::test_helpers::test_app_state();
    assert!(matches!(admin_stats(&state.pool).await, Err(DashboardError::Database(_))));
}

#[cfg(feature = "live-db-tests")]
#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL/live Postgres"]
async fn counts_reflect_new_rows() {
    let pool = test_helpers::integration_pool().await;
    let before = admin_stats(&pool).await.unwrap();
    test_helpers::seed_user(&pool, false).await;
    test_helpers::seed_car(&pool, 20.0).await;
    let after = admin_stats(&pool).await.unwrap();
    assert!(after.total_cars > before.total_cars);
    assert!(after.total_users > before.total_users);
}

#[cfg(feature = "live-db-tests")]
#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL/live Postgres"]
async fn user_summary_lists_only_active_rentals() {
    use crate::services::rental::{BookingRequest, book_car};

    let pool = test_helpers::integration_pool().await;
    let user_id = test_helpers::seed_user(&pool, false).await;
    let car_id = test_helpers::seed_car(&pool, 20.0).await;
    let request = BookingRequest { car_id, start_date: test_helpers::days_from_today(1), end_date: test_helpers::days_from_today(3) };
    book_car(&pool, user_id, &request).await.unwrap();

    let summary = user_summary(&pool, user_id).await.unwrap();
    assert_eq!(summary.profile.id, user_id);
    assert_eq!(summary.active_rentals.len(), 1);
    assert_eq!(summary.active_rentals[0].rental.car_id, car_id);
}

#[cfg(feature = "live-db-tests")]
#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL/live Postgres"]
async fn user_summary_for_unknown_user_is_not_found() {
    let pool = test_helpers::integration_pool().await;
    let result = user_summary(&pool, Uuid::new_v4()).await;
    assert!(matches!(result, Err(DashboardError::Account(AccountError::NotFound(_)))));
}
