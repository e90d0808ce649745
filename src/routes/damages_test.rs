use super::*;
use axum::extract::Query;

#[test]
fn damage_errors_map_to_statuses() {
    assert_eq!(damage_error_to_status(&DamageError::NotFound(Uuid::nil())), StatusCode::NOT_FOUND);
    assert_eq!(damage_error_to_status(&DamageError::InvalidRepairCost("x".into())), StatusCode::BAD_REQUEST);
    assert_eq!(damage_error_to_status(&DamageError::AlreadyCharged(Uuid::nil())), StatusCode::CONFLICT);
}

#[test]
fn damage_query_parses_status_filter() {
    let Query(query): Query<DamageQuery> =
        Query::try_from_uri(&"/api/damages?status=pending".parse().unwrap()).unwrap();
    assert_eq!(query.status, Some(DamageStatus::Pending));
    let Query(query): Query<DamageQuery> = Query::try_from_uri(&"/api/damages".parse().unwrap()).unwrap();
    assert_eq!(query.status, None);
}

#[test]
fn damage_query_rejects_unknown_status() {
    let parsed = Query::<DamageQuery>::try_from_uri(&"/api/damages?status=waived".parse().unwrap());
    assert!(parsed.is_err());
}
