//! Damage report routes. Admin only.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Json, Response};
use serde::Deserialize;
use uuid::Uuid;

use crate::notice;
use crate::routes::auth::AdminUser;
use crate::routes::extract::{ApiJson, ApiPath, ApiQuery};
use crate::services::damage::{self, DamageError, DamageListing, DamageStatus, ResolveRequest};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct DamageQuery {
    pub status: Option<DamageStatus>,
}

/// `GET /api/damages?status=pending`
pub async fn list(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiQuery(query): ApiQuery<DamageQuery>,
) -> Result<Json<Vec<DamageListing>>, Response> {
    damage::list_damages(&state.pool, query.status)
        .await
        .map(Json)
        .map_err(|e| notice::error(damage_error_to_status(&e), &e))
}

/// `POST /api/damages/{id}/resolve`: set the repair cost and mark charged.
pub async fn resolve(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiPath(damage_id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<ResolveRequest>,
) -> Response {
    match damage::resolve_damage(&state.pool, damage_id, &body.repair_cost).await {
        Ok(resolved) => {
            tracing::info!(%damage_id, admin_id = %admin.user.id, "damage report resolved");
            notice::success(StatusCode::OK, "Damage report resolved", resolved)
        }
        Err(e) => notice::error(damage_error_to_status(&e), &e),
    }
}

pub(crate) fn damage_error_to_status(err: &DamageError) -> StatusCode {
    match err {
        DamageError::NotFound(_) => StatusCode::NOT_FOUND,
        DamageError::InvalidRepairCost(_) => StatusCode::BAD_REQUEST,
        DamageError::AlreadyCharged(_) => StatusCode::CONFLICT,
        DamageError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
#[path = "damages_test.rs"]
mod tests;
