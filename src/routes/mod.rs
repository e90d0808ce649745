//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! One Axum router serves the JSON API under `/api`, the session-gated page
//! routes, and `/healthz`. Request spans come from `TraceLayer`.

pub mod auth;
pub mod cars;
pub mod damages;
pub mod dashboard;
pub mod extract;
pub mod pages;
pub mod rentals;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the application router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Pages
        .route("/login", get(pages::login))
        .route("/register", get(pages::register))
        .route("/dashboard", get(pages::user_dashboard))
        .route("/cars", get(pages::car_list))
        .route("/rentals", get(pages::rental_history))
        .route("/admin/dashboard", get(pages::admin_dashboard))
        .route("/admin/cars", get(pages::admin_cars))
        .route("/admin/rentals", get(pages::admin_rentals))
        // Auth
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        // Cars
        .route("/api/cars", get(cars::list).post(cars::create))
        .route("/api/cars/available", get(cars::available))
        .route("/api/cars/{id}", put(cars::update).delete(cars::delete))
        // Rentals
        .route("/api/rentals", get(rentals::list_all).post(rentals::book))
        .route("/api/rentals/mine", get(rentals::mine))
        .route("/api/rentals/{id}/return", post(rentals::return_car))
        // Damages
        .route("/api/damages", get(damages::list))
        .route("/api/damages/{id}/resolve", post(damages::resolve))
        // Dashboards
        .route("/api/dashboard/admin", get(dashboard::admin))
        .route("/api/dashboard/me", get(dashboard::me))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
