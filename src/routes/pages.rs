//! Page routes: session-gated view state for each screen.
//!
//! DESIGN
//! ======
//! Each page answers with a JSON view record that a frontend renders as-is.
//! Access is checked by `decide`, a pure function of the required access
//! level and the viewer's session. Every refusal is the same temporary
//! redirect to `/login`: a missing or expired session, a failed session
//! lookup, and a non-admin on an admin page all look alike to the client.

use std::convert::Infallible;

use axum::extract::{FromRef, FromRequestParts, State};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Json, Redirect, Response};
use serde::Serialize;

use crate::notice;
use crate::routes::auth::request_token;
use crate::routes::{cars, damages, dashboard as dashboard_routes, rentals};
use crate::services::car::{self, Car, CarStatus};
use crate::services::damage::{self, DamageListing, DamageStatus};
use crate::services::dashboard::{self, AdminStats, UserSummary};
use crate::services::rental::{self, RentalListing};
use crate::services::session::{self, SessionUser};
use crate::state::AppState;

pub const LOGIN_PATH: &str = "/login";

// =============================================================================
// GATE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    User,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Render(Option<SessionUser>),
    RedirectToLogin,
}

#[must_use]
pub fn decide(access: Access, viewer: Option<SessionUser>) -> GateDecision {
    match (access, viewer) {
        (Access::Public, viewer) => GateDecision::Render(viewer),
        (Access::User, Some(user)) => GateDecision::Render(Some(user)),
        (Access::Admin, Some(user)) if user.is_admin => GateDecision::Render(Some(user)),
        _ => GateDecision::RedirectToLogin,
    }
}

/// Session of the requesting browser, if any. Never rejects.
pub struct Viewer(pub Option<SessionUser>);

impl<S> FromRequestParts<S> for Viewer
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Some(token) = request_token(&parts.headers) else {
            return Ok(Self(None));
        };
        let app_state = AppState::from_ref(state);
        match session::validate_session(&app_state.pool, &token).await {
            Ok(user) => Ok(Self(user)),
            Err(e) => {
                tracing::warn!(error = %e, path = %parts.uri.path(), "session lookup failed; treating as signed out");
                Ok(Self(None))
            }
        }
    }
}

fn gate(access: Access, viewer: Viewer) -> Result<Option<SessionUser>, Response> {
    match decide(access, viewer.0) {
        GateDecision::Render(viewer) => Ok(viewer),
        GateDecision::RedirectToLogin => Err(Redirect::temporary(LOGIN_PATH).into_response()),
    }
}

fn require(access: Access, viewer: Viewer) -> Result<SessionUser, Response> {
    gate(access, viewer)?.ok_or_else(|| Redirect::temporary(LOGIN_PATH).into_response())
}

// =============================================================================
// VIEWS
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub title: &'static str,
    pub viewer: Option<SessionUser>,
    pub view: T,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Link {
    pub label: &'static str,
    pub href: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FormField {
    pub name: &'static str,
    pub label: &'static str,
    pub input_type: &'static str,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormView {
    pub action: &'static str,
    pub submit_label: &'static str,
    pub fields: Vec<FormField>,
    pub alternate: Link,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserDashboardView {
    pub summary: UserSummary,
    pub quick_actions: Vec<Link>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CarListView {
    pub cars: Vec<Car>,
    pub booking_action: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct RentalHistoryView {
    pub rentals: Vec<RentalListing>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminDashboardView {
    pub stats: AdminStats,
    pub sections: Vec<Link>,
}

/// Statuses an admin may pick; `rented` only changes through booking and return.
pub const EDITABLE_STATUSES: [CarStatus; 2] = [CarStatus::Available, CarStatus::Maintenance];

#[derive(Debug, Clone, Serialize)]
pub struct AdminCarsView {
    pub cars: Vec<Car>,
    pub status_options: [CarStatus; 2],
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminRentalsView {
    pub pending_damages: Vec<DamageListing>,
    pub rentals: Vec<RentalListing>,
}

const fn field(name: &'static str, label: &'static str, input_type: &'static str, required: bool) -> FormField {
    FormField { name, label, input_type, required }
}

#[must_use]
pub fn login_form() -> FormView {
    FormView {
        action: "/api/auth/login",
        submit_label: "Sign in",
        fields: vec![field("email", "Email", "email", true), field("password", "Password", "password", true)],
        alternate: Link { label: "Create an account", href: "/register" },
    }
}

#[must_use]
pub fn register_form() -> FormView {
    FormView {
        action: "/api/auth/register",
        submit_label: "Register",
        fields: vec![
            field("full_name", "Full Name", "text", true),
            field("email", "Email", "email", true),
            field("phone_number", "Phone Number", "tel", false),
            field("address", "Address", "text", false),
            field("password", "Password", "password", true),
        ],
        alternate: Link { label: "Already have an account? Sign in", href: LOGIN_PATH },
    }
}

fn render<T: Serialize>(title: &'static str, viewer: Option<SessionUser>, view: T) -> Response {
    (StatusCode::OK, Json(Page { title, viewer, view })).into_response()
}

// =============================================================================
// HANDLERS
// =============================================================================

/// `GET /login`
pub async fn login(viewer: Viewer) -> Response {
    match gate(Access::Public, viewer) {
        Ok(viewer) => render("Sign in", viewer, login_form()),
        Err(redirect) => redirect,
    }
}

/// `GET /register`
pub async fn register(viewer: Viewer) -> Response {
    match gate(Access::Public, viewer) {
        Ok(viewer) => render("Register", viewer, register_form()),
        Err(redirect) => redirect,
    }
}

/// `GET /dashboard`
pub async fn user_dashboard(State(state): State<AppState>, viewer: Viewer) -> Response {
    let user = match require(Access::User, viewer) {
        Ok(user) => user,
        Err(redirect) => return redirect,
    };
    match dashboard::user_summary(&state.pool, user.id).await {
        Ok(summary) => {
            let quick_actions = vec![
                Link { label: "Rent a Car", href: "/cars" },
                Link { label: "View Rental History", href: "/rentals" },
            ];
            render("Dashboard", Some(user), UserDashboardView { summary, quick_actions })
        }
        Err(e) => notice::error(dashboard_routes::dashboard_error_to_status(&e), &e),
    }
}

/// `GET /cars`
pub async fn car_list(State(state): State<AppState>, viewer: Viewer) -> Response {
    let user = match require(Access::User, viewer) {
        Ok(user) => user,
        Err(redirect) => return redirect,
    };
    match car::list_available_cars(&state.pool).await {
        Ok(cars) => render("Available Cars", Some(user), CarListView { cars, booking_action: "/api/rentals" }),
        Err(e) => notice::error(cars::car_error_to_status(&e), &e),
    }
}

/// `GET /rentals`
pub async fn rental_history(State(state): State<AppState>, viewer: Viewer) -> Response {
    let user = match require(Access::User, viewer) {
        Ok(user) => user,
        Err(redirect) => return redirect,
    };
    match rental::list_user_rentals(&state.pool, user.id).await {
        Ok(rentals) => render("Rental History", Some(user), RentalHistoryView { rentals }),
        Err(e) => notice::error(rentals::rental_error_to_status(&e), &e),
    }
}

/// `GET /admin/dashboard`
pub async fn admin_dashboard(State(state): State<AppState>, viewer: Viewer) -> Response {
    let user = match require(Access::Admin, viewer) {
        Ok(user) => user,
        Err(redirect) => return redirect,
    };
    match dashboard::admin_stats(&state.pool).await {
        Ok(stats) => {
            let sections = vec![
                Link { label: "Manage Cars", href: "/admin/cars" },
                Link { label: "Manage Rentals", href: "/admin/rentals" },
            ];
            render("Admin Dashboard", Some(user), AdminDashboardView { stats, sections })
        }
        Err(e) => notice::error(dashboard_routes::dashboard_error_to_status(&e), &e),
    }
}

/// `GET /admin/cars`
pub async fn admin_cars(State(state): State<AppState>, viewer: Viewer) -> Response {
    let user = match require(Access::Admin, viewer) {
        Ok(user) => user,
        Err(redirect) => return redirect,
    };
    match car::list_cars(&state.pool).await {
        Ok(cars) => {
            let view = AdminCarsView { cars, status_options: EDITABLE_STATUSES };
            render("Car Management", Some(user), view)
        }
        Err(e) => notice::error(cars::car_error_to_status(&e), &e),
    }
}

/// `GET /admin/rentals`: pending damage reports above the full rental table.
pub async fn admin_rentals(State(state): State<AppState>, viewer: Viewer) -> Response {
    let user = match require(Access::Admin, viewer) {
        Ok(user) => user,
        Err(redirect) => return redirect,
    };
    let loaded = tokio::try_join!(
        async {
            damage::list_damages(&state.pool, Some(DamageStatus::Pending))
                .await
                .map_err(|e| notice::error(damages::damage_error_to_status(&e), &e))
        },
        async {
            rental::list_all_rentals(&state.pool)
                .await
                .map_err(|e| notice::error(rentals::rental_error_to_status(&e), &e))
        },
    );
    match loaded {
        Ok((pending_damages, rentals)) => {
            render("Rental Management", Some(user), AdminRentalsView { pending_damages, rentals })
        }
        Err(response) => response,
    }
}

#[cfg(test)]
#[path = "pages_test.rs"]
mod tests;
