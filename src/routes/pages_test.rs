use super::*;
use uuid::Uuid;

fn user(is_admin: bool) -> SessionUser {
    SessionUser { id: Uuid::new_v4(), full_name: "Pat Renter".into(), email: "pat@example.com".into(), is_admin }
}

// =============================================================================
// decide
// =============================================================================

#[test]
fn public_pages_render_for_anyone() {
    assert_eq!(decide(Access::Public, None), GateDecision::Render(None));
    let viewer = user(false);
    assert_eq!(decide(Access::Public, Some(viewer.clone())), GateDecision::Render(Some(viewer)));
}

#[test]
fn user_pages_require_session() {
    assert_eq!(decide(Access::User, None), GateDecision::RedirectToLogin);
    let viewer = user(false);
    assert_eq!(decide(Access::User, Some(viewer.clone())), GateDecision::Render(Some(viewer)));
}

#[test]
fn admin_pages_redirect_non_admins() {
    assert_eq!(decide(Access::Admin, None), GateDecision::RedirectToLogin);
    assert_eq!(decide(Access::Admin, Some(user(false))), GateDecision::RedirectToLogin);
    let admin = user(true);
    assert_eq!(decide(Access::Admin, Some(admin.clone())), GateDecision::Render(Some(admin)));
}

#[test]
fn admins_can_open_user_pages() {
    assert!(matches!(decide(Access::User, Some(user(true))), GateDecision::Render(Some(_))));
}

#[test]
fn require_turns_refusal_into_login_redirect() {
    let Err(response) = require(Access::Admin, Viewer(Some(user(false)))) else {
        panic!("non-admin should be refused");
    };
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.headers()[axum::http::header::LOCATION], LOGIN_PATH);
}

// =============================================================================
// forms
// =============================================================================

#[test]
fn login_form_posts_credentials() {
    let form = login_form();
    assert_eq!(form.action, "/api/auth/login");
    let names: Vec<_> = form.fields.iter().map(|f| f.name).collect();
    assert_eq!(names, ["email", "password"]);
    assert_eq!(form.alternate.href, "/register");
}

#[test]
fn register_form_marks_contact_fields_optional() {
    let form = register_form();
    let optional: Vec<_> = form.fields.iter().filter(|f| !f.required).map(|f| f.name).collect();
    assert_eq!(optional, ["phone_number", "address"]);
}

// =============================================================================
// admin car form
// =============================================================================

#[test]
fn admin_status_options_are_all_editable() {
    assert!(!EDITABLE_STATUSES.contains(&CarStatus::Rented));
    for from in EDITABLE_STATUSES {
        for to in EDITABLE_STATUSES {
            assert!(car::check_status_edit(Some(from), to).is_ok(), "{from:?} -> {to:?}");
        }
    }
}

#[test]
fn admin_cars_view_serializes_editable_options() {
    let view = AdminCarsView { cars: Vec::new(), status_options: EDITABLE_STATUSES };
    let json = serde_json::to_value(&view).unwrap();
    assert_eq!(json["status_options"], serde_json::json!(["available", "maintenance"]));
}
