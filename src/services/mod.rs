//! Domain services used by the HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own business rules and persistence so route handlers can
//! stay focused on request parsing, auth extraction, and status mapping.
//! Every function takes a `&PgPool` and returns a typed error.

pub mod account;
pub mod car;
pub mod damage;
pub mod dashboard;
pub mod password;
pub mod rental;
pub mod session;
