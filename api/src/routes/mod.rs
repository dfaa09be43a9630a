//! HTTP route entry point for `/api/...`.
//!
//! Route groups:
//! - `/health` → Health check endpoint (public)
//! - `/auth` → Registration, login and the current user
//! - `/classes` → Class management for teachers
//! - `/sessions` → Attendance sessions, rosters and check-in
//! - `/me` → Student view of their classes, sessions and attendance

use crate::routes::{
    auth::auth_routes, classes::classes_routes, health::health_routes, me::me_routes,
    sessions::sessions_routes,
};
use crate::auth::guards::{allow_student, allow_teacher};
use axum::{Router, middleware::from_fn};
use util::state::AppState;

pub mod auth;
pub mod classes;
pub mod common;
pub mod health;
pub mod me;
pub mod sessions;

/// Builds the complete application router for all HTTP endpoints, with the
/// state already applied.
///
/// - `/classes` is teacher-only; ownership of each class is checked per request.
/// - `/sessions` mixes teacher and student routes, so its guards are applied per route.
/// - `/me` is student-only.
pub fn routes(app_state: AppState) -> Router {
    Router::new()
        .nest("/health", health_routes())
        .nest("/auth", auth_routes())
        .nest("/classes", classes_routes().route_layer(from_fn(allow_teacher)))
        .nest("/sessions", sessions_routes())
        .nest("/me", me_routes().route_layer(from_fn(allow_student)))
        .with_state(app_state)
}
