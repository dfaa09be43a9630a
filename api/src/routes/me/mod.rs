//! # me Routes Module
//!
//! Student-facing routes mounted at `/api/me`, behind `allow_student`.
//!
//! - `classes.rs`: enrolled classes, join, leave
//! - `attendance.rs`: active sessions and attendance history

pub mod attendance;
pub mod classes;

use axum::{
    Router,
    routing::{delete, get, post},
};
use util::state::AppState;

use attendance::{get_active_sessions, get_my_attendance};
use classes::{get_my_classes, join_class, leave_class};

/// Builds the `/me` route group.
///
/// - `GET    /me/classes`            → `get_my_classes`
/// - `POST   /me/classes/join`       → `join_class`
/// - `DELETE /me/classes/{class_id}` → `leave_class`
/// - `GET    /me/sessions/active`    → `get_active_sessions`
/// - `GET    /me/attendance`         → `get_my_attendance`
pub fn me_routes() -> Router<AppState> {
    Router::new()
        .route("/classes", get(get_my_classes))
        .route("/classes/join", post(join_class))
        .route("/classes/{class_id}", delete(leave_class))
        .route("/sessions/active", get(get_active_sessions))
        .route("/attendance", get(get_my_attendance))
}
