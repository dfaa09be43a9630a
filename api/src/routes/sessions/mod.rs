//! # sessions Routes Module
//!
//! Attendance sessions mounted at `/api/sessions`. Teacher and student routes
//! live side by side, so guards are attached per route.
//!
//! - `get.rs`: teacher's session list, session details, live roster
//! - `post.rs`: toggle, check-in, check-out
//! - `put.rs`: lifecycle, geofence, manual mark

pub mod common;
pub mod get;
pub mod post;
pub mod put;

use axum::{
    Router,
    middleware::from_fn,
    routing::{get, post, put},
};
use util::state::AppState;

use crate::auth::guards::{allow_authenticated, allow_student, allow_teacher};
use get::{get_session, get_session_attendance, get_teacher_sessions};
use post::{check_in, check_out, toggle_attendance};
use put::{cancel_session, end_session, mark_attendance, start_session, update_location};

/// Builds the `/sessions` route group.
///
/// - `GET  /sessions`                                             → teacher
/// - `GET  /sessions/{session_id}`                                → owner or enrolled student
/// - `PUT  /sessions/{session_id}/start`                          → teacher
/// - `PUT  /sessions/{session_id}/end`                            → teacher
/// - `PUT  /sessions/{session_id}/cancel`                         → teacher
/// - `PUT  /sessions/{session_id}/location`                       → teacher
/// - `GET  /sessions/{session_id}/attendance`                     → teacher
/// - `PUT  /sessions/{session_id}/attendance/{student_id}`        → teacher
/// - `POST /sessions/{session_id}/attendance/{student_id}/toggle` → teacher
/// - `POST /sessions/{session_id}/check-in`                       → student
/// - `POST /sessions/{session_id}/check-out`                      → student
pub fn sessions_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(get_teacher_sessions).route_layer(from_fn(allow_teacher)),
        )
        .route(
            "/{session_id}",
            get(get_session).route_layer(from_fn(allow_authenticated)),
        )
        .route(
            "/{session_id}/start",
            put(start_session).route_layer(from_fn(allow_teacher)),
        )
        .route(
            "/{session_id}/end",
            put(end_session).route_layer(from_fn(allow_teacher)),
        )
        .route(
            "/{session_id}/cancel",
            put(cancel_session).route_layer(from_fn(allow_teacher)),
        )
        .route(
            "/{session_id}/location",
            put(update_location).route_layer(from_fn(allow_teacher)),
        )
        .route(
            "/{session_id}/attendance",
            get(get_session_attendance).route_layer(from_fn(allow_teacher)),
        )
        .route(
            "/{session_id}/attendance/{student_id}",
            put(mark_attendance).route_layer(from_fn(allow_teacher)),
        )
        .route(
            "/{session_id}/attendance/{student_id}/toggle",
            post(toggle_attendance).route_layer(from_fn(allow_teacher)),
        )
        .route(
            "/{session_id}/check-in",
            post(check_in).route_layer(from_fn(allow_student)),
        )
        .route(
            "/{session_id}/check-out",
            post(check_out).route_layer(from_fn(allow_student)),
        )
}
