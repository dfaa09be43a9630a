//! # classes Routes Module
//!
//! Teacher-facing class management mounted at `/api/classes`. The whole group
//! sits behind `allow_teacher`; each handler checks that the caller owns the
//! class it touches.
//!
//! - `get.rs`: list classes, class details, roster, sessions, attendance report
//! - `post.rs`: create class, regenerate join code, create session
//! - `put.rs`: edit, archive, unarchive
//! - `delete.rs`: remove a student

pub mod common;
pub mod delete;
pub mod get;
pub mod post;
pub mod put;

use axum::{
    Router,
    routing::{delete, get, post, put},
};
use util::state::AppState;

use delete::remove_student;
use get::{get_class, get_class_attendance, get_class_sessions, get_class_students, get_classes};
use post::{create_class, create_session, regenerate_join_code};
use put::{archive_class, edit_class, unarchive_class};

/// Builds the `/classes` route group.
///
/// - `GET    /classes`                                  → `get_classes`
/// - `POST   /classes`                                  → `create_class`
/// - `GET    /classes/{class_id}`                       → `get_class`
/// - `PUT    /classes/{class_id}`                       → `edit_class`
/// - `PUT    /classes/{class_id}/archive`               → `archive_class`
/// - `PUT    /classes/{class_id}/unarchive`             → `unarchive_class`
/// - `POST   /classes/{class_id}/join-code`             → `regenerate_join_code`
/// - `GET    /classes/{class_id}/students`              → `get_class_students`
/// - `DELETE /classes/{class_id}/students/{student_id}` → `remove_student`
/// - `GET    /classes/{class_id}/attendance`            → `get_class_attendance`
/// - `GET    /classes/{class_id}/sessions`              → `get_class_sessions`
/// - `POST   /classes/{class_id}/sessions`              → `create_session`
pub fn classes_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get_classes).post(create_class))
        .route("/{class_id}", get(get_class).put(edit_class))
        .route("/{class_id}/archive", put(archive_class))
        .route("/{class_id}/unarchive", put(unarchive_class))
        .route("/{class_id}/join-code", post(regenerate_join_code))
        .route("/{class_id}/students", get(get_class_students))
        .route("/{class_id}/students/{student_id}", delete(remove_student))
        .route("/{class_id}/attendance", get(get_class_attendance))
        .route(
            "/{class_id}/sessions",
            get(get_class_sessions).post(create_session),
        )
}
