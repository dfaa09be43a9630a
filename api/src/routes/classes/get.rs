use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use db::models::{attendance_session, class, class_student};
use db::reports::{self, ClassAttendanceReport};
use util::state::AppState;

use super::common::{ClassListQuery, ClassResponse};
use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::response::ApiResponse;

/// GET /classes
///
/// Lists the caller's classes, newest first.
///
/// ### Query Parameters
/// - `archived` (optional): `true` for archived classes only, `false` for active ones only.
///
/// ### Responses
///
/// - `200 OK`
/// ```json
/// {
///   "success": true,
///   "data": [
///     {
///       "id": 1,
///       "name": "Geography",
///       "teacher_id": 3,
///       "join_code": "K7Q2MZ",
///       "subject": "Humanities",
///       "room": "B12",
///       "is_archived": false,
///       "archived_at": null,
///       "created_at": "2025-10-01T08:00:00Z",
///       "updated_at": "2025-10-01T08:00:00Z"
///     }
///   ],
///   "message": "Classes retrieved successfully"
/// }
/// ```
pub async fn get_classes(
    State(app_state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Query(query): Query<ClassListQuery>,
) -> ApiResult<Vec<class::Model>> {
    let classes = class::Model::list_for_teacher(app_state.db(), claims.sub, query.archived).await?;
    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(classes, "Classes retrieved successfully")),
    ))
}

/// GET /classes/{class_id}
///
/// Class details with `student_count`.
///
/// - `403 Forbidden` when the caller does not own the class
/// - `404 Not Found` when the class does not exist
pub async fn get_class(
    State(app_state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Path(class_id): Path<i64>,
) -> ApiResult<ClassResponse> {
    let db = app_state.db();
    let class = class::Model::get_owned(db, class_id, claims.sub).await?;
    let student_count = class_student::Model::list_for_class(db, class_id).await?.len();

    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(
            ClassResponse {
                class,
                student_count,
            },
            "Class retrieved successfully",
        )),
    ))
}

/// GET /classes/{class_id}/students
///
/// Roster ordered by student name.
///
/// ```json
/// {
///   "success": true,
///   "data": [
///     { "class_id": 1, "student_id": 7, "student_name": "Sam", "join_date": "2025-10-01T09:00:00Z" }
///   ],
///   "message": "Students retrieved successfully"
/// }
/// ```
pub async fn get_class_students(
    State(app_state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Path(class_id): Path<i64>,
) -> ApiResult<Vec<class_student::Model>> {
    let db = app_state.db();
    class::Model::get_owned(db, class_id, claims.sub).await?;
    let students = class_student::Model::list_for_class(db, class_id).await?;
    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(students, "Students retrieved successfully")),
    ))
}

/// GET /classes/{class_id}/sessions
///
/// All sessions of the class, newest first.
pub async fn get_class_sessions(
    State(app_state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Path(class_id): Path<i64>,
) -> ApiResult<Vec<attendance_session::Model>> {
    let sessions =
        attendance_session::Model::list_for_class(app_state.db(), class_id, claims.sub).await?;
    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(sessions, "Sessions retrieved successfully")),
    ))
}

/// GET /classes/{class_id}/attendance
///
/// Attendance history of the class. Only sessions that have been started are
/// counted; students without a record count as absent.
///
/// ```json
/// {
///   "success": true,
///   "data": {
///     "class_id": 1,
///     "total_sessions": 2,
///     "enrolled_student_count": 3,
///     "overall_attendance_rate": 83.33,
///     "totals": { "attendance_count": 5, "verified": 4, "checked_in": 1, "failed_location": 0, "failed_other": 0, "checked_out_early": 0, "absent": 1 },
///     "sessions": [
///       {
///         "session_id": 2,
///         "title": "Geography",
///         "status": "ended",
///         "start_time": "2025-10-02T09:00:00Z",
///         "end_time": "2025-10-02T10:00:00Z",
///         "attendance_count": 3,
///         "verified": 3,
///         "checked_in": 0,
///         "failed_location": 0,
///         "failed_other": 0,
///         "checked_out_early": 0,
///         "absent": 0,
///         "attendance_rate": 100.0
///       }
///     ]
///   },
///   "message": "Attendance report retrieved successfully"
/// }
/// ```
pub async fn get_class_attendance(
    State(app_state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Path(class_id): Path<i64>,
) -> ApiResult<ClassAttendanceReport> {
    let report = reports::class_attendance(app_state.db(), claims.sub, class_id).await?;
    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(
            report,
            "Attendance report retrieved successfully",
        )),
    ))
}
