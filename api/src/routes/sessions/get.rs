use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use db::models::attendance_session;
use db::reports::{self, SessionRoster, TeacherSessionView};
use util::state::AppState;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::response::ApiResponse;
use crate::routes::common::load_user;

use super::common::SessionListQuery;

/// GET /sessions
///
/// Every session the calling teacher runs, most recently started first.
///
/// ### Query Parameters
/// - `status` (optional): `scheduled`, `active`, `ended`, `cancelled` or `all`.
/// - `class_id` (optional): restrict to one class.
///
/// ### Responses
///
/// - `200 OK`
/// ```json
/// {
///   "success": true,
///   "data": [
///     {
///       "id": 4,
///       "class_id": 1,
///       "teacher_id": 3,
///       "title": "Geography",
///       "status": "ended",
///       "latitude": null,
///       "longitude": null,
///       "radius_m": null,
///       "start_time": "2025-10-02T09:00:00Z",
///       "end_time": "2025-10-02T10:00:00Z",
///       "created_at": "2025-10-02T08:59:00Z",
///       "updated_at": "2025-10-02T10:00:00Z",
///       "class_name": "Geography",
///       "attendance_count": 24
///     }
///   ],
///   "message": "Sessions retrieved successfully"
/// }
/// ```
/// - `400 Bad Request` for an unknown status
pub async fn get_teacher_sessions(
    State(app_state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Query(query): Query<SessionListQuery>,
) -> ApiResult<Vec<TeacherSessionView>> {
    let status = query.status()?;
    let sessions =
        reports::teacher_sessions(app_state.db(), claims.sub, status, query.class_id).await?;
    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(sessions, "Sessions retrieved successfully")),
    ))
}

/// GET /sessions/{session_id}
///
/// Visible to the teacher running the session and to students enrolled in its class.
///
/// ```json
/// {
///   "success": true,
///   "data": {
///     "id": 4,
///     "class_id": 1,
///     "teacher_id": 3,
///     "title": "Geography",
///     "status": "active",
///     "latitude": -25.7545,
///     "longitude": 28.2314,
///     "radius_m": 100.0,
///     "start_time": "2025-10-02T09:00:00Z",
///     "end_time": null,
///     "created_at": "2025-10-02T08:59:00Z",
///     "updated_at": "2025-10-02T09:00:00Z"
///   },
///   "message": "Session retrieved successfully"
/// }
/// ```
pub async fn get_session(
    State(app_state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Path(session_id): Path<i64>,
) -> ApiResult<attendance_session::Model> {
    let db = app_state.db();
    let user = load_user(db, claims.sub).await?;
    let session = attendance_session::Model::get_for_user(db, session_id, &user).await?;
    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(session, "Session retrieved successfully")),
    ))
}

/// GET /sessions/{session_id}/attendance
///
/// Live roster: every enrolled student with their status, plus counts.
/// Students without a record are listed as `absent`.
///
/// ```json
/// {
///   "success": true,
///   "data": {
///     "session": { "id": 4, "status": "active", "...": "..." },
///     "counts": { "attendance_count": 1, "verified": 1, "checked_in": 0, "failed_location": 0, "failed_other": 0, "checked_out_early": 0, "absent": 1 },
///     "students": [
///       { "student_id": 7, "student_name": "Sam", "status": "verified", "check_in_time": "2025-10-02T09:03:00Z", "check_out_time": null, "distance_m": 12.4, "is_gps_verified": true },
///       { "student_id": 8, "student_name": "Zoe", "status": "absent", "check_in_time": null, "check_out_time": null, "distance_m": null, "is_gps_verified": false }
///     ]
///   },
///   "message": "Attendance retrieved successfully"
/// }
/// ```
pub async fn get_session_attendance(
    State(app_state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Path(session_id): Path<i64>,
) -> ApiResult<SessionRoster> {
    let roster = reports::session_roster(app_state.db(), claims.sub, session_id).await?;
    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(roster, "Attendance retrieved successfully")),
    ))
}
