use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
};
use db::reports::{self, ActiveSessionView, StudentAttendanceEntry};
use serde::Deserialize;
use util::state::AppState;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::response::ApiResponse;

#[derive(Debug, Deserialize)]
pub struct AttendanceQuery {
    pub class_id: Option<i64>,
}

/// GET /me/sessions/active
///
/// Active sessions across the student's classes, with the student's own
/// status (`null` before check-in).
///
/// ```json
/// {
///   "success": true,
///   "data": [
///     { "id": 4, "class_id": 1, "title": "Geography", "status": "active", "...": "...", "class_name": "Geography", "attendance_status": null }
///   ],
///   "message": "Active sessions retrieved successfully"
/// }
/// ```
pub async fn get_active_sessions(
    State(app_state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
) -> ApiResult<Vec<ActiveSessionView>> {
    let sessions = reports::active_sessions_for_student(app_state.db(), claims.sub).await?;
    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(
            sessions,
            "Active sessions retrieved successfully",
        )),
    ))
}

/// GET /me/attendance
///
/// The student's attendance history, most recent first.
///
/// ### Query Parameters
/// - `class_id` (optional): limit to one class
pub async fn get_my_attendance(
    State(app_state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Query(query): Query<AttendanceQuery>,
) -> ApiResult<Vec<StudentAttendanceEntry>> {
    let history = reports::student_history(app_state.db(), claims.sub, query.class_id).await?;
    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(
            history,
            "Attendance history retrieved successfully",
        )),
    ))
}
