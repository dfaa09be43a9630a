use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use db::models::attendance_record;
use util::state::AppState;

use super::common::{CheckInRequest, ToggleResponse};
use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::response::ApiResponse;

/// POST /sessions/{session_id}/attendance/{student_id}/toggle
///
/// Flips a student between present and not present. Toggling twice restores
/// the original state.
///
/// ```json
/// {
///   "success": true,
///   "data": { "session_id": 4, "student_id": 7, "present": true },
///   "message": "Student marked present"
/// }
/// ```
pub async fn toggle_attendance(
    State(app_state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Path((session_id, student_id)): Path<(i64, i64)>,
) -> ApiResult<ToggleResponse> {
    let present =
        attendance_record::Model::toggle(app_state.db(), claims.sub, session_id, student_id)
            .await?;
    let message = if present {
        "Student marked present"
    } else {
        "Student marked not present"
    };

    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(
            ToggleResponse {
                session_id,
                student_id,
                present,
            },
            message,
        )),
    ))
}

/// POST /sessions/{session_id}/check-in
///
/// Student check-in. Sessions with a geofence need the student's location.
///
/// ### Request Body
/// ```json
/// { "latitude": -25.7546, "longitude": 28.2315 }
/// ```
///
/// ### Responses
/// - `201 Created` with the record. `status` is `verified` inside the radius,
///   `failed_location` outside it and `checked_in` when the session has no geofence.
/// - `400 Bad Request` when the session is not active or a required location is missing
/// - `403 Forbidden` when the student is not enrolled
/// - `409 Conflict` when the student already checked in
pub async fn check_in(
    State(app_state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Path(session_id): Path<i64>,
    Json(req): Json<CheckInRequest>,
) -> ApiResult<attendance_record::Model> {
    let location = req.coordinates()?;
    let record =
        attendance_record::Model::check_in(app_state.db(), session_id, claims.sub, location)
            .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(record, "Checked in")),
    ))
}

/// POST /sessions/{session_id}/check-out
///
/// Leaves an active session early. The record becomes `checked_out_early`.
pub async fn check_out(
    State(app_state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Path(session_id): Path<i64>,
) -> ApiResult<attendance_record::Model> {
    let record =
        attendance_record::Model::check_out(app_state.db(), session_id, claims.sub).await?;
    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(record, "Checked out")),
    ))
}
