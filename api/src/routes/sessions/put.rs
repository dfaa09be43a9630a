use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use db::models::{attendance_record, attendance_session};
use util::state::AppState;

use super::common::{LocationRequest, MarkAttendanceRequest};
use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::response::ApiResponse;
use crate::routes::classes::common::location_from_parts;

/// PUT /sessions/{session_id}/start
///
/// `scheduled → active`. Already active is a no-op.
///
/// - `400 Bad Request` for an ended or cancelled session
/// - `409 Conflict` when another session of the class is active
pub async fn start_session(
    State(app_state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Path(session_id): Path<i64>,
) -> ApiResult<attendance_session::Model> {
    let session = attendance_session::Model::start(app_state.db(), session_id, claims.sub).await?;
    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(session, "Session started")),
    ))
}

/// PUT /sessions/{session_id}/end
pub async fn end_session(
    State(app_state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Path(session_id): Path<i64>,
) -> ApiResult<attendance_session::Model> {
    let session = attendance_session::Model::end(app_state.db(), session_id, claims.sub).await?;
    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(session, "Session ended")),
    ))
}

/// PUT /sessions/{session_id}/cancel
///
/// Only a scheduled session can be cancelled.
pub async fn cancel_session(
    State(app_state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Path(session_id): Path<i64>,
) -> ApiResult<attendance_session::Model> {
    let session = attendance_session::Model::cancel(app_state.db(), session_id, claims.sub).await?;
    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(session, "Session cancelled")),
    ))
}

/// PUT /sessions/{session_id}/location
///
/// Sets the geofence. An empty body clears it.
///
/// ```json
/// { "latitude": -25.7545, "longitude": 28.2314, "radius_m": 80 }
/// ```
pub async fn update_location(
    State(app_state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Path(session_id): Path<i64>,
    Json(req): Json<LocationRequest>,
) -> ApiResult<attendance_session::Model> {
    let location = location_from_parts(req.latitude, req.longitude, req.radius_m)?;
    let session =
        attendance_session::Model::update_location(app_state.db(), session_id, claims.sub, location)
            .await?;
    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(session, "Session location updated")),
    ))
}

/// PUT /sessions/{session_id}/attendance/{student_id}
///
/// Manual override by the teacher.
///
/// ### Request Body
/// ```json
/// { "status": "failed_other" }
/// ```
///
/// `absent` removes the student's record, so `data` is `null`. Any other status
/// returns the stored record. `pending` is rejected.
pub async fn mark_attendance(
    State(app_state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Path((session_id, student_id)): Path<(i64, i64)>,
    Json(req): Json<MarkAttendanceRequest>,
) -> ApiResult<Option<attendance_record::Model>> {
    let status = req.status()?;
    let record =
        attendance_record::Model::mark(app_state.db(), claims.sub, session_id, student_id, status)
            .await?;
    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(record, "Attendance updated")),
    ))
}
