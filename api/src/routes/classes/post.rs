use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use db::models::attendance_session::{self, SessionOptions};
use db::models::class;
use util::state::AppState;
use validator::Validate;

use super::common::{CreateClassRequest, CreateSessionRequest, location_from_parts};
use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::response::ApiResponse;

/// POST /classes
///
/// Creates a class owned by the caller with a fresh join code.
///
/// ### Request Body
/// ```json
/// { "name": "Geography", "subject": "Humanities", "room": "B12" }
/// ```
///
/// ### Responses
/// - `201 Created` with the class
/// - `400 Bad Request` when the name is missing or too long
pub async fn create_class(
    State(app_state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Json(req): Json<CreateClassRequest>,
) -> ApiResult<class::Model> {
    req.validate()?;
    let class = class::Model::create(
        app_state.db(),
        claims.sub,
        &req.name,
        req.subject.as_deref(),
        req.room.as_deref(),
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(class, "Class created successfully")),
    ))
}

/// POST /classes/{class_id}/join-code
///
/// Replaces the join code. The previous code stops working immediately.
pub async fn regenerate_join_code(
    State(app_state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Path(class_id): Path<i64>,
) -> ApiResult<class::Model> {
    let class = class::Model::regenerate_join_code(app_state.db(), class_id, claims.sub).await?;
    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(class, "Join code regenerated successfully")),
    ))
}

/// POST /classes/{class_id}/sessions
///
/// Creates an attendance session for the class.
///
/// ### Request Body
/// All fields are optional. `latitude` and `longitude` must be given together;
/// `radius_m` defaults to `DEFAULT_SESSION_RADIUS_M`.
/// ```json
/// {
///   "title": "Monday field trip",
///   "latitude": -25.7545,
///   "longitude": 28.2314,
///   "radius_m": 150,
///   "start_now": true
/// }
/// ```
///
/// ### Responses
/// - `201 Created` with the session
/// - `400 Bad Request` for an archived class or an invalid geofence
/// - `409 Conflict` when `start_now` is set and another session is already active
pub async fn create_session(
    State(app_state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Path(class_id): Path<i64>,
    Json(req): Json<CreateSessionRequest>,
) -> ApiResult<attendance_session::Model> {
    req.validate()?;
    let location = location_from_parts(req.latitude, req.longitude, req.radius_m)?;

    let session = attendance_session::Model::create(
        app_state.db(),
        claims.sub,
        class_id,
        SessionOptions {
            title: req.title,
            location,
            start_now: req.start_now,
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(session, "Session created successfully")),
    ))
}
