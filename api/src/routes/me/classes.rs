use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use db::models::{class_student, user_class};
use serde::Deserialize;
use util::state::AppState;
use validator::Validate;

use crate::auth::AuthUser;
use crate::auth::guards::Empty;
use crate::error::ApiResult;
use crate::response::ApiResponse;
use crate::routes::common::load_user;

#[derive(Debug, Deserialize, Validate)]
pub struct JoinClassRequest {
    #[validate(length(
        min = 1,
        max = 20,
        message = "Join code must be between 1 and 20 characters"
    ))]
    pub join_code: String,
}

/// GET /me/classes
///
/// Classes the student is enrolled in, most recently joined first.
///
/// ```json
/// {
///   "success": true,
///   "data": [
///     { "user_id": 7, "class_id": 1, "class_name": "Geography", "teacher_name": "Ms Smith", "join_date": "2025-10-01T09:00:00Z" }
///   ],
///   "message": "Classes retrieved successfully"
/// }
/// ```
pub async fn get_my_classes(
    State(app_state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
) -> ApiResult<Vec<user_class::Model>> {
    let classes = user_class::Model::list_for_user(app_state.db(), claims.sub).await?;
    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(classes, "Classes retrieved successfully")),
    ))
}

/// POST /me/classes/join
///
/// Joins a class by its join code. Codes are case-insensitive.
///
/// ### Request Body
/// ```json
/// { "join_code": "K7Q2MZ" }
/// ```
///
/// ### Responses
/// - `201 Created` with the new enrollment
/// - `400 Bad Request` when the class is archived
/// - `404 Not Found` for an unknown code
/// - `409 Conflict` when already enrolled
pub async fn join_class(
    State(app_state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Json(req): Json<JoinClassRequest>,
) -> ApiResult<user_class::Model> {
    req.validate()?;
    let db = app_state.db();
    let student = load_user(db, claims.sub).await?;
    let enrollment = class_student::Model::enroll(db, &student, &req.join_code).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(enrollment, "Joined class successfully")),
    ))
}

/// DELETE /me/classes/{class_id}
///
/// Leaves a class. Refused with `409 Conflict` while a session is active.
pub async fn leave_class(
    State(app_state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Path(class_id): Path<i64>,
) -> ApiResult<Empty> {
    class_student::Model::leave(app_state.db(), claims.sub, class_id).await?;
    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(Empty::default(), "Left class successfully")),
    ))
}
