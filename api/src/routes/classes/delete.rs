use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use db::models::class_student;
use util::state::AppState;

use crate::auth::AuthUser;
use crate::auth::guards::Empty;
use crate::error::ApiResult;
use crate::response::ApiResponse;

/// DELETE /classes/{class_id}/students/{student_id}
///
/// Removes a student from the class and from the student's own class list.
///
/// ### Responses
/// - `200 OK`
/// - `404 Not Found` when the student is not enrolled
/// - `409 Conflict` while the class has an active session
pub async fn remove_student(
    State(app_state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Path((class_id, student_id)): Path<(i64, i64)>,
) -> ApiResult<Empty> {
    class_student::Model::remove(app_state.db(), claims.sub, class_id, student_id).await?;
    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(Empty::default(), "Student removed from class")),
    ))
}
