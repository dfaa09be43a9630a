use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use db::models::class::{self, ClassChanges};
use util::state::AppState;
use validator::Validate;

use super::common::EditClassRequest;
use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::response::ApiResponse;

/// PUT /classes/{class_id}
///
/// Edits class details. Omitted fields are left as they are; an empty
/// `subject` or `room` clears it. A new name is shown to enrolled students too.
///
/// ```json
/// { "name": "Geography II", "room": "" }
/// ```
pub async fn edit_class(
    State(app_state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Path(class_id): Path<i64>,
    Json(req): Json<EditClassRequest>,
) -> ApiResult<class::Model> {
    req.validate()?;
    let class = class::Model::update_details(
        app_state.db(),
        class_id,
        claims.sub,
        ClassChanges {
            name: req.name,
            subject: req.subject,
            room: req.room,
        },
    )
    .await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(class, "Class updated successfully")),
    ))
}

/// PUT /classes/{class_id}/archive
///
/// Archived classes refuse new students and new sessions.
pub async fn archive_class(
    State(app_state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Path(class_id): Path<i64>,
) -> ApiResult<class::Model> {
    let class = class::Model::set_archived(app_state.db(), class_id, claims.sub, true).await?;
    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(class, "Class archived successfully")),
    ))
}

/// PUT /classes/{class_id}/unarchive
pub async fn unarchive_class(
    State(app_state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Path(class_id): Path<i64>,
) -> ApiResult<class::Model> {
    let class = class::Model::set_archived(app_state.db(), class_id, claims.sub, false).await?;
    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(class, "Class restored successfully")),
    ))
}
