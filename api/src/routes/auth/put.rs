use axum::{Extension, Json, extract::State, http::StatusCode};
use db::models::user::Model as UserModel;
use serde::Deserialize;
use util::state::AppState;
use validator::Validate;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::response::ApiResponse;
use crate::routes::common::UserResponse;

/// Only the display name is editable. Unknown fields such as `role` are ignored.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Display name must be between 1 and 100 characters"
    ))]
    pub display_name: String,
}

/// PUT /auth/me
///
/// Updates the caller's display name. Names already shown on class rosters
/// are not rewritten.
///
/// ### Request Body
/// ```json
/// { "display_name": "Ms J. Smith" }
/// ```
///
/// ### Responses
///
/// - `200 OK`
/// ```json
/// {
///   "success": true,
///   "data": {
///     "id": 1,
///     "email": "teacher@example.com",
///     "display_name": "Ms J. Smith",
///     "role": "teacher"
///   },
///   "message": "Profile updated successfully"
/// }
/// ```
///
/// - `400 Bad Request` (empty or too long display name)
pub async fn update_me(
    State(app_state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Json(req): Json<UpdateProfileRequest>,
) -> ApiResult<UserResponse> {
    req.validate()?;
    let user = UserModel::update_profile(app_state.db(), claims.sub, &req.display_name).await?;
    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(
            UserResponse::from(user),
            "Profile updated successfully",
        )),
    ))
}
