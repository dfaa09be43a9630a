use axum::{Extension, Json, extract::State, http::StatusCode};
use util::state::AppState;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::response::ApiResponse;
use crate::routes::common::{UserResponse, load_user};

/// GET /auth/me
///
/// Returns the account behind the bearer token.
///
/// ```json
/// {
///   "success": true,
///   "data": {
///     "id": 1,
///     "email": "teacher@example.com",
///     "display_name": "Ms Smith",
///     "role": "teacher"
///   },
///   "message": "User data retrieved successfully"
/// }
/// ```
pub async fn get_me(
    State(app_state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
) -> ApiResult<UserResponse> {
    let user = load_user(app_state.db(), claims.sub).await?;
    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(
            UserResponse::from(user),
            "User data retrieved successfully",
        )),
    ))
}
