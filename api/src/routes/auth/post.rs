use axum::{Json, extract::State, http::StatusCode};
use db::error::DomainError;
use db::models::user::Model as UserModel;
use sea_orm::SqlErr;
use serde::{Deserialize, Serialize};
use util::state::AppState;
use validator::Validate;

use crate::auth::generate_jwt;
use crate::error::{ApiError, ApiResult};
use crate::response::ApiResponse;
use crate::routes::common::parse_role;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(
        min = 1,
        max = 100,
        message = "Display name must be between 1 and 100 characters"
    ))]
    pub display_name: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    /// `teacher` or `student`.
    pub role: String,
}

#[derive(Debug, Serialize, Default)]
pub struct AuthResponse {
    pub id: i64,
    pub email: String,
    pub display_name: String,
    pub role: String,
    pub token: String,
    pub expires_at: String,
}

impl AuthResponse {
    fn issue(user: UserModel) -> Result<Self, ApiError> {
        let (token, expires_at) = generate_jwt(user.id, user.role)
            .map_err(|e| ApiError::Internal(format!("Failed to sign token: {e}")))?;
        Ok(Self {
            id: user.id,
            email: user.email,
            display_name: user.display_name,
            role: user.role.to_string(),
            token,
            expires_at,
        })
    }
}

/// POST /auth/register
///
/// Register a new teacher or student account and issue a JWT.
///
/// ### Request Body
/// ```json
/// {
///   "email": "teacher@example.com",
///   "display_name": "Ms Smith",
///   "password": "strongpassword",
///   "role": "teacher"
/// }
/// ```
///
/// ### Responses
///
/// - `201 Created`
/// ```json
/// {
///   "success": true,
///   "data": {
///     "id": 1,
///     "email": "teacher@example.com",
///     "display_name": "Ms Smith",
///     "role": "teacher",
///     "token": "jwt_token_here",
///     "expires_at": "2025-10-01T11:00:00+00:00"
///   },
///   "message": "User registered successfully"
/// }
/// ```
///
/// - `400 Bad Request` (validation failure or unknown role)
/// - `409 Conflict` (email already registered)
pub async fn register(
    State(app_state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<AuthResponse> {
    req.validate()?;
    let role = parse_role(&req.role)?;
    let db = app_state.db();

    if UserModel::get_by_email(db, &req.email).await?.is_some() {
        return Err(DomainError::Conflict("A user with this email already exists".into()).into());
    }

    let user = UserModel::create(db, &req.email, &req.display_name, &req.password, role)
        .await
        .map_err(|err| match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                DomainError::Conflict("A user with this email already exists".into())
            }
            _ => DomainError::Database(err),
        })?;

    tracing::info!(user_id = user.id, role = %user.role, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            AuthResponse::issue(user)?,
            "User registered successfully",
        )),
    ))
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    pub password: String,
}

/// POST /auth/login
///
/// Authenticate an existing user and issue a JWT.
///
/// ### Request Body
/// ```json
/// {
///   "email": "student@example.com",
///   "password": "strongpassword"
/// }
/// ```
///
/// ### Responses
///
/// - `200 OK` with the same payload as `register`
/// - `401 Unauthorized`
/// ```json
/// {
///   "success": false,
///   "data": {},
///   "message": "Invalid email or password"
/// }
/// ```
pub async fn login(
    State(app_state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<AuthResponse> {
    req.validate()?;

    let Some(user) = UserModel::verify_credentials(app_state.db(), &req.email, &req.password).await?
    else {
        return Err(ApiError::Unauthorized("Invalid email or password".into()));
    };

    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(
            AuthResponse::issue(user)?,
            "Login successful",
        )),
    ))
}
