use axum::{
    Json,
    body::Body,
    extract::FromRequestParts,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use db::models::user::UserRole;

use crate::auth::claims::AuthUser;
use crate::response::ApiResponse;

/// Placeholder payload for error envelopes. Serializes as `{}`.
#[derive(serde::Serialize, Default, Debug)]
pub struct Empty {}

type GuardResult = Result<Response, (StatusCode, Json<ApiResponse<Empty>>)>;

/// Extracts and validates the caller, then stores it in the request extensions
/// so handlers can take `Extension<AuthUser>`.
async fn extract_and_insert_authuser(
    req: Request<Body>,
) -> Result<(Request<Body>, AuthUser), (StatusCode, Json<ApiResponse<Empty>>)> {
    let (mut parts, body) = req.into_parts();
    let user = AuthUser::from_request_parts(&mut parts, &())
        .await
        .map_err(|_| {
            (
                StatusCode::UNAUTHORIZED,
                Json(ApiResponse::error("Authentication required")),
            )
        })?;

    let mut req = Request::from_parts(parts, body);
    req.extensions_mut().insert(user.clone());
    Ok((req, user))
}

/// Basic guard to ensure the request is authenticated.
pub async fn allow_authenticated(req: Request<Body>, next: Next) -> GuardResult {
    let (req, _user) = extract_and_insert_authuser(req).await?;
    Ok(next.run(req).await)
}

async fn allow_role(
    req: Request<Body>,
    next: Next,
    role: UserRole,
    failure_msg: &str,
) -> GuardResult {
    let (req, user) = extract_and_insert_authuser(req).await?;

    if user.0.role != role {
        return Err((StatusCode::FORBIDDEN, Json(ApiResponse::error(failure_msg))));
    }

    Ok(next.run(req).await)
}

/// Teacher-only guard. Ownership of the targeted class is checked by the handler.
pub async fn allow_teacher(req: Request<Body>, next: Next) -> GuardResult {
    allow_role(req, next, UserRole::Teacher, "Teacher access required").await
}

/// Student-only guard.
pub async fn allow_student(req: Request<Body>, next: Next) -> GuardResult {
    allow_role(req, next, UserRole::Student, "Student access required").await
}
