use db::error::DomainError;
use db::models::user::{Model as UserModel, UserRole};
use sea_orm::DbConn;
use serde::Serialize;

use crate::error::ApiError;

/// Public view of a user account.
#[derive(Debug, Serialize, Default)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub display_name: String,
    pub role: String,
}

impl From<UserModel> for UserResponse {
    fn from(user: UserModel) -> Self {
        Self {
            id: user.id,
            email: user.email,
            display_name: user.display_name,
            role: user.role.to_string(),
        }
    }
}

/// Loads the account behind a token. A token for a deleted user is treated as not found.
pub async fn load_user(db: &DbConn, user_id: i64) -> Result<UserModel, ApiError> {
    UserModel::get_by_id(db, user_id)
        .await?
        .ok_or_else(|| DomainError::NotFound("User not found".into()).into())
}

pub fn parse_role(role: &str) -> Result<UserRole, ApiError> {
    role.parse::<UserRole>()
        .map_err(|_| ApiError::BadRequest("Role must be either 'teacher' or 'student'".into()))
}
