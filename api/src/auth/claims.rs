use db::models::user::UserRole;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User id.
    pub sub: i64,
    pub role: UserRole,
    pub exp: usize,
}

impl Claims {
    pub fn is_teacher(&self) -> bool {
        self.role == UserRole::Teacher
    }

    pub fn is_student(&self) -> bool {
        self.role == UserRole::Student
    }
}

/// Authenticated caller, placed in request extensions by the guards.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);
