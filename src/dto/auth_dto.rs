use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::user::Role;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterPayload {
    #[validate(length(min = 1, message = "please enter your name"))]
    pub name: String,
    #[validate(email(message = "please enter valid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "your password must be at least 8 characters long"))]
    pub password: String,
    /// Defaults to `user`; `admin` is rejected at the handler.
    pub role: Option<Role>,
}

/// Both fields optional so a missing one answers with the historical
/// message instead of a deserialization rejection.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoginPayload {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ForgotPasswordPayload {
    #[validate(email(message = "please enter valid email address"))]
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ResetPasswordPayload {
    #[validate(length(min = 8, message = "your password must be at least 8 characters long"))]
    pub password: String,
}

/// Issued on register, login and password changes.
#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub success: bool,
    pub token: String,
}

impl TokenResponse {
    pub fn new(token: String) -> Self {
        Self {
            success: true,
            token,
        }
    }
}
