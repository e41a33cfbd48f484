use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordPayload {
    pub current_password: String,
    #[validate(length(min = 8, message = "your password must be at least 8 characters long"))]
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateMePayload {
    #[validate(length(min = 1, message = "please enter your name"))]
    pub name: Option<String>,
    #[validate(email(message = "please enter valid email address"))]
    pub email: Option<String>,
}
