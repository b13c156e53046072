use bms_common::{EmailAddress, Secret};
use serde::{Deserialize, Serialize};

/// Login request body. The password deserializes straight into a [`Secret`] so it never
/// shows up in request logs.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: EmailAddress,
    pub password: Secret<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
}

impl LoginResponse {
    pub fn bearer(access_token: String) -> Self {
        Self { access_token, token_type: "bearer".to_string() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PasswordResetRequest {
    pub email: EmailAddress,
}

/// Body shared by the two endpoints that actually change the password.
#[derive(Debug, Clone, Deserialize)]
pub struct PasswordChangeRequest {
    pub email: EmailAddress,
    pub new_password: Secret<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetTokenResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new<S: std::fmt::Display>(message: S) -> Self {
        Self { message: message.to_string() }
    }
}
