//! Request/response types for auth endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// User-visible message for both unknown usernames and wrong passwords.
/// The two cases must stay indistinguishable to prevent account enumeration.
pub(super) const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// User-visible message once an account is blocked, including the attempt
/// that reached the lockout threshold.
pub(super) const ACCOUNT_BLOCKED: &str = "Account is blocked";

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginResponse {
    pub username: String,
    pub role: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SessionResponse {
    pub account_id: String,
    pub username: String,
    pub role: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct UnblockRequest {
    pub username: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub(super) fn new(message: &str) -> Self {
        Self {
            error: message.to_string(),
        }
    }
}
