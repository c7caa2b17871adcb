use poem_openapi::{payload::Json, ApiResponse, Object};
use serde::{Deserialize, Serialize};

use crate::types::internal::UserIdentity;

/// Request model for user login
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Username for authentication
    pub username: String,

    /// Password for authentication
    pub password: String,
}

/// Public view of a user account. Never carries credential material.
#[derive(Object, Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserDto {
    /// User ID (UUID)
    pub id: String,

    pub username: String,

    pub display_name: String,

    /// One of student, teacher, admin
    pub role: String,

    pub is_active: bool,

    /// Unix timestamp
    pub created_at: i64,
}

impl From<&UserIdentity> for UserDto {
    fn from(identity: &UserIdentity) -> Self {
        Self {
            id: identity.id.clone(),
            username: identity.username.clone(),
            display_name: identity.display_name.clone(),
            role: identity.role.to_string(),
            is_active: identity.is_active,
            created_at: identity.created_at,
        }
    }
}

impl From<UserIdentity> for UserDto {
    fn from(identity: UserIdentity) -> Self {
        Self::from(&identity)
    }
}

/// Response model for a successful login
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Opaque session token; also set as a cookie
    pub session_token: String,

    /// Token type (always "Bearer")
    pub token_type: String,

    /// Number of seconds until the session expires
    pub expires_in: i64,

    pub user: UserDto,
}

/// Request model for password change
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct ChangePasswordRequest {
    /// Current password for verification
    pub old_password: String,

    /// New password to set
    pub new_password: String,
}

/// Generic success message
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// API response for login endpoint
#[derive(ApiResponse, Debug)]
pub enum LoginApiResponse {
    /// Authentication successful, session issued
    #[oai(status = 200)]
    Ok(Json<LoginResponse>, #[oai(header = "Set-Cookie")] String),
}

/// API response for logout endpoint
#[derive(ApiResponse, Debug)]
pub enum LogoutApiResponse {
    /// Session revoked (or there was none) and the cookie cleared
    #[oai(status = 200)]
    Ok(Json<MessageResponse>, #[oai(header = "Set-Cookie")] String),
}

/// API response for whoami endpoint
#[derive(ApiResponse, Debug)]
pub enum WhoAmIApiResponse {
    #[oai(status = 200)]
    Ok(Json<UserDto>),
}

/// API response for change password endpoint
#[derive(ApiResponse, Debug)]
pub enum ChangePasswordApiResponse {
    /// Password changed; other sessions revoked, the current one kept
    #[oai(status = 200)]
    Ok(Json<MessageResponse>),
}
