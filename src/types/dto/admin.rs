use poem_openapi::{payload::Json, ApiResponse, Object};
use serde::{Deserialize, Serialize};

use crate::types::dto::auth::{MessageResponse, UserDto};

/// Request to create a user account
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,

    /// Initial password, checked against the password policy
    pub password: String,

    /// Defaults to the username when omitted
    pub display_name: Option<String>,

    /// One of student, teacher, admin
    pub role: String,
}

/// Partial update of a user account; absent fields stay unchanged
#[derive(Object, Debug, Default, Serialize, Deserialize)]
pub struct UpdateUserRequest {
    pub display_name: Option<String>,

    /// One of student, teacher, admin
    pub role: Option<String>,

    /// false disables the account and revokes all of its sessions
    pub is_active: Option<bool>,
}

/// Request to set a user's password without knowing the old one
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct ResetPasswordRequest {
    pub new_password: String,
}

/// Response listing user accounts
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct UserListResponse {
    pub users: Vec<UserDto>,
}

/// API response for user listing
#[derive(ApiResponse, Debug)]
pub enum ListUsersApiResponse {
    #[oai(status = 200)]
    Ok(Json<UserListResponse>),
}

/// API response for user creation
#[derive(ApiResponse, Debug)]
pub enum CreateUserApiResponse {
    /// Account created
    #[oai(status = 201)]
    Created(Json<UserDto>),
}

/// API response for user update
#[derive(ApiResponse, Debug)]
pub enum UpdateUserApiResponse {
    #[oai(status = 200)]
    Ok(Json<UserDto>),
}

/// API response for admin password reset
#[derive(ApiResponse, Debug)]
pub enum ResetPasswordApiResponse {
    /// Password replaced and every session of the target revoked
    #[oai(status = 200)]
    Ok(Json<MessageResponse>),
}
