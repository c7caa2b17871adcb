use std::str::FromStr;
use std::sync::Arc;

use poem::Request;
use poem_openapi::{param::Path, payload::Json, OpenApi, Tags};

use crate::api::helpers::extract_session_token;
use crate::errors::{ApiError, AuthError};
use crate::services::{AuthService, NewUser};
use crate::stores::UserChanges;
use crate::types::dto::admin::{
    CreateUserApiResponse, CreateUserRequest, ListUsersApiResponse, ResetPasswordApiResponse,
    ResetPasswordRequest, UpdateUserApiResponse, UpdateUserRequest, UserListResponse,
};
use crate::types::dto::auth::{MessageResponse, UserDto};
use crate::types::internal::Role;

/// User administration endpoints; every one requires the admin role
pub struct AdminApi {
    auth_service: Arc<AuthService>,
    cookie_name: String,
}

impl AdminApi {
    pub fn new(auth_service: Arc<AuthService>, cookie_name: impl Into<String>) -> Self {
        Self {
            auth_service,
            cookie_name: cookie_name.into(),
        }
    }

    fn token(&self, req: &Request) -> String {
        extract_session_token(req, &self.cookie_name).unwrap_or_default()
    }
}

fn parse_role(role: &str) -> Result<Role, AuthError> {
    Role::from_str(role).map_err(AuthError::InvalidInput)
}

/// API tags for admin endpoints
#[derive(Tags)]
enum AdminTags {
    /// User administration
    Admin,
}

#[OpenApi(prefix_path = "/admin")]
impl AdminApi {
    /// List all users, oldest first
    #[oai(path = "/users", method = "get", tag = "AdminTags::Admin")]
    async fn list_users(&self, req: &Request) -> Result<ListUsersApiResponse, ApiError> {
        let users = self.auth_service.list_users(&self.token(req)).await?;

        Ok(ListUsersApiResponse::Ok(Json(UserListResponse {
            users: users.iter().map(UserDto::from).collect(),
        })))
    }

    /// Create a user
    #[oai(path = "/users", method = "post", tag = "AdminTags::Admin")]
    async fn create_user(
        &self,
        req: &Request,
        body: Json<CreateUserRequest>,
    ) -> Result<CreateUserApiResponse, ApiError> {
        let body = body.0;
        let new_user = NewUser {
            role: parse_role(&body.role)?,
            username: body.username,
            display_name: body.display_name,
            password: body.password,
        };

        let identity = self
            .auth_service
            .create_user(&self.token(req), new_user)
            .await?;

        Ok(CreateUserApiResponse::Created(Json(UserDto::from(identity))))
    }

    /// Update display name, role or active flag
    #[oai(path = "/users/:id", method = "put", tag = "AdminTags::Admin")]
    async fn update_user(
        &self,
        req: &Request,
        id: Path<String>,
        body: Json<UpdateUserRequest>,
    ) -> Result<UpdateUserApiResponse, ApiError> {
        let body = body.0;
        let changes = UserChanges {
            display_name: body.display_name,
            role: body.role.as_deref().map(parse_role).transpose()?,
            is_active: body.is_active,
        };

        let identity = self
            .auth_service
            .update_user(&self.token(req), &id.0, changes)
            .await?;

        Ok(UpdateUserApiResponse::Ok(Json(UserDto::from(identity))))
    }

    /// Set a user's password and revoke all of their sessions
    #[oai(path = "/users/:id/password", method = "put", tag = "AdminTags::Admin")]
    async fn reset_password(
        &self,
        req: &Request,
        id: Path<String>,
        body: Json<ResetPasswordRequest>,
    ) -> Result<ResetPasswordApiResponse, ApiError> {
        self.auth_service
            .admin_reset_password(&self.token(req), &id.0, &body.new_password)
            .await?;

        Ok(ResetPasswordApiResponse::Ok(Json(MessageResponse {
            message: "Password reset".to_string(),
        })))
    }
}
