use std::sync::Arc;

use poem::Request;
use poem_openapi::{payload::Json, OpenApi, Tags};

use crate::api::helpers::{clear_session_cookie, extract_session_token, session_cookie};
use crate::errors::ApiError;
use crate::services::AuthService;
use crate::types::dto::auth::{
    ChangePasswordApiResponse, ChangePasswordRequest, LoginApiResponse, LoginRequest, LoginResponse,
    LogoutApiResponse, MessageResponse, UserDto, WhoAmIApiResponse,
};

/// Authentication API endpoints
///
/// Sessions are accepted as `Authorization: Bearer <token>` or as the
/// configured session cookie.
pub struct AuthApi {
    auth_service: Arc<AuthService>,
    cookie_name: String,
}

impl AuthApi {
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

/// API tags for authentication endpoints
#[derive(Tags)]
enum AuthTags {
    /// Authentication endpoints
    Authentication,
}

#[OpenApi(prefix_path = "/auth")]
impl AuthApi {
    /// Login with username and password to open a session
    #[oai(path = "/login", method = "post", tag = "AuthTags::Authentication")]
    async fn login(&self, body: Json<LoginRequest>) -> Result<LoginApiResponse, ApiError> {
        let (identity, token) = self
            .auth_service
            .login(&body.username, &body.password)
            .await?;

        let ttl = self.auth_service.session_ttl_seconds();
        let cookie = session_cookie(&self.cookie_name, &token, ttl);

        Ok(LoginApiResponse::Ok(
            Json(LoginResponse {
                session_token: token,
                token_type: "Bearer".to_string(),
                expires_in: ttl,
                user: UserDto::from(identity),
            }),
            cookie,
        ))
    }

    /// Revoke the current session and clear the cookie
    ///
    /// Succeeds even without a valid session.
    #[oai(path = "/logout", method = "post", tag = "AuthTags::Authentication")]
    async fn logout(&self, req: &Request) -> Result<LogoutApiResponse, ApiError> {
        self.auth_service.logout(&self.token(req)).await?;

        Ok(LogoutApiResponse::Ok(
            Json(MessageResponse {
                message: "Logged out".to_string(),
            }),
            clear_session_cookie(&self.cookie_name),
        ))
    }

    /// Return the identity behind the current session
    #[oai(path = "/me", method = "get", tag = "AuthTags::Authentication")]
    async fn me(&self, req: &Request) -> Result<WhoAmIApiResponse, ApiError> {
        let identity = self.auth_service.whoami(&self.token(req)).await?;
        Ok(WhoAmIApiResponse::Ok(Json(UserDto::from(identity))))
    }

    /// Change the caller's password; other sessions are revoked
    #[oai(path = "/change-password", method = "post", tag = "AuthTags::Authentication")]
    async fn change_password(
        &self,
        req: &Request,
        body: Json<ChangePasswordRequest>,
    ) -> Result<ChangePasswordApiResponse, ApiError> {
        self.auth_service
            .change_password(&self.token(req), &body.old_password, &body.new_password)
            .await?;

        Ok(ChangePasswordApiResponse::Ok(Json(MessageResponse {
            message: "Password changed".to_string(),
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_data::AppData;
    use crate::errors::ApiError;
    use crate::test::utils::{create_test_user, setup_test_app};
    use crate::types::internal::Role;

    async fn setup() -> (AppData, AuthApi) {
        let app = setup_test_app().await;
        create_test_user(&app, "alice", "Chalkboard7", Role::Teacher).await;
        let api = AuthApi::new(
            app.auth_service.clone(),
            app.settings.session_cookie_name(),
        );
        (app, api)
    }

    fn login_request(username: &str, password: &str) -> Json<LoginRequest> {
        Json(LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    fn bearer(token: &str) -> Request {
        Request::builder()
            .header("Authorization", format!("Bearer {}", token))
            .finish()
    }

    async fn login(api: &AuthApi) -> (LoginResponse, String) {
        match api.login(login_request("alice", "Chalkboard7")).await {
            Ok(LoginApiResponse::Ok(Json(body), cookie)) => (body, cookie),
            Err(e) => panic!("Login failed: {}", e),
        }
    }

    #[tokio::test]
    async fn test_login_sets_token_and_cookie() {
        let (app, api) = setup().await;
        let (body, cookie) = login(&api).await;

        assert_eq!(body.token_type, "Bearer");
        assert_eq!(body.expires_in, app.auth_service.session_ttl_seconds());
        assert_eq!(body.user.username, "alice");
        assert_eq!(body.user.role, "teacher");
        assert!(cookie.starts_with(&format!(
            "{}={};",
            app.settings.session_cookie_name(),
            body.session_token
        )));
        assert!(cookie.contains("HttpOnly"));
    }

    #[tokio::test]
    async fn test_login_failures_share_one_message() {
        let (_app, api) = setup().await;

        let wrong = api.login(login_request("alice", "Chalkboard8")).await.unwrap_err();
        let unknown = api.login(login_request("nobody", "Chalkboard7")).await.unwrap_err();

        assert!(matches!(wrong, ApiError::Unauthorized(_)));
        assert!(matches!(unknown, ApiError::Unauthorized(_)));
        assert_eq!(wrong.body(), unknown.body());
        assert_eq!(wrong.body().error, "invalid_credentials");
    }

    #[tokio::test]
    async fn test_me_with_bearer_and_cookie() {
        let (app, api) = setup().await;
        let (body, _) = login(&api).await;

        let Ok(WhoAmIApiResponse::Ok(Json(user))) = api.me(&bearer(&body.session_token)).await else {
            panic!("Bearer token rejected");
        };
        assert_eq!(user.username, "alice");

        let cookie_req = Request::builder()
            .header(
                "Cookie",
                format!("theme=dark; {}={}", app.settings.session_cookie_name(), body.session_token),
            )
            .finish();
        let Ok(WhoAmIApiResponse::Ok(Json(user))) = api.me(&cookie_req).await else {
            panic!("Session cookie rejected");
        };
        assert_eq!(user.username, "alice");
    }

    #[tokio::test]
    async fn test_me_without_session_is_unauthorized() {
        let (_app, api) = setup().await;

        let err = api.me(&Request::builder().finish()).await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
        assert_eq!(err.body().status_code, 401);
        assert_eq!(err.body().error, "not_logged_in");
    }

    #[tokio::test]
    async fn test_logout_clears_cookie_and_session() {
        let (_app, api) = setup().await;
        let (body, _) = login(&api).await;
        let req = bearer(&body.session_token);

        let Ok(LogoutApiResponse::Ok(_, cookie)) = api.logout(&req).await else {
            panic!("Logout failed");
        };
        assert!(cookie.contains("Max-Age=0"));
        assert!(api.me(&req).await.is_err());

        // A second logout still succeeds
        assert!(api.logout(&req).await.is_ok());
    }

    #[tokio::test]
    async fn test_change_password_endpoint() {
        let (_app, api) = setup().await;
        let (body, _) = login(&api).await;
        let req = bearer(&body.session_token);

        let weak = api
            .change_password(
                &req,
                Json(ChangePasswordRequest {
                    old_password: "Chalkboard7".to_string(),
                    new_password: "short".to_string(),
                }),
            )
            .await
            .unwrap_err();
        assert!(matches!(weak, ApiError::BadRequest(_)));

        let result = api
            .change_password(
                &req,
                Json(ChangePasswordRequest {
                    old_password: "Chalkboard7".to_string(),
                    new_password: "Whiteboard8".to_string(),
                }),
            )
            .await;
        assert!(result.is_ok());
        assert!(api.login(login_request("alice", "Whiteboard8")).await.is_ok());
    }
}
