use poem_openapi::{payload::Json, ApiResponse};
use std::fmt;

use crate::errors::AuthError;
use crate::types::dto::common::ErrorResponse;

/// HTTP error responses for every endpoint
///
/// Built only from `AuthError`, so the message a client sees is always one of
/// the taxonomy messages and never an internal detail.
#[derive(ApiResponse, Debug)]
pub enum ApiError {
    /// Malformed request or password policy violation
    #[oai(status = 400)]
    BadRequest(Json<ErrorResponse>),

    /// Not logged in, or wrong username/password
    #[oai(status = 401)]
    Unauthorized(Json<ErrorResponse>),

    /// Authenticated but not permitted
    #[oai(status = 403)]
    Forbidden(Json<ErrorResponse>),

    /// Referenced user does not exist
    #[oai(status = 404)]
    NotFound(Json<ErrorResponse>),

    /// Username already taken
    #[oai(status = 409)]
    Conflict(Json<ErrorResponse>),

    /// Internal server error
    #[oai(status = 500)]
    InternalError(Json<ErrorResponse>),
}

impl ApiError {
    /// Get the error response body from the error variant
    pub fn body(&self) -> &ErrorResponse {
        match self {
            ApiError::BadRequest(json)
            | ApiError::Unauthorized(json)
            | ApiError::Forbidden(json)
            | ApiError::NotFound(json)
            | ApiError::Conflict(json)
            | ApiError::InternalError(json) => &json.0,
        }
    }

    pub fn message(&self) -> String {
        self.body().message.clone()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        let status_code = err.status_code();
        let body = Json(ErrorResponse {
            error: err.code().to_string(),
            message: err.to_string(),
            status_code,
        });

        match status_code {
            400 => ApiError::BadRequest(body),
            401 => ApiError::Unauthorized(body),
            403 => ApiError::Forbidden(body),
            404 => ApiError::NotFound(body),
            409 => ApiError::Conflict(body),
            _ => ApiError::InternalError(body),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}
