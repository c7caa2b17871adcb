use thiserror::Error;

use crate::errors::internal::{CredentialError, InternalError, UserError};
use crate::services::password_policy::PasswordPolicyError;

/// Caller-visible authentication and authorization failures
///
/// Every variant is recoverable by the caller. `NotLoggedIn` deliberately
/// covers absent, expired, revoked and disabled-account sessions alike, and
/// `InvalidCredentials` covers both unknown usernames and wrong passwords.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Not logged in")]
    NotLoggedIn,

    #[error("Forbidden")]
    Forbidden,

    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Only reported after the caller proved knowledge of the password
    #[error("Account is disabled")]
    AccountDisabled,

    #[error("Password too weak: {0}")]
    WeakPassword(String),

    #[error("Stored credential is malformed")]
    MalformedCredential,

    #[error("Username already exists")]
    DuplicateUsername,

    #[error("User not found")]
    UserNotFound,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Detail stays in the operational log, never in the message
    #[error("An internal error occurred")]
    Internal,
}

impl AuthError {
    /// HTTP status code the excluded routing layer should answer with
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::NotLoggedIn | AuthError::InvalidCredentials => 401,
            AuthError::Forbidden | AuthError::AccountDisabled => 403,
            AuthError::WeakPassword(_) | AuthError::InvalidInput(_) => 400,
            AuthError::UserNotFound => 404,
            AuthError::DuplicateUsername => 409,
            AuthError::MalformedCredential | AuthError::Internal => 500,
        }
    }

    /// Stable machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::NotLoggedIn => "not_logged_in",
            AuthError::Forbidden => "forbidden",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::AccountDisabled => "account_disabled",
            AuthError::WeakPassword(_) => "weak_password",
            AuthError::MalformedCredential => "malformed_credential",
            AuthError::DuplicateUsername => "duplicate_username",
            AuthError::UserNotFound => "user_not_found",
            AuthError::InvalidInput(_) => "invalid_input",
            AuthError::Internal => "internal_error",
        }
    }

    /// Convert InternalError to AuthError
    ///
    /// This is the explicit translation point from store errors to the caller
    /// taxonomy. Internal details are logged here and dropped.
    pub fn from_internal_error(err: InternalError) -> Self {
        match &err {
            InternalError::Credential(CredentialError::Malformed(reason)) => {
                tracing::error!("Data integrity: malformed stored credential: {}", reason);
                Self::MalformedCredential
            }
            InternalError::Credential(CredentialError::WeakPassword(policy_err)) => {
                Self::WeakPassword(policy_err.to_string())
            }
            InternalError::User(UserError::DuplicateUsername(username)) => {
                tracing::debug!("Duplicate username attempt: {}", username);
                Self::DuplicateUsername
            }
            InternalError::User(UserError::NotFound(user_id)) => {
                tracing::debug!("User not found: {}", user_id);
                Self::UserNotFound
            }
            InternalError::User(UserError::UnknownRole { user_id, role }) => {
                tracing::error!(user_id = %user_id, "Data integrity: unknown role '{}'", role);
                Self::Internal
            }
            InternalError::Database(_) => {
                tracing::error!("Database error in auth operation: {}", err);
                Self::Internal
            }
            InternalError::Parse { value_type, .. } => {
                tracing::error!("Parse error for {}: {}", value_type, err);
                Self::Internal
            }
            InternalError::Crypto { operation, .. } => {
                tracing::error!("Crypto error in {}: {}", operation, err);
                Self::Internal
            }
            _ => {
                tracing::error!("Unexpected error in auth operation: {}", err);
                Self::Internal
            }
        }
    }
}

impl From<InternalError> for AuthError {
    fn from(err: InternalError) -> Self {
        Self::from_internal_error(err)
    }
}

impl From<PasswordPolicyError> for AuthError {
    fn from(err: PasswordPolicyError) -> Self {
        AuthError::WeakPassword(err.to_string())
    }
}
