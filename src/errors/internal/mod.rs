use thiserror::Error;

pub mod audit;
pub mod credential;
pub mod database;
pub mod session;
pub mod user;

pub use audit::AuditError;
pub use credential::CredentialError;
pub use database::DatabaseError;
pub use session::SessionError;
pub use user::UserError;

/// Internal error type for store and service operations
///
/// Hybrid design separates infrastructure errors (shared) from domain errors (store-specific).
/// Not exposed to callers - the service layer converts to AuthError.
#[derive(Error, Debug)]
pub enum InternalError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("Parse error: failed to parse {value_type}: {message}")]
    Parse {
        value_type: String,
        message: String,
    },

    #[error("Crypto error: {operation} failed: {message}")]
    Crypto {
        operation: String,
        message: String,
    },

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    User(#[from] UserError),

    #[error(transparent)]
    Audit(#[from] AuditError),
}

impl InternalError {
    pub fn database(operation: &'static str, source: sea_orm::DbErr) -> Self {
        Self::Database(DatabaseError::Operation { operation, source })
    }

    pub fn parse(value_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            value_type: value_type.into(),
            message: message.into(),
        }
    }

    pub fn crypto(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Crypto {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// True when the underlying database error is a unique-constraint violation
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Self::Database(DatabaseError::Operation { source, .. }) => matches!(
                source.sql_err(),
                Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
            ),
            _ => false,
        }
    }
}
