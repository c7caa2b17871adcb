use thiserror::Error;

use crate::services::password_policy::PasswordPolicyError;

#[derive(Error, Debug)]
pub enum CredentialError {
    /// Stored credential data cannot be decoded or is internally inconsistent.
    /// This is a data-integrity problem, never a wrong password.
    #[error("Malformed credential: {0}")]
    Malformed(String),

    #[error("Password rejected by policy: {0}")]
    WeakPassword(#[from] PasswordPolicyError),

    #[error("Password hashing failed: {0}")]
    HashingFailed(String),
}
