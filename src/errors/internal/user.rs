use thiserror::Error;

#[derive(Error, Debug)]
pub enum UserError {
    #[error("User already exists: {0}")]
    DuplicateUsername(String),

    #[error("User not found: {0}")]
    NotFound(String),

    /// A role column holds something outside student/teacher/admin
    #[error("Stored role '{role}' for user {user_id} is not a known role")]
    UnknownRole { user_id: String, role: String },
}
