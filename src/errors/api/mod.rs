// API-facing error types
pub mod auth;

// Re-exports for convenience
pub use auth::ApiError;

#[cfg(test)]
mod auth_test;
