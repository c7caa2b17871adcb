// Services layer - Business logic and orchestration
pub mod auth_gate;
pub mod auth_service;
pub mod password_policy;

#[cfg(test)]
mod password_policy_test;

pub use auth_gate::AuthGate;
pub use auth_service::{AuthService, LegacyUser, NewUser};
pub use password_policy::{PasswordPolicy, PasswordPolicyError};
