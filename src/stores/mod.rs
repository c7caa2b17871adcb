// Stores layer - Data access and repository pattern
pub mod audit_store;
pub mod credential_store;
pub mod session_store;
pub mod user_store;

pub use audit_store::AuditStore;
pub use credential_store::CredentialStore;
pub use session_store::SessionStore;
pub use user_store::{NewUserRecord, UserChanges, UserStore};
