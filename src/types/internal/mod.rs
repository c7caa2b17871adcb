pub mod audit;
pub mod identity;

pub use audit::{AuditAction, AuditDetail, AuditEntry};
pub use identity::{Credential, CredentialScheme, Role, UserIdentity};
