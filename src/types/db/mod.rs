// Database entities - SeaORM models
pub mod audit_entry;
pub mod session;
pub mod user;
