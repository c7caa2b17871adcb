pub mod admin;
pub mod auth;
pub mod common;

pub use admin::*;
pub use auth::*;
pub use common::*;
