pub mod database;
pub mod env_provider;
pub mod logging;
pub mod settings;

pub use database::{init_database, migrate_database};
pub use env_provider::{EnvironmentProvider, MockEnvironment, SystemEnvironment};
pub use logging::{init_logging, LoggingError};
pub use settings::{AuthSettings, SettingsError};
