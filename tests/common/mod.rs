// Common test utilities for integration tests
#![allow(dead_code)]

use classroom_auth::app_data::AppData;
use classroom_auth::config::{AuthSettings, MockEnvironment};
use classroom_auth::services::NewUser;
use classroom_auth::types::internal::{Role, UserIdentity};
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};

pub const TEST_SESSION_SECRET: &str = "integration-session-secret-0123456789abcdef";

/// Creates an in-memory database with migrations applied
pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

/// Low iteration count and no failed-login delay
pub fn test_settings() -> AuthSettings {
    test_settings_with(&[])
}

/// Test settings with extra overrides
pub fn test_settings_with(overrides: &[(&str, &str)]) -> AuthSettings {
    let env = MockEnvironment::empty()
        .with_vars(&[
            ("SESSION_SECRET", TEST_SESSION_SECRET),
            ("PBKDF2_ITERATIONS", "1000"),
            ("FAILED_LOGIN_DELAY_MS", "0"),
        ])
        .with_vars(overrides);
    AuthSettings::from_env(&env).expect("Failed to build test settings")
}

/// Fully wired application over a fresh database
pub async fn setup_test_app() -> AppData {
    AppData::init(setup_test_db().await, test_settings())
        .await
        .expect("Failed to initialize AppData")
}

/// Creates a user directly, bypassing the admin check
pub async fn create_user(app: &AppData, username: &str, password: &str, role: Role) -> UserIdentity {
    app.auth_service
        .provision_user(
            None,
            NewUser {
                username: username.to_string(),
                display_name: None,
                role,
                password: password.to_string(),
            },
        )
        .await
        .expect("Failed to create test user")
}

/// Creates a user and returns it with a fresh session token
pub async fn create_and_login(app: &AppData, username: &str, password: &str, role: Role) -> (UserIdentity, String) {
    create_user(app, username, password, role).await;
    app.auth_service
        .login(username, password)
        .await
        .expect("Failed to log in test user")
}
