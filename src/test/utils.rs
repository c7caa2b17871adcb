// Test utilities shared by the unit tests
// Only compiled when running tests

use sea_orm::{Database, DatabaseConnection};
use migration::{Migrator, MigratorTrait};

use crate::app_data::AppData;
use crate::config::{AuthSettings, MockEnvironment};
use crate::services::NewUser;
use crate::types::internal::{Credential, Role, UserIdentity};

pub const TEST_SESSION_SECRET: &str = "test-session-secret-with-at-least-32-chars";

/// In-memory SQLite database with all migrations applied
pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

/// Settings with the minimum iteration count and no failed-login delay
pub fn test_settings() -> AuthSettings {
    let env = MockEnvironment::empty().with_vars(&[
        ("SESSION_SECRET", TEST_SESSION_SECRET),
        ("PBKDF2_ITERATIONS", "1000"),
        ("FAILED_LOGIN_DELAY_MS", "0"),
    ]);
    AuthSettings::from_env(&env).expect("Failed to build test settings")
}

/// Fully wired application over a fresh in-memory database
pub async fn setup_test_app() -> AppData {
    let db = setup_test_db().await;
    AppData::init(db, test_settings())
        .await
        .expect("Failed to initialize AppData")
}

/// Detached identity for pure authorization checks
pub fn identity_with_role(role: Role) -> UserIdentity {
    UserIdentity {
        id: format!("{}-id", role),
        username: role.to_string(),
        display_name: role.to_string(),
        role,
        credential: Credential {
            scheme: "pbkdf2-sha256".to_string(),
            salt: String::new(),
            hash: String::new(),
            iterations: 1000,
        },
        is_active: true,
        created_at: 0,
        updated_at: 0,
    }
}

/// Provision a user through the service, bypassing the admin check
pub async fn create_test_user(app: &AppData, username: &str, password: &str, role: Role) -> UserIdentity {
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
