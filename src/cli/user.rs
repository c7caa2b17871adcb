use crate::app_data::AppData;
use crate::config::EnvironmentProvider;
use crate::services::{NewUser, PasswordPolicy};
use crate::types::internal::{Role, UserIdentity};

pub const PASSWORD_ENV_VAR: &str = "CLASSROOM_AUTH_PASSWORD";

/// Create an account from the command line
///
/// Prints the generated password when none was supplied through the
/// environment. The audit entry carries no actor.
pub async fn create_user(
    app_data: &AppData,
    env: &dyn EnvironmentProvider,
    username: &str,
    display_name: Option<String>,
    role: Role,
) -> Result<UserIdentity, Box<dyn std::error::Error>> {
    let (password, generated) = match env.get_var(PASSWORD_ENV_VAR).filter(|p| !p.is_empty()) {
        Some(password) => (password, false),
        None => {
            let policy = PasswordPolicy::new(
                app_data.settings.password_min_length(),
                app_data.settings.password_min_char_classes(),
            );
            (policy.generate_secure_password(), true)
        }
    };

    let identity = app_data
        .auth_service
        .provision_user(
            None,
            NewUser {
                username: username.to_string(),
                display_name,
                role,
                password: password.clone(),
            },
        )
        .await?;

    println!("Created {} '{}' (id {})", identity.role, identity.username, identity.id);
    if generated {
        println!("Generated password (shown once): {}", password);
    }

    Ok(identity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MockEnvironment;
    use crate::errors::AuthError;
    use crate::test::utils::setup_test_app;

    #[tokio::test]
    async fn test_create_user_with_password_from_env() {
        let app = setup_test_app().await;
        let env = MockEnvironment::empty().with_var(PASSWORD_ENV_VAR, "Blackboard42");

        let identity = create_user(&app, &env, "frizzle", None, Role::Teacher)
            .await
            .unwrap();
        assert_eq!(identity.role, Role::Teacher);
        assert_eq!(identity.display_name, "frizzle");

        let (logged_in, _token) = app
            .auth_service
            .login("frizzle", "Blackboard42")
            .await
            .unwrap();
        assert_eq!(logged_in.id, identity.id);
    }

    #[tokio::test]
    async fn test_create_user_with_generated_password() {
        let app = setup_test_app().await;

        let identity = create_user(&app, &MockEnvironment::empty(), "arnold", Some("Arnold".to_string()), Role::Student)
            .await
            .unwrap();
        assert_eq!(identity.display_name, "Arnold");

        let entries = app.audit_logger.entries_for_target(&identity.id).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].actor_user_id, None);
    }

    #[tokio::test]
    async fn test_create_user_duplicate() {
        let app = setup_test_app().await;
        let env = MockEnvironment::empty().with_var(PASSWORD_ENV_VAR, "Blackboard42");

        create_user(&app, &env, "frizzle", None, Role::Teacher).await.unwrap();
        let err = create_user(&app, &env, "frizzle", None, Role::Teacher)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), AuthError::DuplicateUsername.to_string());
    }
}
