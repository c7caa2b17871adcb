// CLI module for running the server and operator tasks

pub mod import;
pub mod migrate;
pub mod serve;
pub mod sessions;
pub mod user;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::app_data::AppData;
use crate::config::EnvironmentProvider;
use crate::types::internal::Role;

/// Classroom auth server and operator commands
#[derive(Parser, Debug)]
#[command(name = "classroom-auth")]
#[command(about = "Credential, session and role-gating service for the classroom app", long_about = None)]
pub struct Cli {
    /// Defaults to `serve`
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Run migrations and start the HTTP server
    Serve,

    /// Run pending database migrations and exit
    Migrate,

    /// Create a user account
    ///
    /// The password is read from CLASSROOM_AUTH_PASSWORD; when unset a random
    /// one is generated and printed once.
    CreateUser {
        #[arg(long)]
        username: String,

        /// Defaults to the username
        #[arg(long)]
        display_name: Option<String>,

        /// student, teacher or admin
        #[arg(long, default_value_t = Role::Student)]
        role: Role,
    },

    /// Delete sessions whose expiry has passed
    PurgeSessions,

    /// Import accounts exported from the old plaintext-password table
    ///
    /// Reads a JSON array of `{username, display_name?, role?, password_text}`
    /// rows. Passwords are kept under the legacy scheme and re-hashed on each
    /// user's first login. Existing usernames are skipped.
    ImportLegacyUsers {
        #[arg(long)]
        file: PathBuf,
    },
}

impl Cli {
    pub fn command(&self) -> &Commands {
        self.command.as_ref().unwrap_or(&Commands::Serve)
    }
}

/// Execute a command that needs the fully initialized application
///
/// `migrate` never reaches here; it runs before AppData exists.
pub async fn execute_command(
    command: &Commands,
    app_data: &AppData,
    env: &dyn EnvironmentProvider,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Serve => serve::run_server(app_data).await?,
        Commands::Migrate => {
            tracing::info!("Migrations already applied during startup");
        }
        Commands::CreateUser {
            username,
            display_name,
            role,
        } => {
            user::create_user(app_data, env, username, display_name.clone(), *role).await?;
        }
        Commands::PurgeSessions => {
            let purged = sessions::purge_sessions(app_data).await?;
            println!("Purged {} expired session(s)", purged);
        }
        Commands::ImportLegacyUsers { file } => {
            let summary = import::import_legacy_users(app_data, file).await?;
            println!(
                "Imported {} user(s), skipped {} existing, rejected {}",
                summary.imported, summary.duplicates, summary.rejected
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_means_serve() {
        let cli = Cli::parse_from(["classroom-auth"]);
        assert_eq!(cli.command(), &Commands::Serve);
    }

    #[test]
    fn test_create_user_arguments() {
        let cli = Cli::parse_from([
            "classroom-auth",
            "create-user",
            "--username",
            "frizzle",
            "--display-name",
            "Ms. Frizzle",
            "--role",
            "teacher",
        ]);

        assert_eq!(
            cli.command(),
            &Commands::CreateUser {
                username: "frizzle".to_string(),
                display_name: Some("Ms. Frizzle".to_string()),
                role: Role::Teacher,
            }
        );
    }

    #[test]
    fn test_create_user_defaults_to_student() {
        let cli = Cli::parse_from(["classroom-auth", "create-user", "--username", "arnold"]);
        assert!(matches!(
            cli.command(),
            Commands::CreateUser { role: Role::Student, display_name: None, .. }
        ));
    }

    #[test]
    fn test_import_legacy_users_arguments() {
        let cli = Cli::parse_from(["classroom-auth", "import-legacy-users", "--file", "users.json"]);
        assert_eq!(
            cli.command(),
            &Commands::ImportLegacyUsers {
                file: PathBuf::from("users.json"),
            }
        );
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let result = Cli::try_parse_from([
            "classroom-auth",
            "create-user",
            "--username",
            "x",
            "--role",
            "janitor",
        ]);
        assert!(result.is_err());
    }
}
