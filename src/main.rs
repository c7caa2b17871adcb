use clap::Parser;

use classroom_auth::app_data::AppData;
use classroom_auth::cli::{self, Cli, Commands};
use classroom_auth::config::{init_database, init_logging, migrate_database, AuthSettings, SystemEnvironment};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    let env = SystemEnvironment;
    init_logging(&env)?;

    let cli = Cli::parse();
    let settings = AuthSettings::from_env(&env)?;
    tracing::debug!("Loaded settings: {:?}", settings);

    let command = cli.command();
    if *command == Commands::Migrate {
        return cli::migrate::run_migrations(&settings).await;
    }

    let db = init_database(settings.database_url()).await?;
    migrate_database(&db).await?;

    let app_data = AppData::init(db, settings).await?;

    cli::execute_command(command, &app_data, &env).await
}
