use crate::config::{init_database, migrate_database, AuthSettings};

/// Connect and run all pending migrations
///
/// Does not initialize AppData.
pub async fn run_migrations(settings: &AuthSettings) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Running database migrations...");

    let db = init_database(settings.database_url()).await?;
    migrate_database(&db).await?;

    tracing::info!("All migrations completed successfully");

    Ok(())
}
