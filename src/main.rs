use budget_keeper::{
    config::{database, settings},
    errors::Result,
};
use dotenvy::dotenv;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Load .env file (non-fatal, env vars can be set externally)
    let dotenv_loaded = dotenv().is_ok();

    // 2. Load settings; the log level lives there, so logging starts right after
    let app_settings = settings::load_default_settings()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&app_settings.log_level)),
        )
        .init();
    info!(dotenv_loaded, "Loaded application settings");

    // 3. Connect to the record store
    let db = database::create_connection(&app_settings.database_url)
        .await
        .inspect(|_| info!("Connected to database"))
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;

    // 4. Make sure the schema exists
    database::ensure_schema(&db)
        .await
        .inspect(|_| info!("Database schema ready"))
        .inspect_err(|e| error!("Failed to prepare database schema: {}", e))?;

    db.close().await?;
    Ok(())
}
