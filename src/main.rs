//! Opso Bot entry point: logging, configuration, database, then the bot.

use dotenvy::dotenv;
use opso_bot::errors::{Error, Result};
use opso_bot::{bot, config};
use std::{env, sync::Arc};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file (non-fatal, env vars can be set externally)
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load runtime settings and the range reference dataset
    let settings = Arc::new(config::settings::load_settings()?);
    let refdata = Arc::new(
        config::refdata::load_default_data()
            .inspect(|data| info!("Loaded {} ranges from reference data.", data.ranges.len()))
            .inspect_err(|e| error!("Failed to load range reference data: {e}"))?,
    );

    // 4. Initialize the database
    let database = config::database::create_connection()
        .await
        .inspect(|_| info!("Database connected successfully."))
        .inspect_err(|e| error!("Failed to connect to database: {e}"))?;
    config::database::create_tables(&database)
        .await
        .inspect(|_| info!("Database tables ready."))
        .inspect_err(|e| error!("Failed to create tables: {e}"))?;

    // 5. Run the bot; the token is read directly before use, never stored
    let token = env::var("DISCORD_BOT_TOKEN")
        .inspect_err(|e| error!("DISCORD_BOT_TOKEN not found: {e}"))
        .map_err(Error::EnvVar)?;

    bot::run_bot(token, database, refdata, settings)
        .await
        .map_err(Error::from)?;

    Ok(())
}
