use rentledger::{
    config::{app, database, seed},
    core::{dashboard, monthly},
    errors::Result,
};
use dotenvy::dotenv;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; variables can also be set externally
    dotenv().ok();

    // 3. Load config.toml
    let config = app::load_default_config()
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;

    // 4. Connect and make sure the schema exists
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|()| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Seed rooms and the default rate
    seed::seed_database(&db, &config)
        .await
        .inspect_err(|e| error!("Failed to seed database: {}", e))?;

    // 6. Open the current billing period
    let report = monthly::generate_current_period(&db, config.billing.default_rate_per_unit)
        .await
        .inspect_err(|e| error!("Rollover failed: {}", e))?;
    info!("\n{}", monthly::format_rollover_summary(&report));

    // 7. Show where collections stand
    let snapshot = dashboard::current_dashboard(&db).await?;
    info!("\n{}", dashboard::format_dashboard_summary(&snapshot));

    Ok(())
}
