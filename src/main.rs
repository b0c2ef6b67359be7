use anyhow::Result;
use log::info;
use security_tower::ai::client::AiClient;
use security_tower::db::repositories::{AlarmStore, AlarmsRepository};
use security_tower::messaging::AlarmNotifier;
use security_tower::{
    config, DatabaseService, HttpAiClient, IngestionPipeline, ReportService, RestApi, WsNotifier,
};
use std::path::Path;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();
    info!("Starting Security Tower monitoring backend");

    // Load configuration (optional file argument, environment wins)
    let config_path = std::env::args().nth(1);
    let config = config::load_config(config_path.as_deref().map(Path::new))?;
    info!("Configuration loaded");

    // Connect to the database and run migrations
    let database = DatabaseService::new(&config.database).await?;

    // Setup reports directory from config
    std::fs::create_dir_all(&config.reports.storage_path)?;

    // Wire up the alarm ingestion pipeline. Every collaborator is
    // constructed here and injected; nothing is reached through globals.
    let notifier = Arc::new(WsNotifier::default());
    let ai_client: Arc<dyn AiClient> = Arc::new(HttpAiClient::new(&config.ai)?);
    let alarm_store: Arc<dyn AlarmStore> =
        Arc::new(AlarmsRepository::new(database.pool.clone()));
    let notifier_seam: Arc<dyn AlarmNotifier> = notifier.clone();
    let pipeline = Arc::new(IngestionPipeline::new(
        ai_client,
        alarm_store,
        notifier_seam,
        &config.ai,
    ));
    info!(
        "Alarm ingestion pipeline initialized (AI {})",
        if pipeline.is_enabled() {
            "enabled"
        } else {
            "disabled"
        }
    );

    let reports = Arc::new(ReportService::new(
        database.pool.clone(),
        config.reports.storage_path.clone(),
    ));

    // Start the REST API; the realtime channel rides on the same listener.
    let http_server = RestApi::new(
        &config.api,
        database.pool.clone(),
        pipeline,
        notifier,
        reports,
    )?;

    http_server.run().await?;
    info!("Server stopped");

    Ok(())
}
