use anyhow::{anyhow, Result};
use caresma::integration::{AppConfig, SessionOrchestrator};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "caresma=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Caresma desktop client");

    let config = AppConfig::from_env();
    info!("Backend: {}", config.api_base_url);

    let (orchestrator, handle) = SessionOrchestrator::new(config);
    orchestrator.start()?;

    caresma::ui::run(handle).map_err(|e| anyhow!("Failed to start UI: {e}"))
}
