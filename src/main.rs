use anyhow::{Context, Result};
use mango::config::Config;
use mango::server::{self, AppState};
use mango::Mango;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mango=info".parse()?),
        )
        .init();

    info!("Starting Mango translation service");

    // Load configuration from environment
    let config = Config::from_env()?;
    config.validate()?;
    config.require_openai_key()?;

    let mango = Mango::from_config(&config).context("invalid translation settings")?;
    info!(
        "Translating from '{}' into {:?} with {} ({:?})",
        config.source_language, config.languages, config.openai_model, config.strategy
    );
    if config.api_key.is_none() {
        info!("API_KEY not set, /translate is open to any client");
    }

    let state = AppState {
        mango,
        api_key: config.api_key.clone(),
    };

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    server::serve(listener, server::router(state)).await
}
