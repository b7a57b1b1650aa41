//! Kosh API Server
//!
//! Main entry point for the withholding-tax service.

use std::time::Duration;

use anyhow::Context;
use kosh_api::{AppState, create_router};
use kosh_core::{EngineConfig, TaxEngine};
use kosh_shared::config::{LogFormat, LoggingConfig, StorageBackend};
use kosh_shared::{AppConfig, JwtService};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.filter.as_str()));
    let registry = tracing_subscriber::registry().with(filter);

    match logging.format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn build_engine(config: &AppConfig) -> anyhow::Result<TaxEngine> {
    let engine_config =
        EngineConfig::from_config(&config.tax).context("invalid [tax] configuration")?;

    match config.database.backend {
        StorageBackend::Memory => {
            warn!("using in-memory storage; data is lost on restart");
            Ok(TaxEngine::in_memory(engine_config))
        }
        StorageBackend::Postgres => {
            let url = config
                .database
                .url
                .as_deref()
                .context("database.url is required for the postgres backend")?;
            let db = kosh_db::connect_with(url, &config.database).await?;
            info!(
                max_connections = config.database.max_connections,
                "Connected to database"
            );
            Ok(TaxEngine::new(kosh_db::repositories(&db), engine_config))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(&config.logging);

    let engine = build_engine(&config).await?;
    info!(
        sections = config.tax.sections.len(),
        transaction_types = config.tax.transaction_types.len(),
        backend = ?config.database.backend,
        "Withholding engine ready"
    );

    let state = AppState::new(engine, JwtService::new(&config.jwt));
    let app = create_router(
        state,
        Duration::from_secs(config.server.request_timeout_secs),
    );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
