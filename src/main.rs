use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use resource_pipeline_api::config::AppConfig;
use resource_pipeline_api::server::{app, AppState};
use resource_pipeline_api::services::ForecastStore;

#[derive(Parser)]
#[command(name = "resource-pipeline-api")]
#[command(about = "Resource operation pipeline with cursor pagination")]
#[command(version)]
struct Args {
    #[arg(long, help = "Port to listen on (overrides API_PORT)")]
    port: Option<u16>,

    #[arg(long, env = "PIPELINE_CONFIG", help = "YAML configuration file")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up APP_ENV, SECURITY_JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::from_env(),
    };
    if let Some(port) = args.port {
        config.api.port = port;
    }
    tracing::info!("Starting Resource Pipeline API in {:?} mode", config.environment);

    let store = ForecastStore::seeded(config.api.seed_records);
    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let state = AppState::from_config(config, store)?;
    let router = app(state)?;

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("listening on http://{}", bind_addr);

    axum::serve(listener, router).await.context("server error")?;
    Ok(())
}
