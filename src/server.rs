use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::handlers::forecasts;
use crate::middleware::SecurityHeadersLayer;
use crate::pipeline::{gate_from_config, AuthGate, ResourcePipeline};
use crate::services::ForecastStore;

/// Shared per-process state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub pipeline: ResourcePipeline,
    pub store: ForecastStore,
}

impl AppState {
    /// Build state with the auth gate selected by configuration
    pub fn from_config(config: AppConfig, store: ForecastStore) -> anyhow::Result<Self> {
        let gate = gate_from_config(&config.security);
        Self::with_gate(config, store, gate)
    }

    pub fn with_gate(config: AppConfig, store: ForecastStore, gate: Arc<dyn AuthGate>) -> anyhow::Result<Self> {
        let pipeline = ResourcePipeline::new(&config, gate)?;
        Ok(Self {
            config: Arc::new(config),
            pipeline,
            store,
        })
    }
}

pub fn app(state: AppState) -> anyhow::Result<Router> {
    let security_headers = SecurityHeadersLayer::from_config(&state.config.security)?;

    let router = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(forecast_routes())
        .fallback(fallback)
        .with_state(state)
        // Global middleware
        .layer(security_headers)
        .layer(TraceLayer::new_for_http());

    Ok(router)
}

fn forecast_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/forecasts",
            get(forecasts::collection_get).post(forecasts::collection_post),
        )
        .route(
            "/api/forecasts/:id",
            get(forecasts::record_get)
                .put(forecasts::record_put)
                .delete(forecasts::record_delete),
        )
        // Paged reads
        .route("/api/forecasts/page", get(forecasts::page_first))
        .route(forecasts::NEXT_PAGE_PATH, get(forecasts::page_next))
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "data": {
            "name": "Resource Pipeline API",
            "version": version,
            "endpoints": {
                "forecasts": "/api/forecasts[/:id]",
                "first_page": "/api/forecasts/page?pageSize=N",
                "next_page": "/api/forecasts/page/next?token=T&pageSize=N[&pageOffset=K]",
                "health": "/health",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();
    (
        StatusCode::OK,
        Json(json!({
            "data": {
                "status": "ok",
                "timestamp": now,
                "environment": state.config.environment,
                "forecasts": state.store.len().await,
            }
        })),
    )
}

async fn fallback() -> ApiError {
    ApiError::not_found("no such route")
}
