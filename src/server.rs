use crate::config::AppConfig;
use crate::data::MetadataTable;
use crate::metric_set::MetricSet;
use crate::processing;
use crate::render;
use crate::sources::Source;
use crate::summary::{self, SummaryReport};
use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use reqwest::Client;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

/// Shared between requests. Everything in here is read-only.
pub struct AppState {
    pub metadata: MetadataTable,
    pub sources: Vec<Source>,
    pub client: Client,
}

impl AppState {
    pub fn new(config: &AppConfig, metadata: MetadataTable) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.fetch.timeout())
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            metadata,
            sources: Source::from_config(config)?,
            client,
        })
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/metrics/current", get(summary_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start_server(config: AppConfig, metadata: MetadataTable) -> Result<()> {
    let state = Arc::new(AppState::new(&config, metadata)?);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.server.host, config.server.port))?;

    info!("Starting server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// Exposition text of every source that could be collected. Failed
/// sources are logged and left out.
pub async fn render_all(state: &AppState) -> String {
    let mut body = String::new();
    for source in &state.sources {
        match processing::collect(source, &state.client, &state.metadata).await {
            Ok(metrics) => render::render_metrics(&metrics, &mut body),
            Err(err) => warn!("Skipping source {}: {}", source.name(), err),
        }
    }
    body
}

async fn metrics_handler(State(state): State<Arc<AppState>>) -> Response {
    let body = render_all(&state).await;
    ([(header::CONTENT_TYPE, render::CONTENT_TYPE)], body).into_response()
}

async fn summary_handler(State(state): State<Arc<AppState>>) -> (StatusCode, Json<SummaryReport>) {
    let mut combined = MetricSet::new();
    let mut status = StatusCode::OK;
    for source in &state.sources {
        match processing::collect(source, &state.client, &state.metadata).await {
            Ok(metrics) => combined.extend(metrics),
            Err(err) => {
                warn!("Summary without source {}: {}", source.name(), err);
                status = StatusCode::INTERNAL_SERVER_ERROR;
            }
        }
    }
    (status, Json(summary::build_summary(&combined)))
}

async fn health_handler(State(state): State<Arc<AppState>>) -> (StatusCode, String) {
    let issues = processing::check_all(&state.sources, &state.client, &state.metadata).await;
    if issues.is_empty() {
        return (StatusCode::OK, "healthy\n".to_string());
    }

    warn!("Health check found {} issues", issues.len());
    let body = issues
        .iter()
        .map(|issue| format!("{}\n", issue))
        .collect::<String>();
    (StatusCode::INTERNAL_SERVER_ERROR, body)
}
