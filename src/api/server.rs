//! HTTP server for the scanner and search pages.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;

use crate::api::error::method_not_allowed;
use crate::api::{health, scan, search};
use crate::config::toml_config::GlanceConfig;
use crate::core::GlanceService;
use crate::utils::error::Result;

/// Application state shared across routes.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<GlanceService>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(service: GlanceService) -> Self {
        Self {
            service: Arc::new(service),
            started_at: Instant::now(),
        }
    }
}

pub fn router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route(
            "/api/analyze-valve",
            post(scan::analyze_valve).fallback(method_not_allowed),
        )
        .route(
            "/api/vision-analyze",
            post(scan::vision_analyze).fallback(method_not_allowed),
        )
        .route("/api/valve-search", get(search::valve_search))
        .route("/api/test-openai", get(scan::test_openai))
        .route("/api/health", get(health::health))
        // base64 照片遠大於 axum 預設的 2MB
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
}

/// Serves `app` on an already bound listener until Ctrl-C.
pub async fn serve(listener: TcpListener, app: Router) -> Result<()> {
    tracing::info!("GLANCE API listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("GLANCE API stopped");
    Ok(())
}

pub async fn start_server(config: &GlanceConfig, service: GlanceService) -> Result<()> {
    let addr = config.bind_addr()?;
    let app = router(AppState::new(service), config.server.max_body_bytes);
    let listener = TcpListener::bind(addr).await?;
    serve(listener, app).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
