use axum::{
    extract::DefaultBodyLimit,
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod models;
pub mod monitoring;
pub mod observability;
pub mod services;
pub mod state;
pub mod utils;
pub mod webhook;

use monitoring::monitoring_router;
use observability::metrics_middleware;
use state::AppState;
use webhook::create_webhook_router;

use axum::middleware as axum_middleware;

pub fn create_app_router(app_state: Arc<AppState>) -> Router {
    let body_limit = app_state.config.server.max_request_size_kb * 1024;

    Router::new()
        // Webhook de I/O Events (challenge + entregas de eventos)
        .merge(create_webhook_router())
        // Endpoints de monitoreo - incluye /metrics de Prometheus
        .merge(monitoring_router())
        .with_state(app_state)
        .layer(axum_middleware::from_fn(metrics_middleware)) // 📊 Captura métricas automáticamente
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
}
