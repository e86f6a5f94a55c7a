use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use shared::{HealthStatus, ServiceStatus};
use std::sync::Arc;

use crate::state::AppState;

/// Create monitoring router with metrics and health endpoints
pub fn monitoring_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(prometheus_metrics))
        .route("/live", get(liveness_check))
}

/// Basic health check endpoint
async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = HealthStatus {
        service: env!("CARGO_PKG_NAME").to_string(),
        status: ServiceStatus::Healthy,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    };

    (StatusCode::OK, Json(health))
}

/// Prometheus metrics endpoint
async fn prometheus_metrics() -> impl IntoResponse {
    crate::observability::metrics_handler().await
}

/// Kubernetes liveness probe
async fn liveness_check() -> impl IntoResponse {
    // Simple liveness check - if we can respond, we're alive
    (StatusCode::OK, "Alive")
}
