use crate::services::{AppInsightsClientPool, EventsClientFactory, IoEventsProvider, TelemetrySinkFactory};
use shared::Config;
use std::sync::Arc;
use std::time::Instant;

/// Estado compartido de la aplicación.
/// Contiene la configuración y los clientes de I/O Events y Application Insights.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub events: Arc<dyn EventsClientFactory>,
    pub telemetry: Arc<dyn TelemetrySinkFactory>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let telemetry = AppInsightsClientPool::new(&config.telemetry)
            .map_err(|e| anyhow::anyhow!("Failed to create telemetry client pool: {}", e))?;

        if config.action.ikey.is_none() {
            tracing::info!("ℹ️ APPINSIGHTS_IKEY not set. Every event delivery must carry iKey.");
        }

        Ok(Self::with_collaborators(
            config,
            Arc::new(IoEventsProvider),
            Arc::new(telemetry),
        ))
    }

    pub fn with_collaborators(
        config: Config,
        events: Arc<dyn EventsClientFactory>,
        telemetry: Arc<dyn TelemetrySinkFactory>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            events,
            telemetry,
            started_at: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
