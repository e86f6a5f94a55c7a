// ============================================================================
// OUTBOUND SERVICES
// ============================================================================
pub mod events_service;
pub mod telemetry_service;

pub use events_service::{EventsClientFactory, IoEventsClient, IoEventsProvider, SignatureVerifier};
pub use telemetry_service::{
    dispatch_event, AppInsightsClient, AppInsightsClientPool, EventTelemetry, TelemetrySink,
    TelemetrySinkFactory,
};
