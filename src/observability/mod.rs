// Métricas Prometheus del webhook: contadores HTTP, invocaciones, firmas y envíos
pub mod metrics;
pub mod endpoints;
pub mod middleware;

pub use metrics::{
    record_http_request, record_invocation, record_signature_verification, record_telemetry_sent,
    InvocationOutcome,
};
pub use endpoints::metrics_handler;
pub use middleware::metrics_middleware;
