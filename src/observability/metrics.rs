// ============================================================================
// PROMETHEUS METRICS - Sistema de Observabilidad
// ============================================================================
// Métricas del webhook: requests HTTP, invocaciones, firmas y telemetría
// ============================================================================

use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, HistogramVec, IntCounterVec,
};

lazy_static! {
    // ========================================================================
    // HTTP REQUEST METRICS
    // ========================================================================

    /// Total de requests HTTP por método, endpoint y status
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "endpoint", "status"]
    )
    .unwrap();

    /// Duración de requests HTTP en segundos
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "endpoint"],
        vec![0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap();

    /// Tamaño de respuestas HTTP en bytes
    pub static ref HTTP_RESPONSE_SIZE_BYTES: HistogramVec = register_histogram_vec!(
        "http_response_size_bytes",
        "HTTP response size in bytes",
        &["method", "endpoint"],
        vec![0.0, 64.0, 256.0, 1024.0, 4096.0, 16384.0]
    )
    .unwrap();

    // ========================================================================
    // WEBHOOK METRICS
    // ========================================================================

    /// Invocaciones del webhook por resultado
    pub static ref WEBHOOK_INVOCATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "webhook_invocations_total",
        "Total number of webhook invocations by outcome",
        &["outcome"]
    )
    .unwrap();

    /// Verificaciones de x-adobe-signature
    pub static ref SIGNATURE_VERIFICATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "signature_verifications_total",
        "Total number of event signature verifications",
        &["result"]
    )
    .unwrap();

    // ========================================================================
    // TELEMETRY METRICS
    // ========================================================================

    /// Eventos enviados a Application Insights
    pub static ref TELEMETRY_EVENTS_SENT_TOTAL: IntCounterVec = register_int_counter_vec!(
        "telemetry_events_sent_total",
        "Total number of telemetry events sent",
        &["event_name", "status"]
    )
    .unwrap();
}

/// Resultado de una invocación del webhook
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationOutcome {
    Challenge,
    Forwarded,
    Rejected,
    Empty,
    Error,
}

impl InvocationOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvocationOutcome::Challenge => "challenge",
            InvocationOutcome::Forwarded => "forwarded",
            InvocationOutcome::Rejected => "rejected",
            InvocationOutcome::Empty => "empty",
            InvocationOutcome::Error => "error",
        }
    }
}

/// Helper para registrar una request HTTP completa
pub fn record_http_request(method: &str, endpoint: &str, status: u16, duration_secs: f64, response_size: usize) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, endpoint, &status.to_string()])
        .inc();

    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, endpoint])
        .observe(duration_secs);

    HTTP_RESPONSE_SIZE_BYTES
        .with_label_values(&[method, endpoint])
        .observe(response_size as f64);
}

/// Helper para registrar el resultado de una invocación
pub fn record_invocation(outcome: InvocationOutcome) {
    WEBHOOK_INVOCATIONS_TOTAL
        .with_label_values(&[outcome.as_str()])
        .inc();
}

/// Helper para registrar una verificación de firma
pub fn record_signature_verification(result: Option<bool>) {
    let label = match result {
        Some(true) => "valid",
        Some(false) => "invalid",
        None => "skipped",
    };
    SIGNATURE_VERIFICATIONS_TOTAL.with_label_values(&[label]).inc();
}

/// Helper para registrar un evento de telemetría enviado
pub fn record_telemetry_sent(event_name: &str, success: bool) {
    let status = if success { "success" } else { "error" };
    TELEMETRY_EVENTS_SENT_TOTAL
        .with_label_values(&[event_name, status])
        .inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_counter_increments() {
        let before = WEBHOOK_INVOCATIONS_TOTAL
            .with_label_values(&["empty"])
            .get();
        record_invocation(InvocationOutcome::Empty);
        let after = WEBHOOK_INVOCATIONS_TOTAL
            .with_label_values(&["empty"])
            .get();

        assert!(after > before);
    }

    #[test]
    fn test_signature_labels() {
        let before = SIGNATURE_VERIFICATIONS_TOTAL
            .with_label_values(&["skipped"])
            .get();
        record_signature_verification(None);
        assert!(SIGNATURE_VERIFICATIONS_TOTAL.with_label_values(&["skipped"]).get() > before);
    }
}
