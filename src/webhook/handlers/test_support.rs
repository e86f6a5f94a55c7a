//! In-process stand-ins for the I/O Events and telemetry collaborators.

use async_trait::async_trait;
use serde_json::Value;
use shared::{AppError, Config, EventsCredentials, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use crate::services::{
    EventTelemetry, EventsClientFactory, SignatureVerifier, TelemetrySink, TelemetrySinkFactory,
};
use crate::state::AppState;

pub struct StubEvents {
    pub verdict: bool,
    pub fail_init: bool,
    pub inits: AtomicUsize,
}

impl StubEvents {
    pub fn verdict(verdict: bool) -> Arc<Self> {
        Arc::new(Self {
            verdict,
            fail_init: false,
            inits: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            verdict: false,
            fail_init: true,
            inits: AtomicUsize::new(0),
        })
    }

    pub fn init_count(&self) -> usize {
        self.inits.load(Ordering::SeqCst)
    }
}

struct FixedVerifier(bool);

impl SignatureVerifier for FixedVerifier {
    fn verify_signature_for_event(&self, _: &Value, _: Option<&str>, _: &str) -> bool {
        self.0
    }
}

#[async_trait]
impl EventsClientFactory for StubEvents {
    async fn init(&self, _: &EventsCredentials) -> Result<Box<dyn SignatureVerifier>> {
        self.inits.fetch_add(1, Ordering::SeqCst);
        if self.fail_init {
            return Err(AppError::external_service("io-events", "token exchange refused"));
        }
        Ok(Box::new(FixedVerifier(self.verdict)))
    }
}

/// Records every tracked event and the ingestion keys it was asked for.
pub struct RecordingTelemetry {
    tx: mpsc::UnboundedSender<EventTelemetry>,
    pub keys: Mutex<Vec<String>>,
}

struct RecordingSink(mpsc::UnboundedSender<EventTelemetry>);

#[async_trait]
impl TelemetrySink for RecordingSink {
    async fn track_event(&self, event: EventTelemetry) -> Result<()> {
        self.0
            .send(event)
            .map_err(|_| AppError::internal("recording channel closed"))
    }
}

impl RecordingTelemetry {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<EventTelemetry>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Arc::new(Self {
                tx,
                keys: Mutex::new(Vec::new()),
            }),
            rx,
        )
    }
}

impl TelemetrySinkFactory for RecordingTelemetry {
    fn for_instrumentation_key(&self, ikey: Option<&str>) -> Result<Arc<dyn TelemetrySink>> {
        let ikey = ikey
            .filter(|k| !k.is_empty())
            .ok_or_else(|| AppError::validation("Instrumentation key not found"))?;
        self.keys.lock().unwrap().push(ikey.to_string());
        Ok(Arc::new(RecordingSink(self.tx.clone())))
    }
}

pub fn test_config() -> Config {
    Config::from_lookup(|_| None).expect("defaults are valid")
}

pub fn state_with(
    events: Arc<dyn EventsClientFactory>,
    telemetry: Arc<dyn TelemetrySinkFactory>,
) -> AppState {
    AppState::with_collaborators(test_config(), events, telemetry)
}
