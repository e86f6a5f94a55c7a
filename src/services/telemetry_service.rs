// ============================================================================
// TELEMETRY SERVICE - Envío de eventos a Application Insights
// ============================================================================
//
// Delivery is at-most-once with no confirmation: `dispatch_event` spawns the
// track call and the caller never observes its outcome. The only bound on an
// in-flight send is the HTTP client timeout.

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::{config::TelemetryConfig, AppError, Result, ServiceClient};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::observability::record_telemetry_sent;

pub const ADOBE_EVENT_NAME: &str = "Microsoft.events.AdobeEvent";
pub const EVENT_BODY_PROPERTY: &str = "IOEventBody";
pub const CLOUD_ROLE_TAG: &str = "ai.cloud.role";
pub const CLOUD_ROLE_INSTANCE_TAG: &str = "ai.cloud.roleInstance";
const SDK_VERSION_TAG: &str = "ai.internal.sdkVersion";
const TRACK_ENDPOINT: &str = "/v2/track";
const SERVICE_NAME: &str = "app-insights";

/// A named custom event with string properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTelemetry {
    pub name: String,
    pub properties: BTreeMap<String, String>,
}

impl EventTelemetry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// The record forwarded for every verified I/O event.
    pub fn io_event(event: &Value) -> Result<Self> {
        let body = serde_json::to_string(event)?;
        Ok(Self::new(ADOBE_EVENT_NAME).with_property(EVENT_BODY_PROPERTY, body))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub name: String,
    pub time: String,
    #[serde(rename = "iKey")]
    pub ikey: String,
    pub tags: BTreeMap<String, String>,
    pub data: EnvelopeData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeData {
    #[serde(rename = "baseType")]
    pub base_type: String,
    #[serde(rename = "baseData")]
    pub base_data: EventData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventData {
    pub ver: u8,
    pub name: String,
    pub properties: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackResponse {
    #[serde(rename = "itemsReceived")]
    pub items_received: u32,
    #[serde(rename = "itemsAccepted")]
    pub items_accepted: u32,
    #[serde(default)]
    pub errors: Vec<TrackError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackError {
    pub index: u32,
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub message: String,
}

/// Runs over every envelope before it is sent. Returning `false` drops the envelope.
pub type TelemetryProcessor = Arc<dyn Fn(&mut Envelope) -> bool + Send + Sync>;

/// Tags every envelope with a fixed cloud role / role instance pair.
pub fn cloud_role_processor(role: impl Into<String>, instance: impl Into<String>) -> TelemetryProcessor {
    let role = role.into();
    let instance = instance.into();
    Arc::new(move |envelope: &mut Envelope| {
        envelope.tags.insert(CLOUD_ROLE_TAG.to_string(), role.clone());
        envelope
            .tags
            .insert(CLOUD_ROLE_INSTANCE_TAG.to_string(), instance.clone());
        true
    })
}

#[async_trait]
pub trait TelemetrySink: Send + Sync {
    async fn track_event(&self, event: EventTelemetry) -> Result<()>;
}

/// Hands out the telemetry sink bound to one ingestion key.
pub trait TelemetrySinkFactory: Send + Sync {
    fn for_instrumentation_key(&self, ikey: Option<&str>) -> Result<Arc<dyn TelemetrySink>>;
}

pub struct AppInsightsClient {
    ikey: String,
    transport: ServiceClient,
    processors: Vec<TelemetryProcessor>,
}

impl AppInsightsClient {
    pub fn new(ikey: impl Into<String>, transport: ServiceClient) -> Self {
        Self {
            ikey: ikey.into(),
            transport,
            processors: Vec::new(),
        }
    }

    pub fn add_telemetry_processor(&mut self, processor: TelemetryProcessor) {
        self.processors.push(processor);
    }

    pub fn instrumentation_key(&self) -> &str {
        &self.ikey
    }

    /// Wraps the event in a track envelope and runs the processors over it.
    /// `None` means a processor dropped it.
    pub fn build_envelope(&self, event: EventTelemetry) -> Option<Envelope> {
        let mut tags = BTreeMap::new();
        tags.insert(
            SDK_VERSION_TAG.to_string(),
            format!("{}:{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        );

        let mut envelope = Envelope {
            name: format!(
                "Microsoft.ApplicationInsights.{}.Event",
                self.ikey.replace('-', "")
            ),
            time: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            ikey: self.ikey.clone(),
            tags,
            data: EnvelopeData {
                base_type: "EventData".to_string(),
                base_data: EventData {
                    ver: 2,
                    name: event.name,
                    properties: event.properties,
                },
            },
        };

        for processor in &self.processors {
            if !processor(&mut envelope) {
                return None;
            }
        }
        Some(envelope)
    }
}

#[async_trait]
impl TelemetrySink for AppInsightsClient {
    async fn track_event(&self, event: EventTelemetry) -> Result<()> {
        let event_name = event.name.clone();
        let Some(envelope) = self.build_envelope(event) else {
            debug!("Telemetry processor dropped event {}", event_name);
            return Ok(());
        };

        let response: TrackResponse = self.transport.post(TRACK_ENDPOINT, &[envelope]).await?;

        if response.items_accepted < response.items_received {
            let reason = response
                .errors
                .first()
                .map(|e| format!("item {} rejected ({}): {}", e.index, e.status_code, e.message))
                .unwrap_or_else(|| "items rejected without detail".to_string());
            return Err(AppError::external_service(SERVICE_NAME, reason));
        }

        Ok(())
    }
}

/// One client per ingestion key, all sharing a single HTTP client.
/// At most `max_cached_clients` keys are cached; further keys get a client
/// built for that call only.
pub struct AppInsightsClientPool {
    config: TelemetryConfig,
    transport: ServiceClient,
    clients: DashMap<String, Arc<AppInsightsClient>>,
}

impl AppInsightsClientPool {
    pub fn new(config: &TelemetryConfig) -> Result<Self> {
        let transport = ServiceClient::new(
            config.ingestion_url.clone(),
            SERVICE_NAME.to_string(),
            config.timeout_seconds,
        )?;

        info!(
            "📡 Application Insights pool ready (endpoint: {}, timeout: {:?})",
            config.ingestion_url,
            transport.timeout()
        );

        Ok(Self {
            config: config.clone(),
            transport,
            clients: DashMap::new(),
        })
    }

    pub fn client(&self, ikey: &str) -> Arc<AppInsightsClient> {
        if let Some(client) = self.clients.get(ikey) {
            return client.value().clone();
        }

        if self.clients.len() >= self.config.max_cached_clients {
            warn!(
                "⚠️ Application Insights client cache full ({} keys), using an uncached client",
                self.clients.len()
            );
            return Arc::new(self.build_client(ikey));
        }

        self.clients
            .entry(ikey.to_string())
            .or_insert_with(|| {
                debug!("Creating Application Insights client for a new ingestion key");
                Arc::new(self.build_client(ikey))
            })
            .clone()
    }

    fn build_client(&self, ikey: &str) -> AppInsightsClient {
        let mut client = AppInsightsClient::new(ikey, self.transport.clone());
        client.add_telemetry_processor(cloud_role_processor(
            self.config.cloud_role.clone(),
            self.config.cloud_role_instance.clone(),
        ));
        client
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

impl TelemetrySinkFactory for AppInsightsClientPool {
    fn for_instrumentation_key(&self, ikey: Option<&str>) -> Result<Arc<dyn TelemetrySink>> {
        let ikey = ikey
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| AppError::validation("Instrumentation key not found"))?;

        let client: Arc<dyn TelemetrySink> = self.client(ikey);
        Ok(client)
    }
}

/// Fire-and-forget send. The outcome is only logged and counted.
pub fn dispatch_event(sink: Arc<dyn TelemetrySink>, event: EventTelemetry) -> JoinHandle<()> {
    tokio::spawn(async move {
        let name = event.name.clone();
        match sink.track_event(event).await {
            Ok(()) => {
                info!("✅ Telemetry event {} sent", name);
                record_telemetry_sent(&name, true);
            }
            Err(e) => {
                error!("❌ Failed to send telemetry event {}: {}", name, e);
                record_telemetry_sent(&name, false);
            }
        }
    })
}
