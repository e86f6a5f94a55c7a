//! Configuration management for the webhook service

use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub action: ActionDefaults,
    pub app: AppConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub max_request_size_kb: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    pub ingestion_url: String,
    pub timeout_seconds: u64,
    pub cloud_role: String,
    pub cloud_role_instance: String,
    /// Upper bound on cached per-iKey clients; keys past it get a one-off client.
    pub max_cached_clients: usize,
}

/// Deploy-time parameters merged into every invocation that does not carry them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionDefaults {
    pub org_id: Option<String>,
    pub api_key: Option<String>,
    pub auth_token: Option<String>,
    pub client_secret: Option<String>,
    pub ikey: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: String,
    pub log_level: String,
}

pub const DEFAULT_INGESTION_URL: &str = "https://dc.services.visualstudio.com";
pub const DEFAULT_CLOUD_ROLE: &str = "microsoft-telemetry";

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup (the process environment in production).
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let optional = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Ok(Config {
            server: ServerConfig {
                port: var("PORT", "8000").parse()?,
                max_request_size_kb: var("MAX_REQUEST_SIZE_KB", "1024").parse()?,
            },
            telemetry: TelemetryConfig {
                ingestion_url: var("APPINSIGHTS_INGESTION_URL", DEFAULT_INGESTION_URL)
                    .trim_end_matches('/')
                    .to_string(),
                timeout_seconds: var("TELEMETRY_TIMEOUT_SECONDS", "10").parse()?,
                cloud_role: var("TELEMETRY_CLOUD_ROLE", DEFAULT_CLOUD_ROLE),
                cloud_role_instance: var("TELEMETRY_CLOUD_ROLE_INSTANCE", DEFAULT_CLOUD_ROLE),
                max_cached_clients: var("TELEMETRY_MAX_CACHED_CLIENTS", "256").parse()?,
            },
            action: ActionDefaults {
                org_id: optional("IO_ORG_ID"),
                api_key: optional("IO_API_KEY"),
                auth_token: optional("IO_AUTH_TOKEN"),
                client_secret: optional("IO_CLIENT_SECRET"),
                ikey: optional("APPINSIGHTS_IKEY"),
            },
            app: AppConfig {
                environment: var("ENVIRONMENT", "development"),
                log_level: var("RUST_LOG", "info"),
            },
        })
    }
}

impl TelemetryConfig {
    pub fn with_ingestion_url(ingestion_url: impl Into<String>) -> Self {
        Self {
            ingestion_url: ingestion_url.into(),
            ..Self::default()
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            ingestion_url: DEFAULT_INGESTION_URL.to_string(),
            timeout_seconds: 10,
            cloud_role: DEFAULT_CLOUD_ROLE.to_string(),
            cloud_role_instance: DEFAULT_CLOUD_ROLE.to_string(),
            max_cached_clients: 256,
        }
    }
}
