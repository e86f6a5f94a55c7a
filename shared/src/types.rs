//! Common types used across the workspace

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub service: String,
    pub status: ServiceStatus,
    pub version: String,
    pub uptime_seconds: u64,
    pub timestamp: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Healthy,
}

/// Credentials used to open an I/O Events client
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventsCredentials {
    pub org_id: Option<String>,
    pub api_key: Option<String>,
    pub auth_token: Option<String>,
}

impl EventsCredentials {
    /// Names of the arguments that are missing or blank, in SDK order
    pub fn missing_arguments(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if is_blank(&self.org_id) {
            missing.push("organizationId");
        }
        if is_blank(&self.api_key) {
            missing.push("apiKey");
        }
        if is_blank(&self.auth_token) {
            missing.push("accessToken");
        }
        missing
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map(str::trim).map_or(true, str::is_empty)
}
