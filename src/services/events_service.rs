// ============================================================================
// I/O EVENTS SERVICE - Verificación de firma de eventos entrantes
// ============================================================================

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;
use shared::{AppError, EventsCredentials, Result};
use tracing::{debug, warn};

type HmacSha256 = Hmac<Sha256>;

/// Opens a verification client for one set of I/O Events credentials.
#[async_trait]
pub trait EventsClientFactory: Send + Sync {
    async fn init(&self, credentials: &EventsCredentials) -> Result<Box<dyn SignatureVerifier>>;
}

pub trait SignatureVerifier: Send + Sync {
    fn verify_signature_for_event(
        &self,
        event: &Value,
        client_secret: Option<&str>,
        signature: &str,
    ) -> bool;
}

/// Production factory: HMAC-SHA256 over the JSON text of the event.
#[derive(Debug, Clone, Default)]
pub struct IoEventsProvider;

#[derive(Debug, Clone)]
pub struct IoEventsClient {
    org_id: String,
}

#[async_trait]
impl EventsClientFactory for IoEventsProvider {
    async fn init(&self, credentials: &EventsCredentials) -> Result<Box<dyn SignatureVerifier>> {
        let missing = credentials.missing_arguments();
        if !missing.is_empty() {
            return Err(AppError::validation(format!(
                "SDK initialization error(s). Missing arguments: {}",
                missing.join(", ")
            )));
        }

        let org_id = credentials.org_id.clone().unwrap_or_default();
        debug!("I/O Events client initialized for org {}", org_id);
        Ok(Box::new(IoEventsClient { org_id }))
    }
}

impl IoEventsClient {
    /// Checks a base64 HMAC-SHA256 signature over the exact payload bytes.
    pub fn verify_payload(&self, payload: &[u8], client_secret: &str, signature: &str) -> bool {
        let expected = match general_purpose::STANDARD.decode(signature.trim()) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Signature header is not valid base64 (org {}): {}", self.org_id, e);
                return false;
            }
        };

        let Ok(mut mac) = HmacSha256::new_from_slice(client_secret.as_bytes()) else {
            return false;
        };
        mac.update(payload);
        let valid = mac.verify_slice(&expected).is_ok();
        if !valid {
            debug!("Signature mismatch for org {}", self.org_id);
        }
        valid
    }
}

impl SignatureVerifier for IoEventsClient {
    /// The event is signed as its compact JSON text with keys in delivery order.
    fn verify_signature_for_event(
        &self,
        event: &Value,
        client_secret: Option<&str>,
        signature: &str,
    ) -> bool {
        let Some(secret) = client_secret.filter(|s| !s.is_empty()) else {
            warn!("No client secret available, cannot verify event signature");
            return false;
        };

        match serde_json::to_vec(event) {
            Ok(payload) => self.verify_payload(&payload, secret, signature),
            Err(e) => {
                warn!("Failed to serialize event for signature check: {}", e);
                false
            }
        }
    }
}

/// Base64 HMAC-SHA256 of the event's JSON text, as sent in `x-adobe-signature`.
pub fn sign_event(event: &Value, client_secret: &str) -> Result<String> {
    let payload = serde_json::to_vec(event)?;
    let mut mac = HmacSha256::new_from_slice(client_secret.as_bytes())
        .map_err(|e| AppError::internal(format!("Invalid HMAC key: {}", e)))?;
    mac.update(&payload);
    Ok(general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn credentials() -> EventsCredentials {
        EventsCredentials {
            org_id: Some("53444F2B5D4B@AdobeOrg".to_string()),
            api_key: Some("client-id".to_string()),
            auth_token: Some("access-token".to_string()),
        }
    }

    fn sample_event() -> Value {
        json!({
            "event_id": "a7f8c0e2-1b1e-4a5f-9b7c-0f3c7b2e4d11",
            "event": { "activitystreams:object": { "xdmAsset:path": "/MyFolder/file.png" } }
        })
    }

    #[tokio::test]
    async fn test_init_rejects_missing_credentials() {
        let err = IoEventsProvider
            .init(&EventsCredentials {
                org_id: Some("org".to_string()),
                ..Default::default()
            })
            .await
            .err()
            .expect("init should fail");

        assert_eq!(
            err.to_string(),
            "Validation error: SDK initialization error(s). Missing arguments: apiKey, accessToken"
        );
    }

    fn hmac_base64(payload: &str, secret: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(payload.as_bytes());
        general_purpose::STANDARD.encode(mac.finalize().into_bytes())
    }

    #[tokio::test]
    async fn test_signature_over_delivered_text_is_accepted() {
        let client = IoEventsProvider.init(&credentials()).await.unwrap();
        // Keys deliberately out of alphabetical order, as the provider sends them.
        let delivered = r#"{"event_id":"evt-1","event":{"b":1,"a":2},"recipient_client_id":"client-id"}"#;
        let signature = hmac_base64(delivered, "shared-secret");
        let event: Value = serde_json::from_str(delivered).unwrap();

        assert_eq!(serde_json::to_string(&event).unwrap(), delivered);
        assert!(client.verify_signature_for_event(&event, Some("shared-secret"), &signature));
        assert_eq!(sign_event(&event, "shared-secret").unwrap(), signature);
    }

    #[tokio::test]
    async fn test_valid_signature_is_accepted() {
        let client = IoEventsProvider.init(&credentials()).await.unwrap();
        let event = sample_event();
        let signature = sign_event(&event, "shared-secret").unwrap();

        assert!(client.verify_signature_for_event(&event, Some("shared-secret"), &signature));
    }

    #[tokio::test]
    async fn test_tampered_event_or_wrong_secret_is_rejected() {
        let client = IoEventsProvider.init(&credentials()).await.unwrap();
        let event = sample_event();
        let signature = sign_event(&event, "shared-secret").unwrap();

        let mut tampered = event.clone();
        tampered["event_id"] = json!("someone-else");

        assert!(!client.verify_signature_for_event(&tampered, Some("shared-secret"), &signature));
        assert!(!client.verify_signature_for_event(&event, Some("other-secret"), &signature));
    }

    #[tokio::test]
    async fn test_bad_header_or_missing_secret_is_rejected() {
        let client = IoEventsProvider.init(&credentials()).await.unwrap();
        let event = sample_event();
        let signature = sign_event(&event, "shared-secret").unwrap();

        assert!(!client.verify_signature_for_event(&event, Some("shared-secret"), "%%not-base64%%"));
        assert!(!client.verify_signature_for_event(&event, None, &signature));
    }
}
