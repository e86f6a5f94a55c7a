use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use shared::{AppError, EventsCredentials};

/// Header carrying the I/O Events payload signature.
pub const SIGNATURE_HEADER: &str = "x-adobe-signature";

/// Parameters of a single action invocation, as handed over by the runtime.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvocationParams {
    #[serde(default, deserialize_with = "scalar_string", skip_serializing_if = "Option::is_none")]
    pub challenge: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<Value>,
    #[serde(rename = "orgId", default, deserialize_with = "scalar_string", skip_serializing_if = "Option::is_none")]
    pub org_id: Option<String>,
    #[serde(rename = "apiKey", default, deserialize_with = "scalar_string", skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(rename = "authToken", default, deserialize_with = "scalar_string", skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    #[serde(rename = "clientSecret", default, deserialize_with = "scalar_string", skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(rename = "iKey", default, deserialize_with = "scalar_string", skip_serializing_if = "Option::is_none")]
    pub ikey: Option<String>,
    #[serde(rename = "__ow_headers", default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Map<String, Value>>,
    /// Any other key the runtime passed along (`__ow_method`, query extras...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Only the challenge field, so a handshake never depends on the rest of the payload.
#[derive(Debug, Deserialize)]
struct ChallengeProbe {
    #[serde(default, deserialize_with = "scalar_string")]
    challenge: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("invocation parameters must be a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("malformed invocation parameters: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::validation(err.to_string())
    }
}

/// What an invocation asks for, decided before any branching happens.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedInput {
    Challenge(String),
    Delivery(EventDelivery),
    Empty,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventDelivery {
    pub event: Option<Value>,
    pub signature: Option<String>,
    pub credentials: EventsCredentials,
    pub client_secret: Option<String>,
    pub instrumentation_key: Option<String>,
}

impl InvocationParams {
    /// Parses the loosely typed parameter bag into the typed parameter set.
    pub fn from_value(raw: Value) -> Result<Self, ValidationError> {
        if !raw.is_object() {
            return Err(ValidationError::NotAnObject(json_kind(&raw)));
        }
        Ok(serde_json::from_value(raw)?)
    }

    /// True when the runtime passed no keys at all.
    pub fn is_empty(&self) -> bool {
        self.challenge.is_none()
            && self.event.is_none()
            && self.org_id.is_none()
            && self.api_key.is_none()
            && self.auth_token.is_none()
            && self.client_secret.is_none()
            && self.ikey.is_none()
            && self.headers.is_none()
            && self.extra.is_empty()
    }

    /// Header lookup, case-insensitive on the name. Non-string values read as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.as_ref().and_then(|headers| {
            headers
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .and_then(|(_, value)| value.as_str())
        })
    }

    pub fn into_delivery(self) -> EventDelivery {
        let signature = self.header(SIGNATURE_HEADER).map(str::to_string);
        EventDelivery {
            event: self.event,
            signature,
            credentials: EventsCredentials {
                org_id: self.org_id,
                api_key: self.api_key,
                auth_token: self.auth_token,
            },
            client_secret: self.client_secret,
            instrumentation_key: self.ikey,
        }
    }
}

impl ParsedInput {
    /// Validation step run before branching. A non-empty challenge wins over
    /// everything else, even fields that would fail validation.
    pub fn parse(raw: Value) -> Result<Self, ValidationError> {
        if raw.is_object() {
            if let Ok(probe) = ChallengeProbe::deserialize(&raw) {
                if let Some(challenge) = probe.challenge.filter(|c| !c.is_empty()) {
                    return Ok(ParsedInput::Challenge(challenge));
                }
            }
        }

        let params = InvocationParams::from_value(raw)?;
        if params.is_empty() {
            Ok(ParsedInput::Empty)
        } else {
            Ok(ParsedInput::Delivery(params.into_delivery()))
        }
    }
}

/// Accepts strings, numbers and booleans for a string-typed parameter.
fn scalar_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a string, got {}",
            json_kind(&other)
        ))),
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_challenge_wins_over_malformed_fields() {
        let raw = json!({
            "challenge": "abc123",
            "orgId": { "not": "a string" },
            "__ow_headers": "nope"
        });

        assert_eq!(
            ParsedInput::parse(raw).unwrap(),
            ParsedInput::Challenge("abc123".to_string())
        );
    }

    #[test]
    fn test_numeric_challenge_is_stringified() {
        let parsed = ParsedInput::parse(json!({ "challenge": 42 })).unwrap();
        assert_eq!(parsed, ParsedInput::Challenge("42".to_string()));
    }

    #[test]
    fn test_empty_object_is_empty_input() {
        assert_eq!(ParsedInput::parse(json!({})).unwrap(), ParsedInput::Empty);
    }

    #[test]
    fn test_empty_challenge_falls_through_to_delivery() {
        let parsed = ParsedInput::parse(json!({ "challenge": "" })).unwrap();
        assert!(matches!(parsed, ParsedInput::Delivery(_)));
    }

    #[test]
    fn test_delivery_extracts_signature_and_credentials() {
        let raw = json!({
            "event": { "id": "evt-1" },
            "orgId": "org@AdobeOrg",
            "apiKey": "client-id",
            "authToken": "token",
            "clientSecret": "secret",
            "iKey": "ikey-1",
            "__ow_headers": { "X-Adobe-Signature": "c2ln", "content-type": "application/json" },
            "__ow_method": "post"
        });

        let ParsedInput::Delivery(delivery) = ParsedInput::parse(raw).unwrap() else {
            panic!("expected a delivery");
        };

        assert_eq!(delivery.event, Some(json!({ "id": "evt-1" })));
        assert_eq!(delivery.signature.as_deref(), Some("c2ln"));
        assert_eq!(delivery.credentials.org_id.as_deref(), Some("org@AdobeOrg"));
        assert_eq!(delivery.credentials.api_key.as_deref(), Some("client-id"));
        assert_eq!(delivery.credentials.auth_token.as_deref(), Some("token"));
        assert_eq!(delivery.client_secret.as_deref(), Some("secret"));
        assert_eq!(delivery.instrumentation_key.as_deref(), Some("ikey-1"));
    }

    #[test]
    fn test_non_string_header_values_do_not_fail_validation() {
        let raw = json!({
            "event": { "id": "evt-2" },
            "__ow_headers": {
                "x-adobe-signature": "c2ln",
                "x-forwarded-port": 443,
                "x-retry": ["1", "2"]
            }
        });

        let ParsedInput::Delivery(delivery) = ParsedInput::parse(raw).unwrap() else {
            panic!("expected a delivery");
        };
        assert_eq!(delivery.signature.as_deref(), Some("c2ln"));
    }

    #[test]
    fn test_non_string_signature_reads_as_missing() {
        let raw = json!({
            "event": { "id": "evt-3" },
            "__ow_headers": { "x-adobe-signature": 12345 }
        });

        let ParsedInput::Delivery(delivery) = ParsedInput::parse(raw).unwrap() else {
            panic!("expected a delivery");
        };
        assert!(delivery.signature.is_none());
    }

    #[test]
    fn test_unknown_keys_still_count() {
        let params = InvocationParams::from_value(json!({ "__ow_method": "get" })).unwrap();
        assert!(!params.is_empty());
        assert!(params.extra.contains_key("__ow_method"));
    }

    #[test]
    fn test_non_object_is_rejected() {
        let err = ParsedInput::parse(json!(["challenge"])).unwrap_err();
        assert!(matches!(err, ValidationError::NotAnObject("an array")));
    }

    #[test]
    fn test_wrong_field_type_is_malformed() {
        let err = ParsedInput::parse(json!({ "iKey": ["a", "b"] })).unwrap_err();
        assert!(matches!(err, ValidationError::Malformed(_)));
    }
}
