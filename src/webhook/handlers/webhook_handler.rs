use crate::models::invocation::{json_kind, ValidationError};
use crate::models::ResponseEnvelope;
use crate::observability::{record_invocation, InvocationOutcome};
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, Method},
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value};
use shared::config::ActionDefaults;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::error;

use super::action::{handle, SERVER_ERROR};

/// Entry point for I/O Events: GET carries the challenge, POST the event deliveries.
pub async fn invoke_action(
    State(state): State<Arc<AppState>>,
    method: Method,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Response {
    let params = match build_params(&state.config.action, &method, &headers, query, &body) {
        Ok(params) => params,
        Err(e) => {
            error!("❌ Failed to map request onto invocation parameters: {}", e);
            record_invocation(InvocationOutcome::Error);
            return ResponseEnvelope::error(500, SERVER_ERROR).into_response();
        }
    };

    handle(&state, params).await.into_response()
}

/// Maps an HTTP request onto invocation parameters: deploy-time defaults,
/// then query string, then JSON body keys, plus `__ow_headers` / `__ow_method`.
pub fn build_params(
    defaults: &ActionDefaults,
    method: &Method,
    headers: &HeaderMap,
    query: HashMap<String, String>,
    body: &[u8],
) -> Result<Value, ValidationError> {
    let mut params = Map::new();

    let default_params = [
        ("orgId", &defaults.org_id),
        ("apiKey", &defaults.api_key),
        ("authToken", &defaults.auth_token),
        ("clientSecret", &defaults.client_secret),
        ("iKey", &defaults.ikey),
    ];
    for (key, value) in default_params {
        if let Some(value) = value {
            params.insert(key.to_string(), Value::String(value.clone()));
        }
    }

    for (key, value) in query {
        params.insert(key, Value::String(value));
    }

    if !body.iter().all(u8::is_ascii_whitespace) {
        match serde_json::from_slice::<Value>(body)? {
            Value::Object(fields) => params.extend(fields),
            other => return Err(ValidationError::NotAnObject(json_kind(&other))),
        }
    }

    let ow_headers: Map<String, Value> = headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), Value::String(value.to_string())))
        })
        .collect();
    params.insert("__ow_headers".to_string(), Value::Object(ow_headers));
    params.insert(
        "__ow_method".to_string(),
        Value::String(method.as_str().to_lowercase()),
    );

    Ok(Value::Object(params))
}
