// Utils module for utility functions
use serde_json::{Map, Value};
use uuid::Uuid;

const HIDDEN: &str = "<hidden>";
const SECRET_PARAMS: [&str; 3] = ["authToken", "apiKey", "clientSecret"];

// Invocation id from the runtime headers, otherwise a fresh UUID
pub fn get_invocation_id(params: &Value) -> String {
    params
        .get("__ow_headers")
        .and_then(|headers| {
            headers
                .get("x-request-id")
                .or_else(|| headers.get("x-openwhisk-activation-id"))
        })
        .and_then(Value::as_str)
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// JSON text of the invocation parameters, safe to log: the authorization
/// header and credential parameters are replaced by `<hidden>`.
pub fn string_parameters(params: &Value) -> String {
    let mut redacted = params.clone();

    if let Some(object) = redacted.as_object_mut() {
        hide_keys(object, &SECRET_PARAMS);
        if let Some(headers) = object.get_mut("__ow_headers").and_then(Value::as_object_mut) {
            hide_keys(headers, &["authorization"]);
        }
    }

    redacted.to_string()
}

fn hide_keys(object: &mut Map<String, Value>, keys: &[&str]) {
    for key in keys {
        if let Some(value) = object.get_mut(*key) {
            *value = Value::String(HIDDEN.to_string());
        }
    }
}
