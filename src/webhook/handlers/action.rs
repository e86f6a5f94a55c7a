use base64::{engine::general_purpose, Engine as _};
use serde_json::Value;
use shared::{AppError, Result};
use tokio::task::JoinHandle;
use tracing::{error, info, info_span, Instrument};

use crate::models::invocation::{EventDelivery, ParsedInput};
use crate::models::ResponseEnvelope;
use crate::observability::{record_invocation, record_signature_verification, InvocationOutcome};
use crate::services::{dispatch_event, EventTelemetry};
use crate::state::AppState;
use crate::utils::{get_invocation_id, string_parameters};

pub const SERVER_ERROR: &str = "server error";

/// Runs one invocation. Never fails: every error ends up as a 500 envelope.
///
/// Signature failures still answer 200 so the eventing provider does not
/// retry the delivery.
pub async fn handle(state: &AppState, params: Value) -> ResponseEnvelope {
    let span = info_span!("invocation", invocation_id = %get_invocation_id(&params));

    async move {
        info!("Inside main app insights function");
        info!("{}", string_parameters(&params));

        match run(state, params).await {
            Ok((response, outcome)) => {
                record_invocation(outcome);
                response
            }
            Err(e) => {
                error!("❌ Invocation failed: {}", e);
                record_invocation(InvocationOutcome::Error);
                ResponseEnvelope::error(500, SERVER_ERROR)
            }
        }
    }
    .instrument(span)
    .await
}

async fn run(state: &AppState, params: Value) -> Result<(ResponseEnvelope, InvocationOutcome)> {
    let response = ResponseEnvelope::ok();

    let delivery = match ParsedInput::parse(params)? {
        ParsedInput::Challenge(challenge) => {
            info!("Returning challenge: {}", challenge);
            return Ok((challenge_response(&challenge)?, InvocationOutcome::Challenge));
        }
        ParsedInput::Empty => return Ok((response, InvocationOutcome::Empty)),
        ParsedInput::Delivery(delivery) => delivery,
    };

    info!("Handling the app insights ingestion now");

    if !verify_signature(state, &delivery).await? {
        error!("x-adobe-signature header verification failure");
        return Ok((response, InvocationOutcome::Rejected));
    }

    let event = delivery
        .event
        .as_ref()
        .ok_or_else(|| AppError::internal("verified delivery carries no event"))?;
    forward_event(state, &delivery, event)?;

    Ok((response, InvocationOutcome::Forwarded))
}

/// 200 envelope whose body is base64 of `{"challenge":"<value>"}`.
pub fn challenge_response(challenge: &str) -> Result<ResponseEnvelope> {
    let json = serde_json::to_string(&serde_json::json!({ "challenge": challenge }))?;
    let mut response = ResponseEnvelope::ok();
    response.body = general_purpose::STANDARD.encode(json);
    Ok(response)
}

/// Checks `x-adobe-signature` through the I/O Events client. Without the
/// header or an event there is nothing to check and the answer is `false`.
pub async fn verify_signature(state: &AppState, delivery: &EventDelivery) -> Result<bool> {
    let signature = delivery.signature.as_deref().filter(|s| !s.is_empty());
    let (Some(signature), Some(event)) = (signature, delivery.event.as_ref()) else {
        record_signature_verification(None);
        return Ok(false);
    };

    info!("x-adobe-signature:{}", signature);
    let client = state.events.init(&delivery.credentials).await?;
    let valid =
        client.verify_signature_for_event(event, delivery.client_secret.as_deref(), signature);

    record_signature_verification(Some(valid));
    Ok(valid)
}

/// Emits the event to the telemetry sink of the delivery's ingestion key.
/// The send is spawned; the returned handle is only useful to tests.
pub fn forward_event(
    state: &AppState,
    delivery: &EventDelivery,
    event: &Value,
) -> Result<JoinHandle<()>> {
    info!("{}", event);
    let telemetry = EventTelemetry::io_event(event)?;

    let sink = state
        .telemetry
        .for_instrumentation_key(delivery.instrumentation_key.as_deref())?;

    Ok(dispatch_event(sink, telemetry))
}
