use crate::state::AppState;
use axum::{
    routing::get,
    Router,
};
use std::sync::Arc;

use super::handlers::invoke_action;

pub const WEBHOOK_PATH: &str = "/app-insights";

/// Creates the webhook router for I/O Events endpoints
pub fn create_webhook_router() -> Router<Arc<AppState>> {
    Router::new().route(WEBHOOK_PATH, get(invoke_action).post(invoke_action))
}
