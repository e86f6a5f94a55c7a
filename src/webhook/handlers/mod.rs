pub mod action;
pub mod webhook_handler;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export main handlers for easy access
pub use action::{challenge_response, forward_event, handle, verify_signature};
pub use webhook_handler::{build_params, invoke_action};
