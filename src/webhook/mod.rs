pub mod handlers;
pub mod routes;

// Re-export main components
pub use handlers::{handle, invoke_action};
pub use routes::{create_webhook_router, WEBHOOK_PATH};
