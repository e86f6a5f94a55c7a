//! Shared library for the I/O Events insights webhook
//!
//! This library contains functionality used by the webhook service and its
//! outbound clients:
//! - Error types and HTTP error responses
//! - Environment configuration
//! - HTTP client for outbound calls
//! - Common types

pub mod config;
pub mod error;
pub mod service_client;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, Result};
pub use service_client::ServiceClient;
pub use types::*;
