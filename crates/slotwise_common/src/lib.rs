// --- File: crates/slotwise_common/src/lib.rs ---

// Declare modules within this crate
pub mod error; // Error handling
pub mod http; // HTTP utilities
pub mod logging; // Logging utilities
pub mod memory; // In-process stores
pub mod models; // Shared data model
pub mod services; // Service abstractions

// Re-export error types and utilities for easier access
pub use error::{
    config_error, conflict, internal_error, not_found, validation_error, HttpStatusCode,
    SlotwiseError,
};

// Re-export HTTP utilities for easier access
pub use http::{client::create_client, error_response};

// Re-export logging utilities for easier access
pub use logging::{init, init_with_level};
