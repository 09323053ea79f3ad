use std::fmt;
use thiserror::Error;

/// The base error type shared by all slotwise crates.
///
/// Crate-specific errors convert into this type (e.g. `From<DbError>`), and the
/// settings/credential/booking stores report their failures with it.
#[derive(Error, Debug)]
pub enum SlotwiseError {
    /// Error occurred during an HTTP request
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// Error occurred while parsing data
    #[error("Failed to parse data: {0}")]
    ParseError(String),

    /// Error occurred due to missing or invalid configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Error occurred during validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Error occurred during database operation
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Error occurred due to a conflict (e.g., a unique key already exists)
    #[error("Conflict: {0}")]
    ConflictError(String),

    /// Error occurred due to a resource not being found
    #[error("Not found: {0}")]
    NotFoundError(String),

    /// Error occurred due to a timeout
    #[error("Timeout: {0}")]
    TimeoutError(String),

    /// Error occurred due to an internal error
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Maps an error onto the HTTP surface.
///
/// `public_message` is what a client sees; implementors override it for
/// variants whose `Display` output carries upstream bodies or identifiers.
pub trait HttpStatusCode {
    /// Returns the HTTP status code for this error.
    fn status_code(&self) -> u16;

    /// Stable, machine-readable error kind.
    fn kind(&self) -> &'static str;

    /// Message that is safe to return to the client.
    fn public_message(&self) -> String;
}

impl HttpStatusCode for SlotwiseError {
    fn status_code(&self) -> u16 {
        match self {
            SlotwiseError::HttpError(_) => 502,
            SlotwiseError::ParseError(_) => 400,
            SlotwiseError::ConfigError(_) => 500,
            SlotwiseError::ValidationError(_) => 400,
            SlotwiseError::DatabaseError(_) => 500,
            SlotwiseError::ConflictError(_) => 409,
            SlotwiseError::NotFoundError(_) => 404,
            SlotwiseError::TimeoutError(_) => 504,
            SlotwiseError::InternalError(_) => 500,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            SlotwiseError::ParseError(_) | SlotwiseError::ValidationError(_) => "validation_error",
            SlotwiseError::ConflictError(_) => "conflict",
            SlotwiseError::NotFoundError(_) => "not_found",
            SlotwiseError::HttpError(_) | SlotwiseError::TimeoutError(_) => "upstream_error",
            SlotwiseError::ConfigError(_)
            | SlotwiseError::DatabaseError(_)
            | SlotwiseError::InternalError(_) => "internal_error",
        }
    }

    fn public_message(&self) -> String {
        match self {
            SlotwiseError::ParseError(_)
            | SlotwiseError::ValidationError(_)
            | SlotwiseError::ConflictError(_)
            | SlotwiseError::NotFoundError(_) => self.to_string(),
            SlotwiseError::HttpError(_) | SlotwiseError::TimeoutError(_) => {
                "An upstream service is unavailable, please try again later.".to_string()
            }
            SlotwiseError::ConfigError(_)
            | SlotwiseError::DatabaseError(_)
            | SlotwiseError::InternalError(_) => "Internal server error.".to_string(),
        }
    }
}

// Common error conversions
impl From<reqwest::Error> for SlotwiseError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SlotwiseError::TimeoutError(err.to_string())
        } else {
            SlotwiseError::HttpError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SlotwiseError {
    fn from(err: serde_json::Error) -> Self {
        SlotwiseError::ParseError(err.to_string())
    }
}

impl From<std::io::Error> for SlotwiseError {
    fn from(err: std::io::Error) -> Self {
        SlotwiseError::InternalError(err.to_string())
    }
}

// Utility functions for error handling
pub fn config_error<T: fmt::Display>(message: T) -> SlotwiseError {
    SlotwiseError::ConfigError(message.to_string())
}

pub fn validation_error<T: fmt::Display>(message: T) -> SlotwiseError {
    SlotwiseError::ValidationError(message.to_string())
}

pub fn not_found<T: fmt::Display>(message: T) -> SlotwiseError {
    SlotwiseError::NotFoundError(message.to_string())
}

pub fn conflict<T: fmt::Display>(message: T) -> SlotwiseError {
    SlotwiseError::ConflictError(message.to_string())
}

pub fn internal_error<T: fmt::Display>(message: T) -> SlotwiseError {
    SlotwiseError::InternalError(message.to_string())
}
