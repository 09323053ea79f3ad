//! Error types for the database client

use slotwise_common::SlotwiseError;
use thiserror::Error;

/// Errors that can occur when working with the database client
#[derive(Debug, Error)]
pub enum DbError {
    /// Error from SQLx
    #[error("Database error: {0}")]
    SqlxError(#[from] sqlx::Error),

    /// Error with the database configuration
    #[error("Database configuration error: {0}")]
    ConfigError(String),

    /// Error with database URL parsing
    #[error("Database URL error: {0}")]
    UrlError(String),

    /// Error with database pool creation
    #[error("Database pool error: {0}")]
    PoolError(String),

    /// Error with database query
    #[error("Database query error: {0}")]
    QueryError(String),

    /// A unique constraint rejected the row
    #[error("Duplicate row: {0}")]
    UniqueViolation(String),

    /// A stored value could not be converted back into a model
    #[error("Corrupt row: {0}")]
    DecodeError(String),
}

impl DbError {
    /// Classifies a failed statement, keeping unique violations apart.
    pub fn from_query(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                DbError::UniqueViolation(db_err.message().to_string())
            }
            _ => DbError::QueryError(err.to_string()),
        }
    }
}

impl From<DbError> for SlotwiseError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::UniqueViolation(message) => SlotwiseError::ConflictError(message),
            DbError::ConfigError(message) | DbError::UrlError(message) => {
                SlotwiseError::ConfigError(message)
            }
            other => SlotwiseError::DatabaseError(other.to_string()),
        }
    }
}
