//! Database integration for slotwise
//!
//! SQL implementations of the tenant settings, credential and booking stores
//! defined in `slotwise-common`. Connections go through the SQLx `Any` driver,
//! so SQLite, PostgreSQL and MySQL are selected by URL and feature flag.
//!
//! # Example
//!
//! ```rust,no_run
//! use slotwise_db::{init_schema, DbClient, SqlBookingRepository};
//!
//! async fn setup_db() -> Result<SqlBookingRepository, Box<dyn std::error::Error>> {
//!     let db_client = DbClient::from_url("sqlite://slotwise.db").await?;
//!     init_schema(&db_client).await?;
//!     Ok(SqlBookingRepository::new(db_client))
//! }
//! ```

pub mod client;
pub mod error;
pub mod repositories;

pub use client::DbClient;
pub use error::DbError;
pub use repositories::{init_schema, SqlBookingRepository, SqlTenantRepository};
