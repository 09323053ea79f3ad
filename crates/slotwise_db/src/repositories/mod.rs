//! SQL repositories for the slotwise stores.

pub mod booking_sql;
pub mod tenant_sql;

pub use booking_sql::SqlBookingRepository;
pub use tenant_sql::SqlTenantRepository;

use crate::error::DbError;
use crate::DbClient;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::any::AnyRow;
use sqlx::{Row, ValueRef};

/// Creates every table the stores need. Idempotent.
pub async fn init_schema(db_client: &DbClient) -> Result<(), DbError> {
    SqlTenantRepository::new(db_client.clone())
        .init_schema()
        .await?;
    SqlBookingRepository::new(db_client.clone())
        .init_schema()
        .await
}

// Instants are stored as fixed-width RFC 3339 text in UTC, so string
// comparison in SQL orders them chronologically.
pub(crate) fn encode_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn decode_instant(raw: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::DecodeError(format!("instant {:?}: {}", raw, e)))
}

pub(crate) fn column<T>(row: &AnyRow, name: &str) -> Result<T, DbError>
where
    T: for<'r> sqlx::Decode<'r, sqlx::Any> + sqlx::Type<sqlx::Any>,
{
    row.try_get::<T, _>(name)
        .map_err(|e| DbError::DecodeError(format!("{}: {}", name, e)))
}

// The Any driver refuses to decode SQL NULL into `Option<T>`, so nullable
// columns are checked for NULL before decoding.
pub(crate) fn optional_column<T>(row: &AnyRow, name: &str) -> Result<Option<T>, DbError>
where
    T: for<'r> sqlx::Decode<'r, sqlx::Any> + sqlx::Type<sqlx::Any>,
{
    let raw = row
        .try_get_raw(name)
        .map_err(|e| DbError::DecodeError(format!("{}: {}", name, e)))?;
    if raw.is_null() {
        return Ok(None);
    }
    column(row, name).map(Some)
}
