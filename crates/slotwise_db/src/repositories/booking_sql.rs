//! SQL implementation of the booking store.
//!
//! Rows are append-only. `UNIQUE(tenant_id, start_at, end_at)` is the last
//! line against two transactions confirming the same slot.

use crate::error::DbError;
use crate::repositories::{column, decode_instant, encode_instant, optional_column};
use crate::DbClient;
use chrono::{DateTime, NaiveDate, Utc};
use slotwise_common::models::BookingRecord;
use slotwise_common::services::{BookingStore, BoxFuture};
use slotwise_common::SlotwiseError;
use sqlx::any::AnyRow;
use tracing::{debug, error, info};

#[derive(Debug, Clone)]
pub struct SqlBookingRepository {
    db_client: DbClient,
}

impl SqlBookingRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }

    pub async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing booking schema");

        let query = r#"
            CREATE TABLE IF NOT EXISTS bookings (
                id TEXT PRIMARY KEY,
                tenant_id TEXT NOT NULL,
                booking_date TEXT NOT NULL,
                start_time TEXT NOT NULL,
                end_time TEXT NOT NULL,
                start_at TEXT NOT NULL,
                end_at TEXT NOT NULL,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                message TEXT,
                calendar_event_id TEXT NOT NULL,
                created_at TEXT NOT NULL,
                UNIQUE(tenant_id, start_at, end_at)
            )
        "#;
        self.db_client.execute(query).await?;

        info!("Booking schema initialized");
        Ok(())
    }

    async fn insert_record(&self, record: &BookingRecord) -> Result<(), DbError> {
        let query = r#"
            INSERT INTO bookings (id, tenant_id, booking_date, start_time, end_time,
                                  start_at, end_at, name, email, message,
                                  calendar_event_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        "#;

        sqlx::query(query)
            .bind(&record.id)
            .bind(&record.tenant_id)
            .bind(record.date.format("%Y-%m-%d").to_string())
            .bind(&record.start_time)
            .bind(&record.end_time)
            .bind(encode_instant(record.start_at))
            .bind(encode_instant(record.end_at))
            .bind(&record.name)
            .bind(&record.email)
            .bind(record.message.clone())
            .bind(&record.calendar_event_id)
            .bind(encode_instant(record.created_at))
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!(tenant_id = %record.tenant_id, "Failed to insert booking: {}", e);
                DbError::from_query(e)
            })?;

        info!(
            tenant_id = %record.tenant_id,
            booking_id = %record.id,
            "Booking stored"
        );
        Ok(())
    }

    async fn select_since(
        &self,
        tenant_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<BookingRecord>, DbError> {
        let query = r#"
            SELECT id, tenant_id, booking_date, start_time, end_time, start_at, end_at,
                   name, email, message, calendar_event_id, created_at
            FROM bookings
            WHERE tenant_id = $1 AND start_at >= $2
            ORDER BY start_at
        "#;

        let rows = sqlx::query(query)
            .bind(tenant_id)
            .bind(encode_instant(since))
            .fetch_all(self.db_client.pool())
            .await
            .map_err(DbError::from_query)?;

        rows.iter().map(booking_from_row).collect()
    }
}

fn booking_from_row(row: &AnyRow) -> Result<BookingRecord, DbError> {
    let date: String = column(row, "booking_date")?;
    let start_at: String = column(row, "start_at")?;
    let end_at: String = column(row, "end_at")?;
    let created_at: String = column(row, "created_at")?;

    Ok(BookingRecord {
        id: column(row, "id")?,
        tenant_id: column(row, "tenant_id")?,
        date: NaiveDate::parse_from_str(&date, "%Y-%m-%d")
            .map_err(|e| DbError::DecodeError(format!("booking_date {:?}: {}", date, e)))?,
        start_time: column(row, "start_time")?,
        end_time: column(row, "end_time")?,
        start_at: decode_instant(&start_at)?,
        end_at: decode_instant(&end_at)?,
        name: column(row, "name")?,
        email: column(row, "email")?,
        message: optional_column(row, "message")?,
        calendar_event_id: column(row, "calendar_event_id")?,
        created_at: decode_instant(&created_at)?,
    })
}

impl BookingStore for SqlBookingRepository {
    fn insert(&self, record: BookingRecord) -> BoxFuture<'_, (), SlotwiseError> {
        Box::pin(async move { Ok(self.insert_record(&record).await?) })
    }

    fn list_since(
        &self,
        tenant_id: &str,
        since: DateTime<Utc>,
    ) -> BoxFuture<'_, Vec<BookingRecord>, SlotwiseError> {
        let tenant_id = tenant_id.to_string();
        Box::pin(async move { Ok(self.select_since(&tenant_id, since).await?) })
    }
}
