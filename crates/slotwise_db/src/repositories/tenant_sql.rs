//! SQL implementation of the tenant settings and credential stores.
//!
//! Both live in the `tenants` table; the refresh token column only ever
//! holds vault ciphertext.

use crate::error::DbError;
use crate::repositories::{column, optional_column};
use crate::DbClient;
use slotwise_common::models::{SettingsUpdate, TenantSettings};
use slotwise_common::services::{BoxFuture, CredentialStore, SettingsStore};
use slotwise_common::{not_found, validation_error, SlotwiseError};
use sqlx::any::AnyRow;
use tracing::{debug, error, info};

const SELECT_SETTINGS: &str = r#"
    SELECT tenant_id, slug, display_name, contact_email, calendar_id,
           duration_minutes, start_hour, end_hour, timezone, max_days_ahead,
           available_days
    FROM tenants
"#;

#[derive(Debug, Clone)]
pub struct SqlTenantRepository {
    db_client: DbClient,
}

impl SqlTenantRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }

    pub async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing tenant schema");

        let query = r#"
            CREATE TABLE IF NOT EXISTS tenants (
                tenant_id TEXT PRIMARY KEY,
                slug TEXT NOT NULL UNIQUE,
                display_name TEXT NOT NULL,
                contact_email TEXT NOT NULL,
                calendar_id TEXT NOT NULL,
                duration_minutes BIGINT NOT NULL,
                start_hour BIGINT NOT NULL,
                end_hour BIGINT NOT NULL,
                timezone TEXT NOT NULL,
                max_days_ahead BIGINT NOT NULL,
                available_days TEXT NOT NULL,
                encrypted_refresh_token TEXT
            )
        "#;
        self.db_client.execute(query).await?;

        info!("Tenant schema initialized");
        Ok(())
    }

    /// Registers a new tenant. Fails on an invalid configuration or a taken slug.
    pub async fn create_tenant(&self, settings: &TenantSettings) -> Result<(), SlotwiseError> {
        settings.validate().map_err(validation_error)?;

        let query = r#"
            INSERT INTO tenants (tenant_id, slug, display_name, contact_email, calendar_id,
                                 duration_minutes, start_hour, end_hour, timezone,
                                 max_days_ahead, available_days)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        "#;

        sqlx::query(query)
            .bind(&settings.tenant_id)
            .bind(&settings.slug)
            .bind(&settings.display_name)
            .bind(&settings.contact_email)
            .bind(&settings.calendar_id)
            .bind(i64::from(settings.duration_minutes))
            .bind(i64::from(settings.start_hour))
            .bind(i64::from(settings.end_hour))
            .bind(&settings.timezone)
            .bind(i64::from(settings.max_days_ahead))
            .bind(encode_days(&settings.available_days))
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to insert tenant {}: {}", settings.tenant_id, e);
                DbError::from_query(e)
            })?;

        info!(tenant_id = %settings.tenant_id, slug = %settings.slug, "Tenant created");
        Ok(())
    }

    async fn fetch_one_where(
        &self,
        column_name: &str,
        value: &str,
    ) -> Result<Option<TenantSettings>, DbError> {
        let query = format!("{} WHERE {} = $1", SELECT_SETTINGS, column_name);
        let row = sqlx::query(&query)
            .bind(value)
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(DbError::from_query)?;

        row.map(|row| settings_from_row(&row)).transpose()
    }

    async fn update(
        &self,
        tenant_id: &str,
        update: SettingsUpdate,
    ) -> Result<TenantSettings, SlotwiseError> {
        let current = self
            .fetch_one_where("tenant_id", tenant_id)
            .await?
            .ok_or_else(|| not_found(format!("tenant {}", tenant_id)))?;
        let merged = update.apply(&current).map_err(validation_error)?;

        let query = r#"
            UPDATE tenants
            SET display_name = $1, contact_email = $2, calendar_id = $3,
                duration_minutes = $4, start_hour = $5, end_hour = $6,
                timezone = $7, max_days_ahead = $8, available_days = $9
            WHERE tenant_id = $10
        "#;

        sqlx::query(query)
            .bind(&merged.display_name)
            .bind(&merged.contact_email)
            .bind(&merged.calendar_id)
            .bind(i64::from(merged.duration_minutes))
            .bind(i64::from(merged.start_hour))
            .bind(i64::from(merged.end_hour))
            .bind(&merged.timezone)
            .bind(i64::from(merged.max_days_ahead))
            .bind(encode_days(&merged.available_days))
            .bind(tenant_id)
            .execute(self.db_client.pool())
            .await
            .map_err(DbError::from_query)?;

        info!(tenant_id, "Tenant settings updated");
        Ok(merged)
    }
}

fn encode_days(days: &[u8]) -> String {
    days.iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn decode_days(raw: &str) -> Result<Vec<u8>, DbError> {
    raw.split(',')
        .filter(|part| !part.trim().is_empty())
        .map(|part| {
            part.trim()
                .parse::<u8>()
                .map_err(|e| DbError::DecodeError(format!("available_days {:?}: {}", raw, e)))
        })
        .collect()
}

fn small_column(row: &AnyRow, name: &str) -> Result<u32, DbError> {
    let value: i64 = column(row, name)?;
    u32::try_from(value)
        .map_err(|_| DbError::DecodeError(format!("{} out of range: {}", name, value)))
}

fn settings_from_row(row: &AnyRow) -> Result<TenantSettings, DbError> {
    let available_days: String = column(row, "available_days")?;
    Ok(TenantSettings {
        tenant_id: column(row, "tenant_id")?,
        slug: column(row, "slug")?,
        display_name: column(row, "display_name")?,
        contact_email: column(row, "contact_email")?,
        calendar_id: column(row, "calendar_id")?,
        duration_minutes: small_column(row, "duration_minutes")?,
        start_hour: small_column(row, "start_hour")?,
        end_hour: small_column(row, "end_hour")?,
        timezone: column(row, "timezone")?,
        max_days_ahead: small_column(row, "max_days_ahead")?,
        available_days: decode_days(&available_days)?,
    })
}

impl SettingsStore for SqlTenantRepository {
    fn get(&self, tenant_id: &str) -> BoxFuture<'_, Option<TenantSettings>, SlotwiseError> {
        let tenant_id = tenant_id.to_string();
        Box::pin(async move { Ok(self.fetch_one_where("tenant_id", &tenant_id).await?) })
    }

    fn find_by_slug(&self, slug: &str) -> BoxFuture<'_, Option<TenantSettings>, SlotwiseError> {
        let slug = slug.to_string();
        Box::pin(async move { Ok(self.fetch_one_where("slug", &slug).await?) })
    }

    fn save(
        &self,
        tenant_id: &str,
        update: SettingsUpdate,
    ) -> BoxFuture<'_, TenantSettings, SlotwiseError> {
        let tenant_id = tenant_id.to_string();
        Box::pin(async move { self.update(&tenant_id, update).await })
    }
}

impl CredentialStore for SqlTenantRepository {
    fn get_encrypted_refresh_token(
        &self,
        tenant_id: &str,
    ) -> BoxFuture<'_, Option<String>, SlotwiseError> {
        let tenant_id = tenant_id.to_string();
        Box::pin(async move {
            let row = sqlx::query("SELECT encrypted_refresh_token FROM tenants WHERE tenant_id = $1")
                .bind(&tenant_id)
                .fetch_optional(self.db_client.pool())
                .await
                .map_err(DbError::from_query)?;

            match row {
                Some(row) => Ok(optional_column::<String>(&row, "encrypted_refresh_token")?),
                None => Ok(None),
            }
        })
    }

    fn store_encrypted_refresh_token(
        &self,
        tenant_id: &str,
        encrypted: &str,
    ) -> BoxFuture<'_, (), SlotwiseError> {
        let tenant_id = tenant_id.to_string();
        let encrypted = encrypted.to_string();
        Box::pin(async move {
            let result =
                sqlx::query("UPDATE tenants SET encrypted_refresh_token = $1 WHERE tenant_id = $2")
                    .bind(&encrypted)
                    .bind(&tenant_id)
                    .execute(self.db_client.pool())
                    .await
                    .map_err(DbError::from_query)?;

            if result.rows_affected() == 0 {
                return Err(not_found(format!("tenant {}", tenant_id)));
            }
            debug!(%tenant_id, "Stored encrypted refresh token");
            Ok(())
        })
    }
}
