// --- File: crates/slotwise_common/src/memory.rs ---
//! In-process store implementations.
//!
//! Used when no database is configured, and as fakes in tests. State lives
//! behind a `std::sync::Mutex`; no lock is held across an await point.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::error::{conflict, internal_error, not_found, validation_error, SlotwiseError};
use crate::models::{BookingRecord, SettingsUpdate, TenantSettings};
use crate::services::{BookingStore, BoxFuture, CredentialStore, SettingsStore};

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, SlotwiseError> {
    mutex
        .lock()
        .map_err(|_| internal_error("in-memory store lock poisoned"))
}

/// Tenant settings keyed by tenant id.
#[derive(Debug, Default)]
pub struct InMemorySettingsStore {
    tenants: Mutex<HashMap<String, TenantSettings>>,
}

impl InMemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a tenant.
    pub fn insert(&self, settings: TenantSettings) -> Result<(), SlotwiseError> {
        settings.validate().map_err(validation_error)?;
        lock(&self.tenants)?.insert(settings.tenant_id.clone(), settings);
        Ok(())
    }
}

impl SettingsStore for InMemorySettingsStore {
    fn get(&self, tenant_id: &str) -> BoxFuture<'_, Option<TenantSettings>, SlotwiseError> {
        let result = lock(&self.tenants).map(|tenants| tenants.get(tenant_id).cloned());
        Box::pin(async move { result })
    }

    fn find_by_slug(&self, slug: &str) -> BoxFuture<'_, Option<TenantSettings>, SlotwiseError> {
        let result = lock(&self.tenants)
            .map(|tenants| tenants.values().find(|t| t.slug == slug).cloned());
        Box::pin(async move { result })
    }

    fn save(
        &self,
        tenant_id: &str,
        update: SettingsUpdate,
    ) -> BoxFuture<'_, TenantSettings, SlotwiseError> {
        let result = lock(&self.tenants).and_then(|mut tenants| {
            let current = tenants
                .get(tenant_id)
                .ok_or_else(|| not_found(format!("tenant {}", tenant_id)))?;
            let merged = update.apply(current).map_err(validation_error)?;
            tenants.insert(tenant_id.to_string(), merged.clone());
            Ok(merged)
        });
        Box::pin(async move { result })
    }
}

/// Encrypted refresh tokens keyed by tenant id.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    blobs: Mutex<HashMap<String, String>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn get_encrypted_refresh_token(
        &self,
        tenant_id: &str,
    ) -> BoxFuture<'_, Option<String>, SlotwiseError> {
        let result = lock(&self.blobs).map(|blobs| blobs.get(tenant_id).cloned());
        Box::pin(async move { result })
    }

    fn store_encrypted_refresh_token(
        &self,
        tenant_id: &str,
        encrypted: &str,
    ) -> BoxFuture<'_, (), SlotwiseError> {
        let result = lock(&self.blobs).map(|mut blobs| {
            blobs.insert(tenant_id.to_string(), encrypted.to_string());
        });
        Box::pin(async move { result })
    }
}

/// Bookings in insertion order, unique per `(tenant, start, end)`.
#[derive(Debug, Default)]
pub struct InMemoryBookingStore {
    records: Mutex<Vec<BookingRecord>>,
}

impl InMemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored record, across tenants.
    pub fn all(&self) -> Result<Vec<BookingRecord>, SlotwiseError> {
        lock(&self.records).map(|records| records.clone())
    }
}

impl BookingStore for InMemoryBookingStore {
    fn insert(&self, record: BookingRecord) -> BoxFuture<'_, (), SlotwiseError> {
        let result = lock(&self.records).and_then(|mut records| {
            let duplicate = records.iter().any(|r| {
                r.tenant_id == record.tenant_id
                    && r.start_at == record.start_at
                    && r.end_at == record.end_at
            });
            if duplicate {
                return Err(conflict(format!(
                    "booking for tenant {} at {} already exists",
                    record.tenant_id, record.start_at
                )));
            }
            records.push(record);
            Ok(())
        });
        Box::pin(async move { result })
    }

    fn list_since(
        &self,
        tenant_id: &str,
        since: DateTime<Utc>,
    ) -> BoxFuture<'_, Vec<BookingRecord>, SlotwiseError> {
        let result = lock(&self.records).map(|records| {
            let mut matching: Vec<_> = records
                .iter()
                .filter(|r| r.tenant_id == tenant_id && r.start_at >= since)
                .cloned()
                .collect();
            matching.sort_by_key(|r| r.start_at);
            matching
        });
        Box::pin(async move { result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    fn record(tenant: &str, hour: u32) -> BookingRecord {
        let start = Utc.with_ymd_and_hms(2025, 3, 12, hour, 0, 0).unwrap();
        BookingRecord {
            id: format!("{}-{}", tenant, hour),
            tenant_id: tenant.to_string(),
            date: NaiveDate::from_ymd_opt(2025, 3, 12).unwrap(),
            start_time: format!("{:02}:00", hour),
            end_time: format!("{:02}:00", hour + 1),
            start_at: start,
            end_at: start + chrono::Duration::hours(1),
            name: "Sam".to_string(),
            email: "sam@example.com".to_string(),
            message: None,
            calendar_event_id: format!("evt-{}", hour),
            created_at: start,
        }
    }

    #[test]
    fn test_poisoned_booking_store_reports_error() {
        let store = InMemoryBookingStore::new();
        let records = &store.records;
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = records.lock().unwrap();
            panic!("poison the lock");
        }));

        let err = store.all().unwrap_err();
        assert!(matches!(err, SlotwiseError::InternalError(_)));
    }

    #[tokio::test]
    async fn test_duplicate_booking_is_rejected() {
        let store = InMemoryBookingStore::new();
        store.insert(record("a", 10)).await.unwrap();
        let err = store.insert(record("a", 10)).await.unwrap_err();
        assert!(matches!(err, SlotwiseError::ConflictError(_)));
        // same instants for another tenant are fine
        store.insert(record("b", 10)).await.unwrap();
        assert_eq!(store.all().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_list_since_filters_and_orders() {
        let store = InMemoryBookingStore::new();
        store.insert(record("a", 15)).await.unwrap();
        store.insert(record("a", 9)).await.unwrap();
        store.insert(record("a", 12)).await.unwrap();
        store.insert(record("b", 11)).await.unwrap();

        let since = Utc.with_ymd_and_hms(2025, 3, 12, 10, 0, 0).unwrap();
        let hours: Vec<_> = store
            .list_since("a", since)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.start_time)
            .collect();
        assert_eq!(hours, vec!["12:00", "15:00"]);
    }

    #[tokio::test]
    async fn test_settings_lookup_and_update() {
        let store = InMemorySettingsStore::new();
        store
            .insert(TenantSettings::with_defaults("t1", "jane", "Jane", "jane@example.com"))
            .unwrap();

        assert!(store.find_by_slug("jane").await.unwrap().is_some());
        assert!(store.find_by_slug("john").await.unwrap().is_none());

        let saved = store
            .save(
                "t1",
                SettingsUpdate {
                    timezone: Some("Europe/Zurich".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(saved.timezone, "Europe/Zurich");
        assert_eq!(store.get("t1").await.unwrap().unwrap().timezone, "Europe/Zurich");

        let err = store
            .save(
                "t1",
                SettingsUpdate {
                    start_hour: Some(20),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SlotwiseError::ValidationError(_)));
        assert!(matches!(
            store.save("nobody", SettingsUpdate::default()).await,
            Err(SlotwiseError::NotFoundError(_))
        ));
    }

    #[tokio::test]
    async fn test_credentials_are_replaced() {
        let store = InMemoryCredentialStore::new();
        assert!(store.get_encrypted_refresh_token("t1").await.unwrap().is_none());
        store.store_encrypted_refresh_token("t1", "blob-1").await.unwrap();
        store.store_encrypted_refresh_token("t1", "blob-2").await.unwrap();
        assert_eq!(
            store.get_encrypted_refresh_token("t1").await.unwrap().as_deref(),
            Some("blob-2")
        );
    }
}
