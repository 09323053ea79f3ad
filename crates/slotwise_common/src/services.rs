// --- File: crates/slotwise_common/src/services.rs ---
//! Service abstractions for storage and notifications.
//!
//! The booking engine talks to persistence and outbound notifications only
//! through these traits, so the SQL repositories and in-memory fakes are
//! interchangeable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;

use crate::error::SlotwiseError;
use crate::models::{BookingRecord, SettingsUpdate, TenantSettings};

/// Type alias for a boxed future that returns a Result
pub type BoxFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// Tenant configuration lookup and update.
pub trait SettingsStore: Send + Sync {
    /// Get settings by tenant id. `Ok(None)` when the tenant is unknown.
    fn get(&self, tenant_id: &str) -> BoxFuture<'_, Option<TenantSettings>, SlotwiseError>;

    /// Resolve a public page slug to its tenant settings.
    fn find_by_slug(&self, slug: &str) -> BoxFuture<'_, Option<TenantSettings>, SlotwiseError>;

    /// Apply a partial update and return the stored result.
    fn save(
        &self,
        tenant_id: &str,
        update: SettingsUpdate,
    ) -> BoxFuture<'_, TenantSettings, SlotwiseError>;
}

/// Storage for the vault-encrypted provider refresh token of each tenant.
///
/// Implementations never see plaintext tokens.
pub trait CredentialStore: Send + Sync {
    fn get_encrypted_refresh_token(
        &self,
        tenant_id: &str,
    ) -> BoxFuture<'_, Option<String>, SlotwiseError>;

    fn store_encrypted_refresh_token(
        &self,
        tenant_id: &str,
        encrypted: &str,
    ) -> BoxFuture<'_, (), SlotwiseError>;
}

/// Append-only booking persistence.
pub trait BookingStore: Send + Sync {
    /// Insert a confirmed booking. A second record for the same tenant and
    /// instants is rejected with a conflict error.
    fn insert(&self, record: BookingRecord) -> BoxFuture<'_, (), SlotwiseError>;

    /// Bookings of a tenant starting at or after `since`, ordered by start.
    fn list_since(
        &self,
        tenant_id: &str,
        since: DateTime<Utc>,
    ) -> BoxFuture<'_, Vec<BookingRecord>, SlotwiseError>;
}

/// A trait for notification service operations.
pub trait NotificationService: Send + Sync {
    /// Send an email notification.
    fn send_email(
        &self,
        to: &str,
        subject: &str,
        body: &str,
    ) -> BoxFuture<'_, NotificationResult, SlotwiseError>;
}

/// Represents the result of a notification operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationResult {
    /// The ID of the notification, if the transport assigns one.
    pub id: Option<String>,
    /// The status of the notification.
    pub status: String,
}

/// Notification transport that only writes the message to the log.
///
/// Used when no mail provider is configured.
#[derive(Debug, Clone, Default)]
pub struct LogNotificationService;

impl NotificationService for LogNotificationService {
    fn send_email(
        &self,
        to: &str,
        subject: &str,
        body: &str,
    ) -> BoxFuture<'_, NotificationResult, SlotwiseError> {
        let to = to.to_string();
        let subject = subject.to_string();
        let body_len = body.len();
        Box::pin(async move {
            tracing::info!(%to, %subject, body_len, "Notification (log transport)");
            Ok(NotificationResult {
                id: None,
                status: "logged".to_string(),
            })
        })
    }
}
