// --- File: crates/slotwise_gcal/src/error.rs ---

use axum::response::{IntoResponse, Response};
use slotwise_common::{error_response, HttpStatusCode, SlotwiseError};
use thiserror::Error;

/// Failures of the availability and booking engine.
///
/// Client-facing variants (`Validation`, `PastDate`, `SlotConflict`) carry
/// messages that are safe to return; everything else is logged in full and
/// answered with a generic message.
#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Requested start {0} is not in the future")]
    PastDate(String),

    #[error("The requested time overlaps an existing calendar entry")]
    SlotConflict,

    /// The provider rejected the stored refresh token; the owner must reconnect.
    #[error("Token refresh rejected ({status}): {message}")]
    TokenRefresh { status: u16, message: String },

    /// The tenant never completed the calendar consent flow.
    #[error("No calendar credential stored for tenant {0}")]
    NotConnected(String),

    #[error("Calendar API error ({status}): {message}")]
    CalendarApi { status: u16, message: String },

    #[error("Credential decryption failed: {0}")]
    Decryption(String),

    /// The calendar event exists but the booking record could not be written.
    #[error("Booking for calendar event {event_id} was not persisted: {message}")]
    Persistence { event_id: String, message: String },

    #[error("Tenant not found: {0}")]
    TenantNotFound(String),

    #[error("Timezone error: {0}")]
    Timezone(String),

    /// Transport failure or timeout before the provider answered.
    #[error("Upstream request failed: {0}")]
    Upstream(String),

    #[error(transparent)]
    Store(#[from] SlotwiseError),
}

impl BookingError {
    /// Errors a client caused and can fix; logged at warn instead of error.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            BookingError::Validation(_)
                | BookingError::PastDate(_)
                | BookingError::SlotConflict
                | BookingError::TenantNotFound(_)
        )
    }
}

impl HttpStatusCode for BookingError {
    fn status_code(&self) -> u16 {
        match self {
            BookingError::Validation(_) => 400,
            BookingError::PastDate(_) => 422,
            BookingError::SlotConflict => 409,
            BookingError::TokenRefresh { .. } | BookingError::NotConnected(_) => 503,
            BookingError::CalendarApi { .. } | BookingError::Upstream(_) => 502,
            BookingError::TenantNotFound(_) => 404,
            BookingError::Decryption(_)
            | BookingError::Persistence { .. }
            | BookingError::Timezone(_) => 500,
            BookingError::Store(inner) => inner.status_code(),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            BookingError::Validation(_) => "validation_error",
            BookingError::PastDate(_) => "past_date",
            BookingError::SlotConflict => "slot_conflict",
            BookingError::TokenRefresh { .. } | BookingError::NotConnected(_) => {
                "calendar_reconnect_required"
            }
            BookingError::CalendarApi { .. } | BookingError::Upstream(_) => "upstream_error",
            BookingError::TenantNotFound(_) => "not_found",
            BookingError::Decryption(_)
            | BookingError::Persistence { .. }
            | BookingError::Timezone(_) => "internal_error",
            BookingError::Store(inner) => inner.kind(),
        }
    }

    fn public_message(&self) -> String {
        match self {
            BookingError::Validation(_) | BookingError::PastDate(_) => self.to_string(),
            BookingError::SlotConflict => {
                "This time is no longer available, please pick another slot.".to_string()
            }
            BookingError::TokenRefresh { .. } | BookingError::NotConnected(_) => {
                "Bookings are temporarily unavailable for this page.".to_string()
            }
            BookingError::CalendarApi { .. } | BookingError::Upstream(_) => {
                "The calendar service is unavailable, please try again later.".to_string()
            }
            BookingError::TenantNotFound(_) => "Booking page not found.".to_string(),
            BookingError::Decryption(_)
            | BookingError::Persistence { .. }
            | BookingError::Timezone(_) => "Internal server error.".to_string(),
            BookingError::Store(inner) => inner.public_message(),
        }
    }
}

impl IntoResponse for BookingError {
    fn into_response(self) -> Response {
        error_response(&self)
    }
}
