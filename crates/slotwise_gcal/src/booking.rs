// --- File: crates/slotwise_gcal/src/booking.rs ---
//! Availability read path and the booking transaction.
//!
//! A booking runs `Validating -> ConflictChecking -> CalendarWriting ->
//! Persisting -> Completed`; any step can end in `Failed`. The conflict check
//! is a re-read of the live calendar right before the write. It narrows the
//! double-booking window but does not close it; the booking store's
//! uniqueness on `(tenant, start, end)` rejects the second record.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use slotwise_common::models::{BookingRecord, TenantSettings, TimeSlot};
use slotwise_common::services::{BookingStore, NotificationService, SettingsStore};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::BookingError;
use crate::logic::{generate_slots, within_horizon};
use crate::oauth::AccessTokenProvider;
use crate::service::{CalendarGateway, NewEvent};
use crate::timezone::{day_of_week, instant_to_civil, local_day_bounds, parse_tz, today_in};

/// Booking request as posted by the public page.
///
/// Required fields are optional here so that a missing field is reported as
/// a validation error rather than a deserialisation failure.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    #[cfg_attr(feature = "openapi", schema(example = "2025-03-12T09:00:00Z"))]
    pub start_time: Option<String>,
    #[cfg_attr(feature = "openapi", schema(example = "2025-03-12T10:00:00Z"))]
    pub end_time: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingState {
    Validating,
    ConflictChecking,
    CalendarWriting,
    Persisting,
    Completed,
    Failed(String),
}

impl fmt::Display for BookingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookingState::Validating => write!(f, "validating"),
            BookingState::ConflictChecking => write!(f, "conflict_checking"),
            BookingState::CalendarWriting => write!(f, "calendar_writing"),
            BookingState::Persisting => write!(f, "persisting"),
            BookingState::Completed => write!(f, "completed"),
            BookingState::Failed(reason) => write!(f, "failed({})", reason),
        }
    }
}

/// Result of a completed booking.
#[derive(Debug, Clone)]
pub struct BookingOutcome {
    pub event_id: String,
    pub record: BookingRecord,
}

/// Validated booking input.
struct ValidBooking {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    name: String,
    email: String,
    message: Option<String>,
}

pub struct BookingEngine {
    settings: Arc<dyn SettingsStore>,
    tokens: Arc<dyn AccessTokenProvider>,
    gateway: Arc<dyn CalendarGateway>,
    bookings: Arc<dyn BookingStore>,
    notifier: Arc<dyn NotificationService>,
    event_title_prefix: String,
}

impl BookingEngine {
    pub fn new(
        settings: Arc<dyn SettingsStore>,
        tokens: Arc<dyn AccessTokenProvider>,
        gateway: Arc<dyn CalendarGateway>,
        bookings: Arc<dyn BookingStore>,
        notifier: Arc<dyn NotificationService>,
        event_title_prefix: impl Into<String>,
    ) -> Self {
        Self {
            settings,
            tokens,
            gateway,
            bookings,
            notifier,
            event_title_prefix: event_title_prefix.into(),
        }
    }

    /// Resolves a public page slug.
    pub async fn tenant_by_slug(&self, slug: &str) -> Result<TenantSettings, BookingError> {
        self.settings
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| BookingError::TenantNotFound(slug.to_string()))
    }

    /// Slots for one civil date in the tenant's timezone.
    ///
    /// Dates before today or beyond the booking horizon, and disabled
    /// weekdays, yield an empty list without calling the calendar.
    pub async fn slots_for_date(
        &self,
        settings: &TenantSettings,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Vec<TimeSlot>, BookingError> {
        let tz = parse_tz(&settings.timezone)?;
        if !within_horizon(date, today_in(tz, now), settings.max_days_ahead) {
            debug!(tenant_id = %settings.tenant_id, %date, "Date outside booking horizon");
            return Ok(Vec::new());
        }
        if !settings.is_day_available(day_of_week(date, tz)?) {
            return Ok(Vec::new());
        }

        let (day_start, day_end) = local_day_bounds(tz, date)?;
        let access_token = self.tokens.access_token(&settings.tenant_id).await?;
        let busy = self
            .gateway
            .list_busy(&access_token, &settings.calendar_id, day_start, day_end)
            .await?;

        generate_slots(date, &busy, settings, now)
    }

    /// Bookings of a tenant starting at or after `since`.
    pub async fn list_bookings(
        &self,
        tenant_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<BookingRecord>, BookingError> {
        Ok(self.bookings.list_since(tenant_id, since).await?)
    }

    /// Runs the booking transaction for `request` at evaluation time `now`.
    pub async fn book(
        &self,
        settings: &TenantSettings,
        request: BookingRequest,
        now: DateTime<Utc>,
    ) -> Result<BookingOutcome, BookingError> {
        let mut state = BookingState::Validating;
        match self.run(settings, request, now, &mut state).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                let failed_in = state.to_string();
                transition(settings, &mut state, BookingState::Failed(failed_in.clone()));
                if e.is_client_error() {
                    warn!(
                        tenant_id = %settings.tenant_id,
                        state = %failed_in,
                        error = %e,
                        "Booking rejected"
                    );
                } else {
                    error!(
                        tenant_id = %settings.tenant_id,
                        state = %failed_in,
                        error = %e,
                        "Booking failed"
                    );
                }
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        settings: &TenantSettings,
        request: BookingRequest,
        now: DateTime<Utc>,
        state: &mut BookingState,
    ) -> Result<BookingOutcome, BookingError> {
        debug!(tenant_id = %settings.tenant_id, state = %state, "Booking started");
        let booking = validate(settings, request, now)?;

        transition(settings, state, BookingState::ConflictChecking);
        let access_token = self.tokens.access_token(&settings.tenant_id).await?;
        let busy = self
            .gateway
            .list_busy(&access_token, &settings.calendar_id, booking.start, booking.end)
            .await?;
        if !busy.is_empty() {
            return Err(BookingError::SlotConflict);
        }

        transition(settings, state, BookingState::CalendarWriting);
        let event = NewEvent {
            title: format!("{} {}", self.event_title_prefix, booking.name),
            description: Some(event_description(&booking)),
            start: booking.start,
            end: booking.end,
            timezone: settings.timezone.clone(),
            attendee_email: Some(booking.email.clone()),
        };
        let event_id = self
            .gateway
            .create_event(&access_token, &settings.calendar_id, event)
            .await?;

        transition(settings, state, BookingState::Persisting);
        let tz = parse_tz(&settings.timezone)?;
        let local_start = instant_to_civil(booking.start, tz);
        let local_end = instant_to_civil(booking.end, tz);
        let record = BookingRecord {
            id: Uuid::new_v4().to_string(),
            tenant_id: settings.tenant_id.clone(),
            date: local_start.date,
            start_time: local_start.hhmm(),
            end_time: local_end.hhmm(),
            start_at: booking.start,
            end_at: booking.end,
            name: booking.name,
            email: booking.email,
            message: booking.message,
            calendar_event_id: event_id.clone(),
            created_at: now,
        };
        self.bookings
            .insert(record.clone())
            .await
            .map_err(|e| BookingError::Persistence {
                event_id: event_id.clone(),
                message: e.to_string(),
            })?;

        transition(settings, state, BookingState::Completed);
        info!(
            tenant_id = %settings.tenant_id,
            booking_id = %record.id,
            event_id = %event_id,
            start = %record.start_at,
            "Booking completed"
        );
        self.dispatch_notifications(settings, &record);

        Ok(BookingOutcome { event_id, record })
    }

    /// Sends owner and booker mails on detached tasks. Failures are only logged.
    fn dispatch_notifications(&self, settings: &TenantSettings, record: &BookingRecord) {
        let when = format!(
            "{} {}-{} ({})",
            record.date, record.start_time, record.end_time, settings.timezone
        );
        let mails = [
            (
                settings.contact_email.clone(),
                format!("New booking: {}", record.name),
                format!(
                    "{} <{}> booked {}.\n\n{}",
                    record.name,
                    record.email,
                    when,
                    record.message.as_deref().unwrap_or("")
                ),
            ),
            (
                record.email.clone(),
                format!("Your appointment with {}", settings.display_name),
                format!(
                    "Your appointment with {} is confirmed for {}.",
                    settings.display_name, when
                ),
            ),
        ];

        for (to, subject, body) in mails {
            let notifier = self.notifier.clone();
            let tenant_id = settings.tenant_id.clone();
            tokio::spawn(async move {
                if let Err(e) = notifier.send_email(&to, &subject, &body).await {
                    warn!(tenant_id = %tenant_id, to = %to, error = %e, "Notification failed");
                }
            });
        }
    }
}

fn transition(settings: &TenantSettings, state: &mut BookingState, next: BookingState) {
    debug!(tenant_id = %settings.tenant_id, from = %state, to = %next, "Booking state");
    *state = next;
}

fn required(value: Option<String>, field: &str) -> Result<String, BookingError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(BookingError::Validation(format!("{} is required", field))),
    }
}

fn parse_instant(value: &str, field: &str) -> Result<DateTime<Utc>, BookingError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| BookingError::Validation(format!("{} must be an ISO-8601 timestamp", field)))
}

fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}

fn validate(
    settings: &TenantSettings,
    request: BookingRequest,
    now: DateTime<Utc>,
) -> Result<ValidBooking, BookingError> {
    let start_time = required(request.start_time, "startTime")?;
    let end_time = required(request.end_time, "endTime")?;
    let name = required(request.name, "name")?;
    let email = required(request.email, "email")?;

    let start = parse_instant(&start_time, "startTime")?;
    let end = parse_instant(&end_time, "endTime")?;
    if end <= start {
        return Err(BookingError::Validation(
            "endTime must be after startTime".to_string(),
        ));
    }
    if !is_plausible_email(&email) {
        return Err(BookingError::Validation("email is not valid".to_string()));
    }
    if start <= now {
        return Err(BookingError::PastDate(start.to_rfc3339()));
    }

    let tz = parse_tz(&settings.timezone)?;
    let start_date = instant_to_civil(start, tz).date;
    if !within_horizon(start_date, today_in(tz, now), settings.max_days_ahead) {
        return Err(BookingError::Validation(format!(
            "bookings are accepted at most {} days ahead",
            settings.max_days_ahead
        )));
    }

    Ok(ValidBooking {
        start,
        end,
        name,
        email,
        message: request
            .message
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty()),
    })
}

fn event_description(booking: &ValidBooking) -> String {
    match &booking.message {
        Some(message) => format!(
            "Booked by {} <{}>\n\n{}",
            booking.name, booking.email, message
        ),
        None => format!("Booked by {} <{}>", booking.name, booking.email),
    }
}
