// --- File: crates/slotwise_common/src/models.rs ---

// Data model shared by the booking engine, the stores and the HTTP layer.
// Wire names are camelCase, matching what the public booking page consumes.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Default slot length for newly onboarded tenants, in minutes.
pub const DEFAULT_DURATION_MINUTES: u32 = 30;
pub const DEFAULT_START_HOUR: u32 = 9;
pub const DEFAULT_END_HOUR: u32 = 17;
pub const DEFAULT_TIMEZONE: &str = "UTC";
pub const DEFAULT_MAX_DAYS_AHEAD: u32 = 30;

/// Per-tenant booking configuration.
///
/// `available_days` uses 0 = Sunday .. 6 = Saturday.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantSettings {
    pub tenant_id: String,
    /// Public page identifier, e.g. `/jane-doe/slots`.
    pub slug: String,
    pub display_name: String,
    pub contact_email: String,
    pub calendar_id: String,
    pub duration_minutes: u32,
    pub start_hour: u32,
    pub end_hour: u32,
    /// IANA timezone name, e.g. `Europe/Zurich`.
    pub timezone: String,
    pub max_days_ahead: u32,
    pub available_days: Vec<u8>,
}

impl TenantSettings {
    /// Settings a tenant starts with at onboarding.
    pub fn with_defaults(
        tenant_id: impl Into<String>,
        slug: impl Into<String>,
        display_name: impl Into<String>,
        contact_email: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            slug: slug.into(),
            display_name: display_name.into(),
            contact_email: contact_email.into(),
            calendar_id: "primary".to_string(),
            duration_minutes: DEFAULT_DURATION_MINUTES,
            start_hour: DEFAULT_START_HOUR,
            end_hour: DEFAULT_END_HOUR,
            timezone: DEFAULT_TIMEZONE.to_string(),
            max_days_ahead: DEFAULT_MAX_DAYS_AHEAD,
            available_days: vec![1, 2, 3, 4, 5],
        }
    }

    /// Checks the settings invariants, returning a human readable reason on failure.
    pub fn validate(&self) -> Result<(), String> {
        if self.duration_minutes == 0 {
            return Err("duration must be greater than zero".to_string());
        }
        if self.end_hour > 23 {
            return Err(format!("end hour {} is outside 0-23", self.end_hour));
        }
        if self.start_hour >= self.end_hour {
            return Err(format!(
                "start hour {} must be before end hour {}",
                self.start_hour, self.end_hour
            ));
        }
        if let Some(day) = self.available_days.iter().find(|d| **d > 6) {
            return Err(format!("available day {} is outside 0-6", day));
        }
        if self.max_days_ahead == 0 {
            return Err("booking horizon must be at least one day".to_string());
        }
        if self.timezone.parse::<Tz>().is_err() {
            return Err(format!("unknown timezone {}", self.timezone));
        }
        Ok(())
    }

    /// Whether bookings are offered on the given day of week (0 = Sunday).
    pub fn is_day_available(&self, day_of_week: u8) -> bool {
        self.available_days.contains(&day_of_week)
    }
}

/// Partial settings update; `None` leaves the stored value unchanged.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    pub display_name: Option<String>,
    pub contact_email: Option<String>,
    pub calendar_id: Option<String>,
    pub duration_minutes: Option<u32>,
    pub start_hour: Option<u32>,
    pub end_hour: Option<u32>,
    pub timezone: Option<String>,
    pub max_days_ahead: Option<u32>,
    pub available_days: Option<Vec<u8>>,
}

impl SettingsUpdate {
    /// Applies the update and validates the merged result.
    pub fn apply(self, current: &TenantSettings) -> Result<TenantSettings, String> {
        let mut available_days = self
            .available_days
            .unwrap_or_else(|| current.available_days.clone());
        available_days.sort_unstable();
        available_days.dedup();

        let merged = TenantSettings {
            tenant_id: current.tenant_id.clone(),
            slug: current.slug.clone(),
            display_name: self
                .display_name
                .unwrap_or_else(|| current.display_name.clone()),
            contact_email: self
                .contact_email
                .unwrap_or_else(|| current.contact_email.clone()),
            calendar_id: self
                .calendar_id
                .unwrap_or_else(|| current.calendar_id.clone()),
            duration_minutes: self.duration_minutes.unwrap_or(current.duration_minutes),
            start_hour: self.start_hour.unwrap_or(current.start_hour),
            end_hour: self.end_hour.unwrap_or(current.end_hour),
            timezone: self.timezone.unwrap_or_else(|| current.timezone.clone()),
            max_days_ahead: self.max_days_ahead.unwrap_or(current.max_days_ahead),
            available_days,
        };
        merged.validate()?;
        Ok(merged)
    }
}

/// A range reported busy by the calendar provider.
///
/// All-day events carry the instants of their civil day boundaries and
/// `is_all_day = true`; they block every slot on the dates they cover.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusyPeriod {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub is_all_day: bool,
}

impl BusyPeriod {
    pub fn timed(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end,
            is_all_day: false,
        }
    }

    pub fn all_day(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end,
            is_all_day: true,
        }
    }

    /// Half-open overlap of `[start, end)` with this period.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        start < self.end && end > self.start
    }
}

/// A candidate appointment window, derived per request.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub start_hour: u32,
    pub start_minute: u32,
    pub end_hour: u32,
    pub end_minute: u32,
    pub available: bool,
    pub is_past: bool,
    pub is_busy: bool,
}

/// A confirmed appointment, written once after the calendar event exists.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRecord {
    pub id: String,
    pub tenant_id: String,
    /// Calendar date in the tenant timezone.
    pub date: NaiveDate,
    /// Civil start time in the tenant timezone, `HH:MM`.
    pub start_time: String,
    pub end_time: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub name: String,
    pub email: String,
    pub message: Option<String>,
    pub calendar_event_id: String,
    pub created_at: DateTime<Utc>,
}
