// --- File: crates/slotwise_gcal/src/service.rs ---
//! Calendar gateway.
//!
//! The engine reads busy periods and writes booking events through the
//! [`CalendarGateway`] trait; [`GoogleCalendarGateway`] implements it against
//! the Google Calendar v3 API with a tenant's access token.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use google_calendar3::{
    api::{Event, EventAttendee, EventDateTime, Events},
    hyper_rustls::{self, HttpsConnectorBuilder},
    hyper_util::client::legacy::{connect::HttpConnector, Client},
    CalendarHub,
};
use hyper_util::rt::TokioExecutor;
use slotwise_common::config_error;
use slotwise_common::models::BusyPeriod;
use slotwise_common::services::BoxFuture;
use slotwise_config::GoogleConfig;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::BookingError;
use crate::timezone::civil_to_instant;

// Type aliases for clarity
type Connector = hyper_rustls::HttpsConnector<HttpConnector>;

pub type HubType = CalendarHub<Connector>;

/// Event to write for a confirmed booking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    pub title: String,
    pub description: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// IANA name the event times are qualified with.
    pub timezone: String,
    pub attendee_email: Option<String>,
}

/// Read/write access to one tenant's calendar, authorised by `access_token`.
pub trait CalendarGateway: Send + Sync {
    /// Busy periods overlapping `[time_min, time_max)`, ordered by start.
    ///
    /// Recurring events are expanded into instances. Cancelled and
    /// transparent events are not busy.
    fn list_busy(
        &self,
        access_token: &str,
        calendar_id: &str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> BoxFuture<'_, Vec<BusyPeriod>, BookingError>;

    /// Inserts `event` and returns the provider's event id.
    fn create_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        event: NewEvent,
    ) -> BoxFuture<'_, String, BookingError>;
}

/// Google Calendar implementation.
///
/// A hub is built per call because each call runs under a different tenant's
/// token; the TLS connector is shared.
#[derive(Clone)]
pub struct GoogleCalendarGateway {
    connector: Connector,
    base_url: Option<String>,
    timeout: Duration,
    max_results: i32,
}

impl GoogleCalendarGateway {
    pub fn new(config: &GoogleConfig) -> Result<Self, BookingError> {
        let connector = HttpsConnectorBuilder::new()
            .with_native_roots()
            .map_err(|e| BookingError::Store(config_error(format!("TLS roots: {}", e))))?
            .https_or_http()
            .enable_http1()
            .build();

        Ok(Self {
            connector,
            base_url: config.api_base_url.clone().map(|url| {
                if url.ends_with('/') {
                    url
                } else {
                    format!("{}/", url)
                }
            }),
            timeout: Duration::from_secs(config.request_timeout_secs),
            max_results: config.max_busy_results,
        })
    }

    fn hub(&self, access_token: &str) -> HubType {
        let client = Client::builder(TokioExecutor::new()).build(self.connector.clone());
        let mut hub = CalendarHub::new(client, access_token.to_string());
        if let Some(base_url) = &self.base_url {
            hub.base_url(base_url.clone());
        }
        hub
    }
}

impl CalendarGateway for GoogleCalendarGateway {
    fn list_busy(
        &self,
        access_token: &str,
        calendar_id: &str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> BoxFuture<'_, Vec<BusyPeriod>, BookingError> {
        let hub = self.hub(access_token);
        let calendar_id = calendar_id.to_string();

        Box::pin(async move {
            let call = hub
                .events()
                .list(&calendar_id)
                .time_min(time_min)
                .time_max(time_max)
                .single_events(true)
                .order_by("startTime")
                .max_results(self.max_results)
                .doit();

            let (_response, events) = tokio::time::timeout(self.timeout, call)
                .await
                .map_err(|_| timeout_error("events.list"))?
                .map_err(map_api_error)?;

            if events.next_page_token.is_some() {
                warn!(
                    calendar_id = %calendar_id,
                    max_results = self.max_results,
                    "Busy listing truncated at result cap"
                );
            }

            busy_from_events(events)
        })
    }

    fn create_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        event: NewEvent,
    ) -> BoxFuture<'_, String, BookingError> {
        let hub = self.hub(access_token);
        let calendar_id = calendar_id.to_string();

        Box::pin(async move {
            let new_event = Event {
                summary: Some(event.title),
                description: event.description,
                start: Some(EventDateTime {
                    date_time: Some(event.start),
                    time_zone: Some(event.timezone.clone()),
                    ..Default::default()
                }),
                end: Some(EventDateTime {
                    date_time: Some(event.end),
                    time_zone: Some(event.timezone),
                    ..Default::default()
                }),
                attendees: event.attendee_email.map(|email| {
                    vec![EventAttendee {
                        email: Some(email),
                        ..Default::default()
                    }]
                }),
                ..Default::default()
            };

            let call = hub.events().insert(new_event, &calendar_id).doit();
            let (_response, created) = tokio::time::timeout(self.timeout, call)
                .await
                .map_err(|_| timeout_error("events.insert"))?
                .map_err(map_api_error)?;

            created.id.ok_or_else(|| BookingError::CalendarApi {
                status: 502,
                message: "created event has no id".to_string(),
            })
        })
    }
}

fn timeout_error(operation: &str) -> BookingError {
    BookingError::CalendarApi {
        status: 504,
        message: format!("{} timed out", operation),
    }
}

/// Maps a Google client error onto `CalendarApi { status, message }`.
pub fn map_api_error(err: google_calendar3::Error) -> BookingError {
    match err {
        google_calendar3::Error::Failure(response) => {
            let status = response.status();
            BookingError::CalendarApi {
                status: status.as_u16(),
                message: status
                    .canonical_reason()
                    .unwrap_or("unexpected status")
                    .to_string(),
            }
        }
        google_calendar3::Error::BadRequest(body) => {
            let status = body["error"]["code"]
                .as_u64()
                .and_then(|code| u16::try_from(code).ok())
                .unwrap_or(400);
            let message = body["error"]["message"]
                .as_str()
                .unwrap_or("bad request")
                .to_string();
            BookingError::CalendarApi { status, message }
        }
        google_calendar3::Error::HttpError(e) => BookingError::Upstream(e.to_string()),
        other => BookingError::CalendarApi {
            status: 502,
            message: other.to_string(),
        },
    }
}

/// Converts an events listing into busy periods.
///
/// All-day events are anchored at midnight of their dates in the calendar's
/// own timezone (`Events.time_zone`, UTC if absent); the end date is exclusive.
pub fn busy_from_events(events: Events) -> Result<Vec<BusyPeriod>, BookingError> {
    let calendar_tz = events
        .time_zone
        .as_deref()
        .and_then(|name| name.parse::<Tz>().ok())
        .unwrap_or(Tz::UTC);

    let mut busy = Vec::new();
    for event in events.items.unwrap_or_default() {
        if event.status.as_deref() == Some("cancelled")
            || event.transparency.as_deref() == Some("transparent")
        {
            continue;
        }

        let (Some(start), Some(end)) = (event.start, event.end) else {
            debug!(event_id = ?event.id, "Skipping event without start/end");
            continue;
        };

        match (start.date_time, end.date_time, start.date, end.date) {
            (Some(start), Some(end), _, _) => busy.push(BusyPeriod::timed(start, end)),
            (_, _, Some(start_date), Some(end_date)) => busy.push(BusyPeriod::all_day(
                civil_to_instant(calendar_tz, start_date, 0, 0)?,
                civil_to_instant(calendar_tz, end_date, 0, 0)?,
            )),
            _ => debug!(event_id = ?event.id, "Skipping event with mixed date kinds"),
        }
    }

    busy.sort_by_key(|period| period.start);
    Ok(busy)
}
