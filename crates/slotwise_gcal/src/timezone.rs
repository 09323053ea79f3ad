// --- File: crates/slotwise_gcal/src/timezone.rs ---
//! Civil time <-> instant conversion in a tenant's IANA timezone.
//!
//! All conversions go through the tz database (`chrono-tz`), so offsets are
//! always those in force on the date in question. Nothing here reads the
//! host's local timezone.

use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

use crate::error::BookingError;

/// Longest forward clock jump we search across when a civil time falls in a gap.
const MAX_GAP_MINUTES: i64 = 180;

/// A wall-clock reading in some timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CivilTime {
    pub date: NaiveDate,
    pub hour: u32,
    pub minute: u32,
}

impl CivilTime {
    /// `HH:MM`
    pub fn hhmm(&self) -> String {
        format!("{:02}:{:02}", self.hour, self.minute)
    }
}

pub fn parse_tz(name: &str) -> Result<Tz, BookingError> {
    name.parse::<Tz>()
        .map_err(|_| BookingError::Timezone(format!("unknown IANA timezone '{}'", name)))
}

/// The instant at which clocks in `tz` read `date hour:minute`.
///
/// A time skipped by a spring-forward transition resolves to the first valid
/// minute after the gap; a time repeated by a fall-back transition resolves to
/// its earlier occurrence.
pub fn civil_to_instant(
    tz: Tz,
    date: NaiveDate,
    hour: u32,
    minute: u32,
) -> Result<DateTime<Utc>, BookingError> {
    let time = NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(|| {
        BookingError::Timezone(format!("invalid civil time {:02}:{:02}", hour, minute))
    })?;
    let local = date.and_time(time);

    for shift in 0..=MAX_GAP_MINUTES {
        match tz.from_local_datetime(&(local + Duration::minutes(shift))) {
            LocalResult::Single(dt) => return Ok(dt.with_timezone(&Utc)),
            LocalResult::Ambiguous(earliest, _) => return Ok(earliest.with_timezone(&Utc)),
            LocalResult::None => continue,
        }
    }

    Err(BookingError::Timezone(format!(
        "{} does not exist in {}",
        local, tz
    )))
}

/// Wall-clock reading of `instant` in `tz`.
pub fn instant_to_civil(instant: DateTime<Utc>, tz: Tz) -> CivilTime {
    let local = instant.with_timezone(&tz);
    CivilTime {
        date: local.date_naive(),
        hour: local.hour(),
        minute: local.minute(),
    }
}

/// Day of week of `date` as observed in `tz`, 0 = Sunday.
///
/// Anchored at local noon, which exists on every date in every zone.
pub fn day_of_week(date: NaiveDate, tz: Tz) -> Result<u8, BookingError> {
    let noon = civil_to_instant(tz, date, 12, 0)?;
    Ok(noon.with_timezone(&tz).weekday().num_days_from_sunday() as u8)
}

/// Current civil date in `tz`.
pub fn today_in(tz: Tz, now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(&tz).date_naive()
}

/// `[start, end)` instants of the civil day `date` in `tz`.
///
/// Not always 24 hours long: DST transition days are 23 or 25 hours.
pub fn local_day_bounds(
    tz: Tz,
    date: NaiveDate,
) -> Result<(DateTime<Utc>, DateTime<Utc>), BookingError> {
    let next = date
        .succ_opt()
        .ok_or_else(|| BookingError::Timezone(format!("no day after {}", date)))?;
    Ok((civil_to_instant(tz, date, 0, 0)?, civil_to_instant(tz, next, 0, 0)?))
}
