// --- File: crates/slotwise_gcal/src/logic.rs ---
use chrono::{DateTime, Days, Duration, NaiveDate, Utc};
use slotwise_common::models::{BusyPeriod, TenantSettings, TimeSlot};

use crate::error::BookingError;
use crate::timezone::{civil_to_instant, day_of_week, instant_to_civil, local_day_bounds, parse_tz};

// --- Slot Generation ---

/// Enumerates the fixed-duration slots of `date` in the tenant's business
/// hours and classifies each one.
///
/// * Dates whose weekday (in the tenant timezone) is not enabled yield no slots.
/// * Slots step by `duration_minutes` from `start_hour`; a slot that would end
///   after `end_hour` is not produced.
/// * A slot is busy if a timed busy period overlaps it (half-open), or if an
///   all-day period touches the civil day at all.
/// * A slot is past if it starts before `now`.
///
/// Output is chronological and depends only on the arguments.
pub fn generate_slots(
    date: NaiveDate,
    busy_periods: &[BusyPeriod],
    settings: &TenantSettings,
    now: DateTime<Utc>,
) -> Result<Vec<TimeSlot>, BookingError> {
    let tz = parse_tz(&settings.timezone)?;

    if !settings.is_day_available(day_of_week(date, tz)?) {
        return Ok(Vec::new());
    }
    if settings.duration_minutes == 0 {
        return Err(BookingError::Validation(
            "slot duration must be greater than zero".to_string(),
        ));
    }

    let window_start = civil_to_instant(tz, date, settings.start_hour, 0)?;
    let window_end = civil_to_instant(tz, date, settings.end_hour, 0)?;
    let (day_start, day_end) = local_day_bounds(tz, date)?;

    let blocked_all_day = busy_periods
        .iter()
        .any(|busy| busy.is_all_day && busy.overlaps(day_start, day_end));

    let step = Duration::minutes(i64::from(settings.duration_minutes));
    let mut slots = Vec::new();
    let mut slot_start = window_start;

    while slot_start + step <= window_end {
        let slot_end = slot_start + step;
        let is_busy = blocked_all_day
            || busy_periods
                .iter()
                .any(|busy| !busy.is_all_day && busy.overlaps(slot_start, slot_end));
        let is_past = slot_start < now;

        let local_start = instant_to_civil(slot_start, tz);
        let local_end = instant_to_civil(slot_end, tz);

        slots.push(TimeSlot {
            start: slot_start,
            end: slot_end,
            start_hour: local_start.hour,
            start_minute: local_start.minute,
            end_hour: local_end.hour,
            end_minute: local_end.minute,
            available: !is_busy && !is_past,
            is_past,
            is_busy,
        });

        slot_start = slot_end;
    }

    Ok(slots)
}

/// Whether `date` lies in `[today, today + max_days_ahead]`.
///
/// A horizon reaching past the last representable date has no upper bound.
pub fn within_horizon(date: NaiveDate, today: NaiveDate, max_days_ahead: u32) -> bool {
    if date < today {
        return false;
    }
    match today.checked_add_days(Days::new(u64::from(max_days_ahead))) {
        Some(last) => date <= last,
        None => true,
    }
}
