#[cfg(test)]
mod tests {
    use crate::logic::generate_slots;
    use crate::timezone::civil_to_instant;
    use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
    use chrono_tz::Tz;
    use proptest::prelude::*;
    use slotwise_common::models::{BusyPeriod, TenantSettings};

    // Zones whose DST transitions (if any) happen before 04:00 local
    const ZONES: [&str; 6] = [
        "UTC",
        "Europe/Zurich",
        "America/New_York",
        "Asia/Tokyo",
        "Australia/Sydney",
        "Asia/Kolkata",
    ];

    // Durations that divide an hour, so every window divides evenly
    const DURATIONS: [u32; 6] = [10, 15, 20, 30, 60, 5];

    fn settings(zone: &str, start_hour: u32, end_hour: u32, duration: u32) -> TenantSettings {
        let mut settings = TenantSettings::with_defaults("t", "s", "Owner", "owner@example.com");
        settings.timezone = zone.to_string();
        settings.start_hour = start_hour;
        settings.end_hour = end_hour;
        settings.duration_minutes = duration;
        settings.available_days = vec![0, 1, 2, 3, 4, 5, 6];
        settings
    }

    fn long_ago() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap()
    }

    fn date_from_offset(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap() + Duration::days(offset)
    }

    proptest! {
        #[test]
        fn test_slot_count_matches_window(
            zone_idx in 0..ZONES.len(),
            duration_idx in 0..DURATIONS.len(),
            day_offset in 0..730i64,
            start_hour in 4..16u32,
            length in 1..8u32,
        ) {
            let end_hour = (start_hour + length).min(23);
            let s = settings(ZONES[zone_idx], start_hour, end_hour, DURATIONS[duration_idx]);
            let slots = generate_slots(date_from_offset(day_offset), &[], &s, long_ago()).unwrap();

            let expected = ((end_hour - start_hour) * 60 / DURATIONS[duration_idx]) as usize;
            prop_assert_eq!(slots.len(), expected);
        }

        #[test]
        fn test_slots_stay_inside_window_and_are_contiguous(
            zone_idx in 0..ZONES.len(),
            duration in 7..121u32,
            day_offset in 0..730i64,
            start_hour in 4..16u32,
            length in 1..8u32,
        ) {
            let end_hour = (start_hour + length).min(23);
            let zone = ZONES[zone_idx];
            let date = date_from_offset(day_offset);
            let s = settings(zone, start_hour, end_hour, duration);
            let slots = generate_slots(date, &[], &s, long_ago()).unwrap();

            let tz: Tz = zone.parse().unwrap();
            let window_start = civil_to_instant(tz, date, start_hour, 0).unwrap();
            let window_end = civil_to_instant(tz, date, end_hour, 0).unwrap();

            let mut expected_start = window_start;
            for slot in &slots {
                prop_assert_eq!(slot.start, expected_start);
                prop_assert_eq!(slot.end - slot.start, Duration::minutes(i64::from(duration)));
                prop_assert!(slot.end <= window_end);
                expected_start = slot.end;
            }
            // no room left for another full slot
            prop_assert!(expected_start + Duration::minutes(i64::from(duration)) > window_end);
        }

        #[test]
        fn test_busy_iff_half_open_overlap(
            duration_idx in 0..DURATIONS.len(),
            busy_start_min in 0..(24 * 60i64),
            busy_len_min in 1..240i64,
        ) {
            let date = NaiveDate::from_ymd_opt(2025, 3, 12).unwrap();
            let s = settings("UTC", 8, 18, DURATIONS[duration_idx]);
            let day_start = Utc.with_ymd_and_hms(2025, 3, 12, 0, 0, 0).unwrap();
            let busy_start = day_start + Duration::minutes(busy_start_min);
            let busy_end = busy_start + Duration::minutes(busy_len_min);
            let busy = [BusyPeriod::timed(busy_start, busy_end)];

            let slots = generate_slots(date, &busy, &s, long_ago()).unwrap();
            for slot in &slots {
                let overlaps = slot.start < busy_end && slot.end > busy_start;
                prop_assert_eq!(slot.is_busy, overlaps);
                prop_assert_eq!(slot.available, !overlaps);
                if slot.end == busy_start || slot.start == busy_end {
                    prop_assert!(!slot.is_busy);
                }
            }
        }

        #[test]
        fn test_disabled_weekday_always_empty(
            day_offset in 0..730i64,
            busy_count in 0..4usize,
        ) {
            let date = date_from_offset(day_offset);
            let mut s = settings("Europe/Zurich", 9, 17, 30);
            let weekday = crate::timezone::day_of_week(date, Tz::Europe__Zurich).unwrap();
            s.available_days.retain(|d| *d != weekday);

            let base = Utc.from_utc_datetime(&date.and_hms_opt(8, 0, 0).unwrap());
            let busy: Vec<_> = (0..busy_count)
                .map(|i| {
                    let start = base + Duration::hours(i as i64 * 2);
                    BusyPeriod::timed(start, start + Duration::hours(1))
                })
                .collect();

            prop_assert!(generate_slots(date, &busy, &s, long_ago()).unwrap().is_empty());
        }
    }
}
