use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use slotwise_common::models::{BusyPeriod, TenantSettings};
use slotwise_gcal::logic::generate_slots;

fn create_settings(timezone: &str, duration_minutes: u32) -> TenantSettings {
    let mut settings =
        TenantSettings::with_defaults("bench", "bench", "Bench Tenant", "bench@example.com");
    settings.timezone = timezone.to_string();
    settings.duration_minutes = duration_minutes;
    settings.start_hour = 7;
    settings.end_hour = 21;
    settings
}

// Helper function to create a list of busy periods across the day
fn create_busy_periods(base_time: DateTime<Utc>, count: usize) -> Vec<BusyPeriod> {
    let mut busy_periods = Vec::new();
    let mut current_time = base_time;

    for _ in 0..count {
        let start = current_time + Duration::minutes(20);
        let end = start + Duration::minutes(25);
        busy_periods.push(BusyPeriod::timed(start, end));
        current_time = end;
    }

    busy_periods
}

fn benchmark_generate_slots(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate_slots");

    // Wednesday
    let date = NaiveDate::from_ymd_opt(2025, 3, 12).unwrap();
    let now = Utc.with_ymd_and_hms(2025, 3, 10, 8, 0, 0).unwrap();

    group.bench_function("no_busy_periods", |b| {
        let settings = create_settings("UTC", 30);
        b.iter(|| {
            generate_slots(
                black_box(date),
                black_box(&[]),
                black_box(&settings),
                black_box(now),
            )
        })
    });

    group.bench_function("many_busy_periods", |b| {
        let settings = create_settings("UTC", 15);
        let base = Utc.with_ymd_and_hms(2025, 3, 12, 7, 0, 0).unwrap();
        let busy_periods = create_busy_periods(base, 40);
        b.iter(|| {
            generate_slots(
                black_box(date),
                black_box(&busy_periods),
                black_box(&settings),
                black_box(now),
            )
        })
    });

    group.bench_function("non_utc_timezone", |b| {
        let settings = create_settings("America/New_York", 30);
        let base = Utc.with_ymd_and_hms(2025, 3, 12, 11, 0, 0).unwrap();
        let busy_periods = create_busy_periods(base, 10);
        b.iter(|| {
            generate_slots(
                black_box(date),
                black_box(&busy_periods),
                black_box(&settings),
                black_box(now),
            )
        })
    });

    group.finish();
}

criterion_group!(benches, benchmark_generate_slots);
criterion_main!(benches);
