#[cfg(test)]
mod tests {
    use crate::booking::{BookingEngine, BookingRequest};
    use crate::error::BookingError;
    use crate::oauth::AccessTokenProvider;
    use crate::service::mock::MockCalendarGateway;
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};
    use slotwise_common::memory::{InMemoryBookingStore, InMemorySettingsStore};
    use slotwise_common::models::{BookingRecord, BusyPeriod, TenantSettings};
    use slotwise_common::services::{
        BookingStore, BoxFuture, NotificationResult, NotificationService,
    };
    use slotwise_common::{internal_error, SlotwiseError};
    use std::sync::{Arc, Mutex};

    struct StaticToken;

    impl AccessTokenProvider for StaticToken {
        fn access_token(&self, _tenant_id: &str) -> BoxFuture<'_, String, BookingError> {
            Box::pin(async { Ok("access-token".to_string()) })
        }
    }

    struct RevokedToken;

    impl AccessTokenProvider for RevokedToken {
        fn access_token(&self, _tenant_id: &str) -> BoxFuture<'_, String, BookingError> {
            Box::pin(async {
                Err(BookingError::TokenRefresh {
                    status: 400,
                    message: "invalid_grant".to_string(),
                })
            })
        }
    }

    struct BrokenBookingStore;

    impl BookingStore for BrokenBookingStore {
        fn insert(&self, _record: BookingRecord) -> BoxFuture<'_, (), SlotwiseError> {
            Box::pin(async { Err(SlotwiseError::DatabaseError("disk I/O error".to_string())) })
        }

        fn list_since(
            &self,
            _tenant_id: &str,
            _since: DateTime<Utc>,
        ) -> BoxFuture<'_, Vec<BookingRecord>, SlotwiseError> {
            Box::pin(async { Ok(Vec::new()) })
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        fail: bool,
        sent: Mutex<Vec<String>>,
    }

    impl NotificationService for RecordingNotifier {
        fn send_email(
            &self,
            to: &str,
            _subject: &str,
            _body: &str,
        ) -> BoxFuture<'_, NotificationResult, SlotwiseError> {
            self.sent.lock().unwrap().push(to.to_string());
            let fail = self.fail;
            Box::pin(async move {
                if fail {
                    Err(internal_error("SMTP unavailable"))
                } else {
                    Ok(NotificationResult {
                        id: None,
                        status: "sent".to_string(),
                    })
                }
            })
        }
    }

    fn settings() -> TenantSettings {
        let mut settings =
            TenantSettings::with_defaults("tenant-1", "jane", "Jane Doe", "jane@example.com");
        settings.duration_minutes = 60;
        settings
    }

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    fn now() -> DateTime<Utc> {
        utc(2025, 3, 10, 8, 0)
    }

    fn request(start: &str, end: &str) -> BookingRequest {
        BookingRequest {
            start_time: Some(start.to_string()),
            end_time: Some(end.to_string()),
            name: Some("Sam Booker".to_string()),
            email: Some("sam@example.com".to_string()),
            message: Some("Looking forward".to_string()),
        }
    }

    struct Harness {
        engine: BookingEngine,
        gateway: Arc<MockCalendarGateway>,
        bookings: Arc<InMemoryBookingStore>,
        notifier: Arc<RecordingNotifier>,
    }

    fn harness(gateway: MockCalendarGateway) -> Harness {
        let gateway = Arc::new(gateway);
        let bookings = Arc::new(InMemoryBookingStore::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let settings_store = Arc::new(InMemorySettingsStore::new());
        settings_store.insert(settings()).unwrap();
        let engine = BookingEngine::new(
            settings_store,
            Arc::new(StaticToken),
            gateway.clone(),
            bookings.clone(),
            notifier.clone(),
            "Booking with",
        );
        Harness {
            engine,
            gateway,
            bookings,
            notifier,
        }
    }

    #[tokio::test]
    async fn test_successful_booking_writes_event_then_record() {
        let h = harness(MockCalendarGateway::default());
        let outcome = h
            .engine
            .book(
                &settings(),
                request("2025-03-12T09:00:00Z", "2025-03-12T10:00:00Z"),
                now(),
            )
            .await
            .unwrap();

        assert_eq!(outcome.event_id, "evt-1");
        assert_eq!(h.gateway.create_calls(), 1);
        let created = h.gateway.created.lock().unwrap()[0].clone();
        assert_eq!(created.title, "Booking with Sam Booker");
        assert_eq!(created.timezone, "UTC");
        assert_eq!(created.attendee_email.as_deref(), Some("sam@example.com"));

        let records = h.bookings.all().unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.calendar_event_id, "evt-1");
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2025, 3, 12).unwrap());
        assert_eq!(record.start_time, "09:00");
        assert_eq!(record.end_time, "10:00");
        assert_eq!(record.message.as_deref(), Some("Looking forward"));
        assert_eq!(record.created_at, now());
    }

    #[tokio::test]
    async fn test_conflict_check_queries_exact_range() {
        let h = harness(MockCalendarGateway::default());
        h.engine
            .book(
                &settings(),
                request("2025-03-12T09:00:00Z", "2025-03-12T10:00:00Z"),
                now(),
            )
            .await
            .unwrap();
        let calls = h.gateway.list_calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![(utc(2025, 3, 12, 9, 0), utc(2025, 3, 12, 10, 0))]
        );
    }

    #[tokio::test]
    async fn test_conflict_rejects_before_any_calendar_write() {
        let busy = vec![BusyPeriod::timed(
            utc(2025, 3, 12, 9, 30),
            utc(2025, 3, 12, 10, 30),
        )];
        let h = harness(MockCalendarGateway::with_busy(busy));
        let err = h
            .engine
            .book(
                &settings(),
                request("2025-03-12T09:00:00Z", "2025-03-12T10:00:00Z"),
                now(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, BookingError::SlotConflict));
        assert_eq!(h.gateway.create_calls(), 0);
        assert!(h.bookings.all().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_calendar_write_failure_persists_nothing() {
        let h = harness(MockCalendarGateway::failing_create(500));
        let err = h
            .engine
            .book(
                &settings(),
                request("2025-03-12T09:00:00Z", "2025-03-12T10:00:00Z"),
                now(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, BookingError::CalendarApi { status: 500, .. }));
        assert!(h.bookings.all().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_persistence_failure_reports_orphaned_event() {
        let gateway = Arc::new(MockCalendarGateway::default());
        let settings_store = Arc::new(InMemorySettingsStore::new());
        let engine = BookingEngine::new(
            settings_store,
            Arc::new(StaticToken),
            gateway.clone(),
            Arc::new(BrokenBookingStore),
            Arc::new(RecordingNotifier::default()),
            "Booking with",
        );
        let err = engine
            .book(
                &settings(),
                request("2025-03-12T09:00:00Z", "2025-03-12T10:00:00Z"),
                now(),
            )
            .await
            .unwrap_err();

        match err {
            BookingError::Persistence { event_id, message } => {
                assert_eq!(event_id, "evt-1");
                assert!(message.contains("disk I/O error"));
            }
            other => panic!("expected Persistence, got {:?}", other),
        }
        assert_eq!(gateway.create_calls(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_record_is_persistence_error() {
        let h = harness(MockCalendarGateway::default());
        let req = request("2025-03-12T09:00:00Z", "2025-03-12T10:00:00Z");
        h.engine.book(&settings(), req.clone(), now()).await.unwrap();
        // the mock calendar does not remember created events, like a racing request
        let err = h.engine.book(&settings(), req, now()).await.unwrap_err();
        assert!(matches!(err, BookingError::Persistence { .. }));
        assert_eq!(h.bookings.all().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_fields_are_validation_errors() {
        let h = harness(MockCalendarGateway::default());
        let cases = [
            BookingRequest {
                start_time: None,
                ..request("2025-03-12T09:00:00Z", "2025-03-12T10:00:00Z")
            },
            BookingRequest {
                end_time: None,
                ..request("2025-03-12T09:00:00Z", "2025-03-12T10:00:00Z")
            },
            BookingRequest {
                name: Some("   ".to_string()),
                ..request("2025-03-12T09:00:00Z", "2025-03-12T10:00:00Z")
            },
            BookingRequest {
                email: None,
                ..request("2025-03-12T09:00:00Z", "2025-03-12T10:00:00Z")
            },
        ];
        for case in cases {
            let err = h.engine.book(&settings(), case, now()).await.unwrap_err();
            assert!(matches!(err, BookingError::Validation(_)), "{:?}", err);
        }
        assert!(h.gateway.list_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_input_is_validation_error() {
        let h = harness(MockCalendarGateway::default());
        let cases = [
            request("next tuesday", "2025-03-12T10:00:00Z"),
            request("2025-03-12T10:00:00Z", "2025-03-12T09:00:00Z"),
            BookingRequest {
                email: Some("sam.example.com".to_string()),
                ..request("2025-03-12T09:00:00Z", "2025-03-12T10:00:00Z")
            },
            // beyond the 30 day horizon
            request("2025-05-12T09:00:00Z", "2025-05-12T10:00:00Z"),
        ];
        for case in cases {
            let err = h.engine.book(&settings(), case, now()).await.unwrap_err();
            assert!(matches!(err, BookingError::Validation(_)), "{:?}", err);
        }
    }

    #[tokio::test]
    async fn test_start_not_in_future_is_past_date() {
        let h = harness(MockCalendarGateway::default());
        let err = h
            .engine
            .book(
                &settings(),
                request("2025-03-10T08:00:00Z", "2025-03-10T09:00:00Z"),
                now(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::PastDate(_)));
        assert_eq!(h.gateway.create_calls(), 0);
    }

    #[tokio::test]
    async fn test_revoked_credential_stops_before_calendar() {
        let gateway = Arc::new(MockCalendarGateway::default());
        let bookings = Arc::new(InMemoryBookingStore::new());
        let engine = BookingEngine::new(
            Arc::new(InMemorySettingsStore::new()),
            Arc::new(RevokedToken),
            gateway.clone(),
            bookings.clone(),
            Arc::new(RecordingNotifier::default()),
            "Booking with",
        );
        let err = engine
            .book(
                &settings(),
                request("2025-03-12T09:00:00Z", "2025-03-12T10:00:00Z"),
                now(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::TokenRefresh { .. }));
        assert!(gateway.list_calls.lock().unwrap().is_empty());
        assert!(bookings.all().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_notification_failure_does_not_fail_booking() {
        let gateway = Arc::new(MockCalendarGateway::default());
        let notifier = Arc::new(RecordingNotifier {
            fail: true,
            ..Default::default()
        });
        let bookings = Arc::new(InMemoryBookingStore::new());
        let engine = BookingEngine::new(
            Arc::new(InMemorySettingsStore::new()),
            Arc::new(StaticToken),
            gateway,
            bookings.clone(),
            notifier.clone(),
            "Booking with",
        );
        let outcome = engine
            .book(
                &settings(),
                request("2025-03-12T09:00:00Z", "2025-03-12T10:00:00Z"),
                now(),
            )
            .await;
        assert!(outcome.is_ok());
        assert_eq!(bookings.all().unwrap().len(), 1);

        for _ in 0..100 {
            if notifier.sent.lock().unwrap().len() == 2 {
                break;
            }
            tokio::task::yield_now().await;
        }
        let mut sent = notifier.sent.lock().unwrap().clone();
        sent.sort();
        assert_eq!(sent, vec!["jane@example.com", "sam@example.com"]);
    }

    #[tokio::test]
    async fn test_slots_for_wednesday() {
        let h = harness(MockCalendarGateway::default());
        let date = NaiveDate::from_ymd_opt(2025, 3, 12).unwrap();
        let slots = h.engine.slots_for_date(&settings(), date, now()).await.unwrap();

        assert_eq!(slots.len(), 8);
        assert_eq!((slots[0].start_hour, slots[0].end_hour), (9, 10));
        assert_eq!((slots[7].start_hour, slots[7].end_hour), (16, 17));
        assert!(slots.iter().all(|s| s.available));
        // busy lookup covers the whole civil day, so all-day events are seen
        let calls = h.gateway.list_calls.lock().unwrap().clone();
        assert_eq!(calls, vec![(utc(2025, 3, 12, 0, 0), utc(2025, 3, 13, 0, 0))]);
    }

    #[tokio::test]
    async fn test_slots_outside_horizon_skip_calendar() {
        let h = harness(MockCalendarGateway::default());
        let yesterday = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        let far = NaiveDate::from_ymd_opt(2025, 6, 4).unwrap();
        let saturday = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
        for date in [yesterday, far, saturday] {
            assert!(h
                .engine
                .slots_for_date(&settings(), date, now())
                .await
                .unwrap()
                .is_empty());
        }
        assert!(h.gateway.list_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_tenant_by_slug() {
        let h = harness(MockCalendarGateway::default());
        assert_eq!(h.engine.tenant_by_slug("jane").await.unwrap().tenant_id, "tenant-1");
        assert!(matches!(
            h.engine.tenant_by_slug("nobody").await,
            Err(BookingError::TenantNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_bookings_after_booking() {
        let h = harness(MockCalendarGateway::default());
        h.engine
            .book(
                &settings(),
                request("2025-03-12T09:00:00Z", "2025-03-12T10:00:00Z"),
                now(),
            )
            .await
            .unwrap();
        let listed = h.engine.list_bookings("tenant-1", now()).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(h.notifier.sent.lock().unwrap().len() <= 2);
    }
}
