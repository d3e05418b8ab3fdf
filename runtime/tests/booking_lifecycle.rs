//! Booking engine behaviour against the in-memory store.

#![allow(clippy::unwrap_used)]

use roombnb_core::environment::Clock;
use roombnb_core::error::{BookingError, ErrorKind};
use roombnb_core::notification::NotificationKind;
use roombnb_core::types::{BookingStatus, Money, NewBooking, PropertyId};
use roombnb_runtime::{BookingEngine, Notifier};
use roombnb_testing::{FixedClock, Marketplace, RacingStore, RecordingSink, date, test_clock};
use std::sync::Arc;
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(2);

struct Harness {
    market: Marketplace,
    sink: RecordingSink,
    clock: FixedClock,
    engine: BookingEngine,
}

fn harness_with(sink: RecordingSink) -> Harness {
    roombnb_testing::init_tracing();
    let market = Marketplace::new();
    let store = Arc::new(market.store.clone());
    let clock = test_clock();
    let engine = BookingEngine::new(
        store.clone(),
        store,
        Notifier::new(Arc::new(sink.clone())),
        Arc::new(clock.clone()),
    );
    Harness {
        market,
        sink,
        clock,
        engine,
    }
}

fn harness() -> Harness {
    harness_with(RecordingSink::new())
}

fn request(h: &Harness, from: u32, to: u32, guests: u32) -> NewBooking {
    NewBooking {
        property_id: h.market.property.id,
        check_in: date(2025, 3, from),
        check_out: date(2025, 3, to),
        number_of_guests: guests,
        special_requests: None,
    }
}

#[tokio::test]
async fn creates_pending_booking_with_quoted_price() {
    let h = harness();

    let details = h
        .engine
        .create_booking(&h.market.guest_actor(), request(&h, 1, 4, 2))
        .await
        .unwrap();

    assert_eq!(details.status(), BookingStatus::Pending);
    assert_eq!(details.booking.total_price, Money::from_dollars(640));
    assert_eq!(details.booking.guest_id, h.market.guest.id);
    assert_eq!(details.host.id, h.market.host.id);
    assert_eq!(details.property.title, "Ocean View Cottage");
    assert_eq!(details.booking.created_at, h.clock.now());

    let sent = h.sink.wait_for(1, WAIT).await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].kind, NotificationKind::NewBookingRequest);
    assert_eq!(sent[0].recipient.id, h.market.host.id);
}

#[tokio::test]
async fn overlapping_request_is_refused_while_first_is_pending() {
    let h = harness();
    h.engine
        .create_booking(&h.market.guest_actor(), request(&h, 1, 4, 2))
        .await
        .unwrap();

    let second = h.market.add_party("Olive", "Other");
    let err = h
        .engine
        .create_booking(&roombnb_core::Actor::guest(second.id), request(&h, 3, 5, 2))
        .await
        .unwrap_err();

    assert_eq!(err, BookingError::DateConflict);
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(err.to_string(), "Property not available for selected dates");
    assert_eq!(h.market.store.booking_count(), 1);
}

#[tokio::test]
async fn same_day_turnover_is_a_conflict() {
    let h = harness();
    h.engine
        .create_booking(&h.market.guest_actor(), request(&h, 1, 4, 2))
        .await
        .unwrap();

    let err = h
        .engine
        .create_booking(&h.market.guest_actor(), request(&h, 4, 6, 2))
        .await
        .unwrap_err();
    assert_eq!(err, BookingError::DateConflict);

    assert!(
        h.engine
            .create_booking(&h.market.guest_actor(), request(&h, 5, 7, 2))
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn capacity_is_enforced() {
    let h = harness();
    let err = h
        .engine
        .create_booking(&h.market.guest_actor(), request(&h, 1, 4, 6))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ValidationFailed);
    assert!(err.to_string().contains("4 guests allowed"));
}

#[tokio::test]
async fn at_least_one_guest() {
    let h = harness();
    let err = h
        .engine
        .create_booking(&h.market.guest_actor(), request(&h, 1, 4, 0))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationFailed);
    assert_eq!(err.to_string(), "Number of guests must be at least 1");
}

#[tokio::test]
async fn inverted_range_is_invalid() {
    let h = harness();
    let err = h
        .engine
        .create_booking(&h.market.guest_actor(), request(&h, 4, 4, 2))
        .await
        .unwrap_err();
    assert_eq!(err, BookingError::InvalidRange);
    assert_eq!(err.kind(), ErrorKind::ValidationFailed);
}

#[tokio::test]
async fn missing_or_inactive_property_is_not_found() {
    let h = harness();

    let mut missing = request(&h, 1, 4, 2);
    missing.property_id = PropertyId::new();
    let err = h
        .engine
        .create_booking(&h.market.guest_actor(), missing)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Property not found");

    let mut inactive = h.market.property.clone();
    inactive.is_active = false;
    h.market.store.put_property(inactive);
    let err = h
        .engine
        .create_booking(&h.market.guest_actor(), request(&h, 1, 4, 2))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn confirm_then_guest_cancel_notifies_host() {
    let h = harness();
    let id = h
        .engine
        .create_booking(&h.market.guest_actor(), request(&h, 1, 4, 2))
        .await
        .unwrap()
        .id();

    let confirmed = h
        .engine
        .confirm_booking(&h.market.host_actor(), id)
        .await
        .unwrap();
    assert_eq!(confirmed.status(), BookingStatus::Confirmed);

    let cancelled = h
        .engine
        .cancel_booking(&h.market.guest_actor(), id)
        .await
        .unwrap();
    assert_eq!(cancelled.status(), BookingStatus::Cancelled);

    let sent = h.sink.wait_for(3, WAIT).await;
    let kinds: Vec<_> = sent.iter().map(|n| (n.kind, n.recipient.id)).collect();
    assert!(kinds.contains(&(NotificationKind::BookingConfirmed, h.market.guest.id)));
    assert!(kinds.contains(&(NotificationKind::BookingCancelledByGuest, h.market.host.id)));
}

#[tokio::test]
async fn host_cancel_notifies_guest() {
    let h = harness();
    let id = h.market.seed(date(2025, 3, 1), date(2025, 3, 4), BookingStatus::Confirmed);

    h.engine
        .cancel_booking(&h.market.host_actor(), id)
        .await
        .unwrap();

    let sent = h.sink.wait_for(1, WAIT).await;
    assert_eq!(sent[0].kind, NotificationKind::BookingCancelledByHost);
    assert_eq!(sent[0].recipient.id, h.market.guest.id);
}

#[tokio::test]
async fn reject_notifies_guest() {
    let h = harness();
    let id = h.market.seed(date(2025, 3, 1), date(2025, 3, 4), BookingStatus::Pending);

    let rejected = h
        .engine
        .reject_booking(&h.market.host_actor(), id)
        .await
        .unwrap();
    assert_eq!(rejected.status(), BookingStatus::Rejected);

    let sent = h.sink.wait_for(1, WAIT).await;
    assert_eq!(sent[0].kind, NotificationKind::BookingRejected);
    assert_eq!(sent[0].recipient.id, h.market.guest.id);
}

#[tokio::test]
async fn cancellation_frees_the_dates() {
    let h = harness();
    let id = h
        .engine
        .create_booking(&h.market.guest_actor(), request(&h, 1, 4, 2))
        .await
        .unwrap()
        .id();
    h.engine
        .cancel_booking(&h.market.guest_actor(), id)
        .await
        .unwrap();

    assert!(
        h.engine
            .create_booking(&h.market.guest_actor(), request(&h, 2, 3, 1))
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn cancel_messages_for_closed_bookings() {
    let h = harness();
    let guest = h.market.guest_actor();

    let cancelled = h.market.seed(date(2025, 3, 1), date(2025, 3, 2), BookingStatus::Cancelled);
    let err = h.engine.cancel_booking(&guest, cancelled).await.unwrap_err();
    assert_eq!(err.to_string(), "Booking already cancelled");
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let completed = h.market.seed(date(2024, 12, 1), date(2024, 12, 3), BookingStatus::Completed);
    let err = h.engine.cancel_booking(&guest, completed).await.unwrap_err();
    assert_eq!(err.to_string(), "Cannot cancel completed booking");
}

#[tokio::test]
async fn confirm_requires_pending_and_names_status() {
    let h = harness();
    let id = h.market.seed(date(2025, 3, 1), date(2025, 3, 4), BookingStatus::Confirmed);

    let err = h
        .engine
        .confirm_booking(&h.market.host_actor(), id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(err.to_string(), "Cannot confirm booking with status confirmed");
    assert_eq!(err.current_status(), Some(BookingStatus::Confirmed));
}

#[tokio::test]
async fn terminal_states_reject_every_transition() {
    let h = harness();
    let host = h.market.host_actor();

    for status in [
        BookingStatus::Rejected,
        BookingStatus::Cancelled,
        BookingStatus::Completed,
    ] {
        let id = h.market.seed(date(2024, 11, 1), date(2024, 11, 3), status);
        for result in [
            h.engine.confirm_booking(&host, id).await,
            h.engine.reject_booking(&host, id).await,
            h.engine.cancel_booking(&host, id).await,
        ] {
            let err = result.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Conflict, "{status}: {err}");
        }
        assert_eq!(h.market.store.booking(id).unwrap().status, status);
    }
}

#[tokio::test]
async fn outsiders_are_forbidden() {
    let h = harness();
    let id = h
        .engine
        .create_booking(&h.market.guest_actor(), request(&h, 1, 4, 2))
        .await
        .unwrap()
        .id();
    let stranger = h.market.stranger_actor();

    let err = h.engine.get_booking(&stranger, id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
    assert_eq!(err.to_string(), "Not authorized to view this booking");

    let err = h.engine.cancel_booking(&stranger, id).await.unwrap_err();
    assert_eq!(err.to_string(), "Not authorized to cancel this booking");

    let err = h.engine.confirm_booking(&stranger, id).await.unwrap_err();
    assert_eq!(err.to_string(), "Not authorized to confirm this booking");

    let err = h.engine.reject_booking(&stranger, id).await.unwrap_err();
    assert_eq!(err.to_string(), "Not authorized to reject this booking");

    assert!(h.engine.get_booking(&h.market.guest_actor(), id).await.is_ok());
    assert!(h.engine.get_booking(&h.market.host_actor(), id).await.is_ok());
}

#[tokio::test]
async fn guest_cannot_confirm_own_request() {
    let h = harness();
    let id = h.market.seed(date(2025, 3, 1), date(2025, 3, 4), BookingStatus::Pending);

    let err = h
        .engine
        .confirm_booking(&h.market.guest_actor(), id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
    assert_eq!(h.market.store.booking(id).unwrap().status, BookingStatus::Pending);
}

#[tokio::test]
async fn missing_booking_is_not_found() {
    let h = harness();
    let err = h
        .engine
        .get_booking(&h.market.guest_actor(), roombnb_core::BookingId::new())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Booking not found");
}

#[tokio::test]
async fn price_is_fixed_at_creation() {
    let h = harness();
    let id = h
        .engine
        .create_booking(&h.market.guest_actor(), request(&h, 1, 4, 2))
        .await
        .unwrap()
        .id();

    let mut repriced = h.market.property.clone();
    repriced.price_per_night = Money::from_dollars(999);
    h.market.store.put_property(repriced);

    let details = h
        .engine
        .get_booking(&h.market.guest_actor(), id)
        .await
        .unwrap();
    assert_eq!(details.booking.total_price, Money::from_dollars(640));
}

#[tokio::test]
async fn notification_failure_does_not_fail_the_booking() {
    let h = harness_with(RecordingSink::failing());

    let details = h
        .engine
        .create_booking(&h.market.guest_actor(), request(&h, 1, 4, 2))
        .await
        .unwrap();
    assert_eq!(details.status(), BookingStatus::Pending);

    let attempts = h.sink.wait_for(1, WAIT).await;
    assert_eq!(attempts.len(), 1);
    assert_eq!(h.market.store.booking_count(), 1);
}

#[tokio::test]
async fn lists_are_scoped_and_newest_first() {
    let h = harness();
    let first = h
        .engine
        .create_booking(&h.market.guest_actor(), request(&h, 1, 4, 2))
        .await
        .unwrap()
        .id();
    h.clock.advance(chrono::Duration::hours(1));
    let second = h
        .engine
        .create_booking(&h.market.guest_actor(), request(&h, 10, 12, 2))
        .await
        .unwrap()
        .id();

    let as_guest = h
        .engine
        .list_guest_bookings(&h.market.guest_actor())
        .await
        .unwrap();
    assert_eq!(
        as_guest.iter().map(|d| d.id()).collect::<Vec<_>>(),
        vec![second, first]
    );

    let as_host = h
        .engine
        .list_host_bookings(&h.market.host_actor())
        .await
        .unwrap();
    assert_eq!(as_host.len(), 2);

    let strangers = h
        .engine
        .list_host_bookings(&h.market.stranger_actor())
        .await
        .unwrap();
    assert!(strangers.is_empty());
}

#[tokio::test]
async fn concurrent_overlapping_requests_admit_one() {
    let h = harness();
    let mut tasks = Vec::new();
    for i in 0..8 {
        let engine = h.engine.clone();
        let guest = h.market.add_party("Racer", &format!("N{i}"));
        let req = request(&h, 1, 4, 2);
        tasks.push(tokio::spawn(async move {
            engine
                .create_booking(&roombnb_core::Actor::guest(guest.id), req)
                .await
        }));
    }

    let mut admitted = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => admitted += 1,
            Err(err) => assert_eq!(err, BookingError::DateConflict),
        }
    }
    assert_eq!(admitted, 1);
    assert_eq!(h.market.store.booking_count(), 1);
}

fn racing_engine(market: &Marketplace) -> (RacingStore, BookingEngine) {
    roombnb_testing::init_tracing();
    let racing = RacingStore::new(market.store.clone());
    let engine = BookingEngine::new(
        Arc::new(market.store.clone()),
        Arc::new(racing.clone()),
        Notifier::new(Arc::new(RecordingSink::new())),
        Arc::new(test_clock()),
    );
    (racing, engine)
}

#[tokio::test]
async fn insert_recheck_refuses_a_clash_the_precheck_missed() {
    let market = Marketplace::new();
    market.seed(date(2025, 3, 1), date(2025, 3, 4), BookingStatus::Confirmed);
    let (racing, engine) = racing_engine(&market);
    racing.hide_overlaps();

    let err = engine
        .create_booking(
            &market.guest_actor(),
            NewBooking {
                property_id: market.property.id,
                check_in: date(2025, 3, 2),
                check_out: date(2025, 3, 5),
                number_of_guests: 2,
                special_requests: None,
            },
        )
        .await
        .unwrap_err();

    assert_eq!(err, BookingError::DateConflict);
    assert_eq!(err.to_string(), "Property not available for selected dates");
    assert_eq!(market.store.booking_count(), 1);
}

#[tokio::test]
async fn lost_confirm_reports_the_status_that_won() {
    let market = Marketplace::new();
    let id = market.seed(date(2025, 3, 1), date(2025, 3, 4), BookingStatus::Pending);
    let (racing, engine) = racing_engine(&market);
    racing.interleave_status(BookingStatus::Cancelled);

    let err = engine
        .confirm_booking(&market.host_actor(), id)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(err.current_status(), Some(BookingStatus::Cancelled));
    assert_eq!(err.to_string(), "Cannot confirm booking with status cancelled");
    assert_eq!(
        market.store.booking(id).map(|b| b.status),
        Some(BookingStatus::Cancelled)
    );
}

#[tokio::test]
async fn lost_cancel_reports_the_rejection() {
    let market = Marketplace::new();
    let id = market.seed(date(2025, 3, 1), date(2025, 3, 4), BookingStatus::Pending);
    let (racing, engine) = racing_engine(&market);
    racing.interleave_status(BookingStatus::Rejected);

    let err = engine
        .cancel_booking(&market.guest_actor(), id)
        .await
        .unwrap_err();

    assert_eq!(err.current_status(), Some(BookingStatus::Rejected));
    assert_eq!(err.to_string(), "Cannot cancel rejected booking");
}
