//! Review, guest review, earnings and sweep behaviour against the in-memory
//! store.

#![allow(clippy::unwrap_used, clippy::float_cmp)]

use roombnb_core::error::ErrorKind;
use roombnb_core::review::ReviewUpdate;
use roombnb_core::types::{Actor, BookingId, BookingStatus, Money};
use roombnb_runtime::{
    BookingEngine, EarningsService, ExpirySweeper, NewGuestReview, NewReview, Notifier,
    ReviewService,
};
use roombnb_testing::{FixedClock, Marketplace, RecordingSink, date, test_clock};
use std::sync::Arc;
use std::time::Duration;

struct Services {
    market: Marketplace,
    clock: FixedClock,
    reviews: ReviewService,
    earnings: EarningsService,
    engine: BookingEngine,
}

fn services() -> Services {
    roombnb_testing::init_tracing();
    let market = Marketplace::new();
    let store = Arc::new(market.store.clone());
    let clock = test_clock();
    let reviews = ReviewService::new(store.clone(), store.clone(), Arc::new(clock.clone()));
    let earnings = EarningsService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        Arc::new(clock.clone()),
    );
    let engine = BookingEngine::new(
        store.clone(),
        store,
        Notifier::new(Arc::new(RecordingSink::new())),
        Arc::new(clock.clone()),
    );
    Services {
        market,
        clock,
        reviews,
        earnings,
        engine,
    }
}

fn finished_stay(s: &Services) -> BookingId {
    s.market
        .seed(date(2024, 12, 20), date(2024, 12, 23), BookingStatus::Completed)
}

fn review_of(s: &Services, booking_id: BookingId, rating: i64) -> NewReview {
    NewReview {
        booking_id,
        property_id: s.market.property.id,
        rating,
        comment: "Lovely stay by the water".to_string(),
    }
}

fn guest_review_of(s: &Services, booking_id: BookingId, comment: &str) -> NewGuestReview {
    NewGuestReview {
        booking_id,
        guest_id: s.market.guest.id,
        rating: 5,
        comment: comment.to_string(),
    }
}

#[tokio::test]
async fn guest_reviews_a_finished_stay_once() {
    let s = services();
    let booking = finished_stay(&s);

    let view = s
        .reviews
        .create_review(&s.market.guest_actor(), review_of(&s, booking, 5))
        .await
        .unwrap();
    assert_eq!(view.review.rating.value(), 5);
    assert_eq!(view.user.first_name, "Gary");

    let err = s
        .reviews
        .create_review(&s.market.guest_actor(), review_of(&s, booking, 4))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(err.to_string(), "You have already reviewed this booking");
    assert_eq!(s.market.store.review_count(), 1);

    let listed = s
        .reviews
        .property_reviews(s.market.property.id)
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn confirmed_stay_past_checkout_counts_as_finished() {
    let s = services();
    let booking = s
        .market
        .seed(date(2024, 12, 20), date(2024, 12, 23), BookingStatus::Confirmed);

    assert!(
        s.reviews
            .create_review(&s.market.guest_actor(), review_of(&s, booking, 4))
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn upcoming_or_pending_stays_cannot_be_reviewed() {
    let s = services();
    let guest = s.market.guest_actor();

    let upcoming = s
        .market
        .seed(date(2025, 2, 1), date(2025, 2, 3), BookingStatus::Confirmed);
    let err = s
        .reviews
        .create_review(&guest, review_of(&s, upcoming, 5))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationFailed);
    assert_eq!(err.to_string(), "You can only review completed trips");

    let pending = s
        .market
        .seed(date(2024, 12, 1), date(2024, 12, 3), BookingStatus::Pending);
    let err = s
        .reviews
        .create_review(&guest, review_of(&s, pending, 5))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationFailed);
}

#[tokio::test]
async fn review_input_is_validated() {
    let s = services();
    let booking = finished_stay(&s);
    let guest = s.market.guest_actor();

    let err = s
        .reviews
        .create_review(&guest, review_of(&s, booking, 6))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Rating must be between 1 and 5");

    let mut blank = review_of(&s, booking, 3);
    blank.comment = String::new();
    let err = s.reviews.create_review(&guest, blank).await.unwrap_err();
    assert_eq!(err.to_string(), "Comment is required");

    let mut elsewhere = review_of(&s, booking, 3);
    elsewhere.property_id = roombnb_core::PropertyId::new();
    let err = s.reviews.create_review(&guest, elsewhere).await.unwrap_err();
    assert_eq!(err.to_string(), "Booking does not match the property");
}

#[tokio::test]
async fn only_the_guest_may_review_their_booking() {
    let s = services();
    let booking = finished_stay(&s);

    let err = s
        .reviews
        .create_review(&s.market.stranger_actor(), review_of(&s, booking, 5))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let err = s
        .reviews
        .create_review(
            &s.market.guest_actor(),
            review_of(&s, BookingId::new(), 5),
        )
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Booking not found");
}

#[tokio::test]
async fn author_edits_and_deletes_their_review() {
    let s = services();
    let booking = finished_stay(&s);
    let guest = s.market.guest_actor();
    let id = s
        .reviews
        .create_review(&guest, review_of(&s, booking, 3))
        .await
        .unwrap()
        .review
        .id;

    let err = s
        .reviews
        .update_review(
            &s.market.stranger_actor(),
            id,
            ReviewUpdate {
                rating: Some(9),
                comment: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let err = s
        .reviews
        .update_review(
            &guest,
            id,
            ReviewUpdate {
                rating: Some(9),
                comment: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationFailed);

    let err = s
        .reviews
        .update_review(
            &guest,
            id,
            ReviewUpdate {
                rating: None,
                comment: Some("   ".to_string()),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Comment cannot be empty");

    s.clock.advance(chrono::Duration::days(1));
    let updated = s
        .reviews
        .update_review(
            &guest,
            id,
            ReviewUpdate {
                rating: Some(4),
                comment: Some("Even better on reflection".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.review.rating.value(), 4);
    assert!(updated.review.updated_at > updated.review.created_at);

    let err = s
        .reviews
        .delete_review(&s.market.host_actor(), id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    s.reviews.delete_review(&guest, id).await.unwrap();
    assert_eq!(s.market.store.review_count(), 0);

    let err = s.reviews.delete_review(&guest, id).await.unwrap_err();
    assert_eq!(err.to_string(), "Review not found");
}

#[tokio::test]
async fn host_reviews_their_guest_once() {
    let s = services();
    let booking = finished_stay(&s);
    let host = s.market.host_actor();

    let view = s
        .reviews
        .create_guest_review(&host, guest_review_of(&s, booking, "Left the place spotless"))
        .await
        .unwrap();
    assert_eq!(view.host.id, s.market.host.id);
    assert_eq!(view.property.title, "Ocean View Cottage");

    let err = s
        .reviews
        .create_guest_review(&host, guest_review_of(&s, booking, "Second thoughts here"))
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "You have already reviewed this guest for this booking"
    );

    let listed = s.reviews.guest_reviews(s.market.guest.id).await.unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn guest_review_rules() {
    let s = services();
    let booking = finished_stay(&s);
    let host = s.market.host_actor();

    let err = s
        .reviews
        .create_guest_review(&host, guest_review_of(&s, booking, "  too short  "))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Comment must be at least 10 characters");

    let err = s
        .reviews
        .create_guest_review(
            &s.market.stranger_actor(),
            guest_review_of(&s, booking, "Not my guest at all"),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let mut wrong_guest = guest_review_of(&s, booking, "Someone else entirely");
    wrong_guest.guest_id = s.market.stranger.id;
    let err = s
        .reviews
        .create_guest_review(&host, wrong_guest)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Guest does not match the booking");

    let upcoming = s
        .market
        .seed(date(2025, 2, 1), date(2025, 2, 3), BookingStatus::Confirmed);
    let err = s
        .reviews
        .create_guest_review(&host, guest_review_of(&s, upcoming, "Has not arrived yet"))
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "You can only review guests after their stay is complete"
    );
}

#[tokio::test]
async fn host_manages_their_guest_reviews() {
    let s = services();
    let booking = finished_stay(&s);
    let unreviewed = s
        .market
        .seed(date(2024, 11, 1), date(2024, 11, 4), BookingStatus::Completed);
    let host = s.market.host_actor();
    let stranger = s.market.stranger_actor();

    let created = s
        .reviews
        .create_guest_review(&host, guest_review_of(&s, booking, "Left the place spotless"))
        .await
        .unwrap();
    let id = created.review.id;

    let found = s
        .reviews
        .guest_review_for_booking(&host, booking)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.review.id, id);
    assert_eq!(found.guest.first_name, "Gary");
    assert!(
        s.reviews
            .guest_review_for_booking(&host, unreviewed)
            .await
            .unwrap()
            .is_none()
    );
    let err = s
        .reviews
        .guest_review_for_booking(&stranger, booking)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
    assert_eq!(
        err.to_string(),
        "You can only view reviews for your own properties"
    );

    let written = s.reviews.host_guest_reviews(&host).await.unwrap();
    assert_eq!(written.len(), 1);
    assert!(s.reviews.host_guest_reviews(&stranger).await.unwrap().is_empty());

    let short = ReviewUpdate {
        rating: None,
        comment: Some(" meh ".to_string()),
    };
    let err = s
        .reviews
        .update_guest_review(&host, id, short)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Comment must be at least 10 characters");

    let edit = ReviewUpdate {
        rating: Some(3),
        comment: Some("  Quiet, but left late  ".to_string()),
    };
    let err = s
        .reviews
        .update_guest_review(&stranger, id, edit.clone())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "You can only update your own reviews");

    let updated = s
        .reviews
        .update_guest_review(&host, id, edit)
        .await
        .unwrap();
    assert_eq!(updated.review.rating.value(), 3);
    assert_eq!(updated.review.comment, "Quiet, but left late");

    let err = s
        .reviews
        .delete_guest_review(&stranger, id)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "You can only delete your own reviews");
    s.reviews.delete_guest_review(&host, id).await.unwrap();
    let err = s.reviews.delete_guest_review(&host, id).await.unwrap_err();
    assert_eq!(err.to_string(), "Review not found");
}

#[tokio::test]
async fn user_review_is_the_callers_own() {
    let s = services();
    let booking = finished_stay(&s);
    let guest = s.market.guest_actor();
    let property = s.market.property.id;

    assert!(s.reviews.user_review(&guest, property).await.unwrap().is_none());

    let view = s
        .reviews
        .create_review(&guest, review_of(&s, booking, 5))
        .await
        .unwrap();
    let mine = s.reviews.user_review(&guest, property).await.unwrap();
    assert_eq!(mine.map(|r| r.id), Some(view.review.id));

    let theirs = s
        .reviews
        .user_review(&s.market.stranger_actor(), property)
        .await
        .unwrap();
    assert!(theirs.is_none());
}

#[tokio::test]
async fn occupancy_over_recent_days() {
    let s = services();
    s.clock.set(date(2025, 3, 15));
    s.market
        .seed(date(2025, 2, 1), date(2025, 2, 4), BookingStatus::Completed);
    // Still in progress: counted up to today
    s.market
        .seed(date(2025, 3, 10), date(2025, 3, 20), BookingStatus::Confirmed);
    s.market
        .seed(date(2025, 3, 1), date(2025, 3, 5), BookingStatus::Cancelled);

    let host = s.market.host_actor();
    let rows = s
        .earnings
        .occupancy(&host, roombnb_core::earnings::DEFAULT_OCCUPANCY_DAYS)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].property_id, s.market.property.id);
    assert_eq!(rows[0].total_days_booked, 8);
    assert_eq!(rows[0].period_days, 90);
    assert_eq!(rows[0].occupancy_rate, 8.9);

    let week = s.earnings.occupancy(&host, 7).await.unwrap();
    assert_eq!(week[0].total_days_booked, 5);
    assert_eq!(week[0].occupancy_rate, 71.4);

    let other = s
        .earnings
        .occupancy(&Actor::host(s.market.stranger.id), 30)
        .await
        .unwrap();
    assert!(other.is_empty());
}

#[tokio::test]
async fn earnings_dashboard() {
    let s = services();
    s.clock.set(date(2025, 3, 15));
    let feb = s
        .market
        .seed(date(2025, 2, 1), date(2025, 2, 4), BookingStatus::Completed);
    s.market
        .seed(date(2025, 3, 1), date(2025, 3, 4), BookingStatus::Completed);
    s.market
        .seed(date(2025, 3, 5), date(2025, 3, 6), BookingStatus::Confirmed);
    // Neither counts: one still pending, one in the future.
    s.market
        .seed(date(2025, 1, 10), date(2025, 1, 12), BookingStatus::Pending);
    s.market
        .seed(date(2025, 4, 1), date(2025, 4, 3), BookingStatus::Confirmed);

    let host = s.market.host_actor();
    let summary = s.earnings.summary(&host).await.unwrap();
    assert_eq!(summary.total_earnings, Money::from_dollars(1520));
    assert_eq!(summary.total_bookings, 3);
    assert_eq!(summary.this_month_earnings, Money::from_dollars(880));
    assert_eq!(summary.last_month_earnings, Money::from_dollars(640));
    assert_eq!(summary.percentage_change, 37.5);

    let monthly = s.earnings.monthly(&host, None).await.unwrap();
    assert_eq!(monthly.len(), 3);
    assert_eq!(monthly[0].earnings, Money::ZERO);
    assert_eq!(monthly[1].earnings, Money::from_dollars(640));
    assert_eq!(monthly[2].bookings, 2);

    let previous_year = s.earnings.monthly(&host, Some(2024)).await.unwrap();
    assert_eq!(previous_year.len(), 12);
    assert!(previous_year.iter().all(|m| m.bookings == 0));

    s.reviews
        .create_review(&s.market.guest_actor(), review_of(&s, feb, 4))
        .await
        .unwrap();
    let by_property = s.earnings.by_property(&host).await.unwrap();
    assert_eq!(by_property.len(), 1);
    assert_eq!(by_property[0].booking_count, 3);
    assert_eq!(by_property[0].average_rating, Some(4.0));
}

#[tokio::test]
async fn earnings_are_scoped_to_the_host() {
    let s = services();
    finished_stay(&s);

    let other = Actor::host(s.market.stranger.id);
    let summary = s.earnings.summary(&other).await.unwrap();
    assert_eq!(summary.total_bookings, 0);
    assert_eq!(summary.percentage_change, 0.0);
    assert!(s.earnings.by_property(&other).await.unwrap().is_empty());
}

#[tokio::test]
async fn sweep_completes_expired_confirmed_stays() {
    let s = services();
    let expired = s
        .market
        .seed(date(2024, 12, 20), date(2024, 12, 25), BookingStatus::Confirmed);
    let stale_request = s
        .market
        .seed(date(2024, 12, 1), date(2024, 12, 3), BookingStatus::Pending);
    let upcoming = s
        .market
        .seed(date(2025, 2, 1), date(2025, 2, 3), BookingStatus::Confirmed);

    let sweeper = ExpirySweeper::new(s.engine.clone(), Duration::from_secs(3600));
    assert_eq!(sweeper.run_once().await, 1);
    assert_eq!(sweeper.run_once().await, 0);

    let status = |id| s.market.store.booking(id).unwrap().status;
    assert_eq!(status(expired), BookingStatus::Completed);
    assert_eq!(status(stale_request), BookingStatus::Pending);
    assert_eq!(status(upcoming), BookingStatus::Confirmed);
}

#[tokio::test]
async fn sweep_survives_an_unavailable_store() {
    let s = services();
    let expired = s
        .market
        .seed(date(2024, 12, 20), date(2024, 12, 25), BookingStatus::Confirmed);
    let sweeper = ExpirySweeper::new(s.engine.clone(), Duration::from_secs(3600));

    s.market.store.set_unavailable(true);
    assert_eq!(sweeper.run_once().await, 0);

    s.market.store.set_unavailable(false);
    assert_eq!(sweeper.run_once().await, 1);
    assert_eq!(
        s.market.store.booking(expired).unwrap().status,
        BookingStatus::Completed
    );
}

#[tokio::test]
async fn sweeper_stops_on_shutdown() {
    let s = services();
    s.market
        .seed(date(2024, 12, 20), date(2024, 12, 25), BookingStatus::Confirmed);
    let (tx, rx) = tokio::sync::broadcast::channel(1);
    let sweeper = ExpirySweeper::new(s.engine.clone(), Duration::from_secs(3600));

    let handle = tokio::spawn(sweeper.run(rx));
    tokio::time::sleep(Duration::from_millis(50)).await;
    tx.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(s.market.store.booking_count(), 1);
}
