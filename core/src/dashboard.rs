//! Guest and host dashboards.
//!
//! Both are views over bookings the caller already loaded: each list is
//! filtered, ordered and cut to [`DASHBOARD_LIST_LIMIT`] entries here.

use crate::earnings::{self, EarningRecord, PropertyRating};
use crate::lifecycle::stay_finished;
use crate::review::mean_rating;
use crate::types::{BookingDetails, BookingId, BookingStatus, Money, Property};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;

/// Longest list shown in any dashboard section.
pub const DASHBOARD_LIST_LIMIT: usize = 5;

/// What a guest sees on their dashboard.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestDashboard {
    /// Pending or confirmed stays that have not begun, soonest first
    pub upcoming_trips: Vec<BookingDetails>,
    /// Finished stays, most recent checkout first
    pub past_trips: Vec<BookingDetails>,
    /// Finished stays the guest has not reviewed yet
    pub pending_reviews: Vec<BookingDetails>,
    /// Saved properties
    pub favorite_count: u64,
    /// Confirmed and completed bookings
    pub total_trips: u64,
}

/// What a host sees on their dashboard.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostDashboard {
    /// Every listing the host owns
    pub total_listings: u64,
    /// Listings open for booking
    pub active_listings: u64,
    /// Requests waiting on the host, newest first
    pub pending_bookings: Vec<BookingDetails>,
    /// Confirmed stays that have not begun, soonest first
    pub upcoming_bookings: Vec<BookingDetails>,
    /// Finished stays, most recent checkout first
    pub recent_bookings: Vec<BookingDetails>,
    /// Sum over all finished stays
    pub total_earnings: Money,
    /// Finished stays that began this calendar month
    pub this_month_earnings: Money,
    /// Finished stays whose guest the host has not reviewed yet
    pub pending_guest_reviews: Vec<BookingDetails>,
    /// Mean property rating, one decimal; `None` without reviews
    pub average_rating: Option<f64>,
    /// Reviews across all listings
    pub total_reviews: u64,
}

fn first<K: Ord>(
    bookings: &[BookingDetails],
    keep: impl Fn(&BookingDetails) -> bool,
    order: impl Fn(&BookingDetails) -> K,
) -> Vec<BookingDetails> {
    let mut rows: Vec<BookingDetails> = bookings.iter().filter(|b| keep(b)).cloned().collect();
    rows.sort_by_key(order);
    rows.truncate(DASHBOARD_LIST_LIMIT);
    rows
}

fn finished(details: &BookingDetails, now: DateTime<Utc>) -> bool {
    stay_finished(details.status(), &details.booking.dates, now)
}

fn not_started(details: &BookingDetails, now: DateTime<Utc>) -> bool {
    details.booking.dates.check_in() >= now
}

fn latest_checkout(details: &BookingDetails) -> std::cmp::Reverse<DateTime<Utc>> {
    std::cmp::Reverse(details.booking.dates.check_out())
}

fn soonest_check_in(details: &BookingDetails) -> DateTime<Utc> {
    details.booking.dates.check_in()
}

/// Builds a guest's dashboard from all of their bookings.
///
/// `reviewed` holds the bookings the guest already reviewed.
#[must_use]
pub fn guest_dashboard(
    bookings: &[BookingDetails],
    reviewed: &HashSet<BookingId>,
    favorite_count: u64,
    now: DateTime<Utc>,
) -> GuestDashboard {
    GuestDashboard {
        upcoming_trips: first(
            bookings,
            |b| b.status().holds_dates() && not_started(b, now),
            soonest_check_in,
        ),
        past_trips: first(bookings, |b| finished(b, now), latest_checkout),
        pending_reviews: first(
            bookings,
            |b| finished(b, now) && !reviewed.contains(&b.id()),
            latest_checkout,
        ),
        favorite_count,
        total_trips: bookings
            .iter()
            .filter(|b| matches!(b.status(), BookingStatus::Confirmed | BookingStatus::Completed))
            .count() as u64,
    }
}

/// Builds a host's dashboard from their listings and every booking on them.
///
/// `guest_reviewed` holds the bookings whose guest the host already reviewed.
#[must_use]
pub fn host_dashboard(
    properties: &[Property],
    bookings: &[BookingDetails],
    guest_reviewed: &HashSet<BookingId>,
    ratings: &[PropertyRating],
    now: DateTime<Utc>,
) -> HostDashboard {
    let records: Vec<EarningRecord> = bookings
        .iter()
        .filter(|b| finished(b, now))
        .map(|b| EarningRecord {
            property_id: b.booking.property_id,
            check_in: b.booking.dates.check_in(),
            total_price: b.booking.total_price,
        })
        .collect();
    let summary = earnings::summarize(&records, now);

    HostDashboard {
        total_listings: properties.len() as u64,
        active_listings: properties.iter().filter(|p| p.is_active).count() as u64,
        pending_bookings: first(
            bookings,
            |b| b.status() == BookingStatus::Pending,
            |b| std::cmp::Reverse(b.booking.created_at),
        ),
        upcoming_bookings: first(
            bookings,
            |b| b.status() == BookingStatus::Confirmed && not_started(b, now),
            soonest_check_in,
        ),
        recent_bookings: first(bookings, |b| finished(b, now), latest_checkout),
        total_earnings: summary.total_earnings,
        this_month_earnings: summary.this_month_earnings,
        pending_guest_reviews: first(
            bookings,
            |b| finished(b, now) && !guest_reviewed.contains(&b.id()),
            latest_checkout,
        ),
        average_rating: mean_rating(ratings.iter().map(|r| r.rating)),
        total_reviews: ratings.len() as u64,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::pricing::StayDates;
    use crate::review::Rating;
    use crate::types::{Booking, Party, PropertyId, UserId};
    use chrono::TimeZone;

    fn day(month: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, month, d, 0, 0, 0).unwrap()
    }

    fn party(name: &str) -> Party {
        Party {
            id: UserId::new(),
            first_name: name.to_string(),
            last_name: "Tester".to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
        }
    }

    fn listing(is_active: bool) -> Property {
        Property {
            id: PropertyId::new(),
            host_id: UserId::new(),
            title: "Harbour Flat".to_string(),
            city: "Porto".to_string(),
            cover_image: None,
            price_per_night: Money::from_dollars(100),
            cleaning_fee: Money::ZERO,
            max_guests: 2,
            is_active,
        }
    }

    struct Stays {
        property: Property,
        host: Party,
        guest: Party,
    }

    impl Stays {
        fn new() -> Self {
            Self {
                property: listing(true),
                host: party("Hana"),
                guest: party("Gus"),
            }
        }

        fn stay(
            &self,
            check_in: DateTime<Utc>,
            check_out: DateTime<Utc>,
            status: BookingStatus,
        ) -> BookingDetails {
            BookingDetails {
                booking: Booking {
                    id: BookingId::new(),
                    property_id: self.property.id,
                    guest_id: self.guest.id,
                    dates: StayDates::new(check_in, check_out).unwrap(),
                    number_of_guests: 2,
                    total_price: Money::from_dollars(300),
                    special_requests: None,
                    status,
                    created_at: check_in - chrono::TimeDelta::days(30),
                    updated_at: check_in - chrono::TimeDelta::days(30),
                },
                property: self.property.summary(),
                host: self.host.clone(),
                guest: self.guest.clone(),
            }
        }
    }

    #[test]
    fn guest_sections_split_on_now() {
        let s = Stays::new();
        let now = day(3, 15);
        let soon = s.stay(day(3, 20), day(3, 22), BookingStatus::Pending);
        let later = s.stay(day(4, 1), day(4, 3), BookingStatus::Confirmed);
        let cancelled = s.stay(day(3, 25), day(3, 27), BookingStatus::Cancelled);
        let swept = s.stay(day(2, 1), day(2, 3), BookingStatus::Completed);
        let unswept = s.stay(day(3, 1), day(3, 4), BookingStatus::Confirmed);
        let bookings = vec![
            later.clone(),
            cancelled,
            swept.clone(),
            soon.clone(),
            unswept.clone(),
        ];
        let reviewed = HashSet::from([swept.id()]);

        let dashboard = guest_dashboard(&bookings, &reviewed, 3, now);
        let ids = |rows: &[BookingDetails]| rows.iter().map(BookingDetails::id).collect::<Vec<_>>();
        assert_eq!(ids(&dashboard.upcoming_trips), vec![soon.id(), later.id()]);
        assert_eq!(ids(&dashboard.past_trips), vec![unswept.id(), swept.id()]);
        assert_eq!(ids(&dashboard.pending_reviews), vec![unswept.id()]);
        assert_eq!(dashboard.favorite_count, 3);
        assert_eq!(dashboard.total_trips, 3);
    }

    #[test]
    fn lists_are_capped() {
        let s = Stays::new();
        let bookings: Vec<BookingDetails> = (1..=8)
            .map(|d| s.stay(day(1, d), day(1, d + 1), BookingStatus::Completed))
            .collect();

        let dashboard = guest_dashboard(&bookings, &HashSet::new(), 0, day(3, 1));
        assert_eq!(dashboard.past_trips.len(), DASHBOARD_LIST_LIMIT);
        assert_eq!(dashboard.past_trips[0].booking.dates.check_in(), day(1, 8));
        assert_eq!(dashboard.total_trips, 8);
    }

    #[test]
    fn host_sections_and_headline() {
        let s = Stays::new();
        let now = day(3, 15);
        let request = s.stay(day(4, 10), day(4, 12), BookingStatus::Pending);
        let upcoming = s.stay(day(3, 20), day(3, 22), BookingStatus::Confirmed);
        let this_month = s.stay(day(3, 2), day(3, 5), BookingStatus::Confirmed);
        let last_month = s.stay(day(2, 2), day(2, 5), BookingStatus::Completed);
        let rejected = s.stay(day(3, 6), day(3, 8), BookingStatus::Rejected);
        let bookings = vec![
            request.clone(),
            upcoming.clone(),
            this_month.clone(),
            last_month.clone(),
            rejected,
        ];
        let properties = [s.property.clone(), listing(false)];
        let ratings = [
            PropertyRating { property_id: s.property.id, rating: Rating::new(5).unwrap() },
            PropertyRating { property_id: s.property.id, rating: Rating::new(4).unwrap() },
        ];
        let guest_reviewed = HashSet::from([last_month.id()]);

        let dashboard = host_dashboard(&properties, &bookings, &guest_reviewed, &ratings, now);
        assert_eq!(dashboard.total_listings, 2);
        assert_eq!(dashboard.active_listings, 1);
        assert_eq!(dashboard.pending_bookings.len(), 1);
        assert_eq!(dashboard.pending_bookings[0].id(), request.id());
        assert_eq!(dashboard.upcoming_bookings.len(), 1);
        assert_eq!(dashboard.upcoming_bookings[0].id(), upcoming.id());
        assert_eq!(dashboard.recent_bookings.len(), 2);
        assert_eq!(dashboard.recent_bookings[0].id(), this_month.id());
        assert_eq!(dashboard.total_earnings, Money::from_dollars(600));
        assert_eq!(dashboard.this_month_earnings, Money::from_dollars(300));
        assert_eq!(dashboard.pending_guest_reviews.len(), 1);
        assert_eq!(dashboard.pending_guest_reviews[0].id(), this_month.id());
        assert_eq!(dashboard.average_rating, Some(4.5));
        assert_eq!(dashboard.total_reviews, 2);
    }

    #[test]
    fn empty_host() {
        let dashboard = host_dashboard(&[], &[], &HashSet::new(), &[], day(3, 15));
        assert_eq!(dashboard.total_listings, 0);
        assert_eq!(dashboard.total_earnings, Money::ZERO);
        assert_eq!(dashboard.average_rating, None);
    }
}
