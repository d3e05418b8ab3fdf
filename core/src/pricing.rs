//! Stay dates, night counting and quoting.

use crate::error::BookingError;
use crate::types::{Money, Property};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Whole days in `length`, with any remainder counted as one more day.
///
/// Zero and negative lengths count as zero days.
#[must_use]
#[allow(clippy::cast_sign_loss)]
pub fn days_rounded_up(length: TimeDelta) -> u64 {
    if length <= TimeDelta::zero() {
        return 0;
    }
    let whole_days = length.num_days();
    // Any remainder, down to a nanosecond, starts another day.
    let partial = length - TimeDelta::days(whole_days) > TimeDelta::zero();
    (whole_days + i64::from(partial)) as u64
}

/// A validated `[check_in, check_out]` interval with `check_in < check_out`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StayDates {
    check_in: DateTime<Utc>,
    check_out: DateTime<Utc>,
}

impl StayDates {
    /// Validates and builds a stay.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::InvalidRange`] unless `check_in < check_out`.
    pub fn new(check_in: DateTime<Utc>, check_out: DateTime<Utc>) -> Result<Self, BookingError> {
        if check_in >= check_out {
            return Err(BookingError::InvalidRange);
        }
        Ok(Self { check_in, check_out })
    }

    /// Check-in instant
    #[must_use]
    pub const fn check_in(&self) -> DateTime<Utc> {
        self.check_in
    }

    /// Check-out instant
    #[must_use]
    pub const fn check_out(&self) -> DateTime<Utc> {
        self.check_out
    }

    /// Number of nights, counting any partial day as a full night.
    #[must_use]
    pub fn nights(&self) -> u64 {
        days_rounded_up(self.check_out - self.check_in).max(1)
    }

    /// Inclusive overlap: a stay ending on the day another begins conflicts.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.check_in <= other.check_out && self.check_out >= other.check_in
    }

    /// Whether the stay has checked out before `now`.
    #[must_use]
    pub fn is_over(&self, now: DateTime<Utc>) -> bool {
        self.check_out < now
    }
}

/// Total price for a stay: `nights * price_per_night + cleaning_fee`.
#[must_use]
pub fn quote(property: &Property, dates: &StayDates) -> Money {
    property
        .price_per_night
        .times(dates.nights())
        .plus(property.cleaning_fee)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{PropertyId, UserId};
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, d, 0, 0, 0).unwrap()
    }

    fn property() -> Property {
        Property {
            id: PropertyId::new(),
            host_id: UserId::new(),
            title: "Lakeside Cabin".to_string(),
            city: "Tahoe".to_string(),
            cover_image: None,
            price_per_night: Money::from_dollars(200),
            cleaning_fee: Money::from_dollars(40),
            max_guests: 4,
            is_active: true,
        }
    }

    #[test]
    fn rejects_empty_and_inverted_ranges() {
        assert_eq!(StayDates::new(day(4), day(4)), Err(BookingError::InvalidRange));
        assert_eq!(StayDates::new(day(4), day(1)), Err(BookingError::InvalidRange));
    }

    #[test]
    fn three_night_quote() {
        let dates = StayDates::new(day(1), day(4)).unwrap();
        assert_eq!(dates.nights(), 3);
        assert_eq!(quote(&property(), &dates), Money::from_dollars(640));
    }

    #[test]
    fn partial_day_rounds_up() {
        let dates = StayDates::new(day(1), day(2) + Duration::hours(3)).unwrap();
        assert_eq!(dates.nights(), 2);

        let short = StayDates::new(day(1), day(1) + Duration::hours(1)).unwrap();
        assert_eq!(short.nights(), 1);
    }

    #[test]
    fn sub_second_remainder_rounds_up() {
        let half_second = StayDates::new(day(1), day(2) + Duration::milliseconds(500)).unwrap();
        assert_eq!(half_second.nights(), 2);

        let one_nano = StayDates::new(day(1), day(3) + Duration::nanoseconds(1)).unwrap();
        assert_eq!(one_nano.nights(), 3);

        let exact = StayDates::new(day(1), day(3)).unwrap();
        assert_eq!(exact.nights(), 2);
    }

    #[test]
    fn same_day_turnover_conflicts() {
        let first = StayDates::new(day(1), day(4)).unwrap();
        let back_to_back = StayDates::new(day(4), day(6)).unwrap();
        let later = StayDates::new(day(5), day(7)).unwrap();

        assert!(first.overlaps(&back_to_back));
        assert!(!first.overlaps(&later));
    }

    proptest! {
        #[test]
        fn overlap_is_symmetric(a in 0i64..60, la in 1i64..15, b in 0i64..60, lb in 1i64..15) {
            let base = day(1);
            let x = StayDates::new(base + Duration::days(a), base + Duration::days(a + la)).unwrap();
            let y = StayDates::new(base + Duration::days(b), base + Duration::days(b + lb)).unwrap();
            prop_assert_eq!(x.overlaps(&y), y.overlaps(&x));
            prop_assert!(x.overlaps(&x));
        }

        #[test]
        fn quote_matches_formula(nights in 1u64..60, price in 0u64..100_000, fee in 0u64..50_000) {
            let mut p = property();
            p.price_per_night = Money::from_cents(price);
            p.cleaning_fee = Money::from_cents(fee);
            #[allow(clippy::cast_possible_wrap)]
            let dates = StayDates::new(day(1), day(1) + Duration::days(nights as i64)).unwrap();
            prop_assert_eq!(dates.nights(), nights);
            prop_assert_eq!(quote(&p, &dates).cents(), nights * price + fee);
        }
    }
}
