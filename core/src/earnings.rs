//! Host earnings aggregation.
//!
//! The store hands over the host's earning bookings (completed, or confirmed
//! with checkout in the past); everything here is arithmetic over that list.

use crate::review::{Rating, mean_rating};
use crate::pricing::days_rounded_up;
use crate::types::{Booking, BookingStatus, Money, Property, PropertyId};
use chrono::{DateTime, Datelike, NaiveDate, TimeDelta, TimeZone, Utc};
use serde::Serialize;

/// One booking that counts towards a host's earnings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EarningRecord {
    /// Booked property
    pub property_id: PropertyId,
    /// Check-in; earnings are bucketed by the month the stay began
    pub check_in: DateTime<Utc>,
    /// Price fixed at booking time
    pub total_price: Money,
}

/// A single rating left on one of the host's properties.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PropertyRating {
    /// Reviewed property
    pub property_id: PropertyId,
    /// Stars
    pub rating: Rating,
}

/// Dashboard headline numbers.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningsSummary {
    /// Sum over all earning bookings
    pub total_earnings: Money,
    /// Number of earning bookings
    pub total_bookings: u64,
    /// Same as `total_bookings`; kept for client compatibility
    pub completed_bookings: u64,
    /// `total_earnings / total_bookings`, zero without bookings
    pub average_booking_value: Money,
    /// Earnings for stays that began this calendar month
    pub this_month_earnings: Money,
    /// Earnings for stays that began last calendar month
    pub last_month_earnings: Money,
    /// Month-over-month change in percent, one decimal
    pub percentage_change: f64,
}

/// Earnings for one calendar month.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyEarnings {
    /// 1 = January
    pub month: u32,
    /// Calendar year
    pub year: i32,
    /// Sum of stays that began in the month
    pub earnings: Money,
    /// Number of stays that began in the month
    pub bookings: u64,
}

/// Earnings for one property.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyEarnings {
    /// Property ID
    pub property_id: PropertyId,
    /// Listing title
    pub property_title: String,
    /// Cover image, empty when the listing has none
    pub property_image: String,
    /// Sum of earning bookings
    pub total_earnings: Money,
    /// Number of earning bookings
    pub booking_count: u64,
    /// Mean review rating, one decimal; `None` without reviews
    pub average_rating: Option<f64>,
}

/// Look-back window for occupancy when the caller names none.
pub const DEFAULT_OCCUPANCY_DAYS: u32 = 90;

/// How much of a recent window one property spent booked.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyOccupancy {
    /// Property ID
    pub property_id: PropertyId,
    /// Listing title
    pub property_title: String,
    /// Booked share of the window in percent, one decimal, at most 100
    pub occupancy_rate: f64,
    /// Booked days inside the window, partial days rounded up per stay
    pub total_days_booked: u64,
    /// Window length in days
    pub period_days: u32,
}

fn month_start(year: i32, month: u32) -> Option<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

const fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 { (year + 1, 1) } else { (year, month + 1) }
}

const fn previous_month(year: i32, month: u32) -> (i32, u32) {
    if month == 1 { (year - 1, 12) } else { (year, month - 1) }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn total(records: impl Iterator<Item = EarningRecord>) -> (Money, u64) {
    records.fold((Money::ZERO, 0), |(sum, count), r| {
        (sum.plus(r.total_price), count + 1)
    })
}

fn within(
    records: &[EarningRecord],
    from: Option<DateTime<Utc>>,
    until: Option<DateTime<Utc>>,
) -> impl Iterator<Item = EarningRecord> + '_ {
    records.iter().copied().filter(move |r| {
        from.is_none_or(|start| r.check_in >= start) && until.is_none_or(|end| r.check_in < end)
    })
}

/// Builds the dashboard summary as of `now`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn summarize(records: &[EarningRecord], now: DateTime<Utc>) -> EarningsSummary {
    let (total_earnings, total_bookings) = total(records.iter().copied());

    let this_start = month_start(now.year(), now.month());
    let (py, pm) = previous_month(now.year(), now.month());
    let last_start = month_start(py, pm);

    let (this_month, _) = total(within(records, this_start, None));
    let (last_month, _) = total(within(records, last_start, this_start));

    let percentage_change = if last_month.cents() > 0 {
        let delta = this_month.cents() as f64 - last_month.cents() as f64;
        round_one_decimal(delta / last_month.cents() as f64 * 100.0)
    } else if this_month.cents() > 0 {
        100.0
    } else {
        0.0
    };

    EarningsSummary {
        total_earnings,
        total_bookings,
        completed_bookings: total_bookings,
        average_booking_value: total_earnings.split(total_bookings),
        this_month_earnings: this_month,
        last_month_earnings: last_month,
        percentage_change,
    }
}

/// One entry per month of `year` that has already started.
#[must_use]
pub fn monthly(records: &[EarningRecord], year: i32, now: DateTime<Utc>) -> Vec<MonthlyEarnings> {
    (1..=12)
        .filter_map(|month| {
            let start = month_start(year, month)?;
            if start > now {
                return None;
            }
            let (ny, nm) = next_month(year, month);
            let (earnings, bookings) = total(within(records, Some(start), month_start(ny, nm)));
            Some(MonthlyEarnings {
                month,
                year,
                earnings,
                bookings,
            })
        })
        .collect()
}

/// Earnings per property, highest first. Properties without bookings are
/// included with zero earnings.
#[must_use]
pub fn by_property(
    properties: &[Property],
    records: &[EarningRecord],
    ratings: &[PropertyRating],
) -> Vec<PropertyEarnings> {
    let mut rows: Vec<PropertyEarnings> = properties
        .iter()
        .map(|property| {
            let (total_earnings, booking_count) = total(
                records
                    .iter()
                    .copied()
                    .filter(|r| r.property_id == property.id),
            );
            let average_rating = mean_rating(
                ratings
                    .iter()
                    .filter(|r| r.property_id == property.id)
                    .map(|r| r.rating),
            );

            PropertyEarnings {
                property_id: property.id,
                property_title: property.title.clone(),
                property_image: property.cover_image.clone().unwrap_or_default(),
                total_earnings,
                booking_count,
                average_rating,
            }
        })
        .collect();

    rows.sort_by(|a, b| b.total_earnings.cmp(&a.total_earnings));
    rows
}

/// Occupancy of every property over the `days` before `now`.
///
/// Confirmed and completed stays count, clipped to the window. A zero-day
/// window reports zero occupancy.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn occupancy(
    properties: &[Property],
    bookings: &[Booking],
    now: DateTime<Utc>,
    days: u32,
) -> Vec<PropertyOccupancy> {
    let window_start = now
        .checked_sub_signed(TimeDelta::days(i64::from(days)))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);

    properties
        .iter()
        .map(|property| {
            let total_days_booked = bookings
                .iter()
                .filter(|b| {
                    b.property_id == property.id
                        && matches!(b.status, BookingStatus::Confirmed | BookingStatus::Completed)
                })
                .map(|b| {
                    let from = b.dates.check_in().max(window_start);
                    let until = b.dates.check_out().min(now);
                    days_rounded_up(until - from)
                })
                .sum::<u64>();

            let occupancy_rate = if days == 0 {
                0.0
            } else {
                round_one_decimal(total_days_booked as f64 / f64::from(days) * 100.0).min(100.0)
            };

            PropertyOccupancy {
                property_id: property.id,
                property_title: property.title.clone(),
                occupancy_rate,
                total_days_booked,
                period_days: days,
            }
        })
        .collect()
}
