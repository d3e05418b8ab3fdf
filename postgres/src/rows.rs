//! Row shapes returned by the queries and their conversion into domain types.
//!
//! Every conversion is fallible: a row that breaks a domain invariant (a
//! negative price, an unknown status) surfaces as [`StoreError::Corrupt`].

use chrono::{DateTime, Utc};
use roombnb_core::earnings::{EarningRecord, PropertyRating};
use roombnb_core::error::StoreError;
use roombnb_core::favorite::FavoriteProperty;
use roombnb_core::pricing::StayDates;
use roombnb_core::review::{
    GuestReview, GuestReviewView, Rating, Review, ReviewView, ReviewedProperty, Reviewer,
};
use roombnb_core::types::{
    Booking, BookingDetails, BookingStatus, Money, Party, Property, PropertySummary,
};
use uuid::Uuid;

/// Columns selected for a bare booking.
pub(crate) const BOOKING_COLUMNS: &str = "b.id, b.property_id, b.guest_id, b.check_in, \
     b.check_out, b.number_of_guests, b.total_price_cents, b.special_requests, b.status, \
     b.created_at, b.updated_at";

/// Booking joined with its property, host and guest.
pub(crate) const DETAILS_SELECT: &str = "SELECT b.id, b.property_id, b.guest_id, b.check_in, \
     b.check_out, b.number_of_guests, b.total_price_cents, b.special_requests, b.status, \
     b.created_at, b.updated_at, \
     p.title AS property_title, p.city AS property_city, p.images[1] AS property_cover_image, \
     h.id AS host_id, h.first_name AS host_first_name, h.last_name AS host_last_name, \
     h.email AS host_email, \
     g.first_name AS guest_first_name, g.last_name AS guest_last_name, g.email AS guest_email \
     FROM bookings b \
     JOIN properties p ON p.id = b.property_id \
     JOIN users h ON h.id = p.host_id \
     JOIN users g ON g.id = b.guest_id";

fn money(cents: i64, column: &str) -> Result<Money, StoreError> {
    u64::try_from(cents)
        .map(Money::from_cents)
        .map_err(|_| StoreError::Corrupt(format!("negative {column}: {cents}")))
}

fn count(value: i32, column: &str) -> Result<u32, StoreError> {
    u32::try_from(value).map_err(|_| StoreError::Corrupt(format!("negative {column}: {value}")))
}

fn rating(value: i16) -> Result<Rating, StoreError> {
    Rating::new(i64::from(value))
        .map_err(|_| StoreError::Corrupt(format!("rating out of range: {value}")))
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct PropertyRow {
    id: Uuid,
    host_id: Uuid,
    title: String,
    city: String,
    cover_image: Option<String>,
    price_per_night_cents: i64,
    cleaning_fee_cents: i64,
    max_guests: i32,
    is_active: bool,
}

impl TryFrom<PropertyRow> for Property {
    type Error = StoreError;

    fn try_from(row: PropertyRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id.into(),
            host_id: row.host_id.into(),
            title: row.title,
            city: row.city,
            cover_image: row.cover_image,
            price_per_night: money(row.price_per_night_cents, "price_per_night_cents")?,
            cleaning_fee: money(row.cleaning_fee_cents, "cleaning_fee_cents")?,
            max_guests: count(row.max_guests, "max_guests")?,
            is_active: row.is_active,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct BookingRow {
    id: Uuid,
    property_id: Uuid,
    guest_id: Uuid,
    check_in: DateTime<Utc>,
    check_out: DateTime<Utc>,
    number_of_guests: i32,
    total_price_cents: i64,
    special_requests: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = StoreError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let dates = StayDates::new(row.check_in, row.check_out)
            .map_err(|_| StoreError::Corrupt(format!("booking {} has an empty stay", row.id)))?;
        let status: BookingStatus = row
            .status
            .parse()
            .map_err(|e| StoreError::Corrupt(format!("booking {}: {e}", row.id)))?;
        Ok(Self {
            id: row.id.into(),
            property_id: row.property_id.into(),
            guest_id: row.guest_id.into(),
            dates,
            number_of_guests: count(row.number_of_guests, "number_of_guests")?,
            total_price: money(row.total_price_cents, "total_price_cents")?,
            special_requests: row.special_requests,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct DetailsRow {
    #[sqlx(flatten)]
    booking: BookingRow,
    property_title: String,
    property_city: String,
    property_cover_image: Option<String>,
    host_id: Uuid,
    host_first_name: String,
    host_last_name: String,
    host_email: String,
    guest_first_name: String,
    guest_last_name: String,
    guest_email: String,
}

impl TryFrom<DetailsRow> for BookingDetails {
    type Error = StoreError;

    fn try_from(row: DetailsRow) -> Result<Self, Self::Error> {
        let booking = Booking::try_from(row.booking)?;
        Ok(Self {
            property: PropertySummary {
                id: booking.property_id,
                title: row.property_title,
                city: row.property_city,
                cover_image: row.property_cover_image,
            },
            host: Party {
                id: row.host_id.into(),
                first_name: row.host_first_name,
                last_name: row.host_last_name,
                email: row.host_email,
            },
            guest: Party {
                id: booking.guest_id,
                first_name: row.guest_first_name,
                last_name: row.guest_last_name,
                email: row.guest_email,
            },
            booking,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct EarningRow {
    property_id: Uuid,
    check_in: DateTime<Utc>,
    total_price_cents: i64,
}

impl TryFrom<EarningRow> for EarningRecord {
    type Error = StoreError;

    fn try_from(row: EarningRow) -> Result<Self, Self::Error> {
        Ok(Self {
            property_id: row.property_id.into(),
            check_in: row.check_in,
            total_price: money(row.total_price_cents, "total_price_cents")?,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct RatingRow {
    property_id: Uuid,
    rating: i16,
}

impl TryFrom<RatingRow> for PropertyRating {
    type Error = StoreError;

    fn try_from(row: RatingRow) -> Result<Self, Self::Error> {
        Ok(Self {
            property_id: row.property_id.into(),
            rating: rating(row.rating)?,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ReviewRow {
    id: Uuid,
    booking_id: Uuid,
    property_id: Uuid,
    user_id: Uuid,
    rating: i16,
    comment: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ReviewRow> for Review {
    type Error = StoreError;

    fn try_from(row: ReviewRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id.into(),
            booking_id: row.booking_id.into(),
            property_id: row.property_id.into(),
            user_id: row.user_id.into(),
            rating: rating(row.rating)?,
            comment: row.comment,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ReviewViewRow {
    #[sqlx(flatten)]
    review: ReviewRow,
    reviewer_first_name: String,
    reviewer_last_name: String,
}

impl TryFrom<ReviewViewRow> for ReviewView {
    type Error = StoreError;

    fn try_from(row: ReviewViewRow) -> Result<Self, Self::Error> {
        let review = Review::try_from(row.review)?;
        Ok(Self {
            user: Reviewer {
                id: review.user_id,
                first_name: row.reviewer_first_name,
                last_name: row.reviewer_last_name,
            },
            review,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct GuestReviewRow {
    id: Uuid,
    booking_id: Uuid,
    guest_id: Uuid,
    host_id: Uuid,
    rating: i16,
    comment: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<GuestReviewRow> for GuestReview {
    type Error = StoreError;

    fn try_from(row: GuestReviewRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id.into(),
            booking_id: row.booking_id.into(),
            guest_id: row.guest_id.into(),
            host_id: row.host_id.into(),
            rating: rating(row.rating)?,
            comment: row.comment,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct GuestReviewViewRow {
    #[sqlx(flatten)]
    review: GuestReviewRow,
    host_first_name: String,
    host_last_name: String,
    guest_first_name: String,
    guest_last_name: String,
    property_id: Uuid,
    property_title: String,
}

impl TryFrom<GuestReviewViewRow> for GuestReviewView {
    type Error = StoreError;

    fn try_from(row: GuestReviewViewRow) -> Result<Self, Self::Error> {
        let review = GuestReview::try_from(row.review)?;
        Ok(Self {
            host: Reviewer {
                id: review.host_id,
                first_name: row.host_first_name,
                last_name: row.host_last_name,
            },
            guest: Reviewer {
                id: review.guest_id,
                first_name: row.guest_first_name,
                last_name: row.guest_last_name,
            },
            property: ReviewedProperty {
                id: row.property_id.into(),
                title: row.property_title,
            },
            review,
        })
    }
}

/// A saved property with its host and review aggregate.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct FavoriteRow {
    id: Uuid,
    title: String,
    city: String,
    cover_image: Option<String>,
    price_per_night_cents: i64,
    max_guests: i32,
    host_id: Uuid,
    host_first_name: String,
    host_last_name: String,
    average_rating: Option<f64>,
    review_count: i64,
    favorited_at: DateTime<Utc>,
}

impl TryFrom<FavoriteRow> for FavoriteProperty {
    type Error = StoreError;

    fn try_from(row: FavoriteRow) -> Result<Self, Self::Error> {
        Ok(Self {
            property: PropertySummary {
                id: row.id.into(),
                title: row.title,
                city: row.city,
                cover_image: row.cover_image,
            },
            price_per_night: money(row.price_per_night_cents, "price_per_night_cents")?,
            max_guests: count(row.max_guests, "max_guests")?,
            host: Reviewer {
                id: row.host_id.into(),
                first_name: row.host_first_name,
                last_name: row.host_last_name,
            },
            average_rating: row.average_rating,
            review_count: u64::try_from(row.review_count).map_err(|_| {
                StoreError::Corrupt(format!("negative review_count: {}", row.review_count))
            })?,
            favorited_at: row.favorited_at,
        })
    }
}

/// Converts every row, failing on the first corrupt one.
pub(crate) fn convert_all<R, T>(rows: Vec<R>) -> Result<Vec<T>, StoreError>
where
    T: TryFrom<R, Error = StoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}
