//! Persistence collaborator traits.
//!
//! The engine relies on the store for atomicity: inserts re-check overlap in
//! the same critical section as the write, and status updates are
//! compare-and-set against the statuses the caller expects.
//!
//! These traits use explicit `Pin<Box<dyn Future>>` returns instead of
//! `async fn` so they stay dyn-compatible and can be shared as `Arc<dyn _>`.

use crate::earnings::{EarningRecord, PropertyRating};
use crate::error::StoreError;
use crate::favorite::FavoriteProperty;
use crate::pricing::StayDates;
use crate::review::{GuestReview, GuestReviewView, Review, ReviewView};
use crate::types::{
    Booking, BookingDetails, BookingId, BookingStatus, GuestReviewId, Property, PropertyId,
    ReviewId, UserId,
};
use chrono::{DateTime, Utc};
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by every store method.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Read access to listed properties.
pub trait PropertyDirectory: Send + Sync {
    /// Looks up a property regardless of its active flag.
    fn find_property(&self, id: PropertyId) -> StoreFuture<'_, Option<Property>>;

    /// All properties owned by `host_id`.
    fn host_properties(&self, host_id: UserId) -> StoreFuture<'_, Vec<Property>>;
}

/// Booking persistence.
pub trait BookingStore: Send + Sync {
    /// Booking with property, host and guest joined in.
    fn find_details(&self, id: BookingId) -> StoreFuture<'_, Option<BookingDetails>>;

    /// Pending or confirmed bookings on `property_id` overlapping `dates`
    /// (inclusive on both ends).
    fn find_overlapping(
        &self,
        property_id: PropertyId,
        dates: StayDates,
    ) -> StoreFuture<'_, Vec<Booking>>;

    /// Inserts a new booking.
    ///
    /// Implementations must re-check for overlapping pending or confirmed
    /// bookings atomically with the insert and fail with
    /// [`StoreError::Overlap`] if one exists.
    fn insert_booking(&self, booking: Booking) -> StoreFuture<'_, ()>;

    /// Sets `next` on the booking if its status is one of `expected`.
    ///
    /// Returns the updated booking, or `None` if the booking is missing or its
    /// status no longer matches.
    fn update_status(
        &self,
        id: BookingId,
        expected: &'static [BookingStatus],
        next: BookingStatus,
        at: DateTime<Utc>,
    ) -> StoreFuture<'_, Option<Booking>>;

    /// Sets `next` on every booking in one of `expected` whose
    /// `check_out < now`, in one statement. Returns how many rows changed.
    fn complete_expired(
        &self,
        expected: &'static [BookingStatus],
        next: BookingStatus,
        now: DateTime<Utc>,
    ) -> StoreFuture<'_, u64>;

    /// Bookings made by `guest_id`, newest first.
    fn list_for_guest(&self, guest_id: UserId) -> StoreFuture<'_, Vec<BookingDetails>>;

    /// Bookings on properties owned by `host_id`, newest first.
    fn list_for_host(&self, host_id: UserId) -> StoreFuture<'_, Vec<BookingDetails>>;

    /// Completed bookings, and confirmed bookings with `check_out < now`, on
    /// properties owned by `host_id`.
    fn earning_records(
        &self,
        host_id: UserId,
        now: DateTime<Utc>,
    ) -> StoreFuture<'_, Vec<EarningRecord>>;
}

/// Review and guest review persistence.
pub trait ReviewStore: Send + Sync {
    /// Review by ID.
    fn find_review(&self, id: ReviewId) -> StoreFuture<'_, Option<Review>>;

    /// Review with its author.
    fn find_review_view(&self, id: ReviewId) -> StoreFuture<'_, Option<ReviewView>>;

    /// Whether the booking already has a property review.
    fn booking_has_review(&self, booking_id: BookingId) -> StoreFuture<'_, bool>;

    /// Inserts a review; [`StoreError::Duplicate`] if the booking has one.
    fn insert_review(&self, review: Review) -> StoreFuture<'_, ()>;

    /// Overwrites rating, comment and `updated_at`.
    fn update_review(&self, review: Review) -> StoreFuture<'_, ()>;

    /// Removes a review.
    fn delete_review(&self, id: ReviewId) -> StoreFuture<'_, ()>;

    /// Reviews written by `user_id`, newest first.
    fn reviews_by_user(&self, user_id: UserId) -> StoreFuture<'_, Vec<Review>>;

    /// Reviews of a property with their authors, newest first.
    fn property_reviews(&self, property_id: PropertyId) -> StoreFuture<'_, Vec<ReviewView>>;

    /// Every rating left on properties owned by `host_id`.
    fn host_ratings(&self, host_id: UserId) -> StoreFuture<'_, Vec<PropertyRating>>;

    /// Whether the host already reviewed the guest of this booking.
    fn booking_has_guest_review(&self, booking_id: BookingId) -> StoreFuture<'_, bool>;

    /// Inserts a guest review; [`StoreError::Duplicate`] if the booking has one.
    fn insert_guest_review(&self, review: GuestReview) -> StoreFuture<'_, ()>;

    /// Guest review with author and property.
    fn find_guest_review_view(
        &self,
        id: GuestReviewId,
    ) -> StoreFuture<'_, Option<GuestReviewView>>;

    /// Reviews left about `guest_id`, newest first.
    fn guest_reviews(&self, guest_id: UserId) -> StoreFuture<'_, Vec<GuestReviewView>>;

    /// Guest review by ID.
    fn find_guest_review(&self, id: GuestReviewId) -> StoreFuture<'_, Option<GuestReview>>;

    /// The guest review left on a booking, if any.
    fn guest_review_for_booking(
        &self,
        booking_id: BookingId,
    ) -> StoreFuture<'_, Option<GuestReviewView>>;

    /// Guest reviews written by `host_id`, newest first.
    fn host_guest_reviews(&self, host_id: UserId) -> StoreFuture<'_, Vec<GuestReviewView>>;

    /// Overwrites rating and comment.
    fn update_guest_review(&self, review: GuestReview) -> StoreFuture<'_, ()>;

    /// Removes a guest review.
    fn delete_guest_review(&self, id: GuestReviewId) -> StoreFuture<'_, ()>;
}

/// Saved properties.
pub trait FavoriteStore: Send + Sync {
    /// Saves a property for a user; [`StoreError::Duplicate`] if already saved.
    fn add_favorite(
        &self,
        user_id: UserId,
        property_id: PropertyId,
        at: DateTime<Utc>,
    ) -> StoreFuture<'_, ()>;

    /// Forgets a saved property. Returns whether it was saved.
    fn remove_favorite(&self, user_id: UserId, property_id: PropertyId) -> StoreFuture<'_, bool>;

    /// Whether the user saved the property.
    fn is_favorite(&self, user_id: UserId, property_id: PropertyId) -> StoreFuture<'_, bool>;

    /// Saved properties with host and rating, most recently saved first.
    fn favorites(&self, user_id: UserId) -> StoreFuture<'_, Vec<FavoriteProperty>>;

    /// How many properties the user saved.
    fn favorite_count(&self, user_id: UserId) -> StoreFuture<'_, u64>;
}

/// Readiness check for the backing store.
pub trait HealthCheck: Send + Sync {
    /// Succeeds when the store can serve queries.
    fn ping(&self) -> StoreFuture<'_, ()>;
}
