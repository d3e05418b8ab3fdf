//! In-memory store for fast, deterministic engine tests.
//!
//! [`InMemoryStore`] implements every persistence trait over one shared
//! `RwLock`, so the overlap re-check and the insert happen under a single
//! write guard, the same guarantee the PostgreSQL store gets from its
//! advisory lock. [`RacingStore`] wraps it to replay lost races on demand.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Lock poisoning only follows a test panic

use roombnb_core::earnings::{EarningRecord, PropertyRating};
use roombnb_core::error::StoreError;
use roombnb_core::favorite::FavoriteProperty;
use roombnb_core::lifecycle::stay_finished;
use roombnb_core::pricing::StayDates;
use roombnb_core::review::{
    GuestReview, GuestReviewView, Review, ReviewView, ReviewedProperty, Reviewer, mean_rating,
};
use roombnb_core::store::{
    BookingStore, FavoriteStore, HealthCheck, PropertyDirectory, ReviewStore, StoreFuture,
};
use roombnb_core::types::{
    Booking, BookingDetails, BookingId, BookingStatus, GuestReviewId, Party, Property,
    PropertyId, ReviewId, UserId,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<UserId, Party>,
    properties: HashMap<PropertyId, Property>,
    /// Property IDs in the order they were first listed
    listed: Vec<PropertyId>,
    bookings: HashMap<BookingId, Booking>,
    reviews: HashMap<ReviewId, Review>,
    guest_reviews: HashMap<GuestReviewId, GuestReview>,
    favorites: HashMap<(UserId, PropertyId), DateTime<Utc>>,
}

impl Tables {
    fn details(&self, booking: &Booking) -> Result<BookingDetails, StoreError> {
        let property = self
            .properties
            .get(&booking.property_id)
            .ok_or_else(|| StoreError::Corrupt(format!("booking {} has no property", booking.id)))?;
        let host = self.party(property.host_id)?;
        let guest = self.party(booking.guest_id)?;
        Ok(BookingDetails {
            booking: booking.clone(),
            property: property.summary(),
            host,
            guest,
        })
    }

    fn party(&self, id: UserId) -> Result<Party, StoreError> {
        self.users
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::Corrupt(format!("unknown user {id}")))
    }

    fn reviewer(&self, id: UserId) -> Result<Reviewer, StoreError> {
        let party = self.party(id)?;
        Ok(Reviewer {
            id: party.id,
            first_name: party.first_name,
            last_name: party.last_name,
        })
    }

    fn host_of(&self, property_id: PropertyId) -> Option<UserId> {
        self.properties.get(&property_id).map(|p| p.host_id)
    }

    fn overlapping(&self, property_id: PropertyId, dates: &StayDates) -> Vec<Booking> {
        self.bookings
            .values()
            .filter(|b| {
                b.property_id == property_id && b.status.holds_dates() && b.dates.overlaps(dates)
            })
            .cloned()
            .collect()
    }

    fn newest_first(&self, mut rows: Vec<&Booking>) -> Result<Vec<BookingDetails>, StoreError> {
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.into_iter().map(|b| self.details(b)).collect()
    }

    fn review_view(&self, review: &Review) -> Result<ReviewView, StoreError> {
        Ok(ReviewView {
            review: review.clone(),
            user: self.reviewer(review.user_id)?,
        })
    }

    fn guest_review_view(&self, review: &GuestReview) -> Result<GuestReviewView, StoreError> {
        let booking = self.bookings.get(&review.booking_id).ok_or_else(|| {
            StoreError::Corrupt(format!("guest review {} has no booking", review.id))
        })?;
        let property = self.properties.get(&booking.property_id).ok_or_else(|| {
            StoreError::Corrupt(format!("booking {} has no property", booking.id))
        })?;
        Ok(GuestReviewView {
            review: review.clone(),
            host: self.reviewer(review.host_id)?,
            guest: self.reviewer(review.guest_id)?,
            property: ReviewedProperty {
                id: property.id,
                title: property.title.clone(),
            },
        })
    }

    fn guest_review_views<'a>(
        &self,
        reviews: impl Iterator<Item = &'a GuestReview>,
    ) -> Result<Vec<GuestReviewView>, StoreError> {
        let mut reviews: Vec<&GuestReview> = reviews.collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        reviews
            .into_iter()
            .map(|r| self.guest_review_view(r))
            .collect()
    }

    fn favorite(
        &self,
        property_id: PropertyId,
        favorited_at: DateTime<Utc>,
    ) -> Result<FavoriteProperty, StoreError> {
        let property = self.properties.get(&property_id).ok_or_else(|| {
            StoreError::Corrupt(format!("favorite of unknown property {property_id}"))
        })?;
        let ratings: Vec<_> = self
            .reviews
            .values()
            .filter(|r| r.property_id == property_id)
            .map(|r| r.rating)
            .collect();
        Ok(FavoriteProperty {
            property: property.summary(),
            price_per_night: property.price_per_night,
            max_guests: property.max_guests,
            host: self.reviewer(property.host_id)?,
            review_count: ratings.len() as u64,
            average_rating: mean_rating(ratings),
            favorited_at,
        })
    }
}

/// In-memory implementation of every store trait.
///
/// Clones share the same tables.
///
/// # Example
///
/// ```
/// use roombnb_testing::Marketplace;
///
/// let market = Marketplace::new();
/// assert_eq!(market.store.booking_count(), 0);
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryStore {
    /// Create a new empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with a database error (or recover).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Database("store unavailable".to_string()));
        }
        Ok(())
    }

    /// Registers a user.
    pub fn add_user(&self, party: Party) {
        self.tables.write().unwrap().users.insert(party.id, party);
    }

    /// Adds or replaces a property.
    ///
    /// A replaced property keeps its place in the listing order.
    pub fn put_property(&self, property: Property) {
        let mut tables = self.tables.write().unwrap();
        if tables.properties.insert(property.id, property.clone()).is_none() {
            tables.listed.push(property.id);
        }
    }

    /// Inserts a booking without any overlap check, for seeding history.
    pub fn seed_booking(&self, booking: Booking) {
        self.tables
            .write()
            .unwrap()
            .bookings
            .insert(booking.id, booking);
    }

    /// Overwrites a booking's status, bypassing the lifecycle.
    pub fn set_status(&self, id: BookingId, status: BookingStatus) {
        if let Some(booking) = self.tables.write().unwrap().bookings.get_mut(&id) {
            booking.status = status;
        }
    }

    /// Current copy of a booking
    #[must_use]
    pub fn booking(&self, id: BookingId) -> Option<Booking> {
        self.tables.read().unwrap().bookings.get(&id).cloned()
    }

    /// Number of stored bookings
    #[must_use]
    pub fn booking_count(&self) -> usize {
        self.tables.read().unwrap().bookings.len()
    }

    /// Number of stored property reviews
    #[must_use]
    pub fn review_count(&self) -> usize {
        self.tables.read().unwrap().reviews.len()
    }
}

impl PropertyDirectory for InMemoryStore {
    fn find_property(&self, id: PropertyId) -> StoreFuture<'_, Option<Property>> {
        Box::pin(async move {
            self.check_available()?;
            Ok(self.tables.read().unwrap().properties.get(&id).cloned())
        })
    }

    fn host_properties(&self, host_id: UserId) -> StoreFuture<'_, Vec<Property>> {
        Box::pin(async move {
            self.check_available()?;
            let tables = self.tables.read().unwrap();
            // Newest listing first
            Ok(tables
                .listed
                .iter()
                .rev()
                .filter_map(|id| tables.properties.get(id))
                .filter(|p| p.host_id == host_id)
                .cloned()
                .collect())
        })
    }
}

impl BookingStore for InMemoryStore {
    fn find_details(&self, id: BookingId) -> StoreFuture<'_, Option<BookingDetails>> {
        Box::pin(async move {
            self.check_available()?;
            let tables = self.tables.read().unwrap();
            tables
                .bookings
                .get(&id)
                .map(|booking| tables.details(booking))
                .transpose()
        })
    }

    fn find_overlapping(
        &self,
        property_id: PropertyId,
        dates: StayDates,
    ) -> StoreFuture<'_, Vec<Booking>> {
        Box::pin(async move {
            self.check_available()?;
            Ok(self.tables.read().unwrap().overlapping(property_id, &dates))
        })
    }

    fn insert_booking(&self, booking: Booking) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            self.check_available()?;
            let mut tables = self.tables.write().unwrap();
            if !tables.overlapping(booking.property_id, &booking.dates).is_empty() {
                return Err(StoreError::Overlap);
            }
            tables.bookings.insert(booking.id, booking);
            Ok(())
        })
    }

    fn update_status(
        &self,
        id: BookingId,
        expected: &'static [BookingStatus],
        next: BookingStatus,
        at: DateTime<Utc>,
    ) -> StoreFuture<'_, Option<Booking>> {
        Box::pin(async move {
            self.check_available()?;
            let mut tables = self.tables.write().unwrap();
            Ok(tables
                .bookings
                .get_mut(&id)
                .filter(|b| expected.contains(&b.status))
                .map(|b| {
                    b.status = next;
                    b.updated_at = at;
                    b.clone()
                }))
        })
    }

    fn complete_expired(
        &self,
        expected: &'static [BookingStatus],
        next: BookingStatus,
        now: DateTime<Utc>,
    ) -> StoreFuture<'_, u64> {
        Box::pin(async move {
            self.check_available()?;
            let mut tables = self.tables.write().unwrap();
            let mut changed = 0;
            for booking in tables.bookings.values_mut() {
                if expected.contains(&booking.status) && booking.dates.is_over(now) {
                    booking.status = next;
                    booking.updated_at = now;
                    changed += 1;
                }
            }
            Ok(changed)
        })
    }

    fn list_for_guest(&self, guest_id: UserId) -> StoreFuture<'_, Vec<BookingDetails>> {
        Box::pin(async move {
            self.check_available()?;
            let tables = self.tables.read().unwrap();
            let rows = tables
                .bookings
                .values()
                .filter(|b| b.guest_id == guest_id)
                .collect();
            tables.newest_first(rows)
        })
    }

    fn list_for_host(&self, host_id: UserId) -> StoreFuture<'_, Vec<BookingDetails>> {
        Box::pin(async move {
            self.check_available()?;
            let tables = self.tables.read().unwrap();
            let rows = tables
                .bookings
                .values()
                .filter(|b| tables.host_of(b.property_id) == Some(host_id))
                .collect();
            tables.newest_first(rows)
        })
    }

    fn earning_records(
        &self,
        host_id: UserId,
        now: DateTime<Utc>,
    ) -> StoreFuture<'_, Vec<EarningRecord>> {
        Box::pin(async move {
            self.check_available()?;
            let tables = self.tables.read().unwrap();
            Ok(tables
                .bookings
                .values()
                .filter(|b| {
                    tables.host_of(b.property_id) == Some(host_id)
                        && stay_finished(b.status, &b.dates, now)
                })
                .map(|b| EarningRecord {
                    property_id: b.property_id,
                    check_in: b.dates.check_in(),
                    total_price: b.total_price,
                })
                .collect())
        })
    }
}

impl ReviewStore for InMemoryStore {
    fn find_review(&self, id: ReviewId) -> StoreFuture<'_, Option<Review>> {
        Box::pin(async move {
            self.check_available()?;
            Ok(self.tables.read().unwrap().reviews.get(&id).cloned())
        })
    }

    fn find_review_view(&self, id: ReviewId) -> StoreFuture<'_, Option<ReviewView>> {
        Box::pin(async move {
            self.check_available()?;
            let tables = self.tables.read().unwrap();
            tables
                .reviews
                .get(&id)
                .map(|review| tables.review_view(review))
                .transpose()
        })
    }

    fn booking_has_review(&self, booking_id: BookingId) -> StoreFuture<'_, bool> {
        Box::pin(async move {
            self.check_available()?;
            Ok(self
                .tables
                .read()
                .unwrap()
                .reviews
                .values()
                .any(|r| r.booking_id == booking_id))
        })
    }

    fn insert_review(&self, review: Review) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            self.check_available()?;
            let mut tables = self.tables.write().unwrap();
            if tables.reviews.values().any(|r| r.booking_id == review.booking_id) {
                return Err(StoreError::Duplicate(format!(
                    "review for booking {}",
                    review.booking_id
                )));
            }
            tables.reviews.insert(review.id, review);
            Ok(())
        })
    }

    fn update_review(&self, review: Review) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            self.check_available()?;
            self.tables.write().unwrap().reviews.insert(review.id, review);
            Ok(())
        })
    }

    fn delete_review(&self, id: ReviewId) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            self.check_available()?;
            self.tables.write().unwrap().reviews.remove(&id);
            Ok(())
        })
    }

    fn reviews_by_user(&self, user_id: UserId) -> StoreFuture<'_, Vec<Review>> {
        Box::pin(async move {
            self.check_available()?;
            let tables = self.tables.read().unwrap();
            let mut reviews: Vec<Review> = tables
                .reviews
                .values()
                .filter(|r| r.user_id == user_id)
                .cloned()
                .collect();
            reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(reviews)
        })
    }

    fn property_reviews(&self, property_id: PropertyId) -> StoreFuture<'_, Vec<ReviewView>> {
        Box::pin(async move {
            self.check_available()?;
            let tables = self.tables.read().unwrap();
            let mut reviews: Vec<&Review> = tables
                .reviews
                .values()
                .filter(|r| r.property_id == property_id)
                .collect();
            reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            reviews.into_iter().map(|r| tables.review_view(r)).collect()
        })
    }

    fn host_ratings(&self, host_id: UserId) -> StoreFuture<'_, Vec<PropertyRating>> {
        Box::pin(async move {
            self.check_available()?;
            let tables = self.tables.read().unwrap();
            Ok(tables
                .reviews
                .values()
                .filter(|r| tables.host_of(r.property_id) == Some(host_id))
                .map(|r| PropertyRating {
                    property_id: r.property_id,
                    rating: r.rating,
                })
                .collect())
        })
    }

    fn booking_has_guest_review(&self, booking_id: BookingId) -> StoreFuture<'_, bool> {
        Box::pin(async move {
            self.check_available()?;
            Ok(self
                .tables
                .read()
                .unwrap()
                .guest_reviews
                .values()
                .any(|r| r.booking_id == booking_id))
        })
    }

    fn insert_guest_review(&self, review: GuestReview) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            self.check_available()?;
            let mut tables = self.tables.write().unwrap();
            if tables
                .guest_reviews
                .values()
                .any(|r| r.booking_id == review.booking_id)
            {
                return Err(StoreError::Duplicate(format!(
                    "guest review for booking {}",
                    review.booking_id
                )));
            }
            tables.guest_reviews.insert(review.id, review);
            Ok(())
        })
    }

    fn find_guest_review_view(
        &self,
        id: GuestReviewId,
    ) -> StoreFuture<'_, Option<GuestReviewView>> {
        Box::pin(async move {
            self.check_available()?;
            let tables = self.tables.read().unwrap();
            tables
                .guest_reviews
                .get(&id)
                .map(|review| tables.guest_review_view(review))
                .transpose()
        })
    }

    fn guest_reviews(&self, guest_id: UserId) -> StoreFuture<'_, Vec<GuestReviewView>> {
        Box::pin(async move {
            self.check_available()?;
            let tables = self.tables.read().unwrap();
            tables.guest_review_views(
                tables
                    .guest_reviews
                    .values()
                    .filter(|r| r.guest_id == guest_id),
            )
        })
    }

    fn find_guest_review(&self, id: GuestReviewId) -> StoreFuture<'_, Option<GuestReview>> {
        Box::pin(async move {
            self.check_available()?;
            Ok(self.tables.read().unwrap().guest_reviews.get(&id).cloned())
        })
    }

    fn guest_review_for_booking(
        &self,
        booking_id: BookingId,
    ) -> StoreFuture<'_, Option<GuestReviewView>> {
        Box::pin(async move {
            self.check_available()?;
            let tables = self.tables.read().unwrap();
            tables
                .guest_reviews
                .values()
                .find(|r| r.booking_id == booking_id)
                .map(|r| tables.guest_review_view(r))
                .transpose()
        })
    }

    fn host_guest_reviews(&self, host_id: UserId) -> StoreFuture<'_, Vec<GuestReviewView>> {
        Box::pin(async move {
            self.check_available()?;
            let tables = self.tables.read().unwrap();
            tables.guest_review_views(
                tables
                    .guest_reviews
                    .values()
                    .filter(|r| r.host_id == host_id),
            )
        })
    }

    fn update_guest_review(&self, review: GuestReview) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            self.check_available()?;
            self.tables
                .write()
                .unwrap()
                .guest_reviews
                .insert(review.id, review);
            Ok(())
        })
    }

    fn delete_guest_review(&self, id: GuestReviewId) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            self.check_available()?;
            self.tables.write().unwrap().guest_reviews.remove(&id);
            Ok(())
        })
    }
}

impl FavoriteStore for InMemoryStore {
    fn add_favorite(
        &self,
        user_id: UserId,
        property_id: PropertyId,
        at: DateTime<Utc>,
    ) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            self.check_available()?;
            let mut tables = self.tables.write().unwrap();
            if tables.favorites.contains_key(&(user_id, property_id)) {
                return Err(StoreError::Duplicate(format!("favorite {property_id}")));
            }
            tables.favorites.insert((user_id, property_id), at);
            Ok(())
        })
    }

    fn remove_favorite(&self, user_id: UserId, property_id: PropertyId) -> StoreFuture<'_, bool> {
        Box::pin(async move {
            self.check_available()?;
            Ok(self
                .tables
                .write()
                .unwrap()
                .favorites
                .remove(&(user_id, property_id))
                .is_some())
        })
    }

    fn is_favorite(&self, user_id: UserId, property_id: PropertyId) -> StoreFuture<'_, bool> {
        Box::pin(async move {
            self.check_available()?;
            Ok(self
                .tables
                .read()
                .unwrap()
                .favorites
                .contains_key(&(user_id, property_id)))
        })
    }

    fn favorites(&self, user_id: UserId) -> StoreFuture<'_, Vec<FavoriteProperty>> {
        Box::pin(async move {
            self.check_available()?;
            let tables = self.tables.read().unwrap();
            let mut saved: Vec<(PropertyId, DateTime<Utc>)> = tables
                .favorites
                .iter()
                .filter(|((user, _), _)| *user == user_id)
                .map(|((_, property), at)| (*property, *at))
                .collect();
            saved.sort_by(|a, b| b.1.cmp(&a.1));
            saved
                .into_iter()
                .map(|(property, at)| tables.favorite(property, at))
                .collect()
        })
    }

    fn favorite_count(&self, user_id: UserId) -> StoreFuture<'_, u64> {
        Box::pin(async move {
            self.check_available()?;
            let tables = self.tables.read().unwrap();
            Ok(tables.favorites.keys().filter(|(user, _)| *user == user_id).count() as u64)
        })
    }
}

impl HealthCheck for InMemoryStore {
    fn ping(&self) -> StoreFuture<'_, ()> {
        Box::pin(async move { self.check_available() })
    }
}

/// Booking store that lets a competing writer slip in between the engine's
/// read and its write.
///
/// Delegates to an [`InMemoryStore`]. With [`RacingStore::hide_overlaps`] the
/// overlap pre-check sees an empty calendar, so only the insert's own re-check
/// can refuse a clash. [`RacingStore::interleave_status`] writes a status
/// right before the next compare-and-set, which then loses.
///
/// # Example
///
/// ```
/// use roombnb_testing::{Marketplace, RacingStore};
///
/// let market = Marketplace::new();
/// let racing = RacingStore::new(market.store.clone());
/// racing.hide_overlaps();
/// ```
#[derive(Clone, Debug)]
pub struct RacingStore {
    inner: InMemoryStore,
    hide_overlaps: Arc<AtomicBool>,
    interleaved: Arc<Mutex<Option<BookingStatus>>>,
}

impl RacingStore {
    /// Wraps `inner`; behaves exactly like it until told otherwise.
    #[must_use]
    pub fn new(inner: InMemoryStore) -> Self {
        Self {
            inner,
            hide_overlaps: Arc::new(AtomicBool::new(false)),
            interleaved: Arc::new(Mutex::new(None)),
        }
    }

    /// Every later overlap pre-check returns no bookings.
    pub fn hide_overlaps(&self) {
        self.hide_overlaps.store(true, Ordering::SeqCst);
    }

    /// The next status update first finds the booking moved to `status`.
    pub fn interleave_status(&self, status: BookingStatus) {
        *self.interleaved.lock().unwrap() = Some(status);
    }
}

impl BookingStore for RacingStore {
    fn find_details(&self, id: BookingId) -> StoreFuture<'_, Option<BookingDetails>> {
        self.inner.find_details(id)
    }

    fn find_overlapping(
        &self,
        property_id: PropertyId,
        dates: StayDates,
    ) -> StoreFuture<'_, Vec<Booking>> {
        if self.hide_overlaps.load(Ordering::SeqCst) {
            return Box::pin(async { Ok(Vec::new()) });
        }
        self.inner.find_overlapping(property_id, dates)
    }

    fn insert_booking(&self, booking: Booking) -> StoreFuture<'_, ()> {
        self.inner.insert_booking(booking)
    }

    fn update_status(
        &self,
        id: BookingId,
        expected: &'static [BookingStatus],
        next: BookingStatus,
        at: DateTime<Utc>,
    ) -> StoreFuture<'_, Option<Booking>> {
        let interleaved = self.interleaved.lock().unwrap().take();
        if let Some(status) = interleaved {
            self.inner.set_status(id, status);
        }
        self.inner.update_status(id, expected, next, at)
    }

    fn complete_expired(
        &self,
        expected: &'static [BookingStatus],
        next: BookingStatus,
        now: DateTime<Utc>,
    ) -> StoreFuture<'_, u64> {
        self.inner.complete_expired(expected, next, now)
    }

    fn list_for_guest(&self, guest_id: UserId) -> StoreFuture<'_, Vec<BookingDetails>> {
        self.inner.list_for_guest(guest_id)
    }

    fn list_for_host(&self, host_id: UserId) -> StoreFuture<'_, Vec<BookingDetails>> {
        self.inner.list_for_host(host_id)
    }

    fn earning_records(
        &self,
        host_id: UserId,
        now: DateTime<Utc>,
    ) -> StoreFuture<'_, Vec<EarningRecord>> {
        self.inner.earning_records(host_id, now)
    }
}
