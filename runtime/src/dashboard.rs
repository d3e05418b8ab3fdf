//! Guest and host dashboards.

use roombnb_core::dashboard::{self, GuestDashboard, HostDashboard};
use roombnb_core::environment::Clock;
use roombnb_core::error::BookingError;
use roombnb_core::store::{BookingStore, FavoriteStore, PropertyDirectory, ReviewStore};
use roombnb_core::types::{Actor, BookingId};
use std::collections::HashSet;
use std::sync::Arc;

/// Gathers the bookings, reviews and favorites behind each dashboard.
#[derive(Clone)]
pub struct DashboardService {
    properties: Arc<dyn PropertyDirectory>,
    bookings: Arc<dyn BookingStore>,
    reviews: Arc<dyn ReviewStore>,
    favorites: Arc<dyn FavoriteStore>,
    clock: Arc<dyn Clock>,
}

impl DashboardService {
    /// Wires the service to its stores.
    #[must_use]
    pub fn new(
        properties: Arc<dyn PropertyDirectory>,
        bookings: Arc<dyn BookingStore>,
        reviews: Arc<dyn ReviewStore>,
        favorites: Arc<dyn FavoriteStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            properties,
            bookings,
            reviews,
            favorites,
            clock,
        }
    }

    /// Upcoming and past trips, trips awaiting a review, and counts.
    ///
    /// # Errors
    ///
    /// Returns a store error if a query fails.
    #[tracing::instrument(skip_all, fields(actor_id = %guest.user_id))]
    pub async fn guest(&self, guest: &Actor) -> Result<GuestDashboard, BookingError> {
        let now = self.clock.now();
        let bookings = self.bookings.list_for_guest(guest.user_id).await?;
        let reviewed: HashSet<BookingId> = self
            .reviews
            .reviews_by_user(guest.user_id)
            .await?
            .into_iter()
            .map(|r| r.booking_id)
            .collect();
        let favorite_count = self.favorites.favorite_count(guest.user_id).await?;
        Ok(dashboard::guest_dashboard(&bookings, &reviewed, favorite_count, now))
    }

    /// Listings, requests to answer, upcoming and recent stays, earnings and
    /// the rating headline.
    ///
    /// # Errors
    ///
    /// Returns a store error if a query fails.
    #[tracing::instrument(skip_all, fields(actor_id = %host.user_id))]
    pub async fn host(&self, host: &Actor) -> Result<HostDashboard, BookingError> {
        let now = self.clock.now();
        let properties = self.properties.host_properties(host.user_id).await?;
        let bookings = self.bookings.list_for_host(host.user_id).await?;
        let guest_reviewed: HashSet<BookingId> = self
            .reviews
            .host_guest_reviews(host.user_id)
            .await?
            .into_iter()
            .map(|r| r.review.booking_id)
            .collect();
        let ratings = self.reviews.host_ratings(host.user_id).await?;
        Ok(dashboard::host_dashboard(
            &properties,
            &bookings,
            &guest_reviewed,
            &ratings,
            now,
        ))
    }
}

impl std::fmt::Debug for DashboardService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardService").finish_non_exhaustive()
    }
}
