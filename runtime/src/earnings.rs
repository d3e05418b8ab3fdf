//! Host earnings dashboard.

use chrono::Datelike;
use roombnb_core::earnings::{
    self, EarningsSummary, MonthlyEarnings, PropertyEarnings, PropertyOccupancy,
};
use roombnb_core::environment::Clock;
use roombnb_core::error::BookingError;
use roombnb_core::store::{BookingStore, PropertyDirectory, ReviewStore};
use roombnb_core::types::{Actor, Booking};
use std::sync::Arc;

/// Aggregates a host's finished stays.
#[derive(Clone)]
pub struct EarningsService {
    properties: Arc<dyn PropertyDirectory>,
    bookings: Arc<dyn BookingStore>,
    reviews: Arc<dyn ReviewStore>,
    clock: Arc<dyn Clock>,
}

impl EarningsService {
    /// Wires the service to its stores.
    #[must_use]
    pub fn new(
        properties: Arc<dyn PropertyDirectory>,
        bookings: Arc<dyn BookingStore>,
        reviews: Arc<dyn ReviewStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            properties,
            bookings,
            reviews,
            clock,
        }
    }

    /// Totals, average and month-over-month change.
    ///
    /// # Errors
    ///
    /// Returns a store error if the query fails.
    pub async fn summary(&self, host: &Actor) -> Result<EarningsSummary, BookingError> {
        let now = self.clock.now();
        let records = self.bookings.earning_records(host.user_id, now).await?;
        Ok(earnings::summarize(&records, now))
    }

    /// Month-by-month earnings for `year`, or the current year.
    ///
    /// # Errors
    ///
    /// Returns a store error if the query fails.
    pub async fn monthly(
        &self,
        host: &Actor,
        year: Option<i32>,
    ) -> Result<Vec<MonthlyEarnings>, BookingError> {
        let now = self.clock.now();
        let records = self.bookings.earning_records(host.user_id, now).await?;
        Ok(earnings::monthly(&records, year.unwrap_or_else(|| now.year()), now))
    }

    /// Per-property earnings and ratings, highest earning first.
    ///
    /// # Errors
    ///
    /// Returns a store error if a query fails.
    pub async fn by_property(&self, host: &Actor) -> Result<Vec<PropertyEarnings>, BookingError> {
        let now = self.clock.now();
        let properties = self.properties.host_properties(host.user_id).await?;
        let records = self.bookings.earning_records(host.user_id, now).await?;
        let ratings = self.reviews.host_ratings(host.user_id).await?;
        Ok(earnings::by_property(&properties, &records, &ratings))
    }

    /// Booked share of each property over the last `days` days.
    ///
    /// # Errors
    ///
    /// Returns a store error if a query fails.
    pub async fn occupancy(
        &self,
        host: &Actor,
        days: u32,
    ) -> Result<Vec<PropertyOccupancy>, BookingError> {
        let now = self.clock.now();
        let properties = self.properties.host_properties(host.user_id).await?;
        let bookings: Vec<Booking> = self
            .bookings
            .list_for_host(host.user_id)
            .await?
            .into_iter()
            .map(|details| details.booking)
            .collect();
        Ok(earnings::occupancy(&properties, &bookings, now, days))
    }
}

impl std::fmt::Debug for EarningsService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EarningsService").finish_non_exhaustive()
    }
}
