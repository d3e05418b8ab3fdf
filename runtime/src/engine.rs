//! The booking lifecycle engine.
//!
//! Stateless apart from its collaborators: every operation reads current state
//! from the store, validates, writes one transition and (optionally) queues a
//! notification.

use crate::metrics::BookingMetrics;
use crate::notifications::Notifier;
use roombnb_core::environment::Clock;
use roombnb_core::error::BookingError;
use roombnb_core::lifecycle::{self, Transition};
use roombnb_core::notification::{Notification, NotificationKind};
use roombnb_core::pricing::{StayDates, quote};
use roombnb_core::store::{BookingStore, PropertyDirectory};
use roombnb_core::types::{Actor, Booking, BookingDetails, BookingId, BookingStatus, NewBooking};
use std::sync::Arc;

/// Creates bookings and drives them through their lifecycle.
///
/// Construct once at startup and share; it holds no mutable state.
///
/// # Example
///
/// ```ignore
/// let engine = BookingEngine::new(properties, bookings, notifier, Arc::new(SystemClock));
/// let details = engine.create_booking(&guest, request).await?;
/// assert_eq!(details.status(), BookingStatus::Pending);
/// ```
#[derive(Clone)]
pub struct BookingEngine {
    properties: Arc<dyn PropertyDirectory>,
    bookings: Arc<dyn BookingStore>,
    notifier: Notifier,
    clock: Arc<dyn Clock>,
}

impl BookingEngine {
    /// Wires the engine to its collaborators.
    #[must_use]
    pub fn new(
        properties: Arc<dyn PropertyDirectory>,
        bookings: Arc<dyn BookingStore>,
        notifier: Notifier,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            properties,
            bookings,
            notifier,
            clock,
        }
    }

    /// Requests a stay. The booking starts out pending host approval.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the property is missing or inactive
    /// - `InvalidRange` unless check-in precedes check-out
    /// - `Validation` for fewer than one guest
    /// - `CapacityExceeded` above the property's capacity
    /// - `DateConflict` if a pending or confirmed booking overlaps
    #[tracing::instrument(skip(self, request), fields(guest_id = %guest.user_id, property_id = %request.property_id))]
    pub async fn create_booking(
        &self,
        guest: &Actor,
        request: NewBooking,
    ) -> Result<BookingDetails, BookingError> {
        let property = self
            .properties
            .find_property(request.property_id)
            .await?
            .filter(|p| p.is_active)
            .ok_or(BookingError::not_found("Property"))?;

        let dates = StayDates::new(request.check_in, request.check_out)?;

        if request.number_of_guests < 1 {
            return Err(BookingError::validation(
                "Number of guests must be at least 1",
            ));
        }
        if request.number_of_guests > property.max_guests {
            return Err(BookingError::CapacityExceeded {
                max_guests: property.max_guests,
            });
        }

        if !self
            .bookings
            .find_overlapping(property.id, dates)
            .await?
            .is_empty()
        {
            BookingMetrics::record_conflict();
            return Err(BookingError::DateConflict);
        }

        let now = self.clock.now();
        let booking = Booking {
            id: BookingId::new(),
            property_id: property.id,
            guest_id: guest.user_id,
            dates,
            number_of_guests: request.number_of_guests,
            total_price: quote(&property, &dates),
            special_requests: request.special_requests.filter(|s| !s.trim().is_empty()),
            status: BookingStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        let id = booking.id;

        if let Err(error) = self.bookings.insert_booking(booking).await {
            let error = BookingError::from(error);
            if error == BookingError::DateConflict {
                BookingMetrics::record_conflict();
            }
            return Err(error);
        }

        let details = self.load(id).await?;
        BookingMetrics::record_created();
        tracing::info!(
            booking_id = %id,
            total_price = %details.booking.total_price,
            nights = dates.nights(),
            "Booking requested"
        );

        self.notifier.dispatch(Notification::new(
            NotificationKind::NewBookingRequest,
            details.clone(),
        ));
        Ok(details)
    }

    /// Reads one booking; only its guest and the property's host may.
    ///
    /// # Errors
    ///
    /// `NotFound` if absent, `Forbidden` for anyone else.
    pub async fn get_booking(
        &self,
        actor: &Actor,
        id: BookingId,
    ) -> Result<BookingDetails, BookingError> {
        let details = self.load(id).await?;
        lifecycle::authorize_view(actor, details.booking.guest_id, details.host.id)?;
        Ok(details)
    }

    /// Bookings the actor made as a guest, newest first.
    ///
    /// # Errors
    ///
    /// Returns a store error if the query fails.
    pub async fn list_guest_bookings(
        &self,
        actor: &Actor,
    ) -> Result<Vec<BookingDetails>, BookingError> {
        Ok(self.bookings.list_for_guest(actor.user_id).await?)
    }

    /// Bookings on the actor's properties, newest first.
    ///
    /// # Errors
    ///
    /// Returns a store error if the query fails.
    pub async fn list_host_bookings(
        &self,
        actor: &Actor,
    ) -> Result<Vec<BookingDetails>, BookingError> {
        Ok(self.bookings.list_for_host(actor.user_id).await?)
    }

    /// Cancels a pending or confirmed booking and tells the other party.
    ///
    /// # Errors
    ///
    /// `NotFound`, `Forbidden` unless guest or host, `Conflict` if already
    /// cancelled, rejected or completed.
    #[tracing::instrument(skip(self), fields(actor_id = %actor.user_id))]
    pub async fn cancel_booking(
        &self,
        actor: &Actor,
        id: BookingId,
    ) -> Result<BookingDetails, BookingError> {
        self.transition(actor, id, Transition::Cancel).await
    }

    /// Host accepts a pending request.
    ///
    /// # Errors
    ///
    /// `NotFound`, `Forbidden` unless the owning host, `Conflict` unless pending.
    #[tracing::instrument(skip(self), fields(actor_id = %actor.user_id))]
    pub async fn confirm_booking(
        &self,
        actor: &Actor,
        id: BookingId,
    ) -> Result<BookingDetails, BookingError> {
        self.transition(actor, id, Transition::Confirm).await
    }

    /// Host declines a pending request.
    ///
    /// # Errors
    ///
    /// `NotFound`, `Forbidden` unless the owning host, `Conflict` unless pending.
    #[tracing::instrument(skip(self), fields(actor_id = %actor.user_id))]
    pub async fn reject_booking(
        &self,
        actor: &Actor,
        id: BookingId,
    ) -> Result<BookingDetails, BookingError> {
        self.transition(actor, id, Transition::Reject).await
    }

    /// Promotes every confirmed booking whose checkout has passed to completed.
    ///
    /// Idempotent; sends no notifications.
    ///
    /// # Errors
    ///
    /// Returns a store error if the bulk update fails.
    #[tracing::instrument(skip(self))]
    pub async fn complete_expired_bookings(&self) -> Result<u64, BookingError> {
        let now = self.clock.now();
        let sweep = Transition::Complete;
        let completed = self
            .bookings
            .complete_expired(sweep.allowed_from(), sweep.target(), now)
            .await?;
        if completed > 0 {
            tracing::info!(completed, "Marked expired bookings as completed");
        } else {
            tracing::debug!("No expired bookings to complete");
        }
        Ok(completed)
    }

    async fn load(&self, id: BookingId) -> Result<BookingDetails, BookingError> {
        self.bookings
            .find_details(id)
            .await?
            .ok_or(BookingError::not_found("Booking"))
    }

    async fn transition(
        &self,
        actor: &Actor,
        id: BookingId,
        transition: Transition,
    ) -> Result<BookingDetails, BookingError> {
        let mut details = self.load(id).await?;
        let who = transition.authorize(actor, details.booking.guest_id, details.host.id)?;
        let next = transition.apply(details.status())?;

        let now = self.clock.now();
        let Some(updated) = self
            .bookings
            .update_status(id, transition.allowed_from(), next, now)
            .await?
        else {
            // Lost a race with another transition: report what it left behind.
            let current = self.load(id).await?.status();
            tracing::debug!(booking_id = %id, %current, "Concurrent transition won");
            return Err(transition
                .apply(current)
                .err()
                .unwrap_or_else(|| BookingError::Conflict(format!(
                    "Booking was modified concurrently (status {current})"
                ))));
        };

        details.booking = updated;
        BookingMetrics::record_transition(next);
        tracing::info!(booking_id = %id, verb = transition.verb(), status = %next, "Booking updated");

        let kind = match transition {
            Transition::Confirm => Some(NotificationKind::BookingConfirmed),
            Transition::Reject => Some(NotificationKind::BookingRejected),
            Transition::Cancel => Some(NotificationKind::cancelled_by(who)),
            Transition::Complete => None,
        };
        if let Some(kind) = kind {
            self.notifier
                .dispatch(Notification::new(kind, details.clone()));
        }
        Ok(details)
    }
}

impl std::fmt::Debug for BookingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookingEngine").finish_non_exhaustive()
    }
}
