//! Property reviews and host reviews of guests.

use roombnb_core::environment::Clock;
use roombnb_core::error::{BookingError, StoreError};
use roombnb_core::lifecycle::stay_finished;
use roombnb_core::review::{
    self, GuestReview, GuestReviewView, Rating, Review, ReviewUpdate, ReviewView,
};
use roombnb_core::store::{BookingStore, ReviewStore};
use roombnb_core::types::{
    Actor, BookingDetails, BookingId, GuestReviewId, PropertyId, ReviewId, UserId,
};
use std::sync::Arc;

const REVIEW_EXISTS: &str = "You have already reviewed this booking";
const GUEST_REVIEW_EXISTS: &str = "You have already reviewed this guest for this booking";

/// Input for [`ReviewService::create_review`].
#[derive(Clone, Debug)]
pub struct NewReview {
    /// Stay being reviewed
    pub booking_id: BookingId,
    /// Property the stay was at
    pub property_id: PropertyId,
    /// Raw stars, validated to 1..=5
    pub rating: i64,
    /// Free text
    pub comment: String,
}

/// Input for [`ReviewService::create_guest_review`].
#[derive(Clone, Debug)]
pub struct NewGuestReview {
    /// Stay being reviewed
    pub booking_id: BookingId,
    /// Guest being reviewed
    pub guest_id: UserId,
    /// Raw stars, validated to 1..=5
    pub rating: i64,
    /// Free text, at least ten characters once trimmed
    pub comment: String,
}

/// Reviews in both directions: guests rate properties, hosts rate guests.
#[derive(Clone)]
pub struct ReviewService {
    bookings: Arc<dyn BookingStore>,
    reviews: Arc<dyn ReviewStore>,
    clock: Arc<dyn Clock>,
}

fn duplicate_as(message: &'static str) -> impl FnOnce(StoreError) -> BookingError {
    move |error| match error {
        StoreError::Duplicate(_) => BookingError::Conflict(message.to_string()),
        other => other.into(),
    }
}

impl ReviewService {
    /// Wires the service to its stores.
    #[must_use]
    pub fn new(
        bookings: Arc<dyn BookingStore>,
        reviews: Arc<dyn ReviewStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            bookings,
            reviews,
            clock,
        }
    }

    async fn booking(&self, id: BookingId) -> Result<BookingDetails, BookingError> {
        self.bookings
            .find_details(id)
            .await?
            .ok_or(BookingError::not_found("Booking"))
    }

    /// Guest reviews a property after their stay.
    ///
    /// # Errors
    ///
    /// Validation for a bad rating, blank comment, unfinished stay or
    /// mismatched property; `NotFound` for a missing booking; `Forbidden` for
    /// someone else's booking; `Conflict` if already reviewed.
    #[tracing::instrument(skip(self, input), fields(actor_id = %actor.user_id, booking_id = %input.booking_id))]
    pub async fn create_review(
        &self,
        actor: &Actor,
        input: NewReview,
    ) -> Result<ReviewView, BookingError> {
        let rating = Rating::new(input.rating)?;
        let comment = review::required_comment(&input.comment)?;

        let details = self.booking(input.booking_id).await?;
        let booking = &details.booking;
        if booking.guest_id != actor.user_id {
            return Err(BookingError::forbidden("You can only review your own bookings"));
        }

        let now = self.clock.now();
        if !stay_finished(booking.status, &booking.dates, now) {
            return Err(BookingError::validation("You can only review completed trips"));
        }
        if booking.property_id != input.property_id {
            return Err(BookingError::validation("Booking does not match the property"));
        }

        if self.reviews.booking_has_review(booking.id).await? {
            return Err(BookingError::Conflict(REVIEW_EXISTS.to_string()));
        }

        let review = Review {
            id: ReviewId::new(),
            booking_id: booking.id,
            property_id: booking.property_id,
            user_id: actor.user_id,
            rating,
            comment,
            created_at: now,
            updated_at: now,
        };
        let id = review.id;
        self.reviews
            .insert_review(review)
            .await
            .map_err(duplicate_as(REVIEW_EXISTS))?;

        tracing::info!(review_id = %id, rating = rating.value(), "Review created");
        self.reviews
            .find_review_view(id)
            .await?
            .ok_or(BookingError::not_found("Review"))
    }

    /// Reviews of a property, newest first.
    ///
    /// # Errors
    ///
    /// Returns a store error if the query fails.
    pub async fn property_reviews(
        &self,
        property_id: PropertyId,
    ) -> Result<Vec<ReviewView>, BookingError> {
        Ok(self.reviews.property_reviews(property_id).await?)
    }

    /// The actor's review of a property they stayed at, if they left one.
    ///
    /// # Errors
    ///
    /// Returns a store error if the query fails.
    pub async fn user_review(
        &self,
        actor: &Actor,
        property_id: PropertyId,
    ) -> Result<Option<Review>, BookingError> {
        Ok(self
            .reviews
            .reviews_by_user(actor.user_id)
            .await?
            .into_iter()
            .find(|r| r.property_id == property_id))
    }

    /// Author edits their review.
    ///
    /// # Errors
    ///
    /// `NotFound`, `Forbidden` for someone else's review, validation for a bad
    /// rating or an emptied comment.
    #[tracing::instrument(skip(self, update), fields(actor_id = %actor.user_id))]
    pub async fn update_review(
        &self,
        actor: &Actor,
        id: ReviewId,
        update: ReviewUpdate,
    ) -> Result<ReviewView, BookingError> {
        let mut review = self
            .reviews
            .find_review(id)
            .await?
            .ok_or(BookingError::not_found("Review"))?;
        if review.user_id != actor.user_id {
            return Err(BookingError::forbidden("You can only update your own reviews"));
        }

        if let Some(rating) = update.rating {
            review.rating = Rating::new(rating)?;
        }
        if let Some(comment) = update.comment {
            review.comment = review::edited_comment(&comment)?;
        }
        review.updated_at = self.clock.now();
        self.reviews.update_review(review).await?;

        self.reviews
            .find_review_view(id)
            .await?
            .ok_or(BookingError::not_found("Review"))
    }

    /// Author removes their review.
    ///
    /// # Errors
    ///
    /// `NotFound`, or `Forbidden` for someone else's review.
    #[tracing::instrument(skip(self), fields(actor_id = %actor.user_id))]
    pub async fn delete_review(&self, actor: &Actor, id: ReviewId) -> Result<(), BookingError> {
        let review = self
            .reviews
            .find_review(id)
            .await?
            .ok_or(BookingError::not_found("Review"))?;
        if review.user_id != actor.user_id {
            return Err(BookingError::forbidden("You can only delete your own reviews"));
        }
        self.reviews.delete_review(id).await?;
        tracing::info!(review_id = %id, "Review deleted");
        Ok(())
    }

    /// Host reviews the guest of a finished stay at one of their properties.
    ///
    /// # Errors
    ///
    /// Validation for a bad rating, short comment, wrong guest or unfinished
    /// stay; `NotFound` for a missing booking; `Forbidden` for another host's
    /// property; `Conflict` if already reviewed.
    #[tracing::instrument(skip(self, input), fields(actor_id = %host.user_id, booking_id = %input.booking_id))]
    pub async fn create_guest_review(
        &self,
        host: &Actor,
        input: NewGuestReview,
    ) -> Result<GuestReviewView, BookingError> {
        let rating = Rating::new(input.rating)?;
        let comment = review::guest_comment(&input.comment)?;

        let details = self.booking(input.booking_id).await?;
        if details.host.id != host.user_id {
            return Err(BookingError::forbidden(
                "You can only review guests for your own properties",
            ));
        }
        let booking = &details.booking;
        if booking.guest_id != input.guest_id {
            return Err(BookingError::validation("Guest does not match the booking"));
        }

        let now = self.clock.now();
        if !stay_finished(booking.status, &booking.dates, now) {
            return Err(BookingError::validation(
                "You can only review guests after their stay is complete",
            ));
        }

        if self.reviews.booking_has_guest_review(booking.id).await? {
            return Err(BookingError::Conflict(GUEST_REVIEW_EXISTS.to_string()));
        }

        let review = GuestReview {
            id: GuestReviewId::new(),
            booking_id: booking.id,
            guest_id: booking.guest_id,
            host_id: host.user_id,
            rating,
            comment,
            created_at: now,
        };
        let id = review.id;
        self.reviews
            .insert_guest_review(review)
            .await
            .map_err(duplicate_as(GUEST_REVIEW_EXISTS))?;

        tracing::info!(guest_review_id = %id, rating = rating.value(), "Guest review created");
        self.reviews
            .find_guest_review_view(id)
            .await?
            .ok_or(BookingError::not_found("Review"))
    }

    /// What hosts have said about a guest, newest first.
    ///
    /// # Errors
    ///
    /// Returns a store error if the query fails.
    pub async fn guest_reviews(
        &self,
        guest_id: UserId,
    ) -> Result<Vec<GuestReviewView>, BookingError> {
        Ok(self.reviews.guest_reviews(guest_id).await?)
    }

    /// The host's review of the guest of one of their bookings, if written.
    ///
    /// # Errors
    ///
    /// `NotFound` for a missing booking, `Forbidden` for another host's
    /// property.
    pub async fn guest_review_for_booking(
        &self,
        host: &Actor,
        booking_id: BookingId,
    ) -> Result<Option<GuestReviewView>, BookingError> {
        let details = self.booking(booking_id).await?;
        if details.host.id != host.user_id {
            return Err(BookingError::forbidden(
                "You can only view reviews for your own properties",
            ));
        }
        Ok(self.reviews.guest_review_for_booking(booking_id).await?)
    }

    /// Every guest review the host has written, newest first.
    ///
    /// # Errors
    ///
    /// Returns a store error if the query fails.
    pub async fn host_guest_reviews(
        &self,
        host: &Actor,
    ) -> Result<Vec<GuestReviewView>, BookingError> {
        Ok(self.reviews.host_guest_reviews(host.user_id).await?)
    }

    /// Author edits a guest review. Comments follow the same ten-character
    /// rule as new ones.
    ///
    /// # Errors
    ///
    /// `NotFound`, `Forbidden` for someone else's review, validation for a bad
    /// rating or a short comment.
    #[tracing::instrument(skip(self, update), fields(actor_id = %host.user_id))]
    pub async fn update_guest_review(
        &self,
        host: &Actor,
        id: GuestReviewId,
        update: ReviewUpdate,
    ) -> Result<GuestReviewView, BookingError> {
        let mut review = self.own_guest_review(host, id, "update").await?;
        if let Some(rating) = update.rating {
            review.rating = Rating::new(rating)?;
        }
        if let Some(comment) = update.comment {
            review.comment = review::guest_comment(&comment)?;
        }
        self.reviews.update_guest_review(review).await?;

        self.reviews
            .find_guest_review_view(id)
            .await?
            .ok_or(BookingError::not_found("Review"))
    }

    /// Author removes a guest review.
    ///
    /// # Errors
    ///
    /// `NotFound`, or `Forbidden` for someone else's review.
    #[tracing::instrument(skip(self), fields(actor_id = %host.user_id))]
    pub async fn delete_guest_review(
        &self,
        host: &Actor,
        id: GuestReviewId,
    ) -> Result<(), BookingError> {
        self.own_guest_review(host, id, "delete").await?;
        self.reviews.delete_guest_review(id).await?;
        tracing::info!(guest_review_id = %id, "Guest review deleted");
        Ok(())
    }

    async fn own_guest_review(
        &self,
        host: &Actor,
        id: GuestReviewId,
        verb: &str,
    ) -> Result<GuestReview, BookingError> {
        let review = self
            .reviews
            .find_guest_review(id)
            .await?
            .ok_or(BookingError::not_found("Review"))?;
        if review.host_id != host.user_id {
            return Err(BookingError::forbidden(format!(
                "You can only {verb} your own reviews"
            )));
        }
        Ok(review)
    }
}

impl std::fmt::Debug for ReviewService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReviewService").finish_non_exhaustive()
    }
}
