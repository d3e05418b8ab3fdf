//! Property reviews (guest → property) and guest reviews (host → guest).

use crate::error::BookingError;
use crate::types::{BookingId, GuestReviewId, PropertyId, ReviewId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Shortest comment a host may leave about a guest, after trimming.
pub const MIN_GUEST_COMMENT_CHARS: usize = 10;

/// Star rating between 1 and 5.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rating(u8);

impl Rating {
    /// Validates a raw rating.
    ///
    /// # Errors
    ///
    /// Returns a validation error unless `1 <= value <= 5`.
    pub fn new(value: i64) -> Result<Self, BookingError> {
        match u8::try_from(value) {
            Ok(v @ 1..=5) => Ok(Self(v)),
            _ => Err(BookingError::validation("Rating must be between 1 and 5")),
        }
    }

    /// Stars as an integer
    #[must_use]
    pub const fn value(&self) -> u8 {
        self.0
    }
}

/// Requires a non-blank comment on a new property review.
///
/// # Errors
///
/// Returns "Comment is required" for blank input.
pub fn required_comment(comment: &str) -> Result<String, BookingError> {
    if comment.trim().is_empty() {
        return Err(BookingError::validation("Comment is required"));
    }
    Ok(comment.to_string())
}

/// Validates an edited property review comment.
///
/// # Errors
///
/// Returns "Comment cannot be empty" for blank input.
pub fn edited_comment(comment: &str) -> Result<String, BookingError> {
    if comment.trim().is_empty() {
        return Err(BookingError::validation("Comment cannot be empty"));
    }
    Ok(comment.to_string())
}

/// Validates and trims a host's comment about a guest.
///
/// # Errors
///
/// Returns "Comment must be at least 10 characters" for short input.
pub fn guest_comment(comment: &str) -> Result<String, BookingError> {
    let trimmed = comment.trim();
    if trimmed.chars().count() < MIN_GUEST_COMMENT_CHARS {
        return Err(BookingError::validation(
            "Comment must be at least 10 characters",
        ));
    }
    Ok(trimmed.to_string())
}

/// Mean of `ratings` rounded to one decimal; `None` when there are none.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean_rating(ratings: impl IntoIterator<Item = Rating>) -> Option<f64> {
    let (sum, count) = ratings
        .into_iter()
        .fold((0u64, 0u64), |(s, c), r| (s + u64::from(r.value()), c + 1));
    (count > 0).then(|| (sum as f64 / count as f64 * 10.0).round() / 10.0)
}

/// Who wrote a review, as shown next to it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reviewer {
    /// User ID
    pub id: UserId,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
}

/// A guest's review of a property they stayed at.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    /// Review ID
    pub id: ReviewId,
    /// Reviewed stay; at most one review per booking
    pub booking_id: BookingId,
    /// Reviewed property
    pub property_id: PropertyId,
    /// Author (the booking's guest)
    pub user_id: UserId,
    /// Stars
    pub rating: Rating,
    /// Free text
    pub comment: String,
    /// Created
    pub created_at: DateTime<Utc>,
    /// Last edited
    pub updated_at: DateTime<Utc>,
}

/// A review together with its author.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewView {
    /// The review
    #[serde(flatten)]
    pub review: Review,
    /// Author
    pub user: Reviewer,
}

/// Changes to an existing review; `None` keeps the current value.
///
/// Values are raw; they are validated only after ownership is checked.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReviewUpdate {
    /// New stars
    pub rating: Option<i64>,
    /// New text
    pub comment: Option<String>,
}

/// A host's review of a guest after a stay.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestReview {
    /// Guest review ID
    pub id: GuestReviewId,
    /// Reviewed stay; at most one guest review per booking
    pub booking_id: BookingId,
    /// Reviewed guest
    pub guest_id: UserId,
    /// Author (the property's host)
    pub host_id: UserId,
    /// Stars
    pub rating: Rating,
    /// Trimmed free text
    pub comment: String,
    /// Created
    pub created_at: DateTime<Utc>,
}

/// Property reference shown with a guest review.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewedProperty {
    /// Property ID
    pub id: PropertyId,
    /// Listing title
    pub title: String,
}

/// A guest review together with both parties and the property stayed at.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestReviewView {
    /// The review
    #[serde(flatten)]
    pub review: GuestReview,
    /// Author
    pub host: Reviewer,
    /// Reviewed guest
    pub guest: Reviewer,
    /// Where the stay took place
    pub property: ReviewedProperty,
}
