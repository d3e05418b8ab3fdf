//! Properties a user saved for later.

use crate::review::Reviewer;
use crate::types::{Money, PropertySummary};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A saved property as listed back to the user who saved it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteProperty {
    /// The listing
    #[serde(flatten)]
    pub property: PropertySummary,
    /// Nightly rate
    pub price_per_night: Money,
    /// Capacity
    pub max_guests: u32,
    /// Owning host
    pub host: Reviewer,
    /// Mean review rating, one decimal; `None` without reviews
    pub average_rating: Option<f64>,
    /// Number of reviews
    pub review_count: u64,
    /// When the user saved it
    pub favorited_at: DateTime<Utc>,
}
