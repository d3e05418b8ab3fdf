//! Domain types for the booking engine.
//!
//! Value objects (identifiers, [`Money`]), the [`Booking`] entity and the
//! read-side views the HTTP layer renders.

use crate::pricing::StayDates;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            #[doc = concat!("Creates a new random `", stringify!($name), "`")]
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            #[doc = concat!("Create a `", stringify!($name), "` from a `Uuid`")]
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Get the inner UUID
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }
    };
}

define_id!(
    /// Unique identifier for a booking
    BookingId
);
define_id!(
    /// Unique identifier for a listed property
    PropertyId
);
define_id!(
    /// Unique identifier for a user (guest or host)
    UserId
);
define_id!(
    /// Unique identifier for a property review
    ReviewId
);
define_id!(
    /// Unique identifier for a host's review of a guest
    GuestReviewId
);

// ============================================================================
// Money
// ============================================================================

/// Monetary amount in cents.
///
/// Stored as integer cents so pricing arithmetic is exact. On the wire it is a
/// decimal number of dollars (`640.0`), matching what clients already send.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(u64);

impl Money {
    /// Zero dollars
    pub const ZERO: Self = Self(0);

    /// Creates a `Money` value from cents
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Creates a `Money` value from whole dollars, saturating on overflow
    #[must_use]
    pub const fn from_dollars(dollars: u64) -> Self {
        Self(dollars.saturating_mul(100))
    }

    /// Returns the amount in cents
    #[must_use]
    pub const fn cents(&self) -> u64 {
        self.0
    }

    /// Returns the amount as fractional dollars
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_dollars(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Multiplies by a count (e.g. nights), saturating on overflow
    #[must_use]
    pub const fn times(self, count: u64) -> Self {
        Self(self.0.saturating_mul(count))
    }

    /// Adds two amounts, saturating on overflow
    #[must_use]
    pub const fn plus(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Divides evenly between `count` parts, rounding to the nearest cent.
    ///
    /// Returns zero when `count` is zero.
    #[must_use]
    pub const fn split(self, count: u64) -> Self {
        if count == 0 {
            return Self::ZERO;
        }
        Self((self.0 + count / 2) / count)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Self::plus)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_dollars())
    }
}

impl<'de> Deserialize<'de> for Money {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let dollars = f64::deserialize(deserializer)?;
        if !dollars.is_finite() || dollars < 0.0 {
            return Err(serde::de::Error::custom("amount must be a non-negative number"));
        }
        Ok(Self((dollars * 100.0).round() as u64))
    }
}

// ============================================================================
// Booking status
// ============================================================================

/// Lifecycle status of a booking.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    /// Awaiting the host's decision
    Pending,
    /// Accepted by the host
    Confirmed,
    /// Declined by the host (terminal)
    Rejected,
    /// Withdrawn by the guest or the host (terminal)
    Cancelled,
    /// Stay finished; promoted by the expiry sweep (terminal)
    Completed,
}

impl BookingStatus {
    /// Statuses that hold a property's dates against other bookings.
    pub const HOLDS_DATES: [Self; 2] = [Self::Pending, Self::Confirmed];

    /// Stable lowercase name used in storage and on the wire.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }

    /// No transition leaves a terminal status.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Rejected | Self::Cancelled | Self::Completed)
    }

    /// Whether a booking in this status blocks overlapping requests.
    #[must_use]
    pub const fn holds_dates(&self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown status string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown booking status: {0}")]
pub struct ParseStatusError(pub String);

impl FromStr for BookingStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "rejected" => Ok(Self::Rejected),
            "cancelled" => Ok(Self::Cancelled),
            "completed" => Ok(Self::Completed),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

// ============================================================================
// Actors and parties
// ============================================================================

/// Authenticated caller, as supplied by the identity provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    /// Who is calling
    pub user_id: UserId,
    /// Host role flag
    pub is_host: bool,
}

impl Actor {
    /// A caller without host privileges
    #[must_use]
    pub const fn guest(user_id: UserId) -> Self {
        Self { user_id, is_host: false }
    }

    /// A caller with host privileges
    #[must_use]
    pub const fn host(user_id: UserId) -> Self {
        Self { user_id, is_host: true }
    }
}

/// A participant of a booking with the contact details notifications need.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Party {
    /// User ID
    pub id: UserId,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Email address
    pub email: String,
}

impl Party {
    /// "First Last"
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

// ============================================================================
// Property (directory view)
// ============================================================================

/// What the engine needs to know about a listed property.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    /// Property ID
    pub id: PropertyId,
    /// Owning host
    pub host_id: UserId,
    /// Listing title
    pub title: String,
    /// City the property is in
    pub city: String,
    /// First listing image, if any
    pub cover_image: Option<String>,
    /// Nightly rate
    pub price_per_night: Money,
    /// One-off cleaning fee added to every stay
    pub cleaning_fee: Money,
    /// Capacity
    pub max_guests: u32,
    /// Inactive listings cannot be booked
    pub is_active: bool,
}

impl Property {
    /// Display summary embedded in booking views
    #[must_use]
    pub fn summary(&self) -> PropertySummary {
        PropertySummary {
            id: self.id,
            title: self.title.clone(),
            city: self.city.clone(),
            cover_image: self.cover_image.clone(),
        }
    }
}

/// Property fields shown alongside a booking.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertySummary {
    /// Property ID
    pub id: PropertyId,
    /// Listing title
    pub title: String,
    /// City
    pub city: String,
    /// First listing image, if any
    pub cover_image: Option<String>,
}

// ============================================================================
// Booking
// ============================================================================

/// A guest's request to stay at a property for a date range.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    /// Booking ID
    pub id: BookingId,
    /// Booked property (immutable)
    pub property_id: PropertyId,
    /// Guest who made the booking (immutable)
    pub guest_id: UserId,
    /// Check-in / check-out
    #[serde(flatten)]
    pub dates: StayDates,
    /// Party size
    pub number_of_guests: u32,
    /// Price fixed at creation; never recomputed
    pub total_price: Money,
    /// Free text for the host
    pub special_requests: Option<String>,
    /// Current lifecycle status
    pub status: BookingStatus,
    /// When the guest created the booking
    pub created_at: DateTime<Utc>,
    /// Last status change
    pub updated_at: DateTime<Utc>,
}

/// Validated input for a new booking.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewBooking {
    /// Property to book
    pub property_id: PropertyId,
    /// Requested check-in
    pub check_in: DateTime<Utc>,
    /// Requested check-out
    pub check_out: DateTime<Utc>,
    /// Party size
    pub number_of_guests: u32,
    /// Optional note for the host
    pub special_requests: Option<String>,
}

/// A booking with its property, host and guest, as rendered to clients.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDetails {
    /// The booking itself
    #[serde(flatten)]
    pub booking: Booking,
    /// Booked property
    pub property: PropertySummary,
    /// Owning host
    pub host: Party,
    /// Guest
    pub guest: Party,
}

impl BookingDetails {
    /// Booking ID shortcut
    #[must_use]
    pub const fn id(&self) -> BookingId {
        self.booking.id
    }

    /// Current status shortcut
    #[must_use]
    pub const fn status(&self) -> BookingStatus {
        self.booking.status
    }
}
