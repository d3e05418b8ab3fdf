//! Error taxonomy for booking operations.
//!
//! Every failure carries a stable [`ErrorKind`] the transport layer maps 1:1 to
//! a status code, plus a human-readable message clients match on.

use crate::types::BookingStatus;
use thiserror::Error;

/// Machine-readable error classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Resource absent (or hidden, e.g. inactive property)
    NotFound,
    /// Actor lacks rights over the resource
    Forbidden,
    /// Input rejected before touching state
    ValidationFailed,
    /// Request collides with current state
    Conflict,
    /// Infrastructure failure
    Internal,
}

impl ErrorKind {
    /// Stable snake-case code used in response bodies.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Forbidden => "forbidden",
            Self::ValidationFailed => "validation_failed",
            Self::Conflict => "conflict",
            Self::Internal => "internal",
        }
    }
}

/// Errors from persistence collaborators.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Database unavailable or query failed
    #[error("Database error: {0}")]
    Database(String),

    /// Insert lost the race against an overlapping booking
    #[error("Overlapping booking exists for property")]
    Overlap,

    /// Unique constraint violated (e.g. second review for a booking)
    #[error("Duplicate record: {0}")]
    Duplicate(String),

    /// Stored row could not be decoded into a domain value
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

/// Errors returned by booking, review and earnings operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookingError {
    /// Missing resource, e.g. `"Booking"` yields "Booking not found"
    #[error("{resource} not found")]
    NotFound {
        /// Resource name as shown to users
        resource: &'static str,
    },

    /// Actor may not perform this operation
    #[error("{0}")]
    Forbidden(String),

    /// `check_in >= check_out`
    #[error("Check-out must be after check-in")]
    InvalidRange,

    /// Party larger than the property allows
    #[error("Maximum {max_guests} guests allowed")]
    CapacityExceeded {
        /// Property capacity
        max_guests: u32,
    },

    /// Any other input validation failure
    #[error("{0}")]
    Validation(String),

    /// Another pending or confirmed booking holds the dates
    #[error("Property not available for selected dates")]
    DateConflict,

    /// Transition not allowed from the booking's current status
    #[error("{message}")]
    InvalidTransition {
        /// Human-readable reason
        message: String,
        /// Status the booking is actually in
        current: BookingStatus,
    },

    /// Other state conflicts (duplicate reviews)
    #[error("{0}")]
    Conflict(String),

    /// Persistence failure
    #[error(transparent)]
    Store(StoreError),
}

impl BookingError {
    /// Shorthand for [`BookingError::NotFound`]
    #[must_use]
    pub const fn not_found(resource: &'static str) -> Self {
        Self::NotFound { resource }
    }

    /// Shorthand for [`BookingError::Forbidden`]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    /// Shorthand for [`BookingError::Validation`]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Classification used by the transport layer.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::InvalidRange | Self::CapacityExceeded { .. } | Self::Validation(_) => {
                ErrorKind::ValidationFailed
            }
            Self::DateConflict | Self::InvalidTransition { .. } | Self::Conflict(_) => {
                ErrorKind::Conflict
            }
            Self::Store(_) => ErrorKind::Internal,
        }
    }

    /// Current booking status, for conflicts caused by an invalid transition.
    #[must_use]
    pub const fn current_status(&self) -> Option<BookingStatus> {
        match self {
            Self::InvalidTransition { current, .. } => Some(*current),
            _ => None,
        }
    }
}

impl From<StoreError> for BookingError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Overlap => Self::DateConflict,
            other => Self::Store(other),
        }
    }
}
