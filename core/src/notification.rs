//! Lifecycle notifications and the sink trait that delivers them.

use crate::lifecycle::Participant;
use crate::types::{BookingDetails, Party};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// What happened to the booking.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    /// Guest requested a stay (sent to the host)
    NewBookingRequest,
    /// Host accepted (sent to the guest)
    BookingConfirmed,
    /// Host declined (sent to the guest)
    BookingRejected,
    /// Guest cancelled (sent to the host)
    BookingCancelledByGuest,
    /// Host cancelled (sent to the guest)
    BookingCancelledByHost,
}

impl NotificationKind {
    /// Cancellation notice addressed to the party that did not cancel.
    #[must_use]
    pub const fn cancelled_by(who: Participant) -> Self {
        match who {
            Participant::Guest => Self::BookingCancelledByGuest,
            Participant::Host => Self::BookingCancelledByHost,
        }
    }

    /// Which side of the booking receives this notification.
    #[must_use]
    pub const fn audience(&self) -> Participant {
        match self {
            Self::NewBookingRequest | Self::BookingCancelledByGuest => Participant::Host,
            Self::BookingConfirmed | Self::BookingRejected | Self::BookingCancelledByHost => {
                Participant::Guest
            }
        }
    }

    /// Stable snake-case name for logs and metric labels.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NewBookingRequest => "new_booking_request",
            Self::BookingConfirmed => "booking_confirmed",
            Self::BookingRejected => "booking_rejected",
            Self::BookingCancelledByGuest => "booking_cancelled_by_guest",
            Self::BookingCancelledByHost => "booking_cancelled_by_host",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message about a booking, addressed to one of its parties.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    /// Event
    pub kind: NotificationKind,
    /// Addressee
    pub recipient: Party,
    /// Booking snapshot at the time of the event
    pub booking: BookingDetails,
}

impl Notification {
    /// Addresses `kind` to the host or guest of `booking` as its audience requires.
    #[must_use]
    pub fn new(kind: NotificationKind, booking: BookingDetails) -> Self {
        let recipient = match kind.audience() {
            Participant::Host => booking.host.clone(),
            Participant::Guest => booking.guest.clone(),
        };
        Self {
            kind,
            recipient,
            booking,
        }
    }
}

/// Delivery failures. Never surfaced to booking callers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotificationError {
    /// Message could not be built (bad address, template failure)
    #[error("Failed to build notification: {0}")]
    Build(String),

    /// Transport rejected or dropped the message
    #[error("Failed to deliver notification: {0}")]
    Delivery(String),
}

/// Destination for notifications (email, log, test recorder).
///
/// Returns a boxed future so sinks can be held as `Arc<dyn NotificationSink>`.
pub trait NotificationSink: Send + Sync {
    /// Delivers one notification.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationError`] if the message cannot be built or sent.
    fn deliver(
        &self,
        notification: Notification,
    ) -> Pin<Box<dyn Future<Output = Result<(), NotificationError>> + Send + '_>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancellations_go_to_the_other_party() {
        assert_eq!(
            NotificationKind::cancelled_by(Participant::Guest).audience(),
            Participant::Host
        );
        assert_eq!(
            NotificationKind::cancelled_by(Participant::Host).audience(),
            Participant::Guest
        );
    }

    #[test]
    fn decisions_go_to_the_guest() {
        assert_eq!(NotificationKind::BookingConfirmed.audience(), Participant::Guest);
        assert_eq!(NotificationKind::BookingRejected.audience(), Participant::Guest);
        assert_eq!(NotificationKind::NewBookingRequest.audience(), Participant::Host);
    }
}
