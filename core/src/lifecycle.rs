//! Booking state machine and the authorization rules around it.
//!
//! The engine never writes a status directly: it asks a [`Transition`] for the
//! next status given the current one, and asks [`Transition::authorize`] who is
//! allowed to drive it.

use crate::error::BookingError;
use crate::pricing::StayDates;
use crate::types::{Actor, BookingStatus, UserId};
use chrono::{DateTime, Utc};

/// Which side of a booking an actor is on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Participant {
    /// The guest who made the booking
    Guest,
    /// The host who owns the booked property
    Host,
}

/// Resolves the actor's relationship to a booking.
///
/// A user who booked their own property counts as the guest.
#[must_use]
pub fn participant(actor: &Actor, guest_id: UserId, host_id: UserId) -> Option<Participant> {
    if actor.user_id == guest_id {
        Some(Participant::Guest)
    } else if actor.user_id == host_id {
        Some(Participant::Host)
    } else {
        None
    }
}

/// Requires the actor to be the guest or the host.
///
/// # Errors
///
/// Returns [`BookingError::Forbidden`] with "Not authorized to view this
/// booking" for any other actor.
pub fn authorize_view(
    actor: &Actor,
    guest_id: UserId,
    host_id: UserId,
) -> Result<Participant, BookingError> {
    participant(actor, guest_id, host_id)
        .ok_or_else(|| BookingError::forbidden("Not authorized to view this booking"))
}

/// A status change requested of a booking.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Transition {
    /// Host accepts a pending request
    Confirm,
    /// Host declines a pending request
    Reject,
    /// Guest or host withdraws a pending or confirmed booking
    Cancel,
    /// Expiry sweep closes a confirmed stay whose checkout has passed
    Complete,
}

impl Transition {
    /// Statuses this transition may start from.
    #[must_use]
    pub const fn allowed_from(&self) -> &'static [BookingStatus] {
        match self {
            Self::Confirm | Self::Reject => &[BookingStatus::Pending],
            Self::Cancel => &BookingStatus::HOLDS_DATES,
            Self::Complete => &[BookingStatus::Confirmed],
        }
    }

    /// Status the booking ends up in.
    #[must_use]
    pub const fn target(&self) -> BookingStatus {
        match self {
            Self::Confirm => BookingStatus::Confirmed,
            Self::Reject => BookingStatus::Rejected,
            Self::Cancel => BookingStatus::Cancelled,
            Self::Complete => BookingStatus::Completed,
        }
    }

    /// Verb used in messages and metric labels.
    #[must_use]
    pub const fn verb(&self) -> &'static str {
        match self {
            Self::Confirm => "confirm",
            Self::Reject => "reject",
            Self::Cancel => "cancel",
            Self::Complete => "complete",
        }
    }

    /// Computes the next status.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::InvalidTransition`] carrying `from` when the
    /// transition is not defined out of it.
    pub fn apply(&self, from: BookingStatus) -> Result<BookingStatus, BookingError> {
        if self.allowed_from().contains(&from) {
            return Ok(self.target());
        }
        let message = match (self, from) {
            (Self::Cancel, BookingStatus::Cancelled) => "Booking already cancelled".to_string(),
            (Self::Cancel, status) => format!("Cannot cancel {status} booking"),
            (transition, status) => {
                format!("Cannot {} booking with status {status}", transition.verb())
            }
        };
        Err(BookingError::InvalidTransition { message, current: from })
    }

    /// Checks that `actor` may drive this transition on a booking between
    /// `guest_id` and `host_id`.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Forbidden`] when the actor is not an allowed
    /// participant. [`Transition::Complete`] has no human actor and always fails.
    pub fn authorize(
        &self,
        actor: &Actor,
        guest_id: UserId,
        host_id: UserId,
    ) -> Result<Participant, BookingError> {
        let who = match self {
            Self::Cancel => participant(actor, guest_id, host_id),
            Self::Confirm | Self::Reject => {
                (actor.user_id == host_id).then_some(Participant::Host)
            }
            Self::Complete => None,
        };
        who.ok_or_else(|| {
            BookingError::forbidden(format!("Not authorized to {} this booking", self.verb()))
        })
    }
}

/// A stay is finished once completed, or confirmed with checkout in the past.
///
/// Reviews and earnings both count finished stays, so a booking the sweep has
/// not reached yet is still included.
#[must_use]
pub fn stay_finished(status: BookingStatus, dates: &StayDates, now: DateTime<Utc>) -> bool {
    match status {
        BookingStatus::Completed => true,
        BookingStatus::Confirmed => dates.is_over(now),
        _ => false,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use proptest::prelude::*;

    const ALL: [BookingStatus; 5] = [
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::Rejected,
        BookingStatus::Cancelled,
        BookingStatus::Completed,
    ];

    const TRANSITIONS: [Transition; 4] = [
        Transition::Confirm,
        Transition::Reject,
        Transition::Cancel,
        Transition::Complete,
    ];

    #[test]
    fn table() {
        assert_eq!(
            Transition::Confirm.apply(BookingStatus::Pending),
            Ok(BookingStatus::Confirmed)
        );
        assert_eq!(
            Transition::Reject.apply(BookingStatus::Pending),
            Ok(BookingStatus::Rejected)
        );
        assert_eq!(
            Transition::Cancel.apply(BookingStatus::Pending),
            Ok(BookingStatus::Cancelled)
        );
        assert_eq!(
            Transition::Cancel.apply(BookingStatus::Confirmed),
            Ok(BookingStatus::Cancelled)
        );
        assert_eq!(
            Transition::Complete.apply(BookingStatus::Confirmed),
            Ok(BookingStatus::Completed)
        );
        assert!(Transition::Confirm.apply(BookingStatus::Confirmed).is_err());
        assert!(Transition::Complete.apply(BookingStatus::Pending).is_err());
    }

    #[test]
    fn cancel_messages() {
        let msg = |s| Transition::Cancel.apply(s).unwrap_err().to_string();
        assert_eq!(msg(BookingStatus::Cancelled), "Booking already cancelled");
        assert_eq!(msg(BookingStatus::Completed), "Cannot cancel completed booking");
        assert_eq!(msg(BookingStatus::Rejected), "Cannot cancel rejected booking");
    }

    #[test]
    fn confirm_message_names_current_status() {
        let err = Transition::Confirm.apply(BookingStatus::Rejected).unwrap_err();
        assert_eq!(err.to_string(), "Cannot confirm booking with status rejected");
        assert_eq!(err.current_status(), Some(BookingStatus::Rejected));

        let err = Transition::Reject.apply(BookingStatus::Confirmed).unwrap_err();
        assert_eq!(err.to_string(), "Cannot reject booking with status confirmed");
    }

    #[test]
    fn only_owner_confirms() {
        let guest = UserId::new();
        let host = UserId::new();

        assert!(Transition::Confirm.authorize(&Actor::host(host), guest, host).is_ok());
        let err = Transition::Confirm
            .authorize(&Actor::guest(guest), guest, host)
            .unwrap_err();
        assert_eq!(err.to_string(), "Not authorized to confirm this booking");

        let err = Transition::Reject
            .authorize(&Actor::host(UserId::new()), guest, host)
            .unwrap_err();
        assert_eq!(err.to_string(), "Not authorized to reject this booking");
    }

    #[test]
    fn either_party_cancels() {
        let guest = UserId::new();
        let host = UserId::new();

        assert_eq!(
            Transition::Cancel.authorize(&Actor::guest(guest), guest, host),
            Ok(Participant::Guest)
        );
        assert_eq!(
            Transition::Cancel.authorize(&Actor::host(host), guest, host),
            Ok(Participant::Host)
        );
        let err = Transition::Cancel
            .authorize(&Actor::guest(UserId::new()), guest, host)
            .unwrap_err();
        assert_eq!(err.to_string(), "Not authorized to cancel this booking");
    }

    #[test]
    fn strangers_cannot_view() {
        let err = authorize_view(&Actor::host(UserId::new()), UserId::new(), UserId::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
        assert_eq!(err.to_string(), "Not authorized to view this booking");
    }

    proptest! {
        #[test]
        fn terminal_states_are_closed(s in 0usize..5, t in 0usize..4) {
            let status = ALL[s];
            let transition = TRANSITIONS[t];
            if status.is_terminal() {
                let err = transition.apply(status).unwrap_err();
                prop_assert_eq!(err.kind(), ErrorKind::Conflict);
                prop_assert_eq!(err.current_status(), Some(status));
            }
        }

        #[test]
        fn every_target_is_reachable_only_from_allowed(s in 0usize..5, t in 0usize..4) {
            let status = ALL[s];
            let transition = TRANSITIONS[t];
            prop_assert_eq!(
                transition.apply(status).is_ok(),
                transition.allowed_from().contains(&status)
            );
        }
    }
}
