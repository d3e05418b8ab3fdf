//! # RoomBnB Core
//!
//! Domain types and rules for the RoomBnB vacation-rental marketplace.
//!
//! This crate owns everything about a booking that can be decided without I/O:
//!
//! - **Types**: identifiers, [`Money`], [`StayDates`], [`Booking`] and its
//!   denormalized [`BookingDetails`] view
//! - **Lifecycle**: the [`BookingStatus`] state machine and who may drive it
//! - **Pricing**: night counting, quoting and the inclusive overlap rule
//! - **Reviews and earnings**: validation and aggregation for the host dashboard
//! - **Dashboards and favorites**: the guest and host overviews, saved listings
//! - **Collaborators**: the traits the engine calls into (stores, property
//!   directory, identity provider, notification sink, clock)
//!
//! # Booking State Machine
//!
//! ```text
//!              confirm (host)            sweep (checkOut < now)
//!   pending ─────────────────▶ confirmed ───────────────────────▶ completed
//!      │  \                        │
//!      │   \ reject (host)         │ cancel (guest or host)
//!      │    ▼                      ▼
//!      │   rejected            cancelled
//!      │                           ▲
//!      └───────────────────────────┘
//!           cancel (guest or host)
//! ```
//!
//! `rejected`, `cancelled` and `completed` are terminal.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod dashboard;
pub mod earnings;
pub mod environment;
pub mod error;
pub mod favorite;
pub mod identity;
pub mod lifecycle;
pub mod notification;
pub mod pricing;
pub mod review;
pub mod store;
pub mod types;

pub use error::{BookingError, ErrorKind, StoreError};
pub use lifecycle::{Participant, Transition};
pub use pricing::StayDates;
pub use types::*;
