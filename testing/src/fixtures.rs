//! Seeded marketplace and date helpers shared by engine, web and store tests.

#![allow(clippy::unwrap_used)] // Fixture dates are literals
#![allow(clippy::missing_panics_doc)]

use crate::store_mocks::InMemoryStore;
use chrono::{DateTime, TimeZone, Utc};
use roombnb_core::pricing::{StayDates, quote};
use roombnb_core::types::{
    Actor, Booking, BookingId, BookingStatus, Money, Party, Property, PropertyId, UserId,
};

/// Midnight UTC on the given day.
#[must_use]
pub fn date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    at(year, month, day, 0)
}

/// The given hour (UTC) on the given day.
#[must_use]
pub fn at(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, 0, 0).unwrap()
}

/// A user with a generated ID.
#[must_use]
pub fn party(first_name: &str, last_name: &str) -> Party {
    Party {
        id: UserId::new(),
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        email: format!(
            "{}.{}@example.com",
            first_name.to_lowercase(),
            last_name.to_lowercase()
        ),
    }
}

/// An active listing: $200/night, $40 cleaning, up to 4 guests.
#[must_use]
pub fn cottage(host_id: UserId) -> Property {
    Property {
        id: PropertyId::new(),
        host_id,
        title: "Ocean View Cottage".to_string(),
        city: "Santa Cruz".to_string(),
        cover_image: Some("https://images.example.com/cottage.jpg".to_string()),
        price_per_night: Money::from_dollars(200),
        cleaning_fee: Money::from_dollars(40),
        max_guests: 4,
        is_active: true,
    }
}

/// A host, their guest-to-be, an unrelated stranger and one property, already
/// registered in an [`InMemoryStore`].
#[derive(Clone, Debug)]
pub struct Marketplace {
    /// Backing store
    pub store: InMemoryStore,
    /// Owns [`Marketplace::property`]
    pub host: Party,
    /// Books [`Marketplace::property`]
    pub guest: Party,
    /// Neither guest nor host of anything
    pub stranger: Party,
    /// The cottage
    pub property: Property,
}

impl Marketplace {
    /// Seeds a fresh store.
    #[must_use]
    pub fn new() -> Self {
        let store = InMemoryStore::new();
        let host = party("Hannah", "Host");
        let guest = party("Gary", "Guest");
        let stranger = party("Sam", "Stranger");
        let property = cottage(host.id);

        store.add_user(host.clone());
        store.add_user(guest.clone());
        store.add_user(stranger.clone());
        store.put_property(property.clone());

        Self {
            store,
            host,
            guest,
            stranger,
            property,
        }
    }

    /// Registers another user.
    #[must_use]
    pub fn add_party(&self, first_name: &str, last_name: &str) -> Party {
        let p = party(first_name, last_name);
        self.store.add_user(p.clone());
        p
    }

    /// The host as an authenticated actor
    #[must_use]
    pub const fn host_actor(&self) -> Actor {
        Actor::host(self.host.id)
    }

    /// The guest as an authenticated actor
    #[must_use]
    pub const fn guest_actor(&self) -> Actor {
        Actor::guest(self.guest.id)
    }

    /// The stranger as an authenticated actor (with the host flag set)
    #[must_use]
    pub const fn stranger_actor(&self) -> Actor {
        Actor::host(self.stranger.id)
    }

    /// A booking by the guest on the cottage, priced as the engine would,
    /// created at 2025-01-01. Not stored.
    #[must_use]
    pub fn booking(
        &self,
        check_in: DateTime<Utc>,
        check_out: DateTime<Utc>,
        status: BookingStatus,
    ) -> Booking {
        let dates = StayDates::new(check_in, check_out).unwrap();
        let created_at = date(2025, 1, 1);
        Booking {
            id: BookingId::new(),
            property_id: self.property.id,
            guest_id: self.guest.id,
            dates,
            number_of_guests: 2,
            total_price: quote(&self.property, &dates),
            special_requests: None,
            status,
            created_at,
            updated_at: created_at,
        }
    }

    /// Stores a booking built by [`Marketplace::booking`] and returns its ID.
    pub fn seed(
        &self,
        check_in: DateTime<Utc>,
        check_out: DateTime<Utc>,
        status: BookingStatus,
    ) -> BookingId {
        let booking = self.booking(check_in, check_out, status);
        let id = booking.id;
        self.store.seed_booking(booking);
        id
    }
}

impl Default for Marketplace {
    fn default() -> Self {
        Self::new()
    }
}
