//! # RoomBnB Testing
//!
//! Testing utilities for the RoomBnB booking engine.
//!
//! This crate provides:
//! - [`FixedClock`]: deterministic, manually advanced time
//! - [`InMemoryStore`]: every store trait behind one `RwLock`
//! - [`RacingStore`]: replays lost insert and status races
//! - [`RecordingSink`]: captures notifications and can simulate outages
//! - [`StaticSessions`]: token → actor map for HTTP tests
//! - [`Marketplace`]: a seeded host, guest, stranger and property
//!
//! ## Example
//!
//! ```ignore
//! use roombnb_testing::{Marketplace, RecordingSink, test_clock};
//!
//! #[tokio::test]
//! async fn books_a_stay() {
//!     let market = Marketplace::new();
//!     let sink = RecordingSink::new();
//!     let clock = test_clock();
//!     // hand `market.store`, `sink` and `clock` to the engine under test
//! }
//! ```

use chrono::{DateTime, Duration, Utc};
use roombnb_core::environment::Clock;

pub mod fixtures;
pub mod notification_mocks;
pub mod store_mocks;

/// Mock implementations of environment traits.
pub mod mocks {
    use super::{Clock, DateTime, Duration, Utc};
    use roombnb_core::identity::SessionResolver;
    use roombnb_core::store::StoreFuture;
    use roombnb_core::types::Actor;
    use std::collections::HashMap;
    use std::sync::{Arc, RwLock};

    /// Fixed clock for deterministic tests
    ///
    /// Returns the same time until moved with [`FixedClock::advance`] or
    /// [`FixedClock::set`]. Clones share the same time.
    ///
    /// # Example
    ///
    /// ```
    /// use roombnb_testing::mocks::FixedClock;
    /// use roombnb_core::environment::Clock;
    /// use chrono::{Duration, Utc};
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let before = clock.now();
    /// assert_eq!(before, clock.now());
    ///
    /// clock.advance(Duration::days(1));
    /// assert_eq!(clock.now() - before, Duration::days(1));
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: Arc<RwLock<DateTime<Utc>>>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub fn new(time: DateTime<Utc>) -> Self {
            Self {
                time: Arc::new(RwLock::new(time)),
            }
        }

        /// Move the clock forward
        #[allow(clippy::unwrap_used)]
        pub fn advance(&self, by: Duration) {
            let mut time = self.time.write().unwrap();
            *time += by;
        }

        /// Jump to an absolute time
        #[allow(clippy::unwrap_used)]
        pub fn set(&self, to: DateTime<Utc>) {
            *self.time.write().unwrap() = to;
        }
    }

    impl Clock for FixedClock {
        #[allow(clippy::unwrap_used)]
        fn now(&self) -> DateTime<Utc> {
            *self.time.read().unwrap()
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }

    /// Session resolver backed by a fixed token table.
    #[derive(Debug, Clone, Default)]
    pub struct StaticSessions {
        tokens: Arc<RwLock<HashMap<String, Actor>>>,
    }

    impl StaticSessions {
        /// Empty table; every token is rejected
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Registers `token` for `actor`
        #[must_use]
        #[allow(clippy::unwrap_used)]
        pub fn with(self, token: &str, actor: Actor) -> Self {
            self.tokens.write().unwrap().insert(token.to_string(), actor);
            self
        }
    }

    impl SessionResolver for StaticSessions {
        #[allow(clippy::unwrap_used)]
        fn resolve<'a>(&'a self, token: &'a str) -> StoreFuture<'a, Option<Actor>> {
            let actor = self.tokens.read().unwrap().get(token).copied();
            Box::pin(async move { Ok(actor) })
        }
    }
}

/// Installs a test-writer tracing subscriber once per process.
///
/// Safe to call from every test; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_test_writer()
        .try_init();
}

// Re-export commonly used items
pub use fixtures::{Marketplace, at, date};
pub use mocks::{FixedClock, StaticSessions, test_clock};
pub use notification_mocks::RecordingSink;
pub use store_mocks::{InMemoryStore, RacingStore};
