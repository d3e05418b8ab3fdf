//! `PostgreSQL` persistence for the RoomBnB booking engine.
//!
//! [`PostgresStore`] implements every store trait from `roombnb-core` over one
//! connection pool:
//!
//! - [`PropertyDirectory`](roombnb_core::store::PropertyDirectory) and
//!   [`BookingStore`](roombnb_core::store::BookingStore)
//! - [`ReviewStore`](roombnb_core::store::ReviewStore) and
//!   [`FavoriteStore`](roombnb_core::store::FavoriteStore)
//! - [`SessionResolver`](roombnb_core::identity::SessionResolver) and
//!   [`HealthCheck`](roombnb_core::store::HealthCheck)
//!
//! Booking inserts take a transaction-scoped advisory lock keyed by the
//! property, so two overlapping requests cannot both pass the overlap check.
//!
//! # Example
//!
//! ```no_run
//! use roombnb_postgres::PostgresStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = sqlx::PgPool::connect("postgres://localhost/roombnb").await?;
//! let store = PostgresStore::new(pool);
//! store.migrate().await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod bookings;
mod favorites;
mod reviews;
mod rows;
mod sessions;

use roombnb_core::error::StoreError;
use sqlx::PgPool;

/// Embedded schema migrations.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// `PostgreSQL`-backed implementation of every store trait.
///
/// Cheap to clone; clones share the pool.
#[derive(Clone, Debug)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Wraps an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run database migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("Migration failed: {e}")))?;
        tracing::info!("Database migrations applied");
        Ok(())
    }
}

pub(crate) fn db_error(error: sqlx::Error) -> StoreError {
    StoreError::Database(error.to_string())
}

/// Maps a unique violation to [`StoreError::Duplicate`].
pub(crate) fn insert_error(error: sqlx::Error, what: &str) -> StoreError {
    if let sqlx::Error::Database(db_err) = &error {
        if db_err.is_unique_violation() {
            return StoreError::Duplicate(what.to_string());
        }
    }
    db_error(error)
}
