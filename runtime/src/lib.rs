//! # RoomBnB Runtime
//!
//! Services that put the domain rules from `roombnb-core` to work against
//! injected stores.
//!
//! ## Core Components
//!
//! - **[`BookingEngine`]**: create, read, cancel, confirm, reject, sweep
//! - **[`ReviewService`]**: property reviews and host reviews of guests
//! - **[`EarningsService`]**: host earnings and occupancy
//! - **[`DashboardService`]**: guest and host overviews
//! - **[`FavoriteService`]**: saved properties
//! - **[`Notifier`]**: fire-and-forget notification dispatch
//! - **[`ExpirySweeper`]**: the hourly completion sweep
//!
//! ## Example
//!
//! ```ignore
//! use roombnb_runtime::{BookingEngine, Notifier};
//! use roombnb_runtime::notifications::ConsoleNotificationSink;
//! use roombnb_core::environment::SystemClock;
//!
//! let store = Arc::new(PostgresStore::new(pool));
//! let engine = BookingEngine::new(
//!     store.clone(),
//!     store,
//!     Notifier::new(Arc::new(ConsoleNotificationSink)),
//!     Arc::new(SystemClock),
//! );
//!
//! let details = engine.confirm_booking(&host, booking_id).await?;
//! ```

pub mod dashboard;
pub mod earnings;
pub mod engine;
pub mod favorites;
pub mod metrics;
pub mod notifications;
pub mod reviews;
pub mod sweeper;

pub use dashboard::DashboardService;
pub use earnings::EarningsService;
pub use engine::BookingEngine;
pub use favorites::FavoriteService;
pub use notifications::Notifier;
pub use reviews::{NewGuestReview, NewReview, ReviewService};
pub use sweeper::ExpirySweeper;
