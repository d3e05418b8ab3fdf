//! Environment traits the engine depends on for side-effect free logic.

use chrono::{DateTime, Utc};

/// Clock trait - abstracts time operations for testability
///
/// Every "now" the engine needs (creation timestamps, the expiry sweep cut-off,
/// review eligibility) comes from a `Clock` so tests can pin time.
///
/// # Examples
///
/// ```
/// use roombnb_core::environment::{Clock, SystemClock};
///
/// let clock = SystemClock;
/// let _now = clock.now();
/// ```
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
