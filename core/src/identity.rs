//! Session lookup.
//!
//! Tokens are issued elsewhere; this crate only needs to turn one back into an
//! [`Actor`]. The result is trusted verbatim, including the host flag.

use crate::store::StoreFuture;
use crate::types::Actor;

/// Resolves bearer tokens to actors.
pub trait SessionResolver: Send + Sync {
    /// Returns the actor for a live session, or `None` for unknown or expired
    /// tokens.
    fn resolve<'a>(&'a self, token: &'a str) -> StoreFuture<'a, Option<Actor>>;
}
