//! HTTP surface for the `RoomBnB` booking engine.
//!
//! Handlers are a thin shell over the runtime services: extract the caller
//! and the input, call one service method, map the result to a JSON
//! envelope.
//!
//! # Request Flow
//!
//! 1. **Correlation ID** assigned (or taken from `X-Correlation-ID`)
//! 2. **Session** resolved from the bearer token
//! 3. **Body/path** parsed; rejections become 400 `validation_failed`
//! 4. **Service call** on [`AppState`]
//! 5. **Result** mapped to `{ data }`, `{ message, data }` or an error body
//!
//! # Example
//!
//! ```ignore
//! use roombnb_web::{AppState, build_router};
//!
//! let state = AppState::new(store, sessions, notifier, clock);
//! let app = build_router(state);
//! axum::serve(listener, app).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

// Re-export key types for convenience
pub use error::AppError;
pub use extractors::{
    CorrelationId, CurrentActor, HostActor, MAINTENANCE_TOKEN_HEADER, MaintenanceAccess,
};
pub use middleware::{CORRELATION_ID_HEADER, request_tracking_layer};
pub use routes::build_router;
pub use state::AppState;

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
