//! HTTP request handlers, one module per resource.
//!
//! Reads answer `{ "data": ... }`; mutations answer
//! `{ "message": ..., "data": ... }`.

pub mod bookings;
pub mod dashboard;
pub mod earnings;
pub mod favorites;
pub mod guest_reviews;
pub mod health;
pub mod reviews;

use serde::Serialize;

pub use health::{health_check, readiness_check};

/// Body of a successful read.
#[derive(Debug, Serialize)]
pub struct Data<T> {
    /// Payload
    pub data: T,
}

impl<T> Data<T> {
    /// Wraps `data`.
    pub const fn new(data: T) -> Self {
        Self { data }
    }
}

/// Body of a successful mutation.
#[derive(Debug, Serialize)]
pub struct Message<T> {
    /// Human-readable outcome
    pub message: String,
    /// Payload
    pub data: T,
}

impl<T> Message<T> {
    /// Pairs `message` with `data`.
    pub fn new(message: impl Into<String>, data: T) -> Self {
        Self {
            message: message.into(),
            data,
        }
    }
}

/// Body of a mutation with nothing to return.
#[derive(Debug, Serialize)]
pub struct Notice {
    /// Human-readable outcome
    pub message: &'static str,
}
