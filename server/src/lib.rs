//! `RoomBnB` booking service.
//!
//! Wires the Postgres store, the booking runtime and the HTTP surface into
//! one process. The binary in `main.rs` only loads configuration, installs
//! logging and hands over to [`app::Application`].

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]

pub mod app;
pub mod config;

pub use app::Application;
pub use config::Config;
