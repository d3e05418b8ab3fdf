//! Background task that completes expired bookings.
//!
//! Runs once immediately, then on a fixed interval until shutdown. A failed
//! sweep is logged and the next tick retries.

use crate::engine::BookingEngine;
use crate::metrics::BookingMetrics;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;

/// Default interval between sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(3600);

/// Periodically promotes confirmed bookings whose checkout passed.
#[derive(Debug, Clone)]
pub struct ExpirySweeper {
    engine: BookingEngine,
    interval: Duration,
}

impl ExpirySweeper {
    /// Creates a sweeper over `engine`. Intervals under one second are
    /// raised to one second.
    #[must_use]
    pub fn new(engine: BookingEngine, interval: Duration) -> Self {
        Self {
            engine,
            interval: interval.max(Duration::from_secs(1)),
        }
    }

    /// Runs one sweep, logging instead of failing.
    ///
    /// Returns the number of bookings completed, zero on error.
    pub async fn run_once(&self) -> u64 {
        let started = Instant::now();
        match self.engine.complete_expired_bookings().await {
            Ok(completed) => {
                BookingMetrics::record_sweep(completed, started.elapsed());
                completed
            }
            Err(error) => {
                tracing::error!(error = %error, "Expiry sweep failed, retrying next interval");
                0
            }
        }
    }

    /// Sweeps on every tick until a shutdown signal arrives.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(interval_secs = self.interval.as_secs(), "Expiry sweeper started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.run_once().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Expiry sweeper stopping");
                    break;
                }
            }
        }
    }
}
