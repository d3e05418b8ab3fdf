//! Prometheus metrics for the booking engine.
//!
//! Counters are recorded through the `metrics` facade everywhere; the
//! [`MetricsServer`] installs the Prometheus recorder and its HTTP listener once
//! at process start.
//!
//! # Example
//!
//! ```rust,no_run
//! use roombnb_runtime::metrics::MetricsServer;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut server = MetricsServer::new("0.0.0.0:9090".parse()?);
//! server.start()?;
//!
//! // Metrics available at http://localhost:9090/metrics
//! # Ok(())
//! # }
//! ```

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use roombnb_core::notification::NotificationKind;
use roombnb_core::types::BookingStatus;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Prometheus metrics server.
///
/// Exposes metrics on an HTTP endpoint for Prometheus scraping.
pub struct MetricsServer {
    addr: SocketAddr,
    handle: Option<PrometheusHandle>,
}

impl MetricsServer {
    /// Create a new metrics server.
    ///
    /// # Arguments
    ///
    /// * `addr` - Socket address to bind to (e.g., `0.0.0.0:9090`)
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self { addr, handle: None }
    }

    /// Install the recorder and spawn the scrape endpoint on the current
    /// tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns error if the exporter cannot be built or installed.
    ///
    /// # Note
    ///
    /// If a recorder is already installed (e.g. by an earlier test) this logs a
    /// warning and leaves the existing recorder in place.
    pub fn start(&mut self) -> Result<(), MetricsError> {
        register_metrics();

        let (recorder, exporter) = PrometheusBuilder::new()
            .with_http_listener(self.addr)
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?
            .build()
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        let handle = recorder.handle();
        match metrics::set_global_recorder(recorder) {
            Ok(()) => {
                tokio::spawn(async move {
                    if let Err(_error) = exporter.await {
                        // ExporterError (metrics-exporter-prometheus 0.15) implements neither Debug nor Display.
                        tracing::error!("Metrics exporter stopped");
                    }
                });
                self.handle = Some(handle);
                tracing::info!(
                    addr = %self.addr,
                    "Metrics server started - available at http://{}/metrics",
                    self.addr
                );
                Ok(())
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Metrics recorder already initialized, skipping re-initialization"
                );
                Ok(())
            }
        }
    }

    /// Render current metrics in Prometheus format.
    ///
    /// Returns `None` if this server did not install the recorder.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

/// Register all metric descriptions.
fn register_metrics() {
    describe_counter!("bookings_created_total", "Bookings accepted as pending requests");
    describe_counter!(
        "booking_transitions_total",
        "Status transitions applied, labelled by target status"
    );
    describe_counter!(
        "booking_conflicts_total",
        "Booking requests refused because the dates were taken"
    );
    describe_counter!(
        "bookings_completed_by_sweep_total",
        "Confirmed bookings promoted to completed by the expiry sweep"
    );
    describe_counter!(
        "notifications_failed_total",
        "Notifications that could not be delivered"
    );
    describe_histogram!("sweep_duration_seconds", "Time taken by one expiry sweep");
}

/// Booking lifecycle metrics recorder.
pub struct BookingMetrics;

impl BookingMetrics {
    /// Record a new booking request.
    pub fn record_created() {
        counter!("bookings_created_total").increment(1);
    }

    /// Record a status change.
    pub fn record_transition(to: BookingStatus) {
        counter!("booking_transitions_total", "to" => to.as_str()).increment(1);
    }

    /// Record a refused overlapping request.
    pub fn record_conflict() {
        counter!("booking_conflicts_total").increment(1);
    }

    /// Record one sweep run.
    pub fn record_sweep(completed: u64, duration: Duration) {
        counter!("bookings_completed_by_sweep_total").increment(completed);
        histogram!("sweep_duration_seconds").record(duration.as_secs_f64());
    }

    /// Record a failed notification delivery.
    pub fn record_notification_failure(kind: NotificationKind) {
        counter!("notifications_failed_total", "kind" => kind.as_str()).increment(1);
    }
}
