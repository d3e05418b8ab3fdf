//! Fire-and-forget notification dispatch.
//!
//! The engine hands a [`Notification`] to the [`Notifier`] and returns at
//! once. Delivery runs on a spawned task; failures are logged and counted,
//! never propagated.

pub mod console;
pub mod email;
pub mod smtp;

pub use console::ConsoleNotificationSink;
pub use smtp::{SmtpNotificationSink, SmtpSettings};

use crate::metrics::BookingMetrics;
use roombnb_core::notification::{Notification, NotificationSink};
use std::sync::Arc;

/// Dispatches notifications to a sink without waiting for delivery.
#[derive(Clone)]
pub struct Notifier {
    sink: Arc<dyn NotificationSink>,
}

impl Notifier {
    /// Wraps a sink.
    #[must_use]
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self { sink }
    }

    /// Spawns delivery on the current tokio runtime.
    ///
    /// Outside a runtime the notification is dropped with a warning.
    pub fn dispatch(&self, notification: Notification) {
        let kind = notification.kind;
        let booking_id = notification.booking.id();

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(%kind, %booking_id, "No async runtime, notification dropped");
            BookingMetrics::record_notification_failure(kind);
            return;
        };

        let sink = Arc::clone(&self.sink);
        runtime.spawn(async move {
            match sink.deliver(notification).await {
                Ok(()) => tracing::debug!(%kind, %booking_id, "Notification delivered"),
                Err(error) => {
                    tracing::warn!(%kind, %booking_id, error = %error, "Notification delivery failed");
                    BookingMetrics::record_notification_failure(kind);
                }
            }
        });
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier").finish_non_exhaustive()
    }
}
