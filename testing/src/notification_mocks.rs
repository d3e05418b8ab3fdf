//! Notification sink that records deliveries.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)]

use roombnb_core::notification::{Notification, NotificationError, NotificationSink};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// Records every notification it is asked to deliver.
///
/// Delivery happens on a spawned task, so tests wait for it with
/// [`RecordingSink::wait_for`] instead of asserting immediately.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    delivered: Arc<Mutex<Vec<Notification>>>,
    arrived: Arc<Notify>,
    failing: Arc<AtomicBool>,
}

impl RecordingSink {
    /// A sink that accepts everything
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that records each attempt and then fails it
    #[must_use]
    pub fn failing() -> Self {
        let sink = Self::default();
        sink.failing.store(true, Ordering::SeqCst);
        sink
    }

    /// Everything delivered (or attempted, when failing) so far
    #[must_use]
    pub fn delivered(&self) -> Vec<Notification> {
        self.delivered.lock().unwrap().clone()
    }

    /// Waits until at least `count` notifications arrived or `timeout`
    /// elapsed, then returns what was recorded.
    pub async fn wait_for(&self, count: usize, timeout: Duration) -> Vec<Notification> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let arrived = self.arrived.notified();
            if self.delivered.lock().unwrap().len() >= count {
                break;
            }
            if tokio::time::timeout_at(deadline, arrived).await.is_err() {
                break;
            }
        }
        self.delivered()
    }
}

impl NotificationSink for RecordingSink {
    fn deliver(
        &self,
        notification: Notification,
    ) -> Pin<Box<dyn Future<Output = Result<(), NotificationError>> + Send + '_>> {
        Box::pin(async move {
            let kind = notification.kind;
            self.delivered.lock().unwrap().push(notification);
            self.arrived.notify_waiters();
            if self.failing.load(Ordering::SeqCst) {
                return Err(NotificationError::Delivery(format!(
                    "simulated outage delivering {kind}"
                )));
            }
            Ok(())
        })
    }
}
