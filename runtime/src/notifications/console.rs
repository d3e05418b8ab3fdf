//! Notification sink that only logs.

use super::email::render;
use roombnb_core::notification::{Notification, NotificationError, NotificationSink};
use std::future::Future;
use std::pin::Pin;

/// Logs each notification instead of sending it.
///
/// Used when SMTP credentials are not configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConsoleNotificationSink;

impl NotificationSink for ConsoleNotificationSink {
    fn deliver(
        &self,
        notification: Notification,
    ) -> Pin<Box<dyn Future<Output = Result<(), NotificationError>> + Send + '_>> {
        Box::pin(async move {
            let email = render(&notification);
            tracing::info!(
                to = %email.to,
                subject = %email.subject,
                kind = %notification.kind,
                booking_id = %notification.booking.id(),
                "Would send email"
            );
            Ok(())
        })
    }
}
