//! SMTP notification sink using Lettre.

use super::email::{EmailMessage, render};
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use roombnb_core::notification::{Notification, NotificationError, NotificationSink};
use std::future::Future;
use std::pin::Pin;

/// Implicit-TLS submission port; every other port upgrades with STARTTLS.
const SMTPS_PORT: u16 = 465;

/// Connection settings for [`SmtpNotificationSink`].
#[derive(Clone, Debug)]
pub struct SmtpSettings {
    /// SMTP server address (e.g. "smtp.gmail.com")
    pub host: String,
    /// SMTP server port (usually 587 for STARTTLS, 465 for TLS)
    pub port: u16,
    /// Authentication username
    pub username: String,
    /// Authentication password
    pub password: String,
    /// "From" header, e.g. `RoomBnB <noreply@roombnb.com>`
    pub from: String,
}

/// Sends notifications as multipart (plain text + HTML) email.
///
/// # Examples
///
/// ```ignore
/// use roombnb_runtime::notifications::smtp::{SmtpNotificationSink, SmtpSettings};
///
/// let sink = SmtpNotificationSink::new(&SmtpSettings {
///     host: "smtp.gmail.com".to_string(),
///     port: 587,
///     username: "user@gmail.com".to_string(),
///     password: "app_password".to_string(),
///     from: "RoomBnB <noreply@roombnb.com>".to_string(),
/// })?;
/// ```
#[derive(Clone)]
pub struct SmtpNotificationSink {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpNotificationSink {
    /// Builds the transport. No connection is opened until the first send.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationError::Build`] if the relay host or the sender
    /// address is invalid.
    pub fn new(settings: &SmtpSettings) -> Result<Self, NotificationError> {
        let builder = if settings.port == SMTPS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
        }
        .map_err(|e| NotificationError::Build(format!("SMTP relay error: {e}")))?;

        let transport = builder
            .port(settings.port)
            .credentials(Credentials::new(
                settings.username.clone(),
                settings.password.clone(),
            ))
            .build();

        let from = settings
            .from
            .parse()
            .map_err(|e| NotificationError::Build(format!("Invalid from address: {e}")))?;

        Ok(Self { transport, from })
    }

    fn build_message(&self, email: EmailMessage) -> Result<Message, NotificationError> {
        let to: Mailbox = email
            .to
            .parse()
            .map_err(|e| NotificationError::Build(format!("Invalid to address: {e}")))?;

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject)
            .multipart(MultiPart::alternative_plain_html(email.text, email.html))
            .map_err(|e| NotificationError::Build(format!("Failed to build email: {e}")))
    }
}

impl NotificationSink for SmtpNotificationSink {
    fn deliver(
        &self,
        notification: Notification,
    ) -> Pin<Box<dyn Future<Output = Result<(), NotificationError>> + Send + '_>> {
        Box::pin(async move {
            let email = render(&notification);
            let recipient = email.to.clone();
            let message = self.build_message(email)?;

            self.transport
                .send(message)
                .await
                .map_err(|e| NotificationError::Delivery(format!("Failed to send email: {e}")))?;

            tracing::info!(
                to = %recipient,
                kind = %notification.kind,
                booking_id = %notification.booking.id(),
                "Email sent"
            );
            Ok(())
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn settings() -> SmtpSettings {
        SmtpSettings {
            host: "smtp.example.com".to_string(),
            port: 587,
            username: "mailer".to_string(),
            password: "secret".to_string(),
            from: "RoomBnB <noreply@roombnb.com>".to_string(),
        }
    }

    #[tokio::test]
    async fn builds_with_valid_settings() {
        assert!(SmtpNotificationSink::new(&settings()).is_ok());
    }

    #[tokio::test]
    async fn rejects_bad_sender() {
        let mut bad = settings();
        bad.from = "not an address".to_string();
        assert!(matches!(
            SmtpNotificationSink::new(&bad),
            Err(NotificationError::Build(_))
        ));
    }
}
