//! Renders notifications as email messages.

use chrono::{DateTime, Utc};
use roombnb_core::notification::{Notification, NotificationKind};
use std::fmt::Write as _;

/// A rendered email, independent of any transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmailMessage {
    /// Recipient address
    pub to: String,
    /// Subject line
    pub subject: String,
    /// Plain-text body
    pub text: String,
    /// HTML body
    pub html: String,
}

const FOOTER: &str = "This is an automated message from RoomBnB. Please do not reply to this email.";

fn format_date(date: DateTime<Utc>) -> String {
    date.format("%A, %B %-d, %Y").to_string()
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Builds the email for a notification.
#[must_use]
#[allow(clippy::too_many_lines)]
pub fn render(notification: &Notification) -> EmailMessage {
    let details = &notification.booking;
    let booking = &details.booking;
    let title = details.property.title.as_str();
    let host_name = details.host.full_name();
    let guest_name = details.guest.full_name();
    let check_in = format_date(booking.dates.check_in());
    let check_out = format_date(booking.dates.check_out());

    let (subject, heading, greeting_name, intro, mut rows, closing) = match notification.kind {
        NotificationKind::NewBookingRequest => (
            format!("New Booking Request for {title}"),
            "New Booking Request!",
            host_name.clone(),
            format!("You have received a new booking request for {title}."),
            vec![
                ("Guest", guest_name.clone()),
                ("Check-in", check_in),
                ("Check-out", check_out),
                ("Guests", booking.number_of_guests.to_string()),
                ("Total", booking.total_price.to_string()),
            ],
            "Please log in to your dashboard to confirm or reject this booking.",
        ),
        NotificationKind::BookingConfirmed => (
            format!("Booking Confirmed - {title}"),
            "Booking Confirmed!",
            guest_name.clone(),
            format!("Great news! Your booking for {title} has been confirmed by the host."),
            vec![
                ("Property", title.to_string()),
                ("Host", host_name.clone()),
                ("Check-in", check_in),
                ("Check-out", check_out),
                ("Guests", booking.number_of_guests.to_string()),
                ("Total Paid", booking.total_price.to_string()),
            ],
            "We hope you have a wonderful stay!",
        ),
        NotificationKind::BookingRejected => (
            format!("Booking Update - {title}"),
            "Booking Not Approved",
            guest_name.clone(),
            format!("Unfortunately, your booking request for {title} was not approved by the host."),
            vec![
                ("Property", title.to_string()),
                ("Check-in", check_in),
                ("Check-out", check_out),
            ],
            "There are plenty of other great places to stay. Browse our listings to find your perfect accommodation!",
        ),
        NotificationKind::BookingCancelledByGuest => (
            format!("Booking Cancelled - {title}"),
            "Booking Cancelled",
            host_name.clone(),
            format!("A booking for {title} has been cancelled."),
            vec![
                ("Guest", guest_name.clone()),
                ("Check-in", check_in),
                ("Check-out", check_out),
            ],
            "The dates are now available for new bookings.",
        ),
        NotificationKind::BookingCancelledByHost => (
            format!("Booking Cancelled - {title}"),
            "Booking Cancelled",
            guest_name.clone(),
            format!("Your booking for {title} has been cancelled."),
            vec![
                ("Property", title.to_string()),
                ("Check-in", check_in),
                ("Check-out", check_out),
            ],
            "If you have any questions, please contact us.",
        ),
    };

    if notification.kind == NotificationKind::NewBookingRequest {
        if let Some(requests) = booking.special_requests.as_deref().filter(|s| !s.is_empty()) {
            rows.push(("Special Requests", requests.to_string()));
        }
    }

    let mut text = format!("Hi {greeting_name},\n\n{intro}\n\n");
    for (label, value) in &rows {
        let _ = writeln!(text, "{label}: {value}");
    }
    let _ = write!(text, "\n{closing}\n\n{FOOTER}\n");

    let mut html = format!(
        "<div style=\"font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;\">\
         <h1>{}</h1><p>Hi {},</p><p>{}</p>\
         <div style=\"background-color: #f7f7f7; padding: 20px; border-radius: 8px;\">",
        escape_html(heading),
        escape_html(&greeting_name),
        escape_html(&intro),
    );
    for (label, value) in &rows {
        let _ = write!(
            html,
            "<p><strong>{}:</strong> {}</p>",
            escape_html(label),
            escape_html(value)
        );
    }
    let _ = write!(
        html,
        "</div><p>{}</p><p style=\"color: #666; font-size: 12px;\">{FOOTER}</p></div>",
        escape_html(closing)
    );

    EmailMessage {
        to: notification.recipient.email.clone(),
        subject,
        text,
        html,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use roombnb_core::types::{BookingDetails, BookingStatus};
    use roombnb_testing::{Marketplace, date};

    fn details(market: &Marketplace) -> BookingDetails {
        let mut booking =
            market.booking(date(2025, 3, 1), date(2025, 3, 4), BookingStatus::Pending);
        booking.special_requests = Some("Late <arrival>".to_string());
        BookingDetails {
            booking,
            property: market.property.summary(),
            host: market.host.clone(),
            guest: market.guest.clone(),
        }
    }

    #[test]
    fn new_request_goes_to_host() {
        let market = Marketplace::new();
        let email = render(&Notification::new(
            NotificationKind::NewBookingRequest,
            details(&market),
        ));

        assert_eq!(email.to, market.host.email);
        assert_eq!(email.subject, "New Booking Request for Ocean View Cottage");
        assert!(email.text.contains("Total: $640.00"));
        assert!(email.text.contains("Check-in: Saturday, March 1, 2025"));
        assert!(email.text.contains("Special Requests: Late <arrival>"));
        assert!(email.html.contains("Late &lt;arrival&gt;"));
    }

    #[test]
    fn subjects_per_kind() {
        let market = Marketplace::new();
        let subject = |kind| render(&Notification::new(kind, details(&market))).subject;

        assert_eq!(
            subject(NotificationKind::BookingConfirmed),
            "Booking Confirmed - Ocean View Cottage"
        );
        assert_eq!(
            subject(NotificationKind::BookingRejected),
            "Booking Update - Ocean View Cottage"
        );
        assert_eq!(
            subject(NotificationKind::BookingCancelledByHost),
            "Booking Cancelled - Ocean View Cottage"
        );
        assert_eq!(
            subject(NotificationKind::BookingCancelledByGuest),
            "Booking Cancelled - Ocean View Cottage"
        );
    }

    #[test]
    fn guest_facing_mail_omits_special_requests() {
        let market = Marketplace::new();
        let email = render(&Notification::new(
            NotificationKind::BookingConfirmed,
            details(&market),
        ));
        assert_eq!(email.to, market.guest.email);
        assert!(!email.text.contains("Special Requests"));
    }
}
