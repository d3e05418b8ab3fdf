//! Router configuration.
//!
//! Builds the complete Axum router with all endpoints.

use crate::handlers::{
    bookings, dashboard, earnings, favorites, guest_reviews, health_check, readiness_check,
    reviews,
};
use crate::middleware::request_tracking_layer;
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::trace::TraceLayer;

/// Build the complete Axum router.
///
/// Health checks sit at the root; everything else is nested under `/api`.
/// Every response carries an `X-Correlation-ID` header and is traced.
#[must_use]
pub fn build_router(state: AppState) -> Router {
    let booking_routes = Router::new()
        .route("/", post(bookings::create_booking))
        .route("/guest", get(bookings::list_guest_bookings))
        .route("/host", get(bookings::list_host_bookings))
        .route("/complete-expired", post(bookings::complete_expired))
        .route("/:id", get(bookings::get_booking))
        .route("/:id/cancel", put(bookings::cancel_booking))
        .route("/:id/confirm", put(bookings::confirm_booking))
        .route("/:id/reject", put(bookings::reject_booking));

    let review_routes = Router::new()
        .route("/", post(reviews::create_review))
        .route("/property/:property_id", get(reviews::property_reviews))
        .route("/user-review/:property_id", get(reviews::user_review))
        .route(
            "/:id",
            put(reviews::update_review).delete(reviews::delete_review),
        );

    let guest_review_routes = Router::new()
        .route("/", post(guest_reviews::create_guest_review))
        .route("/host", get(guest_reviews::host_guest_reviews))
        .route("/guest/:guest_id", get(guest_reviews::guest_reviews))
        .route("/booking/:booking_id", get(guest_reviews::booking_guest_review))
        .route(
            "/:id",
            put(guest_reviews::update_guest_review).delete(guest_reviews::delete_guest_review),
        );

    let earnings_routes = Router::new()
        .route("/summary", get(earnings::summary))
        .route("/monthly", get(earnings::monthly))
        .route("/properties", get(earnings::by_property))
        .route("/by-property", get(earnings::by_property))
        .route("/occupancy", get(earnings::occupancy));

    let favorite_routes = Router::new()
        .route("/", get(favorites::list_favorites))
        .route("/:property_id/check", get(favorites::check_favorite))
        .route(
            "/:property_id",
            post(favorites::add_favorite).delete(favorites::remove_favorite),
        );

    let dashboard_routes = Router::new()
        .route("/guest", get(dashboard::guest_dashboard))
        .route("/host", get(dashboard::host_dashboard));

    let api_routes = Router::new()
        .nest("/bookings", booking_routes)
        .nest("/reviews", review_routes)
        .nest("/guest-reviews", guest_review_routes)
        .nest("/earnings", earnings_routes)
        .nest("/favorites", favorite_routes)
        .nest("/dashboard", dashboard_routes);

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(request_tracking_layer())
        .with_state(state)
}
