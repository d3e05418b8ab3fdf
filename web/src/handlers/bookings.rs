//! Booking lifecycle endpoints.
//!
//! - `POST /api/bookings` - request a stay (guest)
//! - `GET /api/bookings/guest` - the caller's trips
//! - `GET /api/bookings/host` - requests on the caller's properties
//! - `GET /api/bookings/:id` - one booking (guest or host of it)
//! - `PUT /api/bookings/:id/cancel|confirm|reject` - transitions
//! - `POST /api/bookings/complete-expired` - maintenance sweep
//!
//! # Example
//!
//! ```bash
//! curl -X POST http://localhost:5000/api/bookings \
//!   -H "Authorization: Bearer <token>" \
//!   -H "Content-Type: application/json" \
//!   -d '{
//!     "propertyId": "550e8400-e29b-41d4-a716-446655440000",
//!     "checkIn": "2025-03-01T00:00:00Z",
//!     "checkOut": "2025-03-04T00:00:00Z",
//!     "numberOfGuests": 2
//!   }'
//! ```

use super::{Data, Message};
use crate::error::AppError;
use crate::extractors::{CorrelationId, CurrentActor, MaintenanceAccess};
use crate::state::AppState;
use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use roombnb_core::types::{BookingDetails, BookingId, NewBooking, PropertyId};
use serde::{Deserialize, Serialize};

/// Body of `POST /api/bookings`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    /// Property to book
    pub property_id: PropertyId,
    /// Arrival instant
    pub check_in: DateTime<Utc>,
    /// Departure instant
    pub check_out: DateTime<Utc>,
    /// Party size
    pub number_of_guests: u32,
    /// Optional note for the host
    #[serde(default)]
    pub special_requests: Option<String>,
}

impl From<CreateBookingRequest> for NewBooking {
    fn from(request: CreateBookingRequest) -> Self {
        Self {
            property_id: request.property_id,
            check_in: request.check_in,
            check_out: request.check_out,
            number_of_guests: request.number_of_guests,
            special_requests: request.special_requests.filter(|s| !s.trim().is_empty()),
        }
    }
}

/// Payload of the maintenance sweep response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepResult {
    /// Bookings moved to completed
    pub completed_count: u64,
}

type BookingResponse = Result<Json<Message<BookingDetails>>, AppError>;

/// Request a stay.
///
/// # Errors
///
/// 400 for bad dates, party size or body; 404 for an unknown or inactive
/// property; 409 when the dates are taken.
#[tracing::instrument(skip_all, fields(correlation_id = %correlation_id.0))]
pub async fn create_booking(
    correlation_id: CorrelationId,
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    payload: Result<Json<CreateBookingRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Message<BookingDetails>>), AppError> {
    let Json(request) = payload?;
    let details = state.engine.create_booking(&actor, request.into()).await?;
    Ok((
        StatusCode::CREATED,
        Json(Message::new("Booking created successfully", details)),
    ))
}

/// The caller's bookings as a guest, newest first.
///
/// # Errors
///
/// 401 without a session; 500 if the store fails.
pub async fn list_guest_bookings(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
) -> Result<Json<Data<Vec<BookingDetails>>>, AppError> {
    let bookings = state.engine.list_guest_bookings(&actor).await?;
    Ok(Json(Data::new(bookings)))
}

/// Bookings on the caller's properties, newest first.
///
/// # Errors
///
/// 401 without a session; 500 if the store fails.
pub async fn list_host_bookings(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
) -> Result<Json<Data<Vec<BookingDetails>>>, AppError> {
    let bookings = state.engine.list_host_bookings(&actor).await?;
    Ok(Json(Data::new(bookings)))
}

/// One booking, visible to its guest and its property's host.
///
/// # Errors
///
/// 404 for an unknown booking; 403 for anyone else.
pub async fn get_booking(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    id: Result<Path<BookingId>, PathRejection>,
) -> Result<Json<Data<BookingDetails>>, AppError> {
    let Path(id) = id?;
    let details = state.engine.get_booking(&actor, id).await?;
    Ok(Json(Data::new(details)))
}

/// Guest or host cancels.
///
/// # Errors
///
/// 403 for outsiders; 409 for a closed booking.
#[tracing::instrument(skip_all, fields(correlation_id = %correlation_id.0))]
pub async fn cancel_booking(
    correlation_id: CorrelationId,
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    id: Result<Path<BookingId>, PathRejection>,
) -> BookingResponse {
    let Path(id) = id?;
    let details = state.engine.cancel_booking(&actor, id).await?;
    Ok(Json(Message::new("Booking cancelled successfully", details)))
}

/// Host accepts a pending request.
///
/// # Errors
///
/// 403 unless the caller hosts the property; 409 unless pending.
#[tracing::instrument(skip_all, fields(correlation_id = %correlation_id.0))]
pub async fn confirm_booking(
    correlation_id: CorrelationId,
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    id: Result<Path<BookingId>, PathRejection>,
) -> BookingResponse {
    let Path(id) = id?;
    let details = state.engine.confirm_booking(&actor, id).await?;
    Ok(Json(Message::new("Booking confirmed successfully", details)))
}

/// Host declines a pending request.
///
/// # Errors
///
/// 403 unless the caller hosts the property; 409 unless pending.
#[tracing::instrument(skip_all, fields(correlation_id = %correlation_id.0))]
pub async fn reject_booking(
    correlation_id: CorrelationId,
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    id: Result<Path<BookingId>, PathRejection>,
) -> BookingResponse {
    let Path(id) = id?;
    let details = state.engine.reject_booking(&actor, id).await?;
    Ok(Json(Message::new("Booking rejected successfully", details)))
}

/// Runs the expiry sweep on demand.
///
/// # Errors
///
/// 403 without the maintenance token; 500 if the store fails.
pub async fn complete_expired(
    _access: MaintenanceAccess,
    State(state): State<AppState>,
) -> Result<Json<Message<SweepResult>>, AppError> {
    let completed_count = state.engine.complete_expired_bookings().await?;
    Ok(Json(Message::new(
        format!("{completed_count} bookings marked as completed"),
        SweepResult { completed_count },
    )))
}
