//! Host-to-guest review endpoints.
//!
//! Everything except the public per-guest list requires the host role.

use super::{Data, Message, Notice};
use crate::error::AppError;
use crate::extractors::{CurrentActor, HostActor};
use crate::state::AppState;
use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use roombnb_core::review::{GuestReviewView, ReviewUpdate};
use roombnb_core::types::{BookingId, GuestReviewId, UserId};
use roombnb_runtime::NewGuestReview;
use serde::Deserialize;

/// Body of `POST /api/guest-reviews`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGuestReviewRequest {
    /// Stay being reviewed
    pub booking_id: BookingId,
    /// Guest being reviewed
    pub guest_id: UserId,
    /// Stars; range checked by the service
    pub rating: i64,
    /// At least ten characters once trimmed
    #[serde(default)]
    pub comment: String,
}

/// Body of `PUT /api/guest-reviews/:id`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGuestReviewRequest {
    /// New stars
    pub rating: Option<i64>,
    /// New text, at least ten characters once trimmed
    pub comment: Option<String>,
}

/// Host reviews the guest of a finished stay.
///
/// # Errors
///
/// 403 for non-hosts or another host's property; 400 for bad input or an
/// unfinished stay; 409 if already reviewed.
pub async fn create_guest_review(
    HostActor(host): HostActor,
    State(state): State<AppState>,
    payload: Result<Json<CreateGuestReviewRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Message<GuestReviewView>>), AppError> {
    let Json(request) = payload?;
    let review = state
        .reviews
        .create_guest_review(
            &host,
            NewGuestReview {
                booking_id: request.booking_id,
                guest_id: request.guest_id,
                rating: request.rating,
                comment: request.comment,
            },
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(Message::new("Guest review created successfully", review)),
    ))
}

/// What hosts have said about a guest.
///
/// # Errors
///
/// 401 without a session; 400 for a malformed ID.
pub async fn guest_reviews(
    CurrentActor(_actor): CurrentActor,
    State(state): State<AppState>,
    guest_id: Result<Path<UserId>, PathRejection>,
) -> Result<Json<Data<Vec<GuestReviewView>>>, AppError> {
    let Path(guest_id) = guest_id?;
    let reviews = state.reviews.guest_reviews(guest_id).await?;
    Ok(Json(Data::new(reviews)))
}

/// Every guest review the host wrote, newest first.
///
/// # Errors
///
/// 401/403 for non-hosts.
pub async fn host_guest_reviews(
    HostActor(host): HostActor,
    State(state): State<AppState>,
) -> Result<Json<Data<Vec<GuestReviewView>>>, AppError> {
    Ok(Json(Data::new(state.reviews.host_guest_reviews(&host).await?)))
}

/// The host's review of a booking's guest, or `null` if none was written.
///
/// # Errors
///
/// 404 for an unknown booking; 403 if the property is another host's.
pub async fn booking_guest_review(
    HostActor(host): HostActor,
    State(state): State<AppState>,
    booking_id: Result<Path<BookingId>, PathRejection>,
) -> Result<Json<Data<Option<GuestReviewView>>>, AppError> {
    let Path(booking_id) = booking_id?;
    let review = state
        .reviews
        .guest_review_for_booking(&host, booking_id)
        .await?;
    Ok(Json(Data::new(review)))
}

/// Author edits their guest review.
///
/// # Errors
///
/// 404, 403 for someone else's review, 400 for bad values.
pub async fn update_guest_review(
    HostActor(host): HostActor,
    State(state): State<AppState>,
    id: Result<Path<GuestReviewId>, PathRejection>,
    payload: Result<Json<UpdateGuestReviewRequest>, JsonRejection>,
) -> Result<Json<Message<GuestReviewView>>, AppError> {
    let Path(id) = id?;
    let Json(request) = payload?;
    let review = state
        .reviews
        .update_guest_review(
            &host,
            id,
            ReviewUpdate {
                rating: request.rating,
                comment: request.comment,
            },
        )
        .await?;
    Ok(Json(Message::new("Review updated successfully", review)))
}

/// Author removes their guest review.
///
/// # Errors
///
/// 404, or 403 for someone else's review.
pub async fn delete_guest_review(
    HostActor(host): HostActor,
    State(state): State<AppState>,
    id: Result<Path<GuestReviewId>, PathRejection>,
) -> Result<Json<Notice>, AppError> {
    let Path(id) = id?;
    state.reviews.delete_guest_review(&host, id).await?;
    Ok(Json(Notice {
        message: "Review deleted successfully",
    }))
}
