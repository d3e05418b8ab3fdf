//! Property review endpoints.
//!
//! - `POST /api/reviews` - guest reviews a finished stay
//! - `GET /api/reviews/property/:propertyId` - public list
//! - `GET /api/reviews/user-review/:propertyId` - caller's own review, if any
//! - `PUT /api/reviews/:id` - author edits
//! - `DELETE /api/reviews/:id` - author removes

use super::{Data, Message, Notice};
use crate::error::AppError;
use crate::extractors::CurrentActor;
use crate::state::AppState;
use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use roombnb_core::review::{Review, ReviewUpdate, ReviewView};
use roombnb_core::types::{BookingId, PropertyId, ReviewId};
use roombnb_runtime::NewReview;
use serde::Deserialize;

/// Body of `POST /api/reviews`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewRequest {
    /// Stay being reviewed
    pub booking_id: BookingId,
    /// Property of the stay
    pub property_id: PropertyId,
    /// Stars; range checked by the service
    pub rating: i64,
    /// Free text
    #[serde(default)]
    pub comment: String,
}

/// Body of `PUT /api/reviews/:id`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReviewRequest {
    /// New stars
    pub rating: Option<i64>,
    /// New text
    pub comment: Option<String>,
}

/// Guest reviews a finished stay.
///
/// # Errors
///
/// 400 for bad input or an unfinished stay; 403 for someone else's booking;
/// 404 for an unknown booking; 409 if already reviewed.
pub async fn create_review(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    payload: Result<Json<CreateReviewRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Message<ReviewView>>), AppError> {
    let Json(request) = payload?;
    let review = state
        .reviews
        .create_review(
            &actor,
            NewReview {
                booking_id: request.booking_id,
                property_id: request.property_id,
                rating: request.rating,
                comment: request.comment,
            },
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(Message::new("Review created successfully", review)),
    ))
}

/// Reviews of a property, newest first. No session required.
///
/// # Errors
///
/// 400 for a malformed ID; 500 if the store fails.
pub async fn property_reviews(
    State(state): State<AppState>,
    property_id: Result<Path<PropertyId>, PathRejection>,
) -> Result<Json<Data<Vec<ReviewView>>>, AppError> {
    let Path(property_id) = property_id?;
    let reviews = state.reviews.property_reviews(property_id).await?;
    Ok(Json(Data::new(reviews)))
}

/// The caller's review of a property, or `null` if they have none.
///
/// # Errors
///
/// 401 without a session; 400 for a malformed ID.
pub async fn user_review(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    property_id: Result<Path<PropertyId>, PathRejection>,
) -> Result<Json<Data<Option<Review>>>, AppError> {
    let Path(property_id) = property_id?;
    let review = state.reviews.user_review(&actor, property_id).await?;
    Ok(Json(Data::new(review)))
}

/// Author edits their review.
///
/// # Errors
///
/// 404, 403 for someone else's review, 400 for bad values.
pub async fn update_review(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    id: Result<Path<ReviewId>, PathRejection>,
    payload: Result<Json<UpdateReviewRequest>, JsonRejection>,
) -> Result<Json<Message<ReviewView>>, AppError> {
    let Path(id) = id?;
    let Json(request) = payload?;
    let review = state
        .reviews
        .update_review(
            &actor,
            id,
            ReviewUpdate {
                rating: request.rating,
                comment: request.comment,
            },
        )
        .await?;
    Ok(Json(Message::new("Review updated successfully", review)))
}

/// Author removes their review.
///
/// # Errors
///
/// 404, or 403 for someone else's review.
pub async fn delete_review(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    id: Result<Path<ReviewId>, PathRejection>,
) -> Result<Json<Notice>, AppError> {
    let Path(id) = id?;
    state.reviews.delete_review(&actor, id).await?;
    Ok(Json(Notice {
        message: "Review deleted successfully",
    }))
}
