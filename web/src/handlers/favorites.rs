//! Saved property endpoints. Any signed-in user may save listings.

use super::{Data, Message, Notice};
use crate::error::AppError;
use crate::extractors::CurrentActor;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State, rejection::PathRejection},
    http::StatusCode,
};
use roombnb_core::favorite::FavoriteProperty;
use roombnb_core::types::PropertyId;
use serde::Serialize;

/// Body of `GET /api/favorites/:propertyId/check`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteStatus {
    /// Whether the caller saved the property
    pub is_favorited: bool,
}

/// The caller's saved properties, most recently saved first.
///
/// # Errors
///
/// 401 without a session.
pub async fn list_favorites(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
) -> Result<Json<Data<Vec<FavoriteProperty>>>, AppError> {
    Ok(Json(Data::new(state.favorites.list(&actor).await?)))
}

/// Whether the caller saved a property.
///
/// # Errors
///
/// 401 without a session; 400 for a malformed ID.
pub async fn check_favorite(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    property_id: Result<Path<PropertyId>, PathRejection>,
) -> Result<Json<Data<FavoriteStatus>>, AppError> {
    let Path(property_id) = property_id?;
    let is_favorited = state.favorites.is_saved(&actor, property_id).await?;
    Ok(Json(Data::new(FavoriteStatus { is_favorited })))
}

/// Saves a property.
///
/// # Errors
///
/// 404 for a missing or inactive property; 400 if already saved.
pub async fn add_favorite(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    property_id: Result<Path<PropertyId>, PathRejection>,
) -> Result<(StatusCode, Json<Message<FavoriteProperty>>), AppError> {
    let Path(property_id) = property_id?;
    let favorite = state.favorites.add(&actor, property_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(Message::new("Added to favorites", favorite)),
    ))
}

/// Forgets a saved property.
///
/// # Errors
///
/// 404 unless the property was saved.
pub async fn remove_favorite(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
    property_id: Result<Path<PropertyId>, PathRejection>,
) -> Result<Json<Notice>, AppError> {
    let Path(property_id) = property_id?;
    state.favorites.remove(&actor, property_id).await?;
    Ok(Json(Notice {
        message: "Removed from favorites",
    }))
}
