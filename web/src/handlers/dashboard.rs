//! Guest and host dashboards.

use super::Data;
use crate::error::AppError;
use crate::extractors::{CurrentActor, HostActor};
use crate::state::AppState;
use axum::{Json, extract::State};
use roombnb_core::dashboard::{GuestDashboard, HostDashboard};

/// Trips, reviews owed and saved-property count for the caller.
///
/// # Errors
///
/// 401 without a session.
pub async fn guest_dashboard(
    CurrentActor(actor): CurrentActor,
    State(state): State<AppState>,
) -> Result<Json<Data<GuestDashboard>>, AppError> {
    Ok(Json(Data::new(state.dashboard.guest(&actor).await?)))
}

/// Listings, bookings to act on, earnings and ratings for a host.
///
/// # Errors
///
/// 401/403 for non-hosts.
pub async fn host_dashboard(
    HostActor(host): HostActor,
    State(state): State<AppState>,
) -> Result<Json<Data<HostDashboard>>, AppError> {
    Ok(Json(Data::new(state.dashboard.host(&host).await?)))
}
