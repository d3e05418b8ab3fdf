//! Host earnings dashboard endpoints. Every route requires the host role.

use super::Data;
use crate::error::AppError;
use crate::extractors::HostActor;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Query, State},
};
use roombnb_core::earnings::{
    DEFAULT_OCCUPANCY_DAYS, EarningsSummary, MonthlyEarnings, PropertyEarnings, PropertyOccupancy,
};
use serde::Deserialize;

/// Query of `GET /api/earnings/monthly`.
#[derive(Debug, Default, Deserialize)]
pub struct MonthlyQuery {
    /// Calendar year; missing or unparsable means the current year
    pub year: Option<String>,
}

impl MonthlyQuery {
    fn year(&self) -> Option<i32> {
        self.year.as_deref().and_then(|y| y.trim().parse().ok())
    }
}

/// Query of `GET /api/earnings/occupancy`.
#[derive(Debug, Default, Deserialize)]
pub struct OccupancyQuery {
    /// Trailing window in days; missing, unparsable or zero means 90
    pub days: Option<String>,
}

impl OccupancyQuery {
    fn days(&self) -> u32 {
        self.days
            .as_deref()
            .and_then(|d| d.trim().parse::<u32>().ok())
            .filter(|&d| d > 0)
            .unwrap_or(DEFAULT_OCCUPANCY_DAYS)
    }
}

/// Totals and month-over-month change.
///
/// # Errors
///
/// 401/403 for non-hosts; 500 if the store fails.
pub async fn summary(
    HostActor(host): HostActor,
    State(state): State<AppState>,
) -> Result<Json<Data<EarningsSummary>>, AppError> {
    Ok(Json(Data::new(state.earnings.summary(&host).await?)))
}

/// Earnings per started month of a year.
///
/// # Errors
///
/// 401/403 for non-hosts; 500 if the store fails.
pub async fn monthly(
    HostActor(host): HostActor,
    State(state): State<AppState>,
    Query(query): Query<MonthlyQuery>,
) -> Result<Json<Data<Vec<MonthlyEarnings>>>, AppError> {
    let months = state.earnings.monthly(&host, query.year()).await?;
    Ok(Json(Data::new(months)))
}

/// Earnings and ratings per property, highest earning first.
///
/// # Errors
///
/// 401/403 for non-hosts; 500 if the store fails.
pub async fn by_property(
    HostActor(host): HostActor,
    State(state): State<AppState>,
) -> Result<Json<Data<Vec<PropertyEarnings>>>, AppError> {
    Ok(Json(Data::new(state.earnings.by_property(&host).await?)))
}

/// Share of the trailing window each property was booked.
///
/// # Errors
///
/// 401/403 for non-hosts; 500 if the store fails.
pub async fn occupancy(
    HostActor(host): HostActor,
    State(state): State<AppState>,
    Query(query): Query<OccupancyQuery>,
) -> Result<Json<Data<Vec<PropertyOccupancy>>>, AppError> {
    let rates = state.earnings.occupancy(&host, query.days()).await?;
    Ok(Json(Data::new(rates)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unparsable_year_falls_back() {
        let query = |y: &str| MonthlyQuery {
            year: Some(y.to_string()),
        };
        assert_eq!(query("2024").year(), Some(2024));
        assert_eq!(query("last").year(), None);
        assert_eq!(MonthlyQuery::default().year(), None);
    }

    #[test]
    fn occupancy_window_defaults_to_ninety_days() {
        let query = |d: &str| OccupancyQuery {
            days: Some(d.to_string()),
        };
        assert_eq!(query("30").days(), 30);
        assert_eq!(query("0").days(), 90);
        assert_eq!(query("-7").days(), 90);
        assert_eq!(query("month").days(), 90);
        assert_eq!(OccupancyQuery::default().days(), 90);
    }
}
