//! Application state for Axum handlers.

use roombnb_core::environment::Clock;
use roombnb_core::identity::SessionResolver;
use roombnb_core::store::{
    BookingStore, FavoriteStore, HealthCheck, PropertyDirectory, ReviewStore,
};
use roombnb_runtime::{
    BookingEngine, DashboardService, EarningsService, FavoriteService, Notifier, ReviewService,
};
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// Cloned per request; every field is an `Arc` or wraps one.
#[derive(Clone)]
pub struct AppState {
    /// Booking lifecycle operations
    pub engine: BookingEngine,
    /// Property and guest reviews
    pub reviews: ReviewService,
    /// Host earnings reports
    pub earnings: EarningsService,
    /// Saved properties
    pub favorites: FavoriteService,
    /// Guest and host dashboards
    pub dashboard: DashboardService,
    /// Bearer token lookup
    pub sessions: Arc<dyn SessionResolver>,
    /// Readiness check
    pub health: Arc<dyn HealthCheck>,
    /// Shared secret for the maintenance sweep; `None` disables the route
    pub maintenance_token: Option<Arc<str>>,
}

impl AppState {
    /// Wires every service to one store.
    #[must_use]
    pub fn new<S>(
        store: Arc<S>,
        sessions: Arc<dyn SessionResolver>,
        notifier: Notifier,
        clock: Arc<dyn Clock>,
    ) -> Self
    where
        S: PropertyDirectory + BookingStore + ReviewStore + FavoriteStore + HealthCheck + 'static,
    {
        Self {
            engine: BookingEngine::new(store.clone(), store.clone(), notifier, clock.clone()),
            reviews: ReviewService::new(store.clone(), store.clone(), clock.clone()),
            earnings: EarningsService::new(
                store.clone(),
                store.clone(),
                store.clone(),
                clock.clone(),
            ),
            favorites: FavoriteService::new(store.clone(), store.clone(), clock.clone()),
            dashboard: DashboardService::new(
                store.clone(),
                store.clone(),
                store.clone(),
                store.clone(),
                clock,
            ),
            sessions,
            health: store,
            maintenance_token: None,
        }
    }

    /// Enables the maintenance sweep route for `token`.
    ///
    /// Empty tokens leave the route disabled.
    #[must_use]
    pub fn with_maintenance_token(mut self, token: Option<String>) -> Self {
        self.maintenance_token = token.filter(|t| !t.is_empty()).map(Arc::from);
        self
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("engine", &self.engine)
            .field("maintenance_enabled", &self.maintenance_token.is_some())
            .finish_non_exhaustive()
    }
}
