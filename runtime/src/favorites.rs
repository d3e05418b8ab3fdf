//! Saved properties.

use roombnb_core::environment::Clock;
use roombnb_core::error::{BookingError, StoreError};
use roombnb_core::favorite::FavoriteProperty;
use roombnb_core::store::{FavoriteStore, PropertyDirectory};
use roombnb_core::types::{Actor, PropertyId};
use std::sync::Arc;

const ALREADY_SAVED: &str = "Property already in favorites";

/// Lets any signed-in user save listings and list them back.
#[derive(Clone)]
pub struct FavoriteService {
    properties: Arc<dyn PropertyDirectory>,
    favorites: Arc<dyn FavoriteStore>,
    clock: Arc<dyn Clock>,
}

impl FavoriteService {
    /// Wires the service to its stores.
    #[must_use]
    pub fn new(
        properties: Arc<dyn PropertyDirectory>,
        favorites: Arc<dyn FavoriteStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            properties,
            favorites,
            clock,
        }
    }

    /// Saves an active property and returns it as the favorites list shows it.
    ///
    /// # Errors
    ///
    /// `NotFound` for a missing or inactive property; validation if it is
    /// already saved.
    #[tracing::instrument(skip(self), fields(actor_id = %actor.user_id))]
    pub async fn add(
        &self,
        actor: &Actor,
        property_id: PropertyId,
    ) -> Result<FavoriteProperty, BookingError> {
        self.properties
            .find_property(property_id)
            .await?
            .filter(|p| p.is_active)
            .ok_or(BookingError::not_found("Property"))?;

        if self.favorites.is_favorite(actor.user_id, property_id).await? {
            return Err(BookingError::validation(ALREADY_SAVED));
        }
        self.favorites
            .add_favorite(actor.user_id, property_id, self.clock.now())
            .await
            .map_err(|error| match error {
                StoreError::Duplicate(_) => BookingError::validation(ALREADY_SAVED),
                other => other.into(),
            })?;

        tracing::info!(%property_id, "Property saved");
        self.favorites
            .favorites(actor.user_id)
            .await?
            .into_iter()
            .find(|f| f.property.id == property_id)
            .ok_or(BookingError::not_found("Favorite"))
    }

    /// Forgets a saved property.
    ///
    /// # Errors
    ///
    /// `NotFound` ("Favorite not found") unless it was saved.
    #[tracing::instrument(skip(self), fields(actor_id = %actor.user_id))]
    pub async fn remove(&self, actor: &Actor, property_id: PropertyId) -> Result<(), BookingError> {
        if !self
            .favorites
            .remove_favorite(actor.user_id, property_id)
            .await?
        {
            return Err(BookingError::not_found("Favorite"));
        }
        tracing::info!(%property_id, "Property unsaved");
        Ok(())
    }

    /// Saved properties, most recently saved first.
    ///
    /// # Errors
    ///
    /// Returns a store error if the query fails.
    pub async fn list(&self, actor: &Actor) -> Result<Vec<FavoriteProperty>, BookingError> {
        Ok(self.favorites.favorites(actor.user_id).await?)
    }

    /// Whether the actor saved the property.
    ///
    /// # Errors
    ///
    /// Returns a store error if the query fails.
    pub async fn is_saved(
        &self,
        actor: &Actor,
        property_id: PropertyId,
    ) -> Result<bool, BookingError> {
        Ok(self.favorites.is_favorite(actor.user_id, property_id).await?)
    }
}

impl std::fmt::Debug for FavoriteService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FavoriteService").finish_non_exhaustive()
    }
}
