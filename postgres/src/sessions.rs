//! Bearer-token lookup and readiness check.

use crate::{PostgresStore, db_error};
use roombnb_core::identity::SessionResolver;
use roombnb_core::store::{HealthCheck, StoreFuture};
use roombnb_core::types::Actor;
use uuid::Uuid;

impl SessionResolver for PostgresStore {
    fn resolve<'a>(&'a self, token: &'a str) -> StoreFuture<'a, Option<Actor>> {
        Box::pin(async move {
            let row: Option<(Uuid, bool)> = sqlx::query_as(
                r"
                SELECT u.id, u.is_host
                FROM sessions s
                JOIN users u ON u.id = s.user_id
                WHERE s.token = $1 AND s.expires_at > now()
                ",
            )
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

            Ok(row.map(|(id, is_host)| Actor {
                user_id: id.into(),
                is_host,
            }))
        })
    }
}

impl HealthCheck for PostgresStore {
    fn ping(&self) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            sqlx::query("SELECT 1")
                .execute(&self.pool)
                .await
                .map_err(db_error)?;
            Ok(())
        })
    }
}
