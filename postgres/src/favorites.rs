//! Saved properties.

use crate::rows::{FavoriteRow, convert_all};
use crate::{PostgresStore, db_error, insert_error};
use chrono::{DateTime, Utc};
use roombnb_core::favorite::FavoriteProperty;
use roombnb_core::store::{FavoriteStore, StoreFuture};
use roombnb_core::types::{PropertyId, UserId};

impl FavoriteStore for PostgresStore {
    fn add_favorite(
        &self,
        user_id: UserId,
        property_id: PropertyId,
        at: DateTime<Utc>,
    ) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            sqlx::query("INSERT INTO favorites (user_id, property_id, created_at) VALUES ($1, $2, $3)")
                .bind(*user_id.as_uuid())
                .bind(*property_id.as_uuid())
                .bind(at)
                .execute(&self.pool)
                .await
                .map_err(|e| insert_error(e, "favorite"))?;
            Ok(())
        })
    }

    fn remove_favorite(&self, user_id: UserId, property_id: PropertyId) -> StoreFuture<'_, bool> {
        Box::pin(async move {
            let result = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND property_id = $2")
                .bind(*user_id.as_uuid())
                .bind(*property_id.as_uuid())
                .execute(&self.pool)
                .await
                .map_err(db_error)?;
            Ok(result.rows_affected() > 0)
        })
    }

    fn is_favorite(&self, user_id: UserId, property_id: PropertyId) -> StoreFuture<'_, bool> {
        Box::pin(async move {
            let (exists,): (bool,) = sqlx::query_as(
                "SELECT EXISTS (SELECT 1 FROM favorites WHERE user_id = $1 AND property_id = $2)",
            )
            .bind(*user_id.as_uuid())
            .bind(*property_id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;
            Ok(exists)
        })
    }

    fn favorites(&self, user_id: UserId) -> StoreFuture<'_, Vec<FavoriteProperty>> {
        Box::pin(async move {
            let rows: Vec<FavoriteRow> = sqlx::query_as(
                r"
                SELECT p.id, p.title, p.city, p.images[1] AS cover_image,
                       p.price_per_night_cents, p.max_guests,
                       h.id AS host_id, h.first_name AS host_first_name,
                       h.last_name AS host_last_name,
                       ROUND(AVG(r.rating)::numeric, 1)::float8 AS average_rating,
                       COUNT(r.id) AS review_count,
                       f.created_at AS favorited_at
                FROM favorites f
                JOIN properties p ON p.id = f.property_id
                JOIN users h ON h.id = p.host_id
                LEFT JOIN reviews r ON r.property_id = p.id
                WHERE f.user_id = $1
                GROUP BY p.id, h.id, f.created_at
                ORDER BY f.created_at DESC
                ",
            )
            .bind(*user_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
            convert_all(rows)
        })
    }

    fn favorite_count(&self, user_id: UserId) -> StoreFuture<'_, u64> {
        Box::pin(async move {
            let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM favorites WHERE user_id = $1")
                .bind(*user_id.as_uuid())
                .fetch_one(&self.pool)
                .await
                .map_err(db_error)?;
            Ok(u64::try_from(count).unwrap_or_default())
        })
    }
}
