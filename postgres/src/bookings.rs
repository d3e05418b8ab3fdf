//! Property lookup and booking persistence.

use crate::rows::{
    BOOKING_COLUMNS, BookingRow, DETAILS_SELECT, DetailsRow, EarningRow, PropertyRow, convert_all,
};
use crate::{PostgresStore, db_error};
use chrono::{DateTime, Utc};
use roombnb_core::earnings::EarningRecord;
use roombnb_core::error::StoreError;
use roombnb_core::pricing::StayDates;
use roombnb_core::store::{BookingStore, PropertyDirectory, StoreFuture};
use roombnb_core::types::{
    Booking, BookingDetails, BookingId, BookingStatus, Property, PropertyId, UserId,
};

const PROPERTY_SELECT: &str = "SELECT id, host_id, title, city, images[1] AS cover_image, \
     price_per_night_cents, cleaning_fee_cents, max_guests, is_active FROM properties";

fn status_names(statuses: &[BookingStatus]) -> Vec<&'static str> {
    statuses.iter().map(BookingStatus::as_str).collect()
}

impl PropertyDirectory for PostgresStore {
    fn find_property(&self, id: PropertyId) -> StoreFuture<'_, Option<Property>> {
        Box::pin(async move {
            let sql = format!("{PROPERTY_SELECT} WHERE id = $1");
            let row: Option<PropertyRow> = sqlx::query_as(&sql)
                .bind(*id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?;
            row.map(Property::try_from).transpose()
        })
    }

    fn host_properties(&self, host_id: UserId) -> StoreFuture<'_, Vec<Property>> {
        Box::pin(async move {
            let sql = format!("{PROPERTY_SELECT} WHERE host_id = $1 ORDER BY created_at DESC");
            let rows: Vec<PropertyRow> = sqlx::query_as(&sql)
                .bind(*host_id.as_uuid())
                .fetch_all(&self.pool)
                .await
                .map_err(db_error)?;
            convert_all(rows)
        })
    }
}

impl BookingStore for PostgresStore {
    fn find_details(&self, id: BookingId) -> StoreFuture<'_, Option<BookingDetails>> {
        Box::pin(async move {
            let sql = format!("{DETAILS_SELECT} WHERE b.id = $1");
            let row: Option<DetailsRow> = sqlx::query_as(&sql)
                .bind(*id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?;
            row.map(BookingDetails::try_from).transpose()
        })
    }

    fn find_overlapping(
        &self,
        property_id: PropertyId,
        dates: StayDates,
    ) -> StoreFuture<'_, Vec<Booking>> {
        Box::pin(async move {
            let sql = format!(
                "SELECT {BOOKING_COLUMNS} FROM bookings b \
                 WHERE b.property_id = $1 AND b.status = ANY($2) \
                 AND b.check_in <= $4 AND b.check_out >= $3"
            );
            let rows: Vec<BookingRow> = sqlx::query_as(&sql)
                .bind(*property_id.as_uuid())
                .bind(status_names(&BookingStatus::HOLDS_DATES))
                .bind(dates.check_in())
                .bind(dates.check_out())
                .fetch_all(&self.pool)
                .await
                .map_err(db_error)?;
            convert_all(rows)
        })
    }

    #[tracing::instrument(skip(self, booking), fields(booking_id = %booking.id, property_id = %booking.property_id))]
    fn insert_booking(&self, booking: Booking) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let mut tx = self.pool.begin().await.map_err(db_error)?;

            // Serialises inserts per property until commit
            sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
                .bind(booking.property_id.to_string())
                .execute(&mut *tx)
                .await
                .map_err(db_error)?;

            let (taken,): (bool,) = sqlx::query_as(
                r"
                SELECT EXISTS (
                    SELECT 1 FROM bookings
                    WHERE property_id = $1 AND status = ANY($2)
                      AND check_in <= $4 AND check_out >= $3
                )
                ",
            )
            .bind(*booking.property_id.as_uuid())
            .bind(status_names(&BookingStatus::HOLDS_DATES))
            .bind(booking.dates.check_in())
            .bind(booking.dates.check_out())
            .fetch_one(&mut *tx)
            .await
            .map_err(db_error)?;

            if taken {
                tracing::warn!("Overlapping booking inserted concurrently");
                metrics::counter!("booking_insert_races_total").increment(1);
                return Err(StoreError::Overlap);
            }

            let total_cents = i64::try_from(booking.total_price.cents())
                .map_err(|_| StoreError::Corrupt("total price out of range".to_string()))?;
            let guests = i32::try_from(booking.number_of_guests)
                .map_err(|_| StoreError::Corrupt("guest count out of range".to_string()))?;

            sqlx::query(
                r"
                INSERT INTO bookings (
                    id, property_id, guest_id, check_in, check_out, number_of_guests,
                    total_price_cents, special_requests, status, created_at, updated_at
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                ",
            )
            .bind(*booking.id.as_uuid())
            .bind(*booking.property_id.as_uuid())
            .bind(*booking.guest_id.as_uuid())
            .bind(booking.dates.check_in())
            .bind(booking.dates.check_out())
            .bind(guests)
            .bind(total_cents)
            .bind(&booking.special_requests)
            .bind(booking.status.as_str())
            .bind(booking.created_at)
            .bind(booking.updated_at)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

            tx.commit().await.map_err(db_error)?;
            tracing::debug!("Booking inserted");
            Ok(())
        })
    }

    fn update_status(
        &self,
        id: BookingId,
        expected: &'static [BookingStatus],
        next: BookingStatus,
        at: DateTime<Utc>,
    ) -> StoreFuture<'_, Option<Booking>> {
        Box::pin(async move {
            let sql = format!(
                "UPDATE bookings b SET status = $3, updated_at = $4 \
                 WHERE b.id = $1 AND b.status = ANY($2) \
                 RETURNING {BOOKING_COLUMNS}"
            );
            let row: Option<BookingRow> = sqlx::query_as(&sql)
                .bind(*id.as_uuid())
                .bind(status_names(expected))
                .bind(next.as_str())
                .bind(at)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?;
            row.map(Booking::try_from).transpose()
        })
    }

    fn complete_expired(
        &self,
        expected: &'static [BookingStatus],
        next: BookingStatus,
        now: DateTime<Utc>,
    ) -> StoreFuture<'_, u64> {
        Box::pin(async move {
            let result = sqlx::query(
                r"
                UPDATE bookings SET status = $2, updated_at = $3
                WHERE status = ANY($1) AND check_out < $3
                ",
            )
            .bind(status_names(expected))
            .bind(next.as_str())
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
            Ok(result.rows_affected())
        })
    }

    fn list_for_guest(&self, guest_id: UserId) -> StoreFuture<'_, Vec<BookingDetails>> {
        Box::pin(async move {
            let sql = format!("{DETAILS_SELECT} WHERE b.guest_id = $1 ORDER BY b.created_at DESC");
            let rows: Vec<DetailsRow> = sqlx::query_as(&sql)
                .bind(*guest_id.as_uuid())
                .fetch_all(&self.pool)
                .await
                .map_err(db_error)?;
            convert_all(rows)
        })
    }

    fn list_for_host(&self, host_id: UserId) -> StoreFuture<'_, Vec<BookingDetails>> {
        Box::pin(async move {
            let sql = format!("{DETAILS_SELECT} WHERE p.host_id = $1 ORDER BY b.created_at DESC");
            let rows: Vec<DetailsRow> = sqlx::query_as(&sql)
                .bind(*host_id.as_uuid())
                .fetch_all(&self.pool)
                .await
                .map_err(db_error)?;
            convert_all(rows)
        })
    }

    fn earning_records(
        &self,
        host_id: UserId,
        now: DateTime<Utc>,
    ) -> StoreFuture<'_, Vec<EarningRecord>> {
        Box::pin(async move {
            let rows: Vec<EarningRow> = sqlx::query_as(
                r"
                SELECT b.property_id, b.check_in, b.total_price_cents
                FROM bookings b
                JOIN properties p ON p.id = b.property_id
                WHERE p.host_id = $1
                  AND (b.status = 'completed' OR (b.status = 'confirmed' AND b.check_out < $2))
                ",
            )
            .bind(*host_id.as_uuid())
            .bind(now)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
            convert_all(rows)
        })
    }
}
