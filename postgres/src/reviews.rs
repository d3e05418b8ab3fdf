//! Property reviews and guest reviews.

use crate::rows::{
    GuestReviewRow, GuestReviewViewRow, RatingRow, ReviewRow, ReviewViewRow, convert_all,
};
use crate::{PostgresStore, db_error, insert_error};
use roombnb_core::earnings::PropertyRating;
use roombnb_core::review::{GuestReview, GuestReviewView, Review, ReviewView};
use roombnb_core::store::{ReviewStore, StoreFuture};
use roombnb_core::types::{BookingId, GuestReviewId, PropertyId, ReviewId, UserId};

const REVIEW_COLUMNS: &str = "r.id, r.booking_id, r.property_id, r.user_id, r.rating, \
     r.comment, r.created_at, r.updated_at";

const REVIEW_VIEW_SELECT: &str = "SELECT r.id, r.booking_id, r.property_id, r.user_id, \
     r.rating, r.comment, r.created_at, r.updated_at, \
     u.first_name AS reviewer_first_name, u.last_name AS reviewer_last_name \
     FROM reviews r JOIN users u ON u.id = r.user_id";

const GUEST_REVIEW_VIEW_SELECT: &str = "SELECT gr.id, gr.booking_id, gr.guest_id, gr.host_id, \
     gr.rating, gr.comment, gr.created_at, \
     h.first_name AS host_first_name, h.last_name AS host_last_name, \
     g.first_name AS guest_first_name, g.last_name AS guest_last_name, \
     p.id AS property_id, p.title AS property_title \
     FROM guest_reviews gr \
     JOIN users h ON h.id = gr.host_id \
     JOIN users g ON g.id = gr.guest_id \
     JOIN bookings b ON b.id = gr.booking_id \
     JOIN properties p ON p.id = b.property_id";

impl ReviewStore for PostgresStore {
    fn find_review(&self, id: ReviewId) -> StoreFuture<'_, Option<Review>> {
        Box::pin(async move {
            let sql = format!("SELECT {REVIEW_COLUMNS} FROM reviews r WHERE r.id = $1");
            let row: Option<ReviewRow> = sqlx::query_as(&sql)
                .bind(*id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?;
            row.map(Review::try_from).transpose()
        })
    }

    fn find_review_view(&self, id: ReviewId) -> StoreFuture<'_, Option<ReviewView>> {
        Box::pin(async move {
            let sql = format!("{REVIEW_VIEW_SELECT} WHERE r.id = $1");
            let row: Option<ReviewViewRow> = sqlx::query_as(&sql)
                .bind(*id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?;
            row.map(ReviewView::try_from).transpose()
        })
    }

    fn booking_has_review(&self, booking_id: BookingId) -> StoreFuture<'_, bool> {
        Box::pin(async move {
            let (exists,): (bool,) =
                sqlx::query_as("SELECT EXISTS (SELECT 1 FROM reviews WHERE booking_id = $1)")
                    .bind(*booking_id.as_uuid())
                    .fetch_one(&self.pool)
                    .await
                    .map_err(db_error)?;
            Ok(exists)
        })
    }

    fn insert_review(&self, review: Review) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            sqlx::query(
                r"
                INSERT INTO reviews (
                    id, booking_id, property_id, user_id, rating, comment, created_at, updated_at
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ",
            )
            .bind(*review.id.as_uuid())
            .bind(*review.booking_id.as_uuid())
            .bind(*review.property_id.as_uuid())
            .bind(*review.user_id.as_uuid())
            .bind(i16::from(review.rating.value()))
            .bind(&review.comment)
            .bind(review.created_at)
            .bind(review.updated_at)
            .execute(&self.pool)
            .await
            .map_err(|e| insert_error(e, "review for booking"))?;
            Ok(())
        })
    }

    fn update_review(&self, review: Review) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            sqlx::query("UPDATE reviews SET rating = $2, comment = $3, updated_at = $4 WHERE id = $1")
                .bind(*review.id.as_uuid())
                .bind(i16::from(review.rating.value()))
                .bind(&review.comment)
                .bind(review.updated_at)
                .execute(&self.pool)
                .await
                .map_err(db_error)?;
            Ok(())
        })
    }

    fn delete_review(&self, id: ReviewId) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            sqlx::query("DELETE FROM reviews WHERE id = $1")
                .bind(*id.as_uuid())
                .execute(&self.pool)
                .await
                .map_err(db_error)?;
            Ok(())
        })
    }

    fn reviews_by_user(&self, user_id: UserId) -> StoreFuture<'_, Vec<Review>> {
        Box::pin(async move {
            let sql = format!(
                "SELECT {REVIEW_COLUMNS} FROM reviews r WHERE r.user_id = $1 \
                 ORDER BY r.created_at DESC"
            );
            let rows: Vec<ReviewRow> = sqlx::query_as(&sql)
                .bind(*user_id.as_uuid())
                .fetch_all(&self.pool)
                .await
                .map_err(db_error)?;
            convert_all(rows)
        })
    }

    fn property_reviews(&self, property_id: PropertyId) -> StoreFuture<'_, Vec<ReviewView>> {
        Box::pin(async move {
            let sql =
                format!("{REVIEW_VIEW_SELECT} WHERE r.property_id = $1 ORDER BY r.created_at DESC");
            let rows: Vec<ReviewViewRow> = sqlx::query_as(&sql)
                .bind(*property_id.as_uuid())
                .fetch_all(&self.pool)
                .await
                .map_err(db_error)?;
            convert_all(rows)
        })
    }

    fn host_ratings(&self, host_id: UserId) -> StoreFuture<'_, Vec<PropertyRating>> {
        Box::pin(async move {
            let rows: Vec<RatingRow> = sqlx::query_as(
                r"
                SELECT r.property_id, r.rating
                FROM reviews r
                JOIN properties p ON p.id = r.property_id
                WHERE p.host_id = $1
                ",
            )
            .bind(*host_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
            convert_all(rows)
        })
    }

    fn booking_has_guest_review(&self, booking_id: BookingId) -> StoreFuture<'_, bool> {
        Box::pin(async move {
            let (exists,): (bool,) =
                sqlx::query_as("SELECT EXISTS (SELECT 1 FROM guest_reviews WHERE booking_id = $1)")
                    .bind(*booking_id.as_uuid())
                    .fetch_one(&self.pool)
                    .await
                    .map_err(db_error)?;
            Ok(exists)
        })
    }

    fn insert_guest_review(&self, review: GuestReview) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            sqlx::query(
                r"
                INSERT INTO guest_reviews (
                    id, booking_id, guest_id, host_id, rating, comment, created_at
                ) VALUES ($1, $2, $3, $4, $5, $6, $7)
                ",
            )
            .bind(*review.id.as_uuid())
            .bind(*review.booking_id.as_uuid())
            .bind(*review.guest_id.as_uuid())
            .bind(*review.host_id.as_uuid())
            .bind(i16::from(review.rating.value()))
            .bind(&review.comment)
            .bind(review.created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| insert_error(e, "guest review for booking"))?;
            Ok(())
        })
    }

    fn find_guest_review_view(
        &self,
        id: GuestReviewId,
    ) -> StoreFuture<'_, Option<GuestReviewView>> {
        Box::pin(async move {
            let sql = format!("{GUEST_REVIEW_VIEW_SELECT} WHERE gr.id = $1");
            let row: Option<GuestReviewViewRow> = sqlx::query_as(&sql)
                .bind(*id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?;
            row.map(GuestReviewView::try_from).transpose()
        })
    }

    fn guest_reviews(&self, guest_id: UserId) -> StoreFuture<'_, Vec<GuestReviewView>> {
        Box::pin(async move {
            let sql = format!(
                "{GUEST_REVIEW_VIEW_SELECT} WHERE gr.guest_id = $1 ORDER BY gr.created_at DESC"
            );
            let rows: Vec<GuestReviewViewRow> = sqlx::query_as(&sql)
                .bind(*guest_id.as_uuid())
                .fetch_all(&self.pool)
                .await
                .map_err(db_error)?;
            convert_all(rows)
        })
    }

    fn find_guest_review(&self, id: GuestReviewId) -> StoreFuture<'_, Option<GuestReview>> {
        Box::pin(async move {
            let row: Option<GuestReviewRow> = sqlx::query_as(
                r"
                SELECT id, booking_id, guest_id, host_id, rating, comment, created_at
                FROM guest_reviews
                WHERE id = $1
                ",
            )
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
            row.map(GuestReview::try_from).transpose()
        })
    }

    fn guest_review_for_booking(
        &self,
        booking_id: BookingId,
    ) -> StoreFuture<'_, Option<GuestReviewView>> {
        Box::pin(async move {
            let sql = format!("{GUEST_REVIEW_VIEW_SELECT} WHERE gr.booking_id = $1");
            let row: Option<GuestReviewViewRow> = sqlx::query_as(&sql)
                .bind(*booking_id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?;
            row.map(GuestReviewView::try_from).transpose()
        })
    }

    fn host_guest_reviews(&self, host_id: UserId) -> StoreFuture<'_, Vec<GuestReviewView>> {
        Box::pin(async move {
            let sql = format!(
                "{GUEST_REVIEW_VIEW_SELECT} WHERE gr.host_id = $1 ORDER BY gr.created_at DESC"
            );
            let rows: Vec<GuestReviewViewRow> = sqlx::query_as(&sql)
                .bind(*host_id.as_uuid())
                .fetch_all(&self.pool)
                .await
                .map_err(db_error)?;
            convert_all(rows)
        })
    }

    fn update_guest_review(&self, review: GuestReview) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            sqlx::query("UPDATE guest_reviews SET rating = $2, comment = $3 WHERE id = $1")
                .bind(*review.id.as_uuid())
                .bind(i16::from(review.rating.value()))
                .bind(&review.comment)
                .execute(&self.pool)
                .await
                .map_err(db_error)?;
            Ok(())
        })
    }

    fn delete_guest_review(&self, id: GuestReviewId) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            sqlx::query("DELETE FROM guest_reviews WHERE id = $1")
                .bind(*id.as_uuid())
                .execute(&self.pool)
                .await
                .map_err(db_error)?;
            Ok(())
        })
    }
}
