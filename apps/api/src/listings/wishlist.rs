use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::{is_foreign_key_violation, is_unique_violation, AppError};
use crate::models::listing::WishlistEntry;

/// Typed repository for wishlist entries: one row per (user, listing),
/// enforced by the composite primary key.
#[derive(Clone)]
pub struct WishlistRepository {
    pool: PgPool,
}

impl WishlistRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn add(
        &self,
        user_id: Uuid,
        listing_id: Uuid,
        note: Option<&str>,
    ) -> Result<WishlistEntry, AppError> {
        sqlx::query_as::<_, WishlistEntry>(
            r#"
            INSERT INTO wishlist_entries (user_id, listing_id, note)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(listing_id)
        .bind(note)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Duplicate("Listing is already on your wishlist".to_string())
            } else if is_foreign_key_violation(&e) {
                AppError::NotFound(format!("Listing {listing_id} not found"))
            } else {
                AppError::Database(e)
            }
        })
    }

    pub async fn remove(&self, user_id: Uuid, listing_id: Uuid) -> Result<(), AppError> {
        let done =
            sqlx::query("DELETE FROM wishlist_entries WHERE user_id = $1 AND listing_id = $2")
                .bind(user_id)
                .bind(listing_id)
                .execute(&self.pool)
                .await?;

        if done.rows_affected() == 0 {
            return Err(AppError::NotFound(
                "Listing is not on your wishlist".to_string(),
            ));
        }
        Ok(())
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<WishlistEntry>, AppError> {
        Ok(sqlx::query_as::<_, WishlistEntry>(
            "SELECT * FROM wishlist_entries WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }
}
