use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::listing::{Listing, ListingStatus};
use crate::models::moderation::ModerationAction;
use crate::moderation::audit::{self, NewLogEntry, ENTITY_LISTING};

/// Typed repository for listings and their lifecycle transitions.
///
/// The lifecycle is pending -> approved | rejected, both terminal. Each
/// transition is a single conditional update (`WHERE status = 'pending'`), so
/// the precondition check and the status write cannot race: of two concurrent
/// approvals, exactly one matches a row.
#[derive(Clone)]
pub struct ListingRepository {
    pool: PgPool,
}

impl ListingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates a listing in `pending`, awaiting admin review.
    pub async fn create(
        &self,
        owner_id: Uuid,
        name: &str,
        description: &str,
    ) -> Result<Listing, AppError> {
        let listing = sqlx::query_as::<_, Listing>(
            r#"
            INSERT INTO listings (owner_id, name, description)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(owner_id)
        .bind(name)
        .bind(description)
        .fetch_one(&self.pool)
        .await?;

        info!("Listing {} submitted by {owner_id}", listing.id);
        Ok(listing)
    }

    pub async fn get(&self, listing_id: Uuid) -> Result<Listing, AppError> {
        sqlx::query_as::<_, Listing>("SELECT * FROM listings WHERE id = $1")
            .bind(listing_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Listing {listing_id} not found")))
    }

    /// The public read path: only approved listings exist as far as
    /// non-admin callers are concerned.
    pub async fn get_approved(&self, listing_id: Uuid) -> Result<Listing, AppError> {
        let listing = self.get(listing_id).await?;
        if listing.status != ListingStatus::Approved {
            return Err(AppError::NotFound(format!("Listing {listing_id} not found")));
        }
        Ok(listing)
    }

    /// pending -> approved. Zero matched rows means "not found, already
    /// approved, or already rejected" and all three get the same answer, so
    /// an idempotent retry of a successful approval can never succeed twice.
    pub async fn approve(&self, listing_id: Uuid, admin_id: Uuid) -> Result<Listing, AppError> {
        let mut tx = self.pool.begin().await?;

        let listing = sqlx::query_as::<_, Listing>(
            r#"
            UPDATE listings
            SET status = 'approved', updated_at = now()
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(listing_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            AppError::NotPendingOrNotFound(format!(
                "Listing {listing_id} not found or not pending"
            ))
        })?;

        audit::append(
            &mut tx,
            NewLogEntry {
                actor_id: admin_id,
                action: ModerationAction::ListingApprove,
                entity_type: ENTITY_LISTING,
                entity_id: listing_id,
                reason: None,
                metadata: None,
            },
        )
        .await?;

        tx.commit().await?;

        info!("Listing {listing_id} approved by {admin_id}");
        Ok(listing)
    }

    /// pending -> rejected, storing the mandatory reason. Same unified
    /// failure mode as `approve`.
    pub async fn reject(
        &self,
        listing_id: Uuid,
        admin_id: Uuid,
        reason: &str,
    ) -> Result<Listing, AppError> {
        let mut tx = self.pool.begin().await?;

        let listing = sqlx::query_as::<_, Listing>(
            r#"
            UPDATE listings
            SET status = 'rejected', rejection_reason = $2, updated_at = now()
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(listing_id)
        .bind(reason)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            AppError::NotPendingOrNotFound(format!(
                "Listing {listing_id} not found or not pending"
            ))
        })?;

        audit::append(
            &mut tx,
            NewLogEntry {
                actor_id: admin_id,
                action: ModerationAction::ListingReject,
                entity_type: ENTITY_LISTING,
                entity_id: listing_id,
                reason: Some(reason),
                metadata: None,
            },
        )
        .await?;

        tx.commit().await?;

        info!("Listing {listing_id} rejected by {admin_id}");
        Ok(listing)
    }
}
