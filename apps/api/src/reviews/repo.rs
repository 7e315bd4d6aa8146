use serde_json::Value;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::{is_unique_violation, AppError};
use crate::models::listing::{Listing, ListingStatus};
use crate::models::moderation::ModerationAction;
use crate::models::review::{HelpfulVoteState, Report, ReportReason, Review};
use crate::moderation::audit::{self, NewLogEntry, ENTITY_REVIEW};
use crate::reviews::aggregates::recompute_listing_rating;

/// Reason recorded for permanent review deletion. Fixed because the row no
/// longer exists to explain itself.
const DELETED_REASON: &str = "Permanently deleted by admin";

/// Typed repository for reviews, their reports and helpful votes.
///
/// Every mutation that changes which reviews are visible recomputes the
/// listing aggregate on the same transaction, so readers can never observe a
/// review flip without the matching aggregate.
#[derive(Clone)]
pub struct ReviewRepository {
    pool: PgPool,
}

impl ReviewRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, review_id: Uuid) -> Result<Review, AppError> {
        sqlx::query_as::<_, Review>("SELECT * FROM reviews WHERE id = $1")
            .bind(review_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Review {review_id} not found")))
    }

    /// Visible reviews for a listing, newest first. Hidden reviews are
    /// excluded from every public read, matching the aggregate.
    pub async fn visible_for_listing(&self, listing_id: Uuid) -> Result<Vec<Review>, AppError> {
        Ok(sqlx::query_as::<_, Review>(
            r#"
            SELECT * FROM reviews
            WHERE listing_id = $1 AND hidden = FALSE
            ORDER BY created_at DESC
            "#,
        )
        .bind(listing_id)
        .fetch_all(&self.pool)
        .await?)
    }

    /// Creates a review for an approved listing. The UNIQUE (author_id,
    /// listing_id) constraint fires before any aggregate effect is applied;
    /// a second review by the same author is a `Duplicate`, regardless of
    /// timing.
    pub async fn submit(
        &self,
        listing_id: Uuid,
        author_id: Uuid,
        rating: i16,
        sub_ratings: Option<Value>,
        content: &str,
    ) -> Result<Review, AppError> {
        let mut tx = self.pool.begin().await?;

        // Unapproved listings are not publicly visible, so their absence is
        // indistinguishable from a missing id.
        let listing = sqlx::query_as::<_, Listing>("SELECT * FROM listings WHERE id = $1")
            .bind(listing_id)
            .fetch_optional(&mut *tx)
            .await?
            .filter(|l| l.status == ListingStatus::Approved)
            .ok_or_else(|| AppError::NotFound(format!("Listing {listing_id} not found")))?;

        let review = sqlx::query_as::<_, Review>(
            r#"
            INSERT INTO reviews (listing_id, author_id, rating, sub_ratings, content)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(listing_id)
        .bind(author_id)
        .bind(rating)
        .bind(&sub_ratings)
        .bind(content)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Duplicate("You have already reviewed this listing".to_string())
            } else {
                AppError::Database(e)
            }
        })?;

        recompute_listing_rating(&mut tx, listing.id).await?;
        tx.commit().await?;

        info!("Review {} submitted for listing {listing_id}", review.id);
        Ok(review)
    }

    /// Hides a review from public queries and from the rating aggregate.
    /// The row survives; only the visibility flag and its provenance change.
    pub async fn hide(
        &self,
        review_id: Uuid,
        admin_id: Uuid,
        reason: &str,
    ) -> Result<Review, AppError> {
        let mut tx = self.pool.begin().await?;

        let review = sqlx::query_as::<_, Review>(
            r#"
            UPDATE reviews
            SET hidden = TRUE, hidden_reason = $2, hidden_by = $3, hidden_at = now(),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(review_id)
        .bind(reason)
        .bind(admin_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Review {review_id} not found")))?;

        audit::append(
            &mut tx,
            NewLogEntry {
                actor_id: admin_id,
                action: ModerationAction::ReviewHide,
                entity_type: ENTITY_REVIEW,
                entity_id: review_id,
                reason: Some(reason),
                metadata: None,
            },
        )
        .await?;

        recompute_listing_rating(&mut tx, review.listing_id).await?;
        tx.commit().await?;

        info!("Review {review_id} hidden by {admin_id}");
        Ok(review)
    }

    /// Restores a hidden review. Clears all hidden provenance fields.
    pub async fn unhide(&self, review_id: Uuid, admin_id: Uuid) -> Result<Review, AppError> {
        let mut tx = self.pool.begin().await?;

        let review = sqlx::query_as::<_, Review>(
            r#"
            UPDATE reviews
            SET hidden = FALSE, hidden_reason = NULL, hidden_by = NULL, hidden_at = NULL,
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(review_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Review {review_id} not found")))?;

        audit::append(
            &mut tx,
            NewLogEntry {
                actor_id: admin_id,
                action: ModerationAction::ReviewUnhide,
                entity_type: ENTITY_REVIEW,
                entity_id: review_id,
                reason: None,
                metadata: None,
            },
        )
        .await?;

        recompute_listing_rating(&mut tx, review.listing_id).await?;
        tx.commit().await?;

        info!("Review {review_id} unhidden by {admin_id}");
        Ok(review)
    }

    /// Permanently deletes a review, cascading its reports and votes.
    /// The audit entry embeds a snapshot of the full pre-delete row.
    /// Deleting an already-hidden review skips recomputation: it was already
    /// excluded from the aggregate.
    pub async fn delete(&self, review_id: Uuid, admin_id: Uuid) -> Result<Review, AppError> {
        let mut tx = self.pool.begin().await?;

        let review =
            sqlx::query_as::<_, Review>("SELECT * FROM reviews WHERE id = $1 FOR UPDATE")
                .bind(review_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Review {review_id} not found")))?;

        let snapshot = serde_json::to_value(&review).map_err(anyhow::Error::from)?;

        sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(review_id)
            .execute(&mut *tx)
            .await?;

        audit::append(
            &mut tx,
            NewLogEntry {
                actor_id: admin_id,
                action: ModerationAction::ReviewDelete,
                entity_type: ENTITY_REVIEW,
                entity_id: review_id,
                reason: Some(DELETED_REASON),
                metadata: Some(snapshot),
            },
        )
        .await?;

        if !review.hidden {
            recompute_listing_rating(&mut tx, review.listing_id).await?;
        }
        tx.commit().await?;

        info!("Review {review_id} permanently deleted by {admin_id}");
        Ok(review)
    }

    /// Files a user report against a review. A user action, not a moderation
    /// action: nothing is written to the moderation log.
    pub async fn report(
        &self,
        review_id: Uuid,
        reporter_id: Uuid,
        reason: ReportReason,
        details: Option<&str>,
    ) -> Result<Review, AppError> {
        let mut tx = self.pool.begin().await?;

        let review =
            sqlx::query_as::<_, Review>("SELECT * FROM reviews WHERE id = $1 FOR UPDATE")
                .bind(review_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Review {review_id} not found")))?;

        if review.author_id == reporter_id {
            return Err(AppError::SelfReportForbidden);
        }

        sqlx::query(
            r#"
            INSERT INTO review_reports (review_id, reporter_id, reason, details)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(review_id)
        .bind(reporter_id)
        .bind(reason)
        .bind(details)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Duplicate("You have already reported this review".to_string())
            } else {
                AppError::Database(e)
            }
        })?;

        let review = sqlx::query_as::<_, Review>(
            r#"
            UPDATE reviews
            SET reported = TRUE, report_count = report_count + 1, updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(review_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(review)
    }

    /// Open reports against a review, oldest first. Read by admins deciding
    /// between hide and dismiss.
    pub async fn list_reports(&self, review_id: Uuid) -> Result<Vec<Report>, AppError> {
        self.get(review_id).await?;
        Ok(sqlx::query_as::<_, Report>(
            "SELECT * FROM review_reports WHERE review_id = $1 ORDER BY created_at ASC",
        )
        .bind(review_id)
        .fetch_all(&self.pool)
        .await?)
    }

    /// Dismisses all reports against a review: deletes the report rows and
    /// resets the reported flag and count. The hidden flag is untouched.
    pub async fn dismiss_reports(
        &self,
        review_id: Uuid,
        admin_id: Uuid,
    ) -> Result<Review, AppError> {
        let mut tx = self.pool.begin().await?;

        let exists = sqlx::query("SELECT 1 FROM reviews WHERE id = $1 FOR UPDATE")
            .bind(review_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(AppError::NotFound(format!("Review {review_id} not found")));
        }

        sqlx::query("DELETE FROM review_reports WHERE review_id = $1")
            .bind(review_id)
            .execute(&mut *tx)
            .await?;

        let review = sqlx::query_as::<_, Review>(
            r#"
            UPDATE reviews
            SET reported = FALSE, report_count = 0, updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(review_id)
        .fetch_one(&mut *tx)
        .await?;

        audit::append(
            &mut tx,
            NewLogEntry {
                actor_id: admin_id,
                action: ModerationAction::ReviewDismiss,
                entity_type: ENTITY_REVIEW,
                entity_id: review_id,
                reason: None,
                metadata: None,
            },
        )
        .await?;

        tx.commit().await?;

        info!("Reports on review {review_id} dismissed by {admin_id}");
        Ok(review)
    }

    /// Toggles a helpful vote: delete-if-exists, insert-if-absent. Locking
    /// the review row serializes concurrent toggles for the same review, so
    /// the prior count plus the toggle delta equals the row count; the
    /// composite primary key is the backstop against duplicate votes.
    pub async fn toggle_helpful(
        &self,
        review_id: Uuid,
        voter_id: Uuid,
    ) -> Result<HelpfulVoteState, AppError> {
        let mut tx = self.pool.begin().await?;

        let exists = sqlx::query("SELECT 1 FROM reviews WHERE id = $1 FOR UPDATE")
            .bind(review_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(AppError::NotFound(format!("Review {review_id} not found")));
        }

        let prior_count: i64 =
            sqlx::query_scalar("SELECT count(*) FROM helpful_votes WHERE review_id = $1")
                .bind(review_id)
                .fetch_one(&mut *tx)
                .await?;

        let deleted =
            sqlx::query("DELETE FROM helpful_votes WHERE review_id = $1 AND voter_id = $2")
                .bind(review_id)
                .bind(voter_id)
                .execute(&mut *tx)
                .await?
                .rows_affected();

        let state = apply_vote_toggle(deleted > 0, prior_count as i32);

        if state.user_voted {
            sqlx::query("INSERT INTO helpful_votes (review_id, voter_id) VALUES ($1, $2)")
                .bind(review_id)
                .bind(voter_id)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query("UPDATE reviews SET helpful_count = $2 WHERE id = $1")
            .bind(review_id)
            .bind(state.helpful_count)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(state)
    }
}

/// Net state after a vote toggle: a vote present before the toggle means
/// retraction, absence means endorsement. Toggling twice from any state
/// returns to the original count and `user_voted = false` for a fresh voter.
fn apply_vote_toggle(previously_voted: bool, prior_count: i32) -> HelpfulVoteState {
    if previously_voted {
        HelpfulVoteState {
            helpful_count: prior_count - 1,
            user_voted: false,
        }
    } else {
        HelpfulVoteState {
            helpful_count: prior_count + 1,
            user_voted: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn moderated_review(admin_id: Uuid) -> Review {
        Review {
            id: Uuid::new_v4(),
            listing_id: Uuid::new_v4(),
            author_id: Uuid::new_v4(),
            rating: 4,
            sub_ratings: Some(json!({ "cleanliness": 3 })),
            content: "Pitch was fine, showers were not".to_string(),
            hidden: true,
            hidden_reason: Some("spam".to_string()),
            hidden_by: Some(admin_id),
            hidden_at: Some(Utc::now()),
            reported: true,
            report_count: 2,
            helpful_count: 5,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_delete_snapshot_captures_full_row() {
        // The audit entry for a delete is the only surviving record of the
        // row, so the snapshot must carry every field, hidden provenance
        // and derived counts included.
        let admin_id = Uuid::new_v4();
        let review = moderated_review(admin_id);
        let snapshot = serde_json::to_value(&review).unwrap();

        assert_eq!(snapshot["id"], json!(review.id.to_string()));
        assert_eq!(snapshot["listing_id"], json!(review.listing_id.to_string()));
        assert_eq!(snapshot["author_id"], json!(review.author_id.to_string()));
        assert_eq!(snapshot["rating"], json!(4));
        assert_eq!(snapshot["sub_ratings"]["cleanliness"], json!(3));
        assert_eq!(snapshot["content"], json!(review.content));
        assert_eq!(snapshot["hidden"], json!(true));
        assert_eq!(snapshot["hidden_reason"], json!("spam"));
        assert_eq!(snapshot["hidden_by"], json!(admin_id.to_string()));
        assert!(snapshot["hidden_at"].is_string());
        assert_eq!(snapshot["reported"], json!(true));
        assert_eq!(snapshot["report_count"], json!(2));
        assert_eq!(snapshot["helpful_count"], json!(5));
        assert!(snapshot["created_at"].is_string());
        assert!(snapshot["updated_at"].is_string());
    }

    #[test]
    fn test_delete_reason_is_fixed() {
        assert_eq!(DELETED_REASON, "Permanently deleted by admin");
    }

    #[test]
    fn test_vote_toggle_endorses_fresh_voter() {
        let state = apply_vote_toggle(false, 3);
        assert!(state.user_voted);
        assert_eq!(state.helpful_count, 4);
    }

    #[test]
    fn test_vote_toggle_retracts_existing_vote() {
        let state = apply_vote_toggle(true, 4);
        assert!(!state.user_voted);
        assert_eq!(state.helpful_count, 3);
    }

    #[test]
    fn test_vote_toggle_twice_restores_original_state() {
        let first = apply_vote_toggle(false, 3);
        let second = apply_vote_toggle(first.user_voted, first.helpful_count);
        assert!(!second.user_voted);
        assert_eq!(second.helpful_count, 3);
    }

    #[test]
    fn test_vote_toggle_round_trip_from_zero() {
        let first = apply_vote_toggle(false, 0);
        assert_eq!(first.helpful_count, 1);
        let second = apply_vote_toggle(first.user_voted, first.helpful_count);
        assert_eq!(second.helpful_count, 0);
        assert!(!second.user_voted);
    }
}
