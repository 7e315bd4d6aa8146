use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::Role;
use crate::errors::{is_unique_violation, AppError};
use crate::models::moderation::ModerationAction;
use crate::models::user::{OwnerUpgradeRequest, UserProfile};
use crate::moderation::audit::{self, NewLogEntry, ENTITY_OWNER_REQUEST};

/// Outcome of an upgrade approval. The request's terminal state and the
/// profile role are two separately-committed facts; `user_role_updated`
/// surfaces whether the best-effort role mutation landed.
#[derive(Debug, serde::Serialize)]
pub struct UpgradeDecision {
    pub request: OwnerUpgradeRequest,
    pub user_role_updated: bool,
}

/// Typed repository for owner upgrade requests.
#[derive(Clone)]
pub struct UpgradeRepository {
    pool: PgPool,
}

impl UpgradeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Files a new upgrade request in `pending`. The partial unique index on
    /// (requester_id) WHERE status = 'pending' is the backstop against a
    /// second concurrent request slipping through.
    pub async fn create(
        &self,
        requester_id: Uuid,
        business_name: &str,
        business_description: &str,
        contact_email: &str,
    ) -> Result<OwnerUpgradeRequest, AppError> {
        let request = sqlx::query_as::<_, OwnerUpgradeRequest>(
            r#"
            INSERT INTO owner_upgrade_requests
                (requester_id, business_name, business_description, contact_email)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(requester_id)
        .bind(business_name)
        .bind(business_description)
        .bind(contact_email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Duplicate("You already have a pending owner request".to_string())
            } else {
                AppError::Database(e)
            }
        })?;

        info!("Owner upgrade request {} filed by {requester_id}", request.id);
        Ok(request)
    }

    /// Approves a pending request, then attempts the role upgrade on the
    /// requester's profile as a separate commit. Role-upgrade failure never
    /// reverts the approval.
    pub async fn approve(
        &self,
        request_id: Uuid,
        admin_id: Uuid,
    ) -> Result<UpgradeDecision, AppError> {
        let mut tx = self.pool.begin().await?;

        // Precondition and mutation as one conditional update: two concurrent
        // approvals resolve to exactly one success.
        let request = sqlx::query_as::<_, OwnerUpgradeRequest>(
            r#"
            UPDATE owner_upgrade_requests
            SET status = 'approved', reviewed_by = $2, reviewed_at = now()
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(request_id)
        .bind(admin_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            AppError::NotPendingOrNotFound(format!(
                "Owner request {request_id} not found or already reviewed"
            ))
        })?;

        audit::append(
            &mut tx,
            NewLogEntry {
                actor_id: admin_id,
                action: ModerationAction::OwnerApprove,
                entity_type: ENTITY_OWNER_REQUEST,
                entity_id: request_id,
                reason: None,
                metadata: None,
            },
        )
        .await?;

        tx.commit().await?;

        let user_role_updated = self.upgrade_role(request.requester_id).await;
        info!(
            "Owner request {request_id} approved by {admin_id} (role updated: {user_role_updated})"
        );

        Ok(UpgradeDecision {
            request,
            user_role_updated,
        })
    }

    /// Rejects a pending request. Never touches the profile role.
    pub async fn reject(
        &self,
        request_id: Uuid,
        admin_id: Uuid,
        reason: &str,
    ) -> Result<OwnerUpgradeRequest, AppError> {
        let mut tx = self.pool.begin().await?;

        let request = sqlx::query_as::<_, OwnerUpgradeRequest>(
            r#"
            UPDATE owner_upgrade_requests
            SET status = 'rejected', reviewed_by = $2, reviewed_at = now(), rejection_reason = $3
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(request_id)
        .bind(admin_id)
        .bind(reason)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            AppError::NotPendingOrNotFound(format!(
                "Owner request {request_id} not found or already reviewed"
            ))
        })?;

        audit::append(
            &mut tx,
            NewLogEntry {
                actor_id: admin_id,
                action: ModerationAction::OwnerReject,
                entity_type: ENTITY_OWNER_REQUEST,
                entity_id: request_id,
                reason: Some(reason),
                metadata: None,
            },
        )
        .await?;

        tx.commit().await?;

        info!("Owner request {request_id} rejected by {admin_id}");
        Ok(request)
    }

    /// Best-effort role mutation, committed on its own. The updated profile
    /// is read back so the result reflects what was actually stored; a
    /// missing profile row or a failed write reports false.
    async fn upgrade_role(&self, requester_id: Uuid) -> bool {
        let result = sqlx::query_as::<_, UserProfile>(
            "UPDATE users SET role = 'owner' WHERE id = $1 RETURNING *",
        )
        .bind(requester_id)
        .fetch_optional(&self.pool)
        .await;

        match result {
            Ok(Some(profile)) => profile.role == Role::Owner,
            Ok(None) => {
                warn!("No profile row for {requester_id}; role not upgraded");
                false
            }
            Err(e) => {
                warn!("Role upgrade for {requester_id} failed: {e}");
                false
            }
        }
    }
}
