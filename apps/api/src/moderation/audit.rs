use serde_json::Value;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::moderation::{ModerationAction, ModerationLogEntry};

/// Entity kinds the audit log can point at.
pub const ENTITY_LISTING: &str = "listing";
pub const ENTITY_REVIEW: &str = "review";
pub const ENTITY_OWNER_REQUEST: &str = "owner_upgrade_request";

/// A new audit fact, appended alongside the mutation it describes.
#[derive(Debug)]
pub struct NewLogEntry<'a> {
    pub actor_id: Uuid,
    pub action: ModerationAction,
    pub entity_type: &'static str,
    pub entity_id: Uuid,
    pub reason: Option<&'a str>,
    pub metadata: Option<Value>,
}

/// Appends one entry to the moderation log.
///
/// Takes the caller's open transaction connection so the audit append commits
/// or rolls back with the mutation it describes. A listing can never end up
/// "approved with no audit trail" or "audited but still pending".
pub async fn append(conn: &mut PgConnection, entry: NewLogEntry<'_>) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO moderation_log (actor_id, action, entity_type, entity_id, reason, metadata)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(entry.actor_id)
    .bind(entry.action.as_str())
    .bind(entry.entity_type)
    .bind(entry.entity_id)
    .bind(entry.reason)
    .bind(entry.metadata)
    .execute(conn)
    .await?;

    Ok(())
}

/// Read-only query surface for admins. The log itself is append-only; no
/// update or delete is exposed anywhere.
pub async fn list_recent(
    pool: &PgPool,
    entity_id: Option<Uuid>,
    limit: i64,
) -> Result<Vec<ModerationLogEntry>, sqlx::Error> {
    match entity_id {
        Some(entity_id) => {
            sqlx::query_as::<_, ModerationLogEntry>(
                r#"
                SELECT * FROM moderation_log
                WHERE entity_id = $1
                ORDER BY created_at DESC, id DESC
                LIMIT $2
                "#,
            )
            .bind(entity_id)
            .bind(limit)
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query_as::<_, ModerationLogEntry>(
                "SELECT * FROM moderation_log ORDER BY created_at DESC, id DESC LIMIT $1",
            )
            .bind(limit)
            .fetch_all(pool)
            .await
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::models::moderation::ModerationAction;

    #[test]
    fn test_action_names_are_stable() {
        // Stored as text; renaming a variant must not change the log format.
        assert_eq!(ModerationAction::ListingApprove.as_str(), "listing_approve");
        assert_eq!(ModerationAction::ListingReject.as_str(), "listing_reject");
        assert_eq!(ModerationAction::ReviewHide.as_str(), "review_hide");
        assert_eq!(ModerationAction::ReviewUnhide.as_str(), "review_unhide");
        assert_eq!(ModerationAction::ReviewDelete.as_str(), "review_delete");
        assert_eq!(ModerationAction::ReviewDismiss.as_str(), "review_dismiss");
        assert_eq!(ModerationAction::OwnerApprove.as_str(), "owner_approve");
        assert_eq!(ModerationAction::OwnerReject.as_str(), "owner_reject");
    }
}
