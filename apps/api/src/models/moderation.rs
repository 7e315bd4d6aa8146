use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Every state-changing moderation action, as recorded in the audit log.
/// User actions (reporting, voting) are deliberately absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationAction {
    ListingApprove,
    ListingReject,
    ReviewHide,
    ReviewUnhide,
    ReviewDelete,
    ReviewDismiss,
    OwnerApprove,
    OwnerReject,
}

impl ModerationAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationAction::ListingApprove => "listing_approve",
            ModerationAction::ListingReject => "listing_reject",
            ModerationAction::ReviewHide => "review_hide",
            ModerationAction::ReviewUnhide => "review_unhide",
            ModerationAction::ReviewDelete => "review_delete",
            ModerationAction::ReviewDismiss => "review_dismiss",
            ModerationAction::OwnerApprove => "owner_approve",
            ModerationAction::OwnerReject => "owner_reject",
        }
    }
}

/// One append-only audit fact. Rows are never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ModerationLogEntry {
    pub id: i64,
    pub actor_id: Uuid,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub reason: Option<String>,
    /// Snapshot of the mutated entity where the row will not survive to be
    /// inspected later (review deletes).
    pub metadata: Option<Value>,
    pub created_at: DateTime<Utc>,
}
