use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Lifecycle status of a listing. `pending` is the only initial state;
/// `approved` and `rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "listing_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Pending,
    Approved,
    Rejected,
}

/// A submitted campsite.
///
/// `average_rating` and `visible_review_count` are derived values owned by
/// the rating aggregation step; nothing else writes them.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Listing {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: String,
    pub status: ListingStatus,
    pub rejection_reason: Option<String>,
    pub average_rating: f64,
    pub visible_review_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WishlistEntry {
    pub user_id: Uuid,
    pub listing_id: Uuid,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}
