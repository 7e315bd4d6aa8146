use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// A user-submitted review of a listing.
///
/// `hidden` and `reported` are two independent axes: a review can be
/// reported-and-visible, hidden-and-not-reported, or any other combination.
/// Hiding never deletes the row; only an explicit admin delete removes it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Review {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub author_id: Uuid,
    /// Overall rating, 1-5.
    pub rating: i16,
    /// Optional per-aspect ratings (e.g. cleanliness, location), each 1-5.
    pub sub_ratings: Option<Value>,
    pub content: String,
    pub hidden: bool,
    pub hidden_reason: Option<String>,
    pub hidden_by: Option<Uuid>,
    pub hidden_at: Option<DateTime<Utc>>,
    pub reported: bool,
    pub report_count: i32,
    /// Derived from helpful_votes rows inside the toggle transaction.
    pub helpful_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Why a review was reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "report_reason", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReportReason {
    Spam,
    Inappropriate,
    Fake,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Report {
    pub review_id: Uuid,
    pub reporter_id: Uuid,
    pub reason: ReportReason,
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Net state after a helpful-vote toggle.
#[derive(Debug, Clone, Serialize)]
pub struct HelpfulVoteState {
    pub helpful_count: i32,
    pub user_voted: bool,
}
