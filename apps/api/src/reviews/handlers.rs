use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::Identity;
use crate::errors::AppError;
use crate::models::review::{HelpfulVoteState, Report, ReportReason, Review};
use crate::moderation::require_reason;
use crate::notify::{send_best_effort, NotificationKind};
use crate::reviews::validation::validate_new_review;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SubmitReviewRequest {
    pub rating: i16,
    pub sub_ratings: Option<Value>,
    pub content: String,
}

/// POST /api/v1/listings/:id/reviews
pub async fn handle_submit_review(
    State(state): State<AppState>,
    identity: Identity,
    Path(listing_id): Path<Uuid>,
    Json(req): Json<SubmitReviewRequest>,
) -> Result<Json<Review>, AppError> {
    validate_new_review(req.rating, req.sub_ratings.as_ref(), &req.content)?;
    let review = state
        .reviews
        .submit(
            listing_id,
            identity.actor_id,
            req.rating,
            req.sub_ratings,
            &req.content,
        )
        .await?;
    Ok(Json(review))
}

/// GET /api/v1/listings/:id/reviews
pub async fn handle_list_visible_reviews(
    State(state): State<AppState>,
    Path(listing_id): Path<Uuid>,
) -> Result<Json<Vec<Review>>, AppError> {
    // 404s for unknown and unapproved listings alike.
    state.listings.get_approved(listing_id).await?;
    let reviews = state.reviews.visible_for_listing(listing_id).await?;
    Ok(Json(reviews))
}

#[derive(Deserialize)]
pub struct HideReviewRequest {
    pub reason: Option<String>,
}

/// POST /api/v1/reviews/:id/hide
pub async fn handle_hide_review(
    State(state): State<AppState>,
    identity: Identity,
    Path(review_id): Path<Uuid>,
    Json(req): Json<HideReviewRequest>,
) -> Result<Json<Review>, AppError> {
    identity.require_admin()?;
    let reason = require_reason(req.reason.as_deref(), "hide a review")?;

    let review = state
        .reviews
        .hide(review_id, identity.actor_id, reason)
        .await?;

    send_best_effort(
        state.notifier.as_ref(),
        NotificationKind::ReviewHidden,
        review.author_id,
        json!({
            "review_id": review.id,
            "listing_id": review.listing_id,
            "reason": reason,
        }),
    )
    .await;

    Ok(Json(review))
}

/// POST /api/v1/reviews/:id/unhide
pub async fn handle_unhide_review(
    State(state): State<AppState>,
    identity: Identity,
    Path(review_id): Path<Uuid>,
) -> Result<Json<Review>, AppError> {
    identity.require_admin()?;
    let review = state.reviews.unhide(review_id, identity.actor_id).await?;
    Ok(Json(review))
}

/// DELETE /api/v1/reviews/:id
pub async fn handle_delete_review(
    State(state): State<AppState>,
    identity: Identity,
    Path(review_id): Path<Uuid>,
) -> Result<Json<Review>, AppError> {
    identity.require_admin()?;
    let review = state.reviews.delete(review_id, identity.actor_id).await?;
    Ok(Json(review))
}

#[derive(Deserialize)]
pub struct ReportReviewRequest {
    pub reason: ReportReason,
    pub details: Option<String>,
}

/// POST /api/v1/reviews/:id/report
pub async fn handle_report_review(
    State(state): State<AppState>,
    identity: Identity,
    Path(review_id): Path<Uuid>,
    Json(req): Json<ReportReviewRequest>,
) -> Result<Json<Review>, AppError> {
    let review = state
        .reviews
        .report(
            review_id,
            identity.actor_id,
            req.reason,
            req.details.as_deref(),
        )
        .await?;
    Ok(Json(review))
}

/// GET /api/v1/reviews/:id/reports
pub async fn handle_list_reports(
    State(state): State<AppState>,
    identity: Identity,
    Path(review_id): Path<Uuid>,
) -> Result<Json<Vec<Report>>, AppError> {
    identity.require_admin()?;
    let reports = state.reviews.list_reports(review_id).await?;
    Ok(Json(reports))
}

/// POST /api/v1/reviews/:id/dismiss-reports
pub async fn handle_dismiss_reports(
    State(state): State<AppState>,
    identity: Identity,
    Path(review_id): Path<Uuid>,
) -> Result<Json<Review>, AppError> {
    identity.require_admin()?;
    let review = state
        .reviews
        .dismiss_reports(review_id, identity.actor_id)
        .await?;
    Ok(Json(review))
}

/// POST /api/v1/reviews/:id/helpful
pub async fn handle_toggle_helpful(
    State(state): State<AppState>,
    identity: Identity,
    Path(review_id): Path<Uuid>,
) -> Result<Json<HelpfulVoteState>, AppError> {
    let vote = state
        .reviews
        .toggle_helpful(review_id, identity.actor_id)
        .await?;
    Ok(Json(vote))
}
