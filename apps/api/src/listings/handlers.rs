use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::auth::Identity;
use crate::errors::AppError;
use crate::models::listing::{Listing, WishlistEntry};
use crate::moderation::require_reason;
use crate::notify::{send_best_effort, NotificationKind};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateListingRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// POST /api/v1/listings
pub async fn handle_create_listing(
    State(state): State<AppState>,
    identity: Identity,
    Json(req): Json<CreateListingRequest>,
) -> Result<Json<Listing>, AppError> {
    identity.require_owner()?;
    if req.name.trim().is_empty() {
        return Err(AppError::Validation(
            "Listing name must not be empty".to_string(),
        ));
    }
    let listing = state
        .listings
        .create(identity.actor_id, req.name.trim(), &req.description)
        .await?;
    Ok(Json(listing))
}

/// GET /api/v1/listings/:id
pub async fn handle_get_listing(
    State(state): State<AppState>,
    Path(listing_id): Path<Uuid>,
) -> Result<Json<Listing>, AppError> {
    let listing = state.listings.get_approved(listing_id).await?;
    Ok(Json(listing))
}

/// POST /api/v1/listings/:id/approve
pub async fn handle_approve_listing(
    State(state): State<AppState>,
    identity: Identity,
    Path(listing_id): Path<Uuid>,
) -> Result<Json<Listing>, AppError> {
    identity.require_admin()?;
    let listing = state.listings.approve(listing_id, identity.actor_id).await?;

    send_best_effort(
        state.notifier.as_ref(),
        NotificationKind::ListingApproved,
        listing.owner_id,
        json!({
            "listing_id": listing.id,
            "listing_name": listing.name,
        }),
    )
    .await;

    Ok(Json(listing))
}

#[derive(Deserialize)]
pub struct RejectListingRequest {
    pub reason: Option<String>,
}

/// POST /api/v1/listings/:id/reject
pub async fn handle_reject_listing(
    State(state): State<AppState>,
    identity: Identity,
    Path(listing_id): Path<Uuid>,
    Json(req): Json<RejectListingRequest>,
) -> Result<Json<Listing>, AppError> {
    identity.require_admin()?;
    let reason = require_reason(req.reason.as_deref(), "reject a listing")?;
    let listing = state
        .listings
        .reject(listing_id, identity.actor_id, reason)
        .await?;

    send_best_effort(
        state.notifier.as_ref(),
        NotificationKind::ListingRejected,
        listing.owner_id,
        json!({
            "listing_id": listing.id,
            "listing_name": listing.name,
            "reason": reason,
        }),
    )
    .await;

    Ok(Json(listing))
}

#[derive(Deserialize)]
pub struct WishlistRequest {
    pub note: Option<String>,
}

/// POST /api/v1/listings/:id/wishlist
pub async fn handle_add_wishlist(
    State(state): State<AppState>,
    identity: Identity,
    Path(listing_id): Path<Uuid>,
    Json(req): Json<WishlistRequest>,
) -> Result<Json<WishlistEntry>, AppError> {
    let entry = state
        .wishlist
        .add(identity.actor_id, listing_id, req.note.as_deref())
        .await?;
    Ok(Json(entry))
}

/// DELETE /api/v1/listings/:id/wishlist
pub async fn handle_remove_wishlist(
    State(state): State<AppState>,
    identity: Identity,
    Path(listing_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.wishlist.remove(identity.actor_id, listing_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/wishlist
pub async fn handle_list_wishlist(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<Vec<WishlistEntry>>, AppError> {
    let entries = state.wishlist.list_for_user(identity.actor_id).await?;
    Ok(Json(entries))
}
