use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::auth::Identity;
use crate::errors::AppError;
use crate::models::moderation::ModerationLogEntry;
use crate::models::user::OwnerUpgradeRequest;
use crate::moderation::audit;
use crate::moderation::require_reason;
use crate::moderation::upgrade::UpgradeDecision;
use crate::notify::{send_best_effort, NotificationKind};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateOwnerRequest {
    pub business_name: String,
    #[serde(default)]
    pub business_description: String,
    pub contact_email: String,
}

/// POST /api/v1/owner-requests
pub async fn handle_create_owner_request(
    State(state): State<AppState>,
    identity: Identity,
    Json(req): Json<CreateOwnerRequest>,
) -> Result<Json<OwnerUpgradeRequest>, AppError> {
    if req.business_name.trim().is_empty() {
        return Err(AppError::Validation(
            "Business name must not be empty".to_string(),
        ));
    }
    let request = state
        .upgrades
        .create(
            identity.actor_id,
            req.business_name.trim(),
            &req.business_description,
            &req.contact_email,
        )
        .await?;
    Ok(Json(request))
}

/// POST /api/v1/owner-requests/:id/approve
pub async fn handle_approve_owner_request(
    State(state): State<AppState>,
    identity: Identity,
    Path(request_id): Path<Uuid>,
) -> Result<Json<UpgradeDecision>, AppError> {
    identity.require_admin()?;
    let decision = state.upgrades.approve(request_id, identity.actor_id).await?;

    send_best_effort(
        state.notifier.as_ref(),
        NotificationKind::OwnerRequestApproved,
        decision.request.requester_id,
        json!({
            "request_id": decision.request.id,
            "business_name": decision.request.business_name,
        }),
    )
    .await;

    Ok(Json(decision))
}

#[derive(Deserialize)]
pub struct RejectOwnerRequest {
    pub reason: Option<String>,
}

/// POST /api/v1/owner-requests/:id/reject
pub async fn handle_reject_owner_request(
    State(state): State<AppState>,
    identity: Identity,
    Path(request_id): Path<Uuid>,
    Json(req): Json<RejectOwnerRequest>,
) -> Result<Json<OwnerUpgradeRequest>, AppError> {
    identity.require_admin()?;
    let reason = require_reason(req.reason.as_deref(), "reject an owner request")?;
    let request = state
        .upgrades
        .reject(request_id, identity.actor_id, reason)
        .await?;
    Ok(Json(request))
}

#[derive(Deserialize)]
pub struct LogQuery {
    pub entity_id: Option<Uuid>,
}

/// GET /api/v1/moderation/log
pub async fn handle_list_moderation_log(
    State(state): State<AppState>,
    identity: Identity,
    Query(params): Query<LogQuery>,
) -> Result<Json<Vec<ModerationLogEntry>>, AppError> {
    identity.require_admin()?;
    let entries = audit::list_recent(&state.db, params.entity_id, 100).await?;
    Ok(Json(entries))
}
