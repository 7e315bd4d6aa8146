pub mod health;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::listings::handlers as listings;
use crate::moderation::handlers as moderation;
use crate::reviews::handlers as reviews;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Listings
        .route("/api/v1/listings", post(listings::handle_create_listing))
        .route("/api/v1/listings/:id", get(listings::handle_get_listing))
        .route(
            "/api/v1/listings/:id/approve",
            post(listings::handle_approve_listing),
        )
        .route(
            "/api/v1/listings/:id/reject",
            post(listings::handle_reject_listing),
        )
        .route(
            "/api/v1/listings/:id/wishlist",
            post(listings::handle_add_wishlist).delete(listings::handle_remove_wishlist),
        )
        .route("/api/v1/wishlist", get(listings::handle_list_wishlist))
        // Reviews
        .route(
            "/api/v1/listings/:id/reviews",
            post(reviews::handle_submit_review).get(reviews::handle_list_visible_reviews),
        )
        .route(
            "/api/v1/reviews/:id",
            delete(reviews::handle_delete_review),
        )
        .route("/api/v1/reviews/:id/hide", post(reviews::handle_hide_review))
        .route(
            "/api/v1/reviews/:id/unhide",
            post(reviews::handle_unhide_review),
        )
        .route(
            "/api/v1/reviews/:id/report",
            post(reviews::handle_report_review),
        )
        .route(
            "/api/v1/reviews/:id/reports",
            get(reviews::handle_list_reports),
        )
        .route(
            "/api/v1/reviews/:id/dismiss-reports",
            post(reviews::handle_dismiss_reports),
        )
        .route(
            "/api/v1/reviews/:id/helpful",
            post(reviews::handle_toggle_helpful),
        )
        // Owner upgrade workflow
        .route(
            "/api/v1/owner-requests",
            post(moderation::handle_create_owner_request),
        )
        .route(
            "/api/v1/owner-requests/:id/approve",
            post(moderation::handle_approve_owner_request),
        )
        .route(
            "/api/v1/owner-requests/:id/reject",
            post(moderation::handle_reject_owner_request),
        )
        // Moderation audit log (read-only)
        .route(
            "/api/v1/moderation/log",
            get(moderation::handle_list_moderation_log),
        )
        .with_state(state)
}
