use std::sync::Arc;

use sqlx::PgPool;

use crate::listings::repo::ListingRepository;
use crate::listings::wishlist::WishlistRepository;
use crate::moderation::upgrade::UpgradeRepository;
use crate::notify::NotificationSender;
use crate::reviews::repo::ReviewRepository;

/// Shared application state injected into all route handlers via Axum
/// extractors. Repositories are constructed once at startup; there are no
/// module-level clients.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub listings: ListingRepository,
    pub reviews: ReviewRepository,
    pub wishlist: WishlistRepository,
    pub upgrades: UpgradeRepository,
    /// Pluggable delivery seam; webhook when configured, no-op otherwise.
    pub notifier: Arc<dyn NotificationSender>,
}
