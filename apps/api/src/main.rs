mod auth;
mod config;
mod db;
mod errors;
mod listings;
mod models;
mod moderation;
mod notify;
mod reviews;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::listings::repo::ListingRepository;
use crate::listings::wishlist::WishlistRepository;
use crate::moderation::upgrade::UpgradeRepository;
use crate::notify::{NoopNotifier, NotificationSender, WebhookNotifier};
use crate::reviews::repo::ReviewRepository;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            let crate_target = env!("CARGO_PKG_NAME").replace('-', "_");
            EnvFilter::new(format!("{crate_target}={}", &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Campsite API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL and apply migrations
    let db = create_pool(&config.database_url).await?;
    sqlx::migrate!().run(&db).await?;
    info!("Migrations applied");

    // Notification sender: webhook when configured, no-op otherwise
    let notifier: Arc<dyn NotificationSender> = match &config.notify_webhook_url {
        Some(url) => {
            info!("Webhook notifier initialized ({url})");
            Arc::new(WebhookNotifier::new(url.clone()))
        }
        None => {
            info!("No NOTIFY_WEBHOOK_URL set; notifications disabled");
            Arc::new(NoopNotifier)
        }
    };

    // Build app state with explicitly constructed repositories
    let state = AppState {
        listings: ListingRepository::new(db.clone()),
        reviews: ReviewRepository::new(db.clone()),
        wishlist: WishlistRepository::new(db.clone()),
        upgrades: UpgradeRepository::new(db.clone()),
        notifier,
        db,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
