use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use beacon::api;
use beacon::config::Config;
use beacon::moderation::{ContentFilter, FilterPolicy};
use beacon::storage::WebhookRatingStore;
use beacon::Beacon;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Loaded configuration");

    // Build the content filter
    let filter = match config.moderation.policy_path.as_deref() {
        Some(path) => {
            info!("Loading filter policy from {}", path);
            ContentFilter::new(FilterPolicy::load(path)?)?
        }
        None => ContentFilter::builtin()?,
    };
    info!(
        roots = filter.root_count(),
        patterns = filter.pattern_count(),
        "Content filter ready"
    );

    let mut beacon = Beacon::new(&config.core, filter);

    // Attach the external rating store, if configured
    if let Some(url) = config.store.url.as_deref() {
        let store = WebhookRatingStore::new(url, Duration::from_secs(config.store.timeout_secs))?;
        info!("Persisting ratings to {}", store.url());
        beacon = beacon.with_store(Arc::new(store));
    } else {
        info!("No rating store configured - ratings live in memory only");
    }

    let beacon = Arc::new(beacon);
    beacon.warm().await;

    let sweep_every = Duration::from_secs(config.core.sweep_interval_secs.max(1));
    let _sweep_task = beacon.start_sweep_task(sweep_every);

    let router = api::create_api_router(Arc::clone(&beacon));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("🚀 Beacon listening on http://{}", addr);
    info!("   - Stats at http://{}/api/stats", addr);
    info!("   - Ratings at http://{}/api/ratings", addr);

    axum::serve(listener, router).await?;

    Ok(())
}
