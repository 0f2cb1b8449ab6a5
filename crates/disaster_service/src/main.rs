//! Disaster service entry point.
//!
//! Aggregates hazard data from the NWS and USGS feeds behind a TTL-bounded
//! cache and exposes filtered queries over HTTP. Refreshes happen inside the
//! request path; there is no background scheduler.

use std::time::Duration;

use anyhow::Result;
use disaster_service::{create_router, AppState, MemoryHazardStore, RefreshCoordinator};
use hazard_feeds::{NwsFeed, UsgsFeed};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting disaster service...");

    // Initialize Prometheus metrics
    let metrics_port: u16 = std::env::var("METRICS_PORT")
        .unwrap_or_else(|_| "9094".into())
        .parse()
        .unwrap_or(9094);

    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], metrics_port))
        .install()?;

    info!(
        "Prometheus metrics available at http://0.0.0.0:{}/metrics",
        metrics_port
    );

    // Configuration from environment
    let http_port: u16 = std::env::var("HTTP_PORT")
        .unwrap_or_else(|_| "8084".into())
        .parse()
        .unwrap_or(8084);
    let cache_ttl_secs: u64 = std::env::var("CACHE_TTL_SECS")
        .unwrap_or_else(|_| "300".into())
        .parse()
        .unwrap_or(300);
    let fetch_timeout_secs: u64 = std::env::var("FETCH_TIMEOUT_SECS")
        .unwrap_or_else(|_| "10".into())
        .parse()
        .unwrap_or(10);

    let fetch_timeout = Duration::from_secs(fetch_timeout_secs);
    let weather = match std::env::var("NWS_API_URL") {
        Ok(url) => NwsFeed::with_base_url(url),
        Err(_) => NwsFeed::new(),
    }
    .timeout(fetch_timeout);
    let seismic = match std::env::var("USGS_API_URL") {
        Ok(url) => UsgsFeed::with_base_url(url),
        Err(_) => UsgsFeed::new(),
    }
    .timeout(fetch_timeout);

    // Cache starts empty; the first query populates it.
    let store = MemoryHazardStore::new();
    let coordinator = RefreshCoordinator::new(store, weather, seismic)
        .with_ttl(Duration::from_secs(cache_ttl_secs));

    info!(
        "Hazard cache TTL {}s, upstream fetch timeout {}s",
        cache_ttl_secs, fetch_timeout_secs
    );

    // Create HTTP server
    let router = create_router(AppState { coordinator });

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", http_port)).await?;
    info!("HTTP API listening on http://0.0.0.0:{}", http_port);
    info!("Available endpoints:");
    info!("  GET /health                - Health check");
    info!("  GET /disasters             - All cached hazards, filtered");
    info!("  GET /disasters/nws         - Weather alerts only");
    info!("  GET /disasters/earthquakes - Seismic events only");
    info!("  GET /disasters/wildfires   - Wildfire alerts only");

    // Run HTTP server with graceful shutdown
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Disaster service stopped");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    tokio::signal::ctrl_c().await.ok();
    info!("Received shutdown signal");
}
