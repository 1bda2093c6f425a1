use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

mod channel;
mod config;
mod dashboard;
mod feed;
mod scoreboard;

use channel::{ChannelManager, ManagerConfig, TungsteniteConnector};
use config::Config;
use dashboard::{AppState, OverlayAssets};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    config.validate()?;

    info!(
        "Environment: {:?} (feed base {})",
        config.environment,
        config.base_feed_url()
    );
    if config.credential().is_none() {
        warn!("No API_KEY configured – connecting without credentials");
    }

    // One manager for the whole process; every surface shares its connection.
    let manager = ChannelManager::new(
        ManagerConfig {
            base_url: config.base_feed_url().to_string(),
            retry_delay: config.reconnect_delay(),
            ping_interval: config.ping_interval(),
        },
        Arc::new(TungsteniteConnector),
    );

    let subscription = manager
        .subscribe(&config.feed_path, config.credential())
        .await
        .context("Failed to subscribe to feed")?;
    info!("Subscribed to feed {}", subscription.path());

    let state = AppState {
        manager: manager.clone(),
        subscription: subscription.clone(),
        assets: OverlayAssets {
            venue_logo_url: config.venue_logo_url.clone(),
            event_logo_url: config.event_logo_url.clone(),
            tournament_logo_url: config.tournament_logo_url.clone(),
            arrow_image_url: config.arrow_image_url.clone(),
        },
    };
    let app = dashboard::router(state);
    let addr: SocketAddr = config.dashboard_addr.parse()?;
    info!("Overlay listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Run overlay server until Ctrl-C
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
            info!("Shutdown requested");
        })
        .await?;

    manager.release(subscription).await;
    manager.shutdown().await;

    Ok(())
}
