// Copyright (c) 2025 - Cowboy AI, Inc.
//! Marketplace Controller Service
//!
//! Watches the marketplace KV bucket and reconciles brokers and platforms to
//! the `Registered` state.
//!
//! Run with: cargo run --bin marketplace-controller --features nats
//!
//! Prerequisites:
//! 1. NATS server with JetStream enabled (default: localhost:4222)
//! 2. Optional overrides via `NATS_URL`, `MARKETPLACE_BUCKET`,
//!    `MARKETPLACE_NAMESPACE` and `MARKETPLACE_MAX_CONFLICT_RETRIES`

use anyhow::{Context, Result};
use cim_marketplace::{
    controller::ControllerConfig, Broker, MarketplaceConfig, NatsKvResourceStore,
    NatsStoreConfig, Platform, ResourceStore, StoreMarketplaceService,
};
use std::sync::Arc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("🚀 Starting Marketplace Controller");

    // Load configuration
    let config = MarketplaceConfig::from_env().context("Invalid marketplace configuration")?;
    let nats = NatsStoreConfig::from_env();
    info!("📋 Configuration loaded:");
    info!("  - NATS servers: {:?}", nats.servers);
    info!("  - Bucket: {}", nats.bucket);
    info!("  - Namespace: {}", config.namespace);
    info!("  - Max conflict retries: {}", config.max_conflict_retries);

    // Connect to the resource store
    let store: Arc<dyn ResourceStore> = Arc::new(
        NatsKvResourceStore::connect(&nats)
            .await
            .context("Failed to open marketplace store")?,
    );
    info!("✅ Resource store ready ({})", store.backend_name());

    let service = StoreMarketplaceService::new(store, config);
    let brokers = service
        .controller::<Broker>(ControllerConfig::default())
        .spawn();
    let platforms = service
        .controller::<Platform>(ControllerConfig::default())
        .spawn();
    info!("🎧 Reconciling brokers and platforms");

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for Ctrl-C")?;
            info!("🛑 Shutdown requested");
        }
        result = brokers => {
            report_exit("broker", result);
        }
        result = platforms => {
            report_exit("platform", result);
        }
    }

    info!("👋 Marketplace Controller stopped");
    Ok(())
}

fn report_exit(
    kind: &str,
    result: std::result::Result<cim_marketplace::MarketplaceResult<()>, tokio::task::JoinError>,
) {
    match result {
        Ok(Ok(())) => warn!("⚠️  {} controller stopped: watch ended", kind),
        Ok(Err(e)) => error!("❌ {} controller failed: {}", kind, e),
        Err(e) => error!("❌ {} controller task panicked: {}", kind, e),
    }
}
