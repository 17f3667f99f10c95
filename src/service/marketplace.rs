// Copyright (c) 2025 - Cowboy AI, Inc.
//! Marketplace Service
//!
//! Application service over brokers and platforms. Registration goes through
//! a [`Registrar`] and therefore waits for the reconciler; listings read the
//! repositories directly.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use crate::config::MarketplaceConfig;
use crate::controller::{Controller, ControllerConfig, IdentityEventSource, StoreEventSource};
use crate::domain::{Broker, Platform, Registrable, Registration};
use crate::errors::MarketplaceResult;
use crate::reconciler::Reconciler;
use crate::registrar::Registrar;
use crate::repository::{Repository, StoreRepository};
use crate::store::ResourceStore;

/// Marketplace service trait
///
/// The operations an operator-facing client calls.
#[async_trait]
pub trait MarketplaceService: Send + Sync {
    /// Register a broker and wait until it is registered
    async fn register_broker(&self, broker: &Broker) -> MarketplaceResult<Registration<Broker>>;

    /// Register a platform and wait until it is registered
    async fn register_platform(
        &self,
        platform: &Platform,
    ) -> MarketplaceResult<Registration<Platform>>;

    /// All brokers, in any state
    async fn get_brokers(&self) -> MarketplaceResult<Vec<Registration<Broker>>>;

    /// All platforms, in any state
    async fn get_platforms(&self) -> MarketplaceResult<Vec<Registration<Platform>>>;
}

/// [`MarketplaceService`] over a single [`ResourceStore`]
pub struct StoreMarketplaceService {
    store: Arc<dyn ResourceStore>,
    config: MarketplaceConfig,
    brokers: Arc<StoreRepository<Broker>>,
    platforms: Arc<StoreRepository<Platform>>,
    broker_registrar: Registrar<Broker>,
    platform_registrar: Registrar<Platform>,
}

impl StoreMarketplaceService {
    pub fn new(store: Arc<dyn ResourceStore>, config: MarketplaceConfig) -> Self {
        let brokers = Arc::new(StoreRepository::<Broker>::new(
            Arc::clone(&store),
            &config.namespace,
        ));
        let platforms = Arc::new(StoreRepository::<Platform>::new(
            Arc::clone(&store),
            &config.namespace,
        ));

        Self {
            broker_registrar: Registrar::<Broker>::from_config(brokers.clone(), &config),
            platform_registrar: Registrar::<Platform>::from_config(platforms.clone(), &config),
            store,
            config,
            brokers,
            platforms,
        }
    }

    pub fn config(&self) -> &MarketplaceConfig {
        &self.config
    }

    pub fn brokers(&self) -> Arc<StoreRepository<Broker>> {
        Arc::clone(&self.brokers)
    }

    pub fn platforms(&self) -> Arc<StoreRepository<Platform>> {
        Arc::clone(&self.platforms)
    }

    /// Reconciler for one resource kind, sharing this service's store
    pub fn reconciler<R: Registrable>(&self) -> Reconciler<R> {
        let repository = Arc::new(StoreRepository::<R>::new(
            Arc::clone(&self.store),
            &self.config.namespace,
        ));
        Reconciler::<R>::new(repository).with_max_conflict_retries(self.config.max_conflict_retries)
    }

    /// Controller driven by this service's store watch
    pub fn controller<R: Registrable>(&self, config: ControllerConfig) -> Controller<R> {
        let source: Arc<dyn IdentityEventSource> =
            Arc::new(StoreEventSource::new(Arc::clone(&self.store)));
        Controller::new(self.reconciler::<R>(), source, &self.config.namespace).with_config(config)
    }
}

#[async_trait]
impl MarketplaceService for StoreMarketplaceService {
    async fn register_broker(&self, broker: &Broker) -> MarketplaceResult<Registration<Broker>> {
        let registration = self.broker_registrar.register(broker).await?;
        info!(name = %broker.name, url = %broker.url, "Broker registered");
        Ok(registration)
    }

    async fn register_platform(
        &self,
        platform: &Platform,
    ) -> MarketplaceResult<Registration<Platform>> {
        let registration = self.platform_registrar.register(platform).await?;
        info!(name = %platform.name, url = %platform.url, "Platform registered");
        Ok(registration)
    }

    async fn get_brokers(&self) -> MarketplaceResult<Vec<Registration<Broker>>> {
        self.brokers.find_all().await
    }

    async fn get_platforms(&self) -> MarketplaceResult<Vec<Registration<Platform>>> {
        self.platforms.find_all().await
    }
}
