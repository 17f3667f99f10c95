// Copyright (c) 2025 - Cowboy AI, Inc.
//! Test Fixtures for cim-marketplace
//!
//! Resource builders and wrapping test doubles shared by the integration
//! suites. Doubles wrap the real [`StoreRepository`] / [`InMemoryResourceStore`]
//! and only interfere where a test needs them to.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cim_marketplace::domain::Registration;
use cim_marketplace::store::{
    NewResource, ResourceObject, ResourceStatus, ResourceVersion, WatchStream,
};
use cim_marketplace::{
    Broker, InMemoryResourceStore, MarketplaceError, MarketplaceResult, Platform, Registrable,
    RegistrationState, Repository, ResourceKey, ResourceKind, ResourceName, ResourceStore,
    StoreRepository,
};

pub const NAMESPACE: &str = "default";

/// Registration timeout used by the bounded-wait suites
pub const SHORT_TIMEOUT: Duration = Duration::from_secs(1);

pub fn name(raw: &str) -> ResourceName {
    ResourceName::new(raw).expect("Invalid resource name in test fixture")
}

/// Broker whose fields are all derived from its name
pub fn broker(raw: &str) -> Broker {
    Broker::new(
        name(raw),
        format!("https://{}.brokers.example.com", raw),
        format!("{}-username", raw),
        format!("{}-password", raw),
    )
}

pub fn platform(raw: &str) -> Platform {
    Platform::new(name(raw), format!("https://api.{}.example.com", raw))
}

pub fn memory_store() -> Arc<dyn ResourceStore> {
    Arc::new(InMemoryResourceStore::new())
}

pub fn repository<R: Registrable>(store: Arc<dyn ResourceStore>) -> Arc<StoreRepository<R>> {
    Arc::new(StoreRepository::new(store, NAMESPACE))
}

/// Repeatedly reconcile `name` until it is registered, like a controller would
///
/// Runs until `rounds` attempts have been made; the caller usually spawns it.
pub async fn simulate_registration<R: Registrable>(
    repository: Arc<StoreRepository<R>>,
    name: ResourceName,
    rounds: u32,
) {
    for _ in 0..rounds {
        if let Ok(registration) = repository.get(&name).await {
            if registration.is_registered() {
                return;
            }
            let _ = repository
                .update_state(&registration, RegistrationState::Registered)
                .await;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

// ============================================================================
// Store doubles
// ============================================================================

/// Store that counts status writes
pub struct CountingStore {
    inner: InMemoryResourceStore,
    status_writes: AtomicU32,
}

impl CountingStore {
    pub fn new() -> Self {
        Self {
            inner: InMemoryResourceStore::new(),
            status_writes: AtomicU32::new(0),
        }
    }

    pub fn status_writes(&self) -> u32 {
        self.status_writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResourceStore for CountingStore {
    async fn create(&self, resource: NewResource) -> MarketplaceResult<ResourceObject> {
        self.inner.create(resource).await
    }

    async fn get(&self, key: &ResourceKey) -> MarketplaceResult<ResourceObject> {
        self.inner.get(key).await
    }

    async fn list(
        &self,
        kind: ResourceKind,
        namespace: &str,
    ) -> MarketplaceResult<Vec<ResourceObject>> {
        self.inner.list(kind, namespace).await
    }

    async fn update_status(
        &self,
        key: &ResourceKey,
        expected: ResourceVersion,
        status: ResourceStatus,
    ) -> MarketplaceResult<ResourceObject> {
        self.status_writes.fetch_add(1, Ordering::SeqCst);
        self.inner.update_status(key, expected, status).await
    }

    async fn delete(&self, key: &ResourceKey) -> MarketplaceResult<()> {
        self.inner.delete(key).await
    }

    async fn watch(&self, kind: ResourceKind, namespace: &str) -> MarketplaceResult<WatchStream> {
        self.inner.watch(kind, namespace).await
    }

    fn backend_name(&self) -> &'static str {
        "counting"
    }
}

// ============================================================================
// Repository doubles
// ============================================================================

/// Repository that lets a concurrent writer win the first `races` updates
///
/// Before delegating `update_state`, it bumps the stored version with a
/// no-op status write, so the delegated update is stale and conflicts.
pub struct RacingRepository<R: Registrable> {
    inner: Arc<StoreRepository<R>>,
    store: Arc<dyn ResourceStore>,
    races: u32,
    updates: AtomicU32,
}

impl<R: Registrable> RacingRepository<R> {
    pub fn new(store: Arc<dyn ResourceStore>, races: u32) -> Self {
        Self {
            inner: repository(Arc::clone(&store)),
            store,
            races,
            updates: AtomicU32::new(0),
        }
    }

    pub fn inner(&self) -> Arc<StoreRepository<R>> {
        Arc::clone(&self.inner)
    }

    /// `update_state` calls seen so far
    pub fn updates(&self) -> u32 {
        self.updates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<R: Registrable> Repository<R> for RacingRepository<R> {
    async fn find_all(&self) -> MarketplaceResult<Vec<Registration<R>>> {
        self.inner.find_all().await
    }

    async fn register(&self, resource: &R) -> MarketplaceResult<Registration<R>> {
        self.inner.register(resource).await
    }

    async fn get(&self, name: &ResourceName) -> MarketplaceResult<Registration<R>> {
        self.inner.get(name).await
    }

    async fn update_state(
        &self,
        registration: &Registration<R>,
        state: RegistrationState,
    ) -> MarketplaceResult<Registration<R>> {
        let seen = self.updates.fetch_add(1, Ordering::SeqCst);
        if seen < self.races {
            let key = ResourceKey::new(R::KIND, NAMESPACE, registration.resource.name().clone());
            self.store
                .update_status(
                    &key,
                    registration.version(),
                    ResourceStatus::new(registration.state),
                )
                .await?;
        }
        self.inner.update_state(registration, state).await
    }
}

/// Repository whose first `failures` reads fail as unavailable
pub struct FlakyRepository<R: Registrable> {
    inner: Arc<StoreRepository<R>>,
    failures: u32,
    gets: AtomicU32,
}

impl<R: Registrable> FlakyRepository<R> {
    pub fn new(inner: Arc<StoreRepository<R>>, failures: u32) -> Self {
        Self {
            inner,
            failures,
            gets: AtomicU32::new(0),
        }
    }

    pub fn gets(&self) -> u32 {
        self.gets.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<R: Registrable> Repository<R> for FlakyRepository<R> {
    async fn find_all(&self) -> MarketplaceResult<Vec<Registration<R>>> {
        self.inner.find_all().await
    }

    async fn register(&self, resource: &R) -> MarketplaceResult<Registration<R>> {
        self.inner.register(resource).await
    }

    async fn get(&self, name: &ResourceName) -> MarketplaceResult<Registration<R>> {
        let seen = self.gets.fetch_add(1, Ordering::SeqCst);
        if seen < self.failures {
            return Err(MarketplaceError::Unavailable("store unreachable".to_string()));
        }
        self.inner.get(name).await
    }

    async fn update_state(
        &self,
        registration: &Registration<R>,
        state: RegistrationState,
    ) -> MarketplaceResult<Registration<R>> {
        self.inner.update_state(registration, state).await
    }
}

/// Repository whose reads never complete
pub struct HangingRepository<R: Registrable> {
    inner: Arc<StoreRepository<R>>,
}

impl<R: Registrable> HangingRepository<R> {
    pub fn new(inner: Arc<StoreRepository<R>>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<R: Registrable> Repository<R> for HangingRepository<R> {
    async fn find_all(&self) -> MarketplaceResult<Vec<Registration<R>>> {
        self.inner.find_all().await
    }

    async fn register(&self, resource: &R) -> MarketplaceResult<Registration<R>> {
        self.inner.register(resource).await
    }

    async fn get(&self, _name: &ResourceName) -> MarketplaceResult<Registration<R>> {
        futures::future::pending().await
    }

    async fn update_state(
        &self,
        registration: &Registration<R>,
        state: RegistrationState,
    ) -> MarketplaceResult<Registration<R>> {
        self.inner.update_state(registration, state).await
    }
}
