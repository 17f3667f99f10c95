// Copyright (c) 2025 - Cowboy AI, Inc.
//! Watch-driven Reconcile Controller
//!
//! Feeds resource identities from an [`IdentityEventSource`] into a
//! [`Reconciler`]. Every identity gets its own task; at most
//! `max_concurrent_reconciles` run at once. A failed reconcile is logged and
//! requeued after `requeue_delay`, up to `max_requeues` times.
//!
//! The controller only ever hands the reconciler a name, never an object, so
//! duplicated or stale notifications are harmless.

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

use crate::domain::{Registrable, ResourceKind, ResourceName};
use crate::errors::{MarketplaceError, MarketplaceResult};
use crate::reconciler::{ReconcileOutcome, Reconciler};
use crate::store::{ResourceKey, ResourceStore};

/// Stream of identities to reconcile
pub type IdentityStream = BoxStream<'static, MarketplaceResult<ResourceKey>>;

/// Anything that can announce which resources need reconciling
#[async_trait]
pub trait IdentityEventSource: Send + Sync {
    async fn identities(
        &self,
        kind: ResourceKind,
        namespace: &str,
    ) -> MarketplaceResult<IdentityStream>;
}

/// Identity source backed by a store watch
#[derive(Clone)]
pub struct StoreEventSource {
    store: Arc<dyn ResourceStore>,
}

impl StoreEventSource {
    pub fn new(store: Arc<dyn ResourceStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl IdentityEventSource for StoreEventSource {
    async fn identities(
        &self,
        kind: ResourceKind,
        namespace: &str,
    ) -> MarketplaceResult<IdentityStream> {
        let watch = self.store.watch(kind, namespace).await?;
        info!(
            kind = %kind,
            namespace = %namespace,
            backend = self.store.backend_name(),
            "Watching resources"
        );

        Ok(watch
            .map(|event| {
                event.map(|event| {
                    debug!(key = %event.key, event_type = ?event.event_type, "Watch event");
                    event.key
                })
            })
            .boxed())
    }
}

/// Controller tuning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    pub max_concurrent_reconciles: usize,
    pub requeue_delay: Duration,
    pub max_requeues: u32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_reconciles: 4,
            requeue_delay: Duration::from_secs(1),
            max_requeues: 1,
        }
    }
}

/// Runs a reconciler for every identity a source announces
pub struct Controller<R: Registrable> {
    reconciler: Arc<Reconciler<R>>,
    source: Arc<dyn IdentityEventSource>,
    namespace: String,
    config: ControllerConfig,
}

impl<R: Registrable> Controller<R> {
    pub fn new(
        reconciler: Reconciler<R>,
        source: Arc<dyn IdentityEventSource>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            reconciler: Arc::new(reconciler),
            source,
            namespace: namespace.into(),
            config: ControllerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ControllerConfig) -> Self {
        self.config = config;
        self
    }

    /// Run the controller on a background task
    pub fn spawn(self) -> JoinHandle<MarketplaceResult<()>> {
        tokio::spawn(self.run())
    }

    /// Consume identities until the source ends
    ///
    /// Returns once the source is exhausted and every in-flight reconcile
    /// has finished.
    pub async fn run(self) -> MarketplaceResult<()> {
        if self.config.max_concurrent_reconciles == 0 {
            return Err(MarketplaceError::Configuration(
                "max_concurrent_reconciles must be greater than zero".to_string(),
            ));
        }

        let mut identities = self.source.identities(R::KIND, &self.namespace).await?;
        let permits = Arc::new(Semaphore::new(self.config.max_concurrent_reconciles));
        let mut tasks = JoinSet::new();

        info!(kind = %R::KIND, namespace = %self.namespace, "Controller started");

        while let Some(identity) = identities.next().await {
            let key = match identity {
                Ok(key) => key,
                Err(e) => {
                    warn!(kind = %R::KIND, error = %e, "Identity stream error");
                    continue;
                }
            };

            if key.kind != R::KIND || key.namespace != self.namespace {
                debug!(key = %key, "Ignoring identity outside this controller");
                continue;
            }

            let permit = Arc::clone(&permits)
                .acquire_owned()
                .await
                .map_err(|e| MarketplaceError::Unavailable(e.to_string()))?;
            let reconciler = Arc::clone(&self.reconciler);
            let config = self.config.clone();

            tasks.spawn(async move {
                let _permit = permit;
                reconcile_with_requeue(&reconciler, &key.name, &config).await;
            });

            while let Some(finished) = tasks.try_join_next() {
                log_join(finished);
            }
        }

        warn!(kind = %R::KIND, namespace = %self.namespace, "Identity stream ended");

        while let Some(finished) = tasks.join_next().await {
            log_join(finished);
        }
        Ok(())
    }
}

async fn reconcile_with_requeue<R: Registrable>(
    reconciler: &Reconciler<R>,
    name: &ResourceName,
    config: &ControllerConfig,
) {
    let mut requeues = 0;
    loop {
        match reconciler.reconcile(name).await {
            Ok(outcome) => {
                if let ReconcileOutcome::Registered { conflicts } = outcome {
                    debug!(name = %name, conflicts, "Reconcile wrote registration");
                }
                return;
            }
            Err(e) if requeues < config.max_requeues => {
                requeues += 1;
                warn!(
                    name = %name,
                    error = %e,
                    requeue = requeues,
                    delay_ms = config.requeue_delay.as_millis() as u64,
                    "Reconcile failed, requeueing"
                );
                tokio::time::sleep(config.requeue_delay).await;
            }
            Err(e) => {
                error!(name = %name, error = %e, "Reconcile failed");
                return;
            }
        }
    }
}

fn log_join(result: Result<(), tokio::task::JoinError>) {
    if let Err(e) = result {
        error!(error = %e, "Reconcile task panicked");
    }
}
