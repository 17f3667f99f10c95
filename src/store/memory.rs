// Copyright (c) 2025 - Cowboy AI, Inc.
//! In-memory resource store
//!
//! Holds all resources in a `HashMap` guarded by a `tokio::sync::RwLock`.
//! Not durable; meant for tests and local development.
//!
//! Versions come from a single store-wide counter, so every write produces a
//! version no other write has used. Watchers get their own unbounded channel,
//! and notifications are sent while the write lock is held so each watcher
//! sees changes to a key in the order they were applied.

use async_trait::async_trait;
use chrono::Utc;
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::debug;
use uuid::Uuid;

use super::{
    NewResource, ResourceKey, ResourceMeta, ResourceObject, ResourceStatus, ResourceStore,
    ResourceVersion, WatchEvent, WatchEventType, WatchStream,
};
use crate::domain::ResourceKind;
use crate::errors::{MarketplaceError, MarketplaceResult};

struct Watcher {
    kind: ResourceKind,
    namespace: String,
    tx: mpsc::UnboundedSender<WatchEvent>,
}

#[derive(Default)]
struct State {
    objects: HashMap<ResourceKey, ResourceObject>,
    last_version: u64,
    watchers: Vec<Watcher>,
}

impl State {
    fn next_version(&mut self) -> ResourceVersion {
        self.last_version += 1;
        ResourceVersion::new(self.last_version)
    }

    fn notify(&mut self, event_type: WatchEventType, key: &ResourceKey) {
        // Drop watchers whose stream has been dropped
        self.watchers.retain(|watcher| {
            if watcher.kind != key.kind || watcher.namespace != key.namespace {
                return !watcher.tx.is_closed();
            }
            watcher
                .tx
                .send(WatchEvent {
                    event_type,
                    key: key.clone(),
                })
                .is_ok()
        });
    }
}

/// In-memory [`ResourceStore`]
///
/// Cloning is cheap and clones share the same state.
#[derive(Clone, Default)]
pub struct InMemoryResourceStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live watch streams
    pub async fn watcher_count(&self) -> usize {
        let state = self.state.read().await;
        state.watchers.iter().filter(|w| !w.tx.is_closed()).count()
    }
}

fn not_found(key: &ResourceKey) -> MarketplaceError {
    MarketplaceError::NotFound {
        kind: key.kind,
        name: key.name.to_string(),
    }
}

#[async_trait]
impl ResourceStore for InMemoryResourceStore {
    async fn create(&self, resource: NewResource) -> MarketplaceResult<ResourceObject> {
        let mut state = self.state.write().await;
        let key = resource.key;

        if state.objects.contains_key(&key) {
            return Err(MarketplaceError::AlreadyExists {
                kind: key.kind,
                name: key.name.to_string(),
            });
        }

        let version = state.next_version();
        let object = ResourceObject {
            kind: key.kind,
            meta: ResourceMeta {
                name: key.name.clone(),
                namespace: key.namespace.clone(),
                uid: Uuid::now_v7(),
                created_at: Utc::now(),
                version,
            },
            spec: resource.spec,
            status: ResourceStatus::default(),
        };

        state.objects.insert(key.clone(), object.clone());
        state.notify(WatchEventType::Created, &key);

        debug!(key = %key, version = %version, "Created resource");
        Ok(object)
    }

    async fn get(&self, key: &ResourceKey) -> MarketplaceResult<ResourceObject> {
        let state = self.state.read().await;
        state.objects.get(key).cloned().ok_or_else(|| not_found(key))
    }

    async fn list(
        &self,
        kind: ResourceKind,
        namespace: &str,
    ) -> MarketplaceResult<Vec<ResourceObject>> {
        let state = self.state.read().await;
        let mut objects: Vec<ResourceObject> = state
            .objects
            .values()
            .filter(|o| o.kind == kind && o.meta.namespace == namespace)
            .cloned()
            .collect();
        objects.sort_by(|a, b| a.meta.name.cmp(&b.meta.name));
        Ok(objects)
    }

    async fn update_status(
        &self,
        key: &ResourceKey,
        expected: ResourceVersion,
        status: ResourceStatus,
    ) -> MarketplaceResult<ResourceObject> {
        let mut state = self.state.write().await;

        let current = state.objects.get(key).ok_or_else(|| not_found(key))?;
        if current.meta.version != expected {
            debug!(
                key = %key,
                expected = %expected,
                actual = %current.meta.version,
                "Rejected stale status update"
            );
            return Err(MarketplaceError::Conflict {
                kind: key.kind,
                name: key.name.to_string(),
            });
        }

        let version = state.next_version();
        let updated = match state.objects.get_mut(key) {
            Some(object) => {
                object.status = status;
                object.meta.version = version;
                object.clone()
            }
            None => return Err(not_found(key)),
        };
        state.notify(WatchEventType::Updated, key);

        debug!(key = %key, version = %version, state = %status.state, "Updated resource status");
        Ok(updated)
    }

    async fn delete(&self, key: &ResourceKey) -> MarketplaceResult<()> {
        let mut state = self.state.write().await;
        if state.objects.remove(key).is_none() {
            return Err(not_found(key));
        }
        state.notify(WatchEventType::Deleted, key);

        debug!(key = %key, "Deleted resource");
        Ok(())
    }

    async fn watch(&self, kind: ResourceKind, namespace: &str) -> MarketplaceResult<WatchStream> {
        let mut state = self.state.write().await;
        let (tx, rx) = mpsc::unbounded_channel();

        let mut existing: Vec<ResourceKey> = state
            .objects
            .keys()
            .filter(|k| k.kind == kind && k.namespace == namespace)
            .cloned()
            .collect();
        existing.sort_by(|a, b| a.name.cmp(&b.name));
        for key in existing {
            // Receiver is alive in this scope, send cannot fail
            let _ = tx.send(WatchEvent {
                event_type: WatchEventType::Created,
                key,
            });
        }

        state.watchers.push(Watcher {
            kind,
            namespace: namespace.to_string(),
            tx,
        });

        let stream = futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|event| (Ok(event), rx))
        });
        Ok(stream.boxed())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
