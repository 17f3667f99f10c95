// Copyright (c) 2025 - Cowboy AI, Inc.
//! NATS JetStream key-value resource store
//!
//! Resources live in a single KV bucket under the key
//! `<kind>.<namespace>.<name>`. The KV revision of a key is used as the
//! resource version, so `update_status` maps directly onto the bucket's
//! compare-and-set `update` and create-if-absent onto `create`.

use async_nats::jetstream::{
    self,
    kv::{self, Operation},
};
use async_nats::ConnectOptions;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use super::{
    NewResource, ResourceKey, ResourceMeta, ResourceObject, ResourceStatus, ResourceStore,
    ResourceVersion, WatchEvent, WatchEventType, WatchStream, validate_namespace,
};
use crate::domain::{ResourceKind, ResourceName};
use crate::errors::{MarketplaceError, MarketplaceResult};

/// Configuration for the NATS-backed store
#[derive(Debug, Clone)]
pub struct NatsStoreConfig {
    /// NATS server URLs
    pub servers: Vec<String>,
    /// Client name
    pub name: String,
    /// KV bucket holding marketplace resources
    pub bucket: String,
    /// Revisions kept per key
    pub history: i64,
    /// Connection timeout
    pub connect_timeout: Duration,
}

impl Default for NatsStoreConfig {
    fn default() -> Self {
        Self {
            servers: vec!["nats://localhost:4222".to_string()],
            name: "cim-marketplace".to_string(),
            bucket: "MARKETPLACE_RESOURCES".to_string(),
            history: 1,
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl NatsStoreConfig {
    /// Load configuration from `NATS_URL` (comma separated) and `MARKETPLACE_BUCKET`
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let servers = std::env::var("NATS_URL")
            .map(|urls| urls.split(',').map(|s| s.trim().to_string()).collect())
            .unwrap_or(defaults.servers);
        let bucket = std::env::var("MARKETPLACE_BUCKET").unwrap_or(defaults.bucket);

        Self {
            servers,
            bucket,
            ..Self::default()
        }
    }
}

/// Stored value; the version is the KV revision and is not serialized
#[derive(Debug, Serialize, Deserialize)]
struct StoredResource {
    kind: ResourceKind,
    name: ResourceName,
    namespace: String,
    uid: Uuid,
    created_at: DateTime<Utc>,
    spec: serde_json::Value,
    status: ResourceStatus,
}

impl StoredResource {
    fn into_object(self, revision: u64) -> ResourceObject {
        ResourceObject {
            kind: self.kind,
            meta: ResourceMeta {
                name: self.name,
                namespace: self.namespace,
                uid: self.uid,
                created_at: self.created_at,
                version: ResourceVersion::new(revision),
            },
            spec: self.spec,
            status: self.status,
        }
    }

    fn from_object(object: &ResourceObject) -> Self {
        Self {
            kind: object.kind,
            name: object.meta.name.clone(),
            namespace: object.meta.namespace.clone(),
            uid: object.meta.uid,
            created_at: object.meta.created_at,
            spec: object.spec.clone(),
            status: object.status,
        }
    }
}

/// Key prefix shared by every resource of a kind in a namespace
fn kv_prefix(kind: ResourceKind, namespace: &str) -> MarketplaceResult<String> {
    validate_namespace(namespace)?;
    Ok(format!("{}.{}.", kind, namespace))
}

fn kv_key(key: &ResourceKey) -> MarketplaceResult<String> {
    Ok(format!("{}{}", kv_prefix(key.kind, &key.namespace)?, key.name))
}

fn parse_kv_key(kind: ResourceKind, namespace: &str, raw: &str) -> MarketplaceResult<ResourceKey> {
    let prefix = kv_prefix(kind, namespace)?;
    let name = raw.strip_prefix(&prefix).ok_or_else(|| {
        MarketplaceError::Deserialization(format!("unexpected key '{}' in watch", raw))
    })?;
    Ok(ResourceKey::new(kind, namespace, ResourceName::new(name)?))
}

fn unavailable(err: impl std::fmt::Display) -> MarketplaceError {
    MarketplaceError::Unavailable(err.to_string())
}

fn decode(entry: &kv::Entry) -> MarketplaceResult<ResourceObject> {
    let stored: StoredResource = serde_json::from_slice(&entry.value)
        .map_err(|e| MarketplaceError::Deserialization(e.to_string()))?;
    Ok(stored.into_object(entry.revision))
}

/// [`ResourceStore`] backed by a JetStream KV bucket
#[derive(Clone)]
pub struct NatsKvResourceStore {
    kv: kv::Store,
}

impl NatsKvResourceStore {
    /// Connect to NATS and open (or create) the resource bucket
    pub async fn connect(config: &NatsStoreConfig) -> MarketplaceResult<Self> {
        if config.servers.is_empty() {
            return Err(MarketplaceError::Configuration(
                "at least one NATS server is required".to_string(),
            ));
        }

        let connect_options = ConnectOptions::new()
            .name(&config.name)
            .connection_timeout(config.connect_timeout);

        let client = async_nats::connect_with_options(config.servers.join(","), connect_options)
            .await
            .map_err(unavailable)?;

        info!("Connected to NATS at {:?}", config.servers);

        let jetstream = jetstream::new(client);
        let kv = match jetstream.get_key_value(&config.bucket).await {
            Ok(kv) => kv,
            Err(_) => {
                info!(bucket = %config.bucket, "Creating marketplace KV bucket");
                jetstream
                    .create_key_value(kv::Config {
                        bucket: config.bucket.clone(),
                        history: config.history,
                        ..Default::default()
                    })
                    .await
                    .map_err(unavailable)?
            }
        };

        Ok(Self { kv })
    }

    /// Latest live entry for a key; deleted keys read as absent
    async fn live_entry(&self, key: &str) -> MarketplaceResult<Option<kv::Entry>> {
        let entry = self.kv.entry(key).await.map_err(unavailable)?;
        Ok(entry.filter(|e| matches!(e.operation, Operation::Put)))
    }
}

#[async_trait]
impl ResourceStore for NatsKvResourceStore {
    async fn create(&self, resource: NewResource) -> MarketplaceResult<ResourceObject> {
        let key = kv_key(&resource.key)?;
        let stored = StoredResource {
            kind: resource.key.kind,
            name: resource.key.name.clone(),
            namespace: resource.key.namespace.clone(),
            uid: Uuid::now_v7(),
            created_at: Utc::now(),
            spec: resource.spec,
            status: ResourceStatus::default(),
        };
        let payload = serde_json::to_vec(&stored)?;

        match self.kv.create(&key, payload.into()).await {
            Ok(revision) => {
                debug!(key = %key, revision, "Created resource");
                Ok(stored.into_object(revision))
            }
            Err(err) => {
                // Tell a taken key apart from a transport failure
                if self.live_entry(&key).await?.is_some() {
                    Err(MarketplaceError::AlreadyExists {
                        kind: resource.key.kind,
                        name: resource.key.name.to_string(),
                    })
                } else {
                    Err(unavailable(err))
                }
            }
        }
    }

    async fn get(&self, key: &ResourceKey) -> MarketplaceResult<ResourceObject> {
        match self.live_entry(&kv_key(key)?).await? {
            Some(entry) => decode(&entry),
            None => Err(MarketplaceError::NotFound {
                kind: key.kind,
                name: key.name.to_string(),
            }),
        }
    }

    async fn list(
        &self,
        kind: ResourceKind,
        namespace: &str,
    ) -> MarketplaceResult<Vec<ResourceObject>> {
        let prefix = kv_prefix(kind, namespace)?;
        let mut keys = self.kv.keys().await.map_err(unavailable)?;
        let mut objects = Vec::new();

        while let Some(key) = keys.next().await {
            let key = key.map_err(unavailable)?;
            if !key.starts_with(&prefix) {
                continue;
            }
            // Deleted between listing and reading
            if let Some(entry) = self.live_entry(&key).await? {
                objects.push(decode(&entry)?);
            }
        }

        objects.sort_by(|a, b| a.meta.name.cmp(&b.meta.name));
        Ok(objects)
    }

    async fn update_status(
        &self,
        key: &ResourceKey,
        expected: ResourceVersion,
        status: ResourceStatus,
    ) -> MarketplaceResult<ResourceObject> {
        let raw_key = kv_key(key)?;
        let mut object = self.get(key).await?;
        if object.meta.version != expected {
            return Err(MarketplaceError::Conflict {
                kind: key.kind,
                name: key.name.to_string(),
            });
        }

        object.status = status;
        let payload = serde_json::to_vec(&StoredResource::from_object(&object))?;

        match self.kv.update(&raw_key, payload.into(), expected.get()).await {
            Ok(revision) => {
                object.meta.version = ResourceVersion::new(revision);
                debug!(key = %raw_key, revision, state = %status.state, "Updated resource status");
                Ok(object)
            }
            Err(err) => match self.live_entry(&raw_key).await? {
                None => Err(MarketplaceError::NotFound {
                    kind: key.kind,
                    name: key.name.to_string(),
                }),
                Some(entry) if entry.revision != expected.get() => {
                    Err(MarketplaceError::Conflict {
                        kind: key.kind,
                        name: key.name.to_string(),
                    })
                }
                Some(_) => Err(unavailable(err)),
            },
        }
    }

    async fn delete(&self, key: &ResourceKey) -> MarketplaceResult<()> {
        let raw_key = kv_key(key)?;
        if self.live_entry(&raw_key).await?.is_none() {
            return Err(MarketplaceError::NotFound {
                kind: key.kind,
                name: key.name.to_string(),
            });
        }
        self.kv.delete(&raw_key).await.map_err(unavailable)?;
        debug!(key = %raw_key, "Deleted resource");
        Ok(())
    }

    async fn watch(&self, kind: ResourceKind, namespace: &str) -> MarketplaceResult<WatchStream> {
        let filter = format!("{}>", kv_prefix(kind, namespace)?);
        let watch = self
            .kv
            .watch_with_history(filter)
            .await
            .map_err(unavailable)?;

        let namespace = namespace.to_string();
        let events = watch.map(move |entry| -> MarketplaceResult<WatchEvent> {
            let entry = entry.map_err(unavailable)?;
            // A put does not say whether it created the key, report all as updates
            let event_type = match entry.operation {
                Operation::Put => WatchEventType::Updated,
                _ => WatchEventType::Deleted,
            };
            Ok(WatchEvent {
                event_type,
                key: parse_kv_key(kind, &namespace, &entry.key)?,
            })
        });

        Ok(events.boxed())
    }

    fn backend_name(&self) -> &'static str {
        "nats-kv"
    }
}
