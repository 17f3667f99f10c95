// Copyright (c) 2025 - Cowboy AI, Inc.
//! Resource Store Abstraction
//!
//! The store is the single source of truth shared by registrars and
//! reconcilers. It holds generic resource objects keyed by
//! `(kind, namespace, name)` and offers Kubernetes-style semantics:
//!
//! 1. **Create-if-absent**: a second create for the same key fails
//! 2. **Optimistic concurrency**: status updates name the version they were
//!    based on and fail with `Conflict` if it moved on
//! 3. **Watch**: a live stream of change notifications per kind/namespace,
//!    delivered at least once
//!
//! ```text
//! Registrar ──create──▶ Store ──watch──▶ Controller ──▶ Reconciler
//!     ▲                   ▲                                  │
//!     └──────poll get─────┴─────────get / update_status──────┘
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::domain::{RegistrationState, ResourceKind, ResourceName};
use crate::errors::{MarketplaceError, MarketplaceResult};

pub mod memory;
#[cfg(feature = "nats")]
pub mod nats;

pub use memory::InMemoryResourceStore;

/// Opaque optimistic-concurrency token
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceVersion(u64);

impl ResourceVersion {
    pub fn new(version: u64) -> Self {
        Self(version)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ResourceVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a resource in the store
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceKey {
    pub kind: ResourceKind,
    pub namespace: String,
    pub name: ResourceName,
}

impl ResourceKey {
    pub fn new(kind: ResourceKind, namespace: impl Into<String>, name: ResourceName) -> Self {
        Self {
            kind,
            namespace: namespace.into(),
            name,
        }
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.kind, self.namespace, self.name)
    }
}

/// Check that `namespace` can be used as one segment of a store key
///
/// Namespaces are lowercase alphanumerics and `-`, starting and ending with
/// an alphanumeric. Unlike resource names they never contain `.`, which
/// separates key segments.
pub fn validate_namespace(namespace: &str) -> MarketplaceResult<()> {
    let valid_chars = namespace
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    let valid_edges = !namespace.starts_with('-') && !namespace.ends_with('-');

    if namespace.is_empty() || !valid_chars || !valid_edges {
        return Err(MarketplaceError::Configuration(format!(
            "invalid namespace '{}': expected lowercase alphanumerics and '-'",
            namespace
        )));
    }
    Ok(())
}

/// Store-assigned metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceMeta {
    pub name: ResourceName,
    pub namespace: String,
    /// Assigned on create, never changes
    pub uid: Uuid,
    /// Assigned on create, never changes
    pub created_at: DateTime<Utc>,
    pub version: ResourceVersion,
}

/// Mutable part of a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResourceStatus {
    pub state: RegistrationState,
}

impl ResourceStatus {
    pub fn new(state: RegistrationState) -> Self {
        Self { state }
    }
}

/// A resource as held by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceObject {
    pub kind: ResourceKind,
    pub meta: ResourceMeta,
    /// Creation-time fields, immutable
    pub spec: serde_json::Value,
    pub status: ResourceStatus,
}

impl ResourceObject {
    pub fn key(&self) -> ResourceKey {
        ResourceKey::new(self.kind, self.meta.namespace.clone(), self.meta.name.clone())
    }
}

/// Creation request for a resource; the store assigns metadata
#[derive(Debug, Clone, PartialEq)]
pub struct NewResource {
    pub key: ResourceKey,
    pub spec: serde_json::Value,
}

/// Kind of change reported by a watch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatchEventType {
    Created,
    Updated,
    Deleted,
}

/// Change notification; carries only the identity of the changed resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub event_type: WatchEventType,
    pub key: ResourceKey,
}

/// Live sequence of change notifications
pub type WatchStream = BoxStream<'static, MarketplaceResult<WatchEvent>>;

/// Durable, watchable resource store
///
/// Implementations must make `create` atomic with respect to the key and
/// `update_status` atomic with respect to the version check.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Create a resource in the `Pending` state
    ///
    /// # Errors
    ///
    /// - `AlreadyExists` if the key is taken; the existing resource is untouched
    async fn create(&self, resource: NewResource) -> MarketplaceResult<ResourceObject>;

    /// Read a resource
    ///
    /// # Errors
    ///
    /// - `NotFound` if absent
    async fn get(&self, key: &ResourceKey) -> MarketplaceResult<ResourceObject>;

    /// List resources of a kind within a namespace; empty when none exist
    async fn list(&self, kind: ResourceKind, namespace: &str)
        -> MarketplaceResult<Vec<ResourceObject>>;

    /// Replace the status of a resource if it is still at `expected`
    ///
    /// # Errors
    ///
    /// - `Conflict` if the stored version differs from `expected`
    /// - `NotFound` if the resource was deleted
    async fn update_status(
        &self,
        key: &ResourceKey,
        expected: ResourceVersion,
        status: ResourceStatus,
    ) -> MarketplaceResult<ResourceObject>;

    /// Administrative delete
    async fn delete(&self, key: &ResourceKey) -> MarketplaceResult<()>;

    /// Watch a kind within a namespace
    ///
    /// The stream starts with one `Created` event per resource that already
    /// exists, then reports live changes. Delivery is at least once; ordering
    /// is only guaranteed per key.
    async fn watch(&self, kind: ResourceKind, namespace: &str) -> MarketplaceResult<WatchStream>;

    fn backend_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("default" ; "default namespace")]
    #[test_case("team-a" ; "with dash")]
    #[test_case("ns1" ; "with digit")]
    fn test_valid_namespace(namespace: &str) {
        assert!(validate_namespace(namespace).is_ok());
    }

    #[test_case("" ; "empty")]
    #[test_case("a.b" ; "dotted")]
    #[test_case("Team" ; "uppercase")]
    #[test_case("-a" ; "leading dash")]
    #[test_case("a>" ; "wildcard")]
    fn test_invalid_namespace(namespace: &str) {
        let err = validate_namespace(namespace).unwrap_err();
        assert!(matches!(err, MarketplaceError::Configuration(_)));
    }
}
