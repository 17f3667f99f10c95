// Copyright (c) 2025 - Cowboy AI, Inc.
//! Repository Layer
//!
//! Translates domain objects ([`Broker`](crate::domain::Broker),
//! [`Platform`](crate::domain::Platform)) to and from the store's generic
//! resource representation.
//!
//! The repository never caches: every call is a fresh read or write against
//! the store, which is what lets the reconciler and the registrar's poll loop
//! trust what they see.

use async_trait::async_trait;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

use crate::domain::{Registrable, Registration, RegistrationState, ResourceName};
use crate::errors::{MarketplaceError, MarketplaceResult};
use crate::state_machine::{RegistrationCommand, StateMachine, TransitionOutcome};
use crate::store::{
    validate_namespace, NewResource, ResourceKey, ResourceObject, ResourceStatus, ResourceStore,
};

/// Namespace used when none is configured
pub const DEFAULT_NAMESPACE: &str = "default";

/// Repository of registrable resources of one kind
#[async_trait]
pub trait Repository<R: Registrable>: Send + Sync {
    /// All resources of this kind; empty when none exist
    async fn find_all(&self) -> MarketplaceResult<Vec<Registration<R>>>;

    /// Persist a new resource in the `Pending` state
    ///
    /// # Errors
    ///
    /// - `AlreadyExists` if the name is taken; the existing resource is untouched
    async fn register(&self, resource: &R) -> MarketplaceResult<Registration<R>>;

    /// Read a resource by name
    ///
    /// # Errors
    ///
    /// - `NotFound` if absent
    async fn get(&self, name: &ResourceName) -> MarketplaceResult<Registration<R>>;

    /// Move a resource to `state`, conditional on its version
    ///
    /// # Errors
    ///
    /// - `InvalidTransition` if the lifecycle forbids the change
    /// - `Conflict` if the resource changed since `registration` was read
    async fn update_state(
        &self,
        registration: &Registration<R>,
        state: RegistrationState,
    ) -> MarketplaceResult<Registration<R>>;
}

/// [`Repository`] backed by a [`ResourceStore`], scoped to one namespace
pub struct StoreRepository<R> {
    store: Arc<dyn ResourceStore>,
    namespace: String,
    _resource: PhantomData<fn() -> R>,
}

impl<R: Registrable> StoreRepository<R> {
    pub fn new(store: Arc<dyn ResourceStore>, namespace: impl Into<String>) -> Self {
        Self {
            store,
            namespace: namespace.into(),
            _resource: PhantomData,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn key(&self, name: &ResourceName) -> MarketplaceResult<ResourceKey> {
        validate_namespace(&self.namespace)?;
        Ok(ResourceKey::new(R::KIND, self.namespace.clone(), name.clone()))
    }

    fn to_registration(&self, object: ResourceObject) -> MarketplaceResult<Registration<R>> {
        if object.kind != R::KIND {
            return Err(MarketplaceError::Deserialization(format!(
                "expected {} but store returned {} '{}'",
                R::KIND,
                object.kind,
                object.meta.name
            )));
        }
        if object.meta.namespace != self.namespace {
            return Err(MarketplaceError::Deserialization(format!(
                "expected namespace '{}' but store returned {} '{}' from '{}'",
                self.namespace,
                object.kind,
                object.meta.name,
                object.meta.namespace
            )));
        }

        let resource: R = serde_json::from_value(object.spec)
            .map_err(|e| MarketplaceError::Deserialization(e.to_string()))?;

        Ok(Registration::new(
            object.meta.uid,
            object.meta.created_at,
            object.status.state,
            resource,
            object.meta.version,
        ))
    }
}

impl<R> Clone for StoreRepository<R> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            namespace: self.namespace.clone(),
            _resource: PhantomData,
        }
    }
}

#[async_trait]
impl<R: Registrable> Repository<R> for StoreRepository<R> {
    async fn find_all(&self) -> MarketplaceResult<Vec<Registration<R>>> {
        validate_namespace(&self.namespace)?;
        let objects = self.store.list(R::KIND, &self.namespace).await?;
        objects
            .into_iter()
            .map(|object| self.to_registration(object))
            .collect()
    }

    async fn register(&self, resource: &R) -> MarketplaceResult<Registration<R>> {
        let spec = serde_json::to_value(resource)?;
        let created = self
            .store
            .create(NewResource {
                key: self.key(resource.name())?,
                spec,
            })
            .await?;

        debug!(
            kind = %R::KIND,
            name = %resource.name(),
            namespace = %self.namespace,
            "Stored new resource"
        );
        self.to_registration(created)
    }

    async fn get(&self, name: &ResourceName) -> MarketplaceResult<Registration<R>> {
        let object = self.store.get(&self.key(name)?).await?;
        self.to_registration(object)
    }

    async fn update_state(
        &self,
        registration: &Registration<R>,
        state: RegistrationState,
    ) -> MarketplaceResult<Registration<R>> {
        let (next, outcome) = registration
            .state
            .transition(&RegistrationCommand::targeting(state))?;

        if outcome == TransitionOutcome::Unchanged {
            return Ok(registration.clone());
        }

        let updated = self
            .store
            .update_status(
                &self.key(registration.resource.name())?,
                registration.version(),
                ResourceStatus::new(next),
            )
            .await?;

        debug!(
            kind = %R::KIND,
            name = %registration.resource.name(),
            from = %registration.state,
            to = %next,
            "Updated registration state"
        );
        self.to_registration(updated)
    }
}
