//! Marketplace registration for the Composable Information Machine
//!
//! Service brokers and platforms are registered into a marketplace control
//! plane backed by a watchable resource store. Registration is asynchronous:
//! a [`Registrar`] creates the resource in the `Pending` state and waits,
//! bounded by a deadline, while a [`Reconciler`] driven by a [`Controller`]
//! advances it to `Registered`.

pub mod config;
pub mod controller;
pub mod domain;
pub mod errors;
pub mod reconciler;
pub mod registrar;
pub mod repository;
pub mod service;
pub mod state_machine;
pub mod store;

// Re-export commonly used types
pub use config::MarketplaceConfig;
pub use controller::{Controller, ControllerConfig, IdentityEventSource, StoreEventSource};
pub use domain::{
    Broker, Platform, Registrable, Registration, RegistrationState, ResourceKind, ResourceName,
};
pub use errors::{MarketplaceError, MarketplaceResult};
pub use reconciler::{ReconcileOutcome, Reconciler};
pub use registrar::Registrar;
pub use repository::{Repository, StoreRepository};
pub use service::{MarketplaceService, StoreMarketplaceService};
pub use store::{InMemoryResourceStore, ResourceKey, ResourceStore};

#[cfg(feature = "nats")]
pub use store::nats::{NatsKvResourceStore, NatsStoreConfig};
