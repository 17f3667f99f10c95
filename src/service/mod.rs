// Copyright (c) 2025 - Cowboy AI, Inc.
//! Service Layer for the Marketplace
//!
//! The application service that clients call. It wires registrars,
//! repositories and reconcilers onto one resource store.
//!
//! ```text
//! Client Request
//!     ↓
//! MarketplaceService (this module)
//!     ↓
//! Registrar ──▶ Repository ──▶ ResourceStore ◀── Controller ──▶ Reconciler
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use cim_marketplace::service::{MarketplaceService, StoreMarketplaceService};
//!
//! let service = StoreMarketplaceService::new(store, MarketplaceConfig::from_env()?);
//! let _controller = service.controller::<Broker>(ControllerConfig::default()).spawn();
//!
//! service.register_broker(&broker).await?;
//! for registration in service.get_brokers().await? {
//!     println!("{} {}", registration.resource.name, registration.state);
//! }
//! ```

pub mod marketplace;

pub use marketplace::{MarketplaceService, StoreMarketplaceService};
