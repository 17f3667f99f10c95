// Copyright (c) 2025 - Cowboy AI, Inc.
//! Marketplace Domain Models
//!
//! The marketplace knows two kinds of registrable resources:
//!
//! - [`Broker`] - a service broker endpoint with credentials
//! - [`Platform`] - a platform that consumes services from the marketplace
//!
//! Both are described by immutable creation-time fields (their "spec") and
//! carry a [`RegistrationState`] once they have been written to the store.
//! The [`Registrable`] trait is the seam the repository uses to move a domain
//! object in and out of the store's generic resource representation.

pub mod broker;
pub mod platform;
pub mod registration;
pub mod resource_name;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use broker::Broker;
pub use platform::Platform;
pub use registration::{Registration, RegistrationState};
pub use resource_name::{ResourceName, ResourceNameError};

/// Kind of marketplace resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Broker,
    Platform,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Broker => "broker",
            ResourceKind::Platform => "platform",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A domain object that can be registered in the marketplace
///
/// The serialized form of the object is stored as the resource spec, so it
/// must round-trip through `serde_json` unchanged.
pub trait Registrable: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Store kind for this object
    const KIND: ResourceKind;

    /// Unique name within a namespace
    fn name(&self) -> &ResourceName;
}
