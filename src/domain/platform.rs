// Copyright (c) 2025 - Cowboy AI, Inc.
//! Platform

use serde::{Deserialize, Serialize};

use super::{Registrable, ResourceKind, ResourceName};

/// A platform that provisions services from the marketplace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
    pub name: ResourceName,
    pub url: String,
}

impl Platform {
    pub fn new(name: ResourceName, url: impl Into<String>) -> Self {
        Self {
            name,
            url: url.into(),
        }
    }
}

impl Registrable for Platform {
    const KIND: ResourceKind = ResourceKind::Platform;

    fn name(&self) -> &ResourceName {
        &self.name
    }
}
