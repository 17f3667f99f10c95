// Copyright (c) 2025 - Cowboy AI, Inc.
//! Service Broker

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Registrable, ResourceKind, ResourceName};

/// A service broker offering services to the marketplace
///
/// All fields are fixed at registration time.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Broker {
    pub name: ResourceName,
    pub url: String,
    pub username: String,
    pub password: String,
}

impl Broker {
    pub fn new(
        name: ResourceName,
        url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name,
            url: url.into(),
            username: username.into(),
            password: password.into(),
        }
    }
}

impl Registrable for Broker {
    const KIND: ResourceKind = ResourceKind::Broker;

    fn name(&self) -> &ResourceName {
        &self.name
    }
}

// Keep credentials out of log output
impl fmt::Debug for Broker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Broker")
            .field("name", &self.name)
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
