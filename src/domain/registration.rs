// Copyright (c) 2025 - Cowboy AI, Inc.
//! Registration state of a stored resource

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::store::ResourceVersion;

/// Lifecycle state of a marketplace resource
///
/// `Pending` on creation, `Registered` once the reconciler has accepted it.
/// `Registered` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationState {
    #[default]
    Pending,
    Registered,
}

impl RegistrationState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RegistrationState::Registered)
    }
}

impl fmt::Display for RegistrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistrationState::Pending => f.write_str("pending"),
            RegistrationState::Registered => f.write_str("registered"),
        }
    }
}

/// A domain object as it currently exists in the store
///
/// `id` and `created_at` are assigned by the store and never change. The
/// version token is opaque to callers; it is handed back to the repository
/// to make state updates conditional on nothing having changed since the read.
#[derive(Debug, Clone, PartialEq)]
pub struct Registration<R> {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub state: RegistrationState,
    pub resource: R,
    version: ResourceVersion,
}

impl<R> Registration<R> {
    pub(crate) fn new(
        id: Uuid,
        created_at: DateTime<Utc>,
        state: RegistrationState,
        resource: R,
        version: ResourceVersion,
    ) -> Self {
        Self {
            id,
            created_at,
            state,
            resource,
            version,
        }
    }

    pub fn is_registered(&self) -> bool {
        self.state == RegistrationState::Registered
    }

    pub fn version(&self) -> ResourceVersion {
        self.version
    }
}
