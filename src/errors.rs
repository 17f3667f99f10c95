//! Error types for marketplace operations

use thiserror::Error;

use crate::domain::{ResourceKind, ResourceNameError};
use crate::state_machine::TransitionError;

/// Errors that can occur while registering or reconciling marketplace resources
#[derive(Debug, Error)]
pub enum MarketplaceError {
    /// A resource with the same name already exists in the namespace
    #[error("{kind} '{name}' already exists")]
    AlreadyExists { kind: ResourceKind, name: String },

    /// The resource does not exist (or was deleted)
    #[error("{kind} '{name}' not found")]
    NotFound { kind: ResourceKind, name: String },

    /// The stored version moved on since the resource was read
    #[error("{kind} '{name}' was modified concurrently")]
    Conflict { kind: ResourceKind, name: String },

    /// The registrar gave up before observing the `Registered` state
    #[error("timed out waiting for {kind} '{name}' to be registered")]
    RegistrationTimeout { kind: ResourceKind, name: String },

    /// Requested state change is not allowed by the registration lifecycle
    #[error("Invalid state transition: {0}")]
    InvalidTransition(#[from] TransitionError),

    /// Resource name failed validation
    #[error("Invalid resource name: {0}")]
    InvalidName(#[from] ResourceNameError),

    /// Store transport failure
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Deserialization error
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl MarketplaceError {
    pub fn is_already_exists(&self) -> bool {
        matches!(self, MarketplaceError::AlreadyExists { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, MarketplaceError::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, MarketplaceError::Conflict { .. })
    }

    pub fn is_registration_timeout(&self) -> bool {
        matches!(self, MarketplaceError::RegistrationTimeout { .. })
    }
}

/// Result type for marketplace operations
pub type MarketplaceResult<T> = Result<T, MarketplaceError>;

impl From<serde_json::Error> for MarketplaceError {
    fn from(err: serde_json::Error) -> Self {
        MarketplaceError::Serialization(err.to_string())
    }
}

#[cfg(feature = "nats")]
impl From<async_nats::Error> for MarketplaceError {
    fn from(err: async_nats::Error) -> Self {
        MarketplaceError::Unavailable(err.to_string())
    }
}
