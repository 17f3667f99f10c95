// Copyright (c) 2025 - Cowboy AI, Inc.
//! Resource Name Value Object

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Resource name validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResourceNameError {
    #[error("Resource name is empty")]
    Empty,

    #[error("Resource name exceeds maximum length of 253 characters: {0}")]
    TooLong(usize),

    #[error("Invalid character in resource name: {0:?}")]
    InvalidCharacter(char),

    #[error("Resource name must start and end with an alphanumeric character: {0}")]
    InvalidBoundary(String),
}

/// Name of a broker or platform, unique within a namespace
///
/// Names follow DNS subdomain rules so they can be used verbatim as store
/// keys:
/// - 1 to 253 characters
/// - lowercase ASCII letters, digits, `-` and `.`
/// - first and last character alphanumeric
///
/// # Examples
///
/// ```rust
/// use cim_marketplace::domain::ResourceName;
///
/// assert!(ResourceName::new("broker-1").is_ok());
/// assert!(ResourceName::new("mysql.brokers").is_ok());
///
/// assert!(ResourceName::new("").is_err());
/// assert!(ResourceName::new("Broker").is_err());
/// assert!(ResourceName::new("-broker").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceName(String);

impl ResourceName {
    pub const MAX_LENGTH: usize = 253;

    pub fn new(name: impl Into<String>) -> Result<Self, ResourceNameError> {
        let name = name.into();

        if name.is_empty() {
            return Err(ResourceNameError::Empty);
        }

        if name.len() > Self::MAX_LENGTH {
            return Err(ResourceNameError::TooLong(name.len()));
        }

        if let Some(ch) = name
            .chars()
            .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-' || *c == '.'))
        {
            return Err(ResourceNameError::InvalidCharacter(ch));
        }

        let alphanumeric = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit();
        let first_ok = name.chars().next().is_some_and(alphanumeric);
        let last_ok = name.chars().last().is_some_and(alphanumeric);
        if !first_ok || !last_ok {
            return Err(ResourceNameError::InvalidBoundary(name));
        }

        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ResourceName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ResourceName {
    type Error = ResourceNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for ResourceName {
    type Error = ResourceNameError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ResourceName> for String {
    fn from(name: ResourceName) -> Self {
        name.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("broker-1" ; "hyphenated")]
    #[test_case("b" ; "single character")]
    #[test_case("overview.brokers.example" ; "dotted")]
    #[test_case("9lives" ; "leading digit")]
    fn test_valid_names(name: &str) {
        let parsed = ResourceName::new(name).expect("name should be valid");
        assert_eq!(parsed.as_str(), name);
    }

    #[test_case("", ResourceNameError::Empty ; "empty")]
    #[test_case("Broker", ResourceNameError::InvalidCharacter('B') ; "uppercase")]
    #[test_case("broker_1", ResourceNameError::InvalidCharacter('_') ; "underscore")]
    #[test_case("broker 1", ResourceNameError::InvalidCharacter(' ') ; "space")]
    #[test_case("-broker", ResourceNameError::InvalidBoundary("-broker".to_string()) ; "leading hyphen")]
    #[test_case("broker.", ResourceNameError::InvalidBoundary("broker.".to_string()) ; "trailing dot")]
    fn test_invalid_names(name: &str, expected: ResourceNameError) {
        assert_eq!(ResourceName::new(name), Err(expected));
    }

    #[test]
    fn test_too_long() {
        let name = "a".repeat(ResourceName::MAX_LENGTH + 1);
        assert_eq!(
            ResourceName::new(name),
            Err(ResourceNameError::TooLong(ResourceName::MAX_LENGTH + 1))
        );
    }

    #[test]
    fn test_deserialize_rejects_invalid_name() {
        let result: Result<ResourceName, _> = serde_json::from_str("\"Not Valid\"");
        assert!(result.is_err());

        let name: ResourceName = serde_json::from_str("\"broker-1\"").unwrap();
        assert_eq!(name.as_str(), "broker-1");
    }
}
