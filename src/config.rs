//! Marketplace configuration

use std::time::Duration;

use crate::errors::{MarketplaceError, MarketplaceResult};
use crate::reconciler::DEFAULT_MAX_CONFLICT_RETRIES;
use crate::repository::DEFAULT_NAMESPACE;
use crate::store::validate_namespace;

/// Settings shared by registrars and reconcilers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketplaceConfig {
    /// Namespace all resources are created in
    pub namespace: String,
    /// How long a registrar waits for a resource to become registered
    pub registration_timeout: Duration,
    /// Delay between registrar polls
    pub poll_interval: Duration,
    /// Conflicts a reconciler absorbs before giving up
    pub max_conflict_retries: u32,
}

impl MarketplaceConfig {
    pub const DEFAULT_REGISTRATION_TIMEOUT: Duration = Duration::from_secs(60);
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

    /// Load configuration from environment variables, falling back to defaults
    ///
    /// - `MARKETPLACE_NAMESPACE`
    /// - `MARKETPLACE_REGISTRATION_TIMEOUT_MS`
    /// - `MARKETPLACE_POLL_INTERVAL_MS`
    /// - `MARKETPLACE_MAX_CONFLICT_RETRIES`
    pub fn from_env() -> MarketplaceResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> MarketplaceResult<Self> {
        let defaults = Self::default();

        let config = Self {
            namespace: lookup("MARKETPLACE_NAMESPACE").unwrap_or(defaults.namespace),
            registration_timeout: parse_millis(
                &lookup,
                "MARKETPLACE_REGISTRATION_TIMEOUT_MS",
                defaults.registration_timeout,
            )?,
            poll_interval: parse_millis(
                &lookup,
                "MARKETPLACE_POLL_INTERVAL_MS",
                defaults.poll_interval,
            )?,
            max_conflict_retries: match lookup("MARKETPLACE_MAX_CONFLICT_RETRIES") {
                Some(raw) => raw.trim().parse().map_err(|_| {
                    MarketplaceError::Configuration(format!(
                        "MARKETPLACE_MAX_CONFLICT_RETRIES must be a non-negative integer, got '{}'",
                        raw
                    ))
                })?,
                None => defaults.max_conflict_retries,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the registration protocol cannot work with
    pub fn validate(&self) -> MarketplaceResult<()> {
        validate_namespace(&self.namespace)?;
        if self.registration_timeout.is_zero() {
            return Err(MarketplaceError::Configuration(
                "registration timeout must be greater than zero".to_string(),
            ));
        }
        if self.poll_interval.is_zero() {
            return Err(MarketplaceError::Configuration(
                "poll interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for MarketplaceConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            registration_timeout: Self::DEFAULT_REGISTRATION_TIMEOUT,
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
            max_conflict_retries: DEFAULT_MAX_CONFLICT_RETRIES,
        }
    }
}

fn parse_millis(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: Duration,
) -> MarketplaceResult<Duration> {
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|_| {
                MarketplaceError::Configuration(format!(
                    "{} must be a number of milliseconds, got '{}'",
                    name, raw
                ))
            }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = MarketplaceConfig::default();
        assert_eq!(config.namespace, "default");
        assert_eq!(config.registration_timeout, Duration::from_secs(60));
        assert_eq!(config.poll_interval, Duration::from_millis(500));
        assert_eq!(config.max_conflict_retries, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = MarketplaceConfig::from_lookup(lookup(&[
            ("MARKETPLACE_NAMESPACE", "staging"),
            ("MARKETPLACE_REGISTRATION_TIMEOUT_MS", "1000"),
            ("MARKETPLACE_POLL_INTERVAL_MS", "100"),
            ("MARKETPLACE_MAX_CONFLICT_RETRIES", "5"),
        ]))
        .unwrap();

        assert_eq!(config.namespace, "staging");
        assert_eq!(config.registration_timeout, Duration::from_secs(1));
        assert_eq!(config.poll_interval, Duration::from_millis(100));
        assert_eq!(config.max_conflict_retries, 5);
    }

    #[test]
    fn test_from_lookup_rejects_garbage() {
        let err = MarketplaceConfig::from_lookup(lookup(&[(
            "MARKETPLACE_POLL_INTERVAL_MS",
            "soon",
        )]))
        .unwrap_err();
        assert!(matches!(err, MarketplaceError::Configuration(_)));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config = MarketplaceConfig {
            registration_timeout: Duration::ZERO,
            ..MarketplaceConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_dotted_namespace() {
        let config = MarketplaceConfig {
            namespace: "a.b".to_string(),
            ..MarketplaceConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
