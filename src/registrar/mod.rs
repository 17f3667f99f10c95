// Copyright (c) 2025 - Cowboy AI, Inc.
//! Bounded-wait Registration
//!
//! The registrar is the client half of the registration protocol. It writes
//! the resource, then polls the store until the reconciler has marked it
//! `Registered` or the deadline passes:
//!
//! ```text
//! register ──▶ repository.register ──▶ every poll_interval: repository.get
//!                     │                      ├─ Registered ─▶ Ok
//!                     └─ error ─▶ Err        └─ deadline ───▶ RegistrationTimeout
//! ```
//!
//! The wait never mutates anything. A failed poll counts as "not registered
//! yet"; every poll is itself bounded by the deadline, so a hanging store
//! cannot stretch the total wait. The last poll is taken at the deadline
//! itself, so a registration that lands between two ticks is still seen.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{self, Instant};
use tracing::{debug, info, info_span, warn, Instrument, Span};

use crate::config::MarketplaceConfig;
use crate::domain::{Registrable, Registration, ResourceName};
use crate::errors::{MarketplaceError, MarketplaceResult};
use crate::repository::Repository;

/// Creates resources and waits for them to be registered
pub struct Registrar<R: Registrable> {
    repository: Arc<dyn Repository<R>>,
    registration_timeout: Duration,
    poll_interval: Duration,
    span: Span,
}

impl<R: Registrable> Registrar<R> {
    pub fn new(repository: Arc<dyn Repository<R>>, registration_timeout: Duration) -> Self {
        Self {
            repository,
            registration_timeout,
            poll_interval: MarketplaceConfig::DEFAULT_POLL_INTERVAL,
            span: info_span!("registrar", kind = %R::KIND),
        }
    }

    pub fn from_config(repository: Arc<dyn Repository<R>>, config: &MarketplaceConfig) -> Self {
        Self::new(repository, config.registration_timeout).with_poll_interval(config.poll_interval)
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Log under the given span instead of the default one
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn registration_timeout(&self) -> Duration {
        self.registration_timeout
    }

    /// Create `resource` and wait until it is registered
    ///
    /// # Errors
    ///
    /// - `Configuration` if the timeout or poll interval is zero; nothing is
    ///   created
    /// - whatever `Repository::register` fails with (e.g. `AlreadyExists`),
    ///   returned immediately without waiting
    /// - `RegistrationTimeout` if the resource is not `Registered` within
    ///   the registration timeout
    pub async fn register(&self, resource: &R) -> MarketplaceResult<Registration<R>> {
        self.validate()?;
        async {
            let created = self.repository.register(resource).await?;
            info!(
                name = %resource.name(),
                id = %created.id,
                timeout_ms = self.registration_timeout.as_millis() as u64,
                "Resource created, waiting for registration"
            );

            self.wait_for_registration(resource.name()).await
        }
        .instrument(self.span.clone())
        .await
    }

    fn validate(&self) -> MarketplaceResult<()> {
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

    async fn wait_for_registration(
        &self,
        name: &ResourceName,
    ) -> MarketplaceResult<Registration<R>> {
        let started = Instant::now();
        let deadline = started + self.registration_timeout;
        let mut next_poll = started + self.poll_interval;
        let mut polls: u32 = 0;

        loop {
            // The last poll always happens at the deadline itself
            time::sleep_until(next_poll.min(deadline)).await;
            polls += 1;

            match time::timeout_at(deadline, self.repository.get(name)).await {
                Ok(Ok(registration)) if registration.is_registered() => {
                    info!(
                        name = %name,
                        polls,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Resource registered"
                    );
                    return Ok(registration);
                }
                Ok(Ok(registration)) => {
                    debug!(name = %name, state = %registration.state, "Not registered yet");
                }
                Ok(Err(e)) => {
                    warn!(name = %name, error = %e, "Poll failed, treating as not registered");
                }
                Err(_) => {
                    debug!(name = %name, "Poll cut off at deadline");
                }
            }

            let now = Instant::now();
            if now >= deadline {
                warn!(name = %name, polls, "Registration timed out");
                return Err(MarketplaceError::RegistrationTimeout {
                    kind: R::KIND,
                    name: name.to_string(),
                });
            }

            next_poll += self.poll_interval;
            if next_poll <= now {
                next_poll = now + self.poll_interval;
            }
        }
    }
}
