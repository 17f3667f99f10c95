// Copyright (c) 2025 - Cowboy AI, Inc.
//! Registration Reconciler
//!
//! A level-triggered control loop: each invocation receives only the identity
//! of a resource, re-reads it from the store and decides what to do from what
//! it finds there. Because nothing is taken from the triggering event, the
//! reconciler is safe under duplicate, late or reordered notifications.
//!
//! # Algorithm
//!
//! ```text
//! get(name) ─┬─ NotFound ───────────────▶ Deleted
//!            ├─ Registered ─────────────▶ AlreadyRegistered (no write)
//!            └─ Pending ─▶ update_state(Registered)
//!                              ├─ ok ───▶ Registered
//!                              └─ Conflict ─▶ retry from get (bounded)
//! ```
//!
//! The version-conditioned `update_state` is the only coordination between
//! concurrent invocations; there is no locking.

use std::sync::Arc;
use tracing::{debug, info, info_span, Instrument, Span};

use crate::domain::{Registrable, RegistrationState, ResourceName};
use crate::errors::MarketplaceResult;
use crate::repository::Repository;

/// Retries after a version conflict before the conflict is surfaced
pub const DEFAULT_MAX_CONFLICT_RETRIES: u32 = 3;

/// What a reconcile invocation found and did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The resource no longer exists; nothing to do
    Deleted,
    /// The resource was already registered; nothing written
    AlreadyRegistered,
    /// The resource was moved to `Registered`
    Registered {
        /// Conflicts absorbed before the write went through
        conflicts: u32,
    },
}

/// Drives resources of one kind to the `Registered` state
pub struct Reconciler<R: Registrable> {
    repository: Arc<dyn Repository<R>>,
    max_conflict_retries: u32,
    span: Span,
}

impl<R: Registrable> Reconciler<R> {
    pub fn new(repository: Arc<dyn Repository<R>>) -> Self {
        Self {
            repository,
            max_conflict_retries: DEFAULT_MAX_CONFLICT_RETRIES,
            span: info_span!("reconciler", kind = %R::KIND),
        }
    }

    pub fn with_max_conflict_retries(mut self, retries: u32) -> Self {
        self.max_conflict_retries = retries;
        self
    }

    /// Log under the given span instead of the default one
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Reconcile the resource with the given name
    ///
    /// # Errors
    ///
    /// - `Conflict` once `max_conflict_retries` retries have all conflicted
    /// - any other repository error, unchanged
    pub async fn reconcile(&self, name: &ResourceName) -> MarketplaceResult<ReconcileOutcome> {
        self.reconcile_inner(name)
            .instrument(self.span.clone())
            .await
    }

    async fn reconcile_inner(&self, name: &ResourceName) -> MarketplaceResult<ReconcileOutcome> {
        let mut conflicts = 0;

        loop {
            let registration = match self.repository.get(name).await {
                Ok(registration) => registration,
                Err(e) if e.is_not_found() => {
                    debug!(name = %name, "Resource gone, nothing to reconcile");
                    return Ok(ReconcileOutcome::Deleted);
                }
                Err(e) => return Err(e),
            };

            if registration.is_registered() {
                debug!(name = %name, "Resource already registered");
                return Ok(ReconcileOutcome::AlreadyRegistered);
            }

            match self
                .repository
                .update_state(&registration, RegistrationState::Registered)
                .await
            {
                Ok(_) => {
                    info!(name = %name, conflicts, "Resource registered");
                    return Ok(ReconcileOutcome::Registered { conflicts });
                }
                Err(e) if e.is_conflict() && conflicts < self.max_conflict_retries => {
                    conflicts += 1;
                    debug!(name = %name, attempt = conflicts, "Version conflict, re-reading");
                }
                // Deleted between the read and the write
                Err(e) if e.is_not_found() => return Ok(ReconcileOutcome::Deleted),
                Err(e) => return Err(e),
            }
        }
    }
}
