// Copyright (c) 2025 - Cowboy AI, Inc.
//! Registration Lifecycle State Machine
//!
//! # States
//!
//! - Pending: created, waiting for the reconciler (initial)
//! - Registered: accepted into the marketplace (terminal)
//!
//! # Inputs
//!
//! - MarkRegistered: Pending → Registered, Registered → Registered (no-op)
//! - MarkPending: Pending → Pending (no-op); rejected once registered
//!
//! The only transition that changes state is `Pending → Registered`.

use super::{StateMachine, TransitionError, TransitionResult};
use crate::domain::RegistrationState;

/// Lifecycle command (FSM input)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationCommand {
    MarkRegistered,
    MarkPending,
}

impl RegistrationCommand {
    /// Command that requests the given target state
    pub fn targeting(state: RegistrationState) -> Self {
        match state {
            RegistrationState::Pending => RegistrationCommand::MarkPending,
            RegistrationState::Registered => RegistrationCommand::MarkRegistered,
        }
    }
}

/// Whether a transition actually changed the state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    Changed,
    Unchanged,
}

impl StateMachine for RegistrationState {
    type Input = RegistrationCommand;
    type Output = TransitionOutcome;

    fn transition(&self, input: &Self::Input) -> TransitionResult<(Self, Self::Output)> {
        use RegistrationCommand::*;
        use RegistrationState::*;

        match (self, input) {
            (Pending, MarkRegistered) => Ok((Registered, TransitionOutcome::Changed)),
            (Pending, MarkPending) => Ok((Pending, TransitionOutcome::Unchanged)),
            (Registered, MarkRegistered) => Ok((Registered, TransitionOutcome::Unchanged)),
            (Registered, MarkPending) => Err(TransitionError::InvalidTransition {
                from: Registered.to_string(),
                to: Pending.to_string(),
            }),
        }
    }

    fn valid_inputs(&self) -> Vec<Self::Input> {
        match self {
            RegistrationState::Pending => vec![
                RegistrationCommand::MarkRegistered,
                RegistrationCommand::MarkPending,
            ],
            RegistrationState::Registered => vec![RegistrationCommand::MarkRegistered],
        }
    }
}
