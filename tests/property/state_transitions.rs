// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for the Registration Lifecycle
//!
//! Random command sequences are folded through the state machine. Rejected
//! commands leave the state as it was, mirroring what the repository does.

use cim_marketplace::state_machine::{RegistrationCommand, StateMachine, TransitionOutcome};
use cim_marketplace::RegistrationState;
use proptest::prelude::*;

// ============================================================================
// Property Test Strategies
// ============================================================================

fn command() -> impl Strategy<Value = RegistrationCommand> {
    prop_oneof![
        Just(RegistrationCommand::MarkRegistered),
        Just(RegistrationCommand::MarkPending),
    ]
}

fn command_sequence() -> impl Strategy<Value = Vec<RegistrationCommand>> {
    prop::collection::vec(command(), 0..50)
}

/// Apply commands in order, skipping rejected ones; returns every state visited
fn fold_commands(commands: &[RegistrationCommand]) -> Vec<RegistrationState> {
    let mut state = RegistrationState::default();
    let mut visited = vec![state];
    for command in commands {
        if let Ok((next, _)) = state.transition(command) {
            state = next;
        }
        visited.push(state);
    }
    visited
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Property: Registered never reverts
    ///
    /// Once any prefix of a command sequence reaches Registered, every later
    /// state is Registered too.
    #[test]
    fn prop_registered_is_absorbing(commands in command_sequence()) {
        let visited = fold_commands(&commands);
        if let Some(first) = visited.iter().position(|s| *s == RegistrationState::Registered) {
            prop_assert!(
                visited[first..].iter().all(|s| *s == RegistrationState::Registered),
                "Registered must never revert"
            );
        }
    }

    /// Property: The final state is Registered iff MarkRegistered was ever applied
    #[test]
    fn prop_registered_iff_marked(commands in command_sequence()) {
        let final_state = *fold_commands(&commands).last().unwrap();
        let marked = commands.contains(&RegistrationCommand::MarkRegistered);

        prop_assert_eq!(final_state == RegistrationState::Registered, marked);
    }

    /// Property: At most one transition in any sequence changes the state
    #[test]
    fn prop_at_most_one_change(commands in command_sequence()) {
        let mut state = RegistrationState::default();
        let mut changes = 0;
        for command in &commands {
            if let Ok((next, outcome)) = state.transition(command) {
                if outcome == TransitionOutcome::Changed {
                    changes += 1;
                }
                state = next;
            }
        }

        prop_assert!(changes <= 1, "Saw {} state changes", changes);
    }

    /// Property: valid_inputs agrees with can_transition
    #[test]
    fn prop_valid_inputs_match_can_transition(commands in command_sequence(), next in command()) {
        let state = *fold_commands(&commands).last().unwrap();

        prop_assert_eq!(
            state.valid_inputs().contains(&next),
            state.can_transition(&next)
        );
    }

    /// Property: Re-applying the current target state is always an accepted no-op
    #[test]
    fn prop_targeting_current_state_is_noop(commands in command_sequence()) {
        let state = *fold_commands(&commands).last().unwrap();
        let (next, outcome) = state
            .transition(&RegistrationCommand::targeting(state))
            .unwrap();

        prop_assert_eq!(next, state);
        prop_assert_eq!(outcome, TransitionOutcome::Unchanged);
    }
}
