// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests Module
//!
//! Lifecycle transitions are checked as pure functions; reconciler properties
//! run against the in-memory store.

mod reconcile_properties;
mod state_transitions;
