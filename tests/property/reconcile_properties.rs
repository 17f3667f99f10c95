// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for the Reconciler
//!
//! However many times, and in whatever interleaving, a set of resources is
//! reconciled, each ends up Registered after exactly one status write.

use proptest::prelude::*;
use std::sync::Arc;

use cim_marketplace::{Broker, ReconcileOutcome, Reconciler, Repository};

use crate::fixtures::*;

fn reconcile_schedule() -> impl Strategy<Value = (usize, Vec<usize>)> {
    (1usize..6).prop_flat_map(|resources| {
        (
            Just(resources),
            prop::collection::vec(0..resources, 1..30),
        )
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: Sequential reconciles converge with one write per resource
    ///
    /// `schedule` lists which resource each reconcile call targets.
    #[test]
    fn prop_reconcile_converges_with_single_write((resources, schedule) in reconcile_schedule()) {
        tokio_test::block_on(async {
            let store = Arc::new(CountingStore::new());
            let brokers = repository::<Broker>(store.clone());
            let names: Vec<_> = (0..resources).map(|i| format!("broker-{}", i)).collect();
            for raw in &names {
                brokers.register(&broker(raw)).await.unwrap();
            }

            let reconciler = Reconciler::<Broker>::new(brokers.clone());
            let mut first_seen = vec![false; resources];
            for index in &schedule {
                let outcome = reconciler.reconcile(&name(&names[*index])).await.unwrap();
                if first_seen[*index] {
                    assert_eq!(outcome, ReconcileOutcome::AlreadyRegistered);
                } else {
                    assert_eq!(outcome, ReconcileOutcome::Registered { conflicts: 0 });
                    first_seen[*index] = true;
                }
            }

            let touched = first_seen.iter().filter(|seen| **seen).count();
            assert_eq!(store.status_writes() as usize, touched);

            for registration in brokers.find_all().await.unwrap() {
                let index = names
                    .iter()
                    .position(|raw| raw == registration.resource.name.as_str())
                    .unwrap();
                assert_eq!(registration.is_registered(), first_seen[index]);
            }
        });
    }
}
