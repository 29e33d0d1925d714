// Copyright 2025 Cowboy AI, LLC.

//! Determinism and algebraic properties of classification and binding

use std::collections::BTreeSet;
use std::sync::Arc;

use composite::{
    compose_with, overlapping_names, Component, ConflictResolutionMap,
};
use proptest::prelude::*;
use serde_json::json;

/// Build a component whose prototype methods are the given member names
fn component_with(name: &str, members: &BTreeSet<String>) -> Arc<Component> {
    let mut builder = Component::builder(name);
    for member in members {
        let value = member.clone();
        builder = builder.method(member.clone(), move |_fields, _args| Ok(json!(value)));
    }
    builder.build()
}

/// Member-name subsets drawn from a small pool, one per component
fn member_sets() -> impl Strategy<Value = Vec<BTreeSet<String>>> {
    proptest::collection::vec(
        proptest::collection::btree_set((0usize..6).prop_map(|i| format!("m{i}")), 0..=4),
        2..=4,
    )
}

proptest! {
    #[test]
    fn classifier_matches_the_pairwise_model(sets in member_sets()) {
        let components: Vec<Arc<Component>> = sets
            .iter()
            .enumerate()
            .map(|(i, set)| component_with(&format!("C{i}"), set))
            .collect();

        let expected: BTreeSet<String> = sets
            .iter()
            .flatten()
            .filter(|name| sets.iter().filter(|set| set.contains(*name)).count() >= 2)
            .cloned()
            .collect();

        prop_assert_eq!(overlapping_names(&components), expected);
    }

    #[test]
    fn classification_is_idempotent(sets in member_sets()) {
        let components: Vec<Arc<Component>> = sets
            .iter()
            .enumerate()
            .map(|(i, set)| component_with(&format!("C{i}"), set))
            .collect();

        prop_assert_eq!(
            overlapping_names(&components),
            overlapping_names(&components)
        );
    }

    #[test]
    fn plan_build_is_deterministic_and_first_owner_wins(sets in member_sets()) {
        let components: Vec<Arc<Component>> = sets
            .iter()
            .enumerate()
            .map(|(i, set)| component_with(&format!("C{i}"), set))
            .collect();
        let conflicts = overlapping_names(&components);

        // resolve every conflict to its first owner in list order
        let mut map = ConflictResolutionMap::new();
        for name in &conflicts {
            let owner = components
                .iter()
                .find(|c| c.has_member(name))
                .expect("a conflict always has an owner");
            map = map.direct(name.clone(), owner);
        }

        let first = compose_with(components.clone(), map.clone()).unwrap();
        let second = compose_with(components.clone(), map).unwrap();
        prop_assert_eq!(first.plan_summary(), second.plan_summary());

        // every member resolves to the earliest component carrying it
        for (name, summary) in first.plan_summary() {
            let earliest = components
                .iter()
                .position(|c| c.has_member(&name))
                .expect("bound members have an owner");
            match summary {
                composite::BindingSummary::Method { position } => {
                    prop_assert_eq!(position, earliest)
                }
                other => prop_assert!(false, "unexpected binding {:?}", other),
            }
        }

        // the exposed surface is exactly the union of member names
        let union: BTreeSet<String> = sets.iter().flatten().cloned().collect();
        let exposed: BTreeSet<String> = first.member_names().into_iter().collect();
        prop_assert_eq!(exposed, union);
    }

    #[test]
    fn construction_exposes_every_forwarded_member(sets in member_sets()) {
        let components: Vec<Arc<Component>> = sets
            .iter()
            .enumerate()
            .map(|(i, set)| component_with(&format!("C{i}"), set))
            .collect();
        let conflicts = overlapping_names(&components);

        let mut map = ConflictResolutionMap::new();
        for name in &conflicts {
            let owner = components
                .iter()
                .find(|c| c.has_member(name))
                .expect("a conflict always has an owner");
            map = map.direct(name.clone(), owner);
        }

        let composite = compose_with(components, map).unwrap();
        let built = composite.construct(&[]).unwrap();

        for name in built.member_names() {
            // each forwarded method answers with its own name
            prop_assert_eq!(built.call(&name, &[]).unwrap(), json!(name.clone()));
        }
    }
}
