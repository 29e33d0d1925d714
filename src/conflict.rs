// Copyright 2025 Cowboy AI, LLC.

//! Conflict classification across an ordered component list

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::component::Component;

/// Names that appear on two or more distinct components.
///
/// A component contributes the union of its prototype member names and its
/// declared own-field names, deduplicated within the component. Names on
/// exactly one component are never conflicts and always auto-bind to their
/// sole owner. The result is order-stable and idempotent.
pub fn overlapping_names(components: &[Arc<Component>]) -> BTreeSet<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();

    for component in components {
        let names: BTreeSet<&str> = component.member_names().collect();
        for name in names {
            *counts.entry(name).or_insert(0) += 1;
        }
    }

    counts
        .into_iter()
        .filter(|(_, owners)| *owners >= 2)
        .map(|(name, _)| name.to_string())
        .collect()
}
