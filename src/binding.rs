// Copyright 2025 Cowboy AI, LLC.

//! Binding plans: the immutable member-to-source mapping of a composite
//!
//! Built exactly once per composite type, before any instance exists. The
//! plan decides one source (or omission) for every prototype-level member
//! name, validates the resolution map, and records resolver syntheses.
//! Own members join at first construction through the instance composer;
//! the plan itself never changes afterwards.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::component::{Component, ComponentId, GetterFn, MemberImpl, MethodFn, SetterFn};
use crate::errors::{CompositionError, CompositionResult};
use crate::resolution::{ConflictResolutionMap, Resolution, ResolverFn};

/// Resolved source for one composite member
#[derive(Clone)]
pub enum Binding {
    /// Forward invocation to the owning component's method
    Method {
        /// Position of the owner in the component list
        position: usize,
        /// The owner's implementation
        method: Arc<MethodFn>,
    },
    /// Forward reads/writes to the owning component's accessor; the write
    /// half exists iff the original declaration had a setter
    Accessor {
        /// Position of the owner in the component list
        position: usize,
        /// Read half
        get: Option<Arc<GetterFn>>,
        /// Write half
        set: Option<Arc<SetterFn>>,
    },
    /// Synthesized method from a resolver resolution
    Resolver {
        /// Declared owner count; calls pad their groups up to this
        arity: usize,
        /// The resolver function
        resolve: Arc<ResolverFn>,
    },
    /// Name resolved to omission: absent from the member surface, and
    /// blocked from later binding
    Omitted,
}

impl Binding {
    /// Structural summary for logging and determinism checks
    pub fn summary(&self) -> BindingSummary {
        match self {
            Binding::Method { position, .. } => BindingSummary::Method {
                position: *position,
            },
            Binding::Accessor { position, get, set } => BindingSummary::Accessor {
                position: *position,
                readable: get.is_some(),
                writable: set.is_some(),
            },
            Binding::Resolver { arity, .. } => BindingSummary::Resolver { arity: *arity },
            Binding::Omitted => BindingSummary::Omitted,
        }
    }
}

/// Serializable structural view of a [`Binding`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BindingSummary {
    /// Forwarded method
    Method {
        /// Owner position
        position: usize,
    },
    /// Forwarded accessor
    Accessor {
        /// Owner position
        position: usize,
        /// Whether a getter is defined
        readable: bool,
        /// Whether a setter is defined
        writable: bool,
    },
    /// Synthesized resolver method
    Resolver {
        /// Declared owner count
        arity: usize,
    },
    /// Omitted name
    Omitted,
}

/// Immutable mapping from member names to their resolved sources
#[derive(Clone, Default)]
pub struct BindingPlan {
    entries: IndexMap<String, Binding>,
}

impl BindingPlan {
    /// Look up the binding for a name
    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.entries.get(name)
    }

    /// Whether the name is claimed by the plan, including omissions
    pub fn is_reserved(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Member names the composite exposes, excluding omissions, in
    /// binding order
    pub fn member_names(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|(_, binding)| !matches!(binding, Binding::Omitted))
            .map(|(name, _)| name.as_str())
    }

    /// Structural summary of the whole plan, in binding order
    pub fn summary(&self) -> Vec<(String, BindingSummary)> {
        self.entries
            .iter()
            .map(|(name, binding)| (name.clone(), binding.summary()))
            .collect()
    }

    /// Number of entries, including omissions
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the plan is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for BindingPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(name, b)| (name, b.summary())))
            .finish()
    }
}

#[derive(Debug)]
pub(crate) struct PlanOutput {
    pub plan: BindingPlan,
    /// Direct-choice table for the own-member winner rule
    pub direct: BTreeMap<String, ComponentId>,
}

/// Validate the resolution map and build the prototype-level binding plan.
///
/// Scan order is component list order, then each prototype's declaration
/// order; the first successful binder for a name wins and the name is never
/// rebound.
pub(crate) fn build_plan(
    components: &[Arc<Component>],
    conflicts: &BTreeSet<String>,
    resolutions: &ConflictResolutionMap,
) -> CompositionResult<PlanOutput> {
    validate(components, conflicts, resolutions)?;

    let mut entries: IndexMap<String, Binding> = IndexMap::new();
    let mut direct: BTreeMap<String, ComponentId> = BTreeMap::new();
    let mut resolver_names: BTreeSet<&str> = BTreeSet::new();

    for (name, resolution) in resolutions.iter() {
        match resolution {
            Resolution::Omit => {
                entries.insert(name.to_string(), Binding::Omitted);
            }
            Resolution::Direct(component) => {
                direct.insert(name.to_string(), component.id());
            }
            Resolution::Resolver { .. } => {
                // reserved now, synthesized after the prototype scan
                resolver_names.insert(name);
            }
        }
    }

    for (position, component) in components.iter().enumerate() {
        for (name, member) in component.prototype() {
            if entries.contains_key(name) || resolver_names.contains(name.as_str()) {
                continue;
            }
            if conflicts.contains(name) {
                match direct.get(name) {
                    Some(owner) if *owner == component.id() => {}
                    _ => continue,
                }
            }

            let binding = match member {
                MemberImpl::Method(method) => Binding::Method {
                    position,
                    method: Arc::clone(method),
                },
                MemberImpl::Accessor { get, set } => Binding::Accessor {
                    position,
                    get: get.clone(),
                    set: set.clone(),
                },
            };
            trace!(member = %name, component = %component.name(), position, "bound prototype member");
            entries.insert(name.clone(), binding);
        }
    }

    for (name, resolution) in resolutions.iter() {
        if let Resolution::Resolver { owners, resolve } = resolution {
            entries.insert(
                name.to_string(),
                Binding::Resolver {
                    arity: owners.len(),
                    resolve: Arc::clone(resolve),
                },
            );
        }
    }

    debug!(
        components = components.len(),
        conflicts = conflicts.len(),
        bindings = entries.len(),
        "binding plan built"
    );

    Ok(PlanOutput {
        plan: BindingPlan { entries },
        direct,
    })
}

fn validate(
    components: &[Arc<Component>],
    conflicts: &BTreeSet<String>,
    resolutions: &ConflictResolutionMap,
) -> CompositionResult<()> {
    let position_of = |id: ComponentId| components.iter().position(|c| c.id() == id);

    let check_owner = |owner: &Arc<Component>, name: &str| -> CompositionResult<()> {
        if position_of(owner.id()).is_none() {
            return Err(CompositionError::ForeignComponent {
                component: owner.name().to_string(),
                name: name.to_string(),
            });
        }
        if !owner.has_member(name) {
            return Err(CompositionError::MissingOwnerMember {
                component: owner.name().to_string(),
                name: name.to_string(),
            });
        }
        Ok(())
    };

    for (name, resolution) in resolutions.iter() {
        if !conflicts.contains(name) {
            return Err(CompositionError::UnknownConflict(name.to_string()));
        }
        match resolution {
            Resolution::Omit => {}
            Resolution::Direct(component) => check_owner(component, name)?,
            Resolution::Resolver { owners, .. } => {
                for owner in owners {
                    check_owner(owner, name)?;
                }
            }
        }
    }

    for name in conflicts {
        if !resolutions.contains(name) {
            return Err(CompositionError::UnresolvedConflict(name.clone()));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conflict::overlapping_names;
    use serde_json::json;

    fn value_method(name: &str, value: &'static str) -> Arc<Component> {
        Component::builder(name)
            .method("shared", move |_f, _a| Ok(json!(value)))
            .build()
    }

    fn plan_for(
        components: &[Arc<Component>],
        resolutions: &ConflictResolutionMap,
    ) -> CompositionResult<PlanOutput> {
        let conflicts = overlapping_names(components);
        build_plan(components, &conflicts, resolutions)
    }

    #[test]
    fn non_conflicting_members_bind_to_their_sole_owner() {
        let a = Component::builder("A")
            .method("alpha", |_f, _a| Ok(json!("a")))
            .build();
        let b = Component::builder("B")
            .method("beta", |_f, _a| Ok(json!("b")))
            .build();

        let output = plan_for(&[a, b], &ConflictResolutionMap::new()).unwrap();
        assert_eq!(
            output.plan.summary(),
            vec![
                ("alpha".to_string(), BindingSummary::Method { position: 0 }),
                ("beta".to_string(), BindingSummary::Method { position: 1 }),
            ]
        );
    }

    #[test]
    fn direct_resolution_binds_only_at_the_chosen_owner() {
        let a = value_method("A", "a");
        let b = value_method("B", "b");
        let map = ConflictResolutionMap::new().direct("shared", &b);

        let output = plan_for(&[a, b], &map).unwrap();
        assert_eq!(
            output.plan.summary(),
            vec![("shared".to_string(), BindingSummary::Method { position: 1 })]
        );
    }

    #[test]
    fn omit_reserves_the_name_without_exposing_it() {
        let a = value_method("A", "a");
        let b = value_method("B", "b");
        let map = ConflictResolutionMap::new().omit("shared");

        let output = plan_for(&[a, b], &map).unwrap();
        assert!(output.plan.is_reserved("shared"));
        assert_eq!(output.plan.member_names().count(), 0);
    }

    #[test]
    fn resolver_resolution_records_arity() {
        let a = value_method("A", "a");
        let b = value_method("B", "b");
        let map = ConflictResolutionMap::new().resolver(
            "shared",
            &[&a, &b],
            |_groups, _instances| Ok(json!("resolved")),
        );

        let output = plan_for(&[a, b], &map).unwrap();
        assert_eq!(
            output.plan.get("shared").map(Binding::summary),
            Some(BindingSummary::Resolver { arity: 2 })
        );
    }

    #[test]
    fn unresolved_conflict_fails_fast() {
        let a = value_method("A", "a");
        let b = value_method("B", "b");
        let err = plan_for(&[a, b], &ConflictResolutionMap::new()).unwrap_err();
        assert!(matches!(err, CompositionError::UnresolvedConflict(n) if n == "shared"));
    }

    #[test]
    fn resolution_for_non_conflicting_name_fails_fast() {
        let a = Component::builder("A")
            .method("alpha", |_f, _a| Ok(json!("a")))
            .build();
        let map = ConflictResolutionMap::new().omit("alpha");
        let err = plan_for(&[a], &map).unwrap_err();
        assert!(matches!(err, CompositionError::UnknownConflict(n) if n == "alpha"));
    }

    #[test]
    fn foreign_direct_owner_fails_fast() {
        let a = value_method("A", "a");
        let b = value_method("B", "b");
        let outsider = value_method("Outsider", "x");
        let map = ConflictResolutionMap::new().direct("shared", &outsider);

        let err = plan_for(&[a, b], &map).unwrap_err();
        assert!(matches!(
            err,
            CompositionError::ForeignComponent { component, name }
                if component == "Outsider" && name == "shared"
        ));
    }

    #[test]
    fn resolver_owner_without_the_member_fails_fast() {
        let a = value_method("A", "a");
        let b = value_method("B", "b");
        let c = Component::builder("C")
            .method("unrelated", |_f, _a| Ok(json!(null)))
            .build();
        // C is in the list, so "shared" stays a two-owner conflict, but C
        // cannot be a resolver owner for it
        let map = ConflictResolutionMap::new().resolver(
            "shared",
            &[&a, &c],
            |_groups, _instances| Ok(json!(null)),
        );

        let err = plan_for(&[a, b, c], &map).unwrap_err();
        assert!(matches!(
            err,
            CompositionError::MissingOwnerMember { component, name }
                if component == "C" && name == "shared"
        ));
    }

    #[test]
    fn plan_build_is_deterministic() {
        let a = value_method("A", "a");
        let b = value_method("B", "b");
        let map = ConflictResolutionMap::new().direct("shared", &a);

        let first = plan_for(&[a.clone(), b.clone()], &map).unwrap();
        let second = plan_for(&[a, b], &map).unwrap();
        assert_eq!(first.plan.summary(), second.plan.summary());
        assert_eq!(first.direct, second.direct);
    }
}
