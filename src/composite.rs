// Copyright 2025 Cowboy AI, LLC.

//! Composite types: classification, plan construction, and instance
//! composition
//!
//! A [`Composite`] is fully built once, synchronously, before any instance
//! exists: duplicate check, conflict classification, resolution validation,
//! binding plan. Each [`Composite::construct`] call is then an independent
//! synchronous build of one instance that either completes entirely or
//! fails before any partial instance becomes observable.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::rc::Rc;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::binding::{build_plan, BindingPlan, BindingSummary, PlanOutput};
use crate::component::{Component, ComponentId, Fields};
use crate::conflict::overlapping_names;
use crate::errors::{CompositionError, CompositionResult};
use crate::instance::CompositeInstance;
use crate::resolution::{ConflictResolutionMap, ResolverBuilder};
use crate::value::ArgGroup;

/// Instance-level forwarding binding for one own member
#[derive(Debug, Clone, Copy)]
pub(crate) struct OwnBinding {
    /// Position of the owning component
    pub position: usize,
    /// Whether the underlying field descriptor was writable
    pub writable: bool,
}

/// Own-member discovery cache, owned by the composite type.
///
/// Written once per component position on the first construction and read
/// thereafter. Assumes every instance of a given component produces the
/// same own-member names; a constructor that conditionally creates
/// different fields across instances will diverge from that instance's
/// actual shape.
#[derive(Debug, Default)]
struct OwnCache {
    discovered: Vec<bool>,
    bound: IndexMap<String, OwnBinding>,
}

/// A built composite type: ordered components plus the immutable binding
/// plan, ready to construct instances
///
/// Holding the first-construction cache in a [`RefCell`] makes the type
/// `!Sync`, so cache population cannot race across threads.
pub struct Composite {
    components: Vec<Arc<Component>>,
    positions: HashMap<ComponentId, usize>,
    conflicts: BTreeSet<String>,
    plan: BindingPlan,
    direct: BTreeMap<String, ComponentId>,
    own: RefCell<OwnCache>,
}

/// Compose components with no expected conflicts.
///
/// Any overlapping member name fails with
/// [`CompositionError::UnresolvedConflict`].
pub fn compose(components: Vec<Arc<Component>>) -> CompositionResult<Composite> {
    compose_with(components, ConflictResolutionMap::new())
}

/// Compose components with a literal conflict resolution map
pub fn compose_with(
    components: Vec<Arc<Component>>,
    resolutions: ConflictResolutionMap,
) -> CompositionResult<Composite> {
    check_duplicates(&components)?;
    let conflicts = overlapping_names(&components);
    finish(components, conflicts, resolutions)
}

/// Compose components with a resolution-map factory.
///
/// The factory is invoked exactly once, synchronously, before binding,
/// with a [`ResolverBuilder`] over the classified conflicts.
pub fn compose_with_resolver(
    components: Vec<Arc<Component>>,
    factory: impl FnOnce(&mut ResolverBuilder<'_>) -> CompositionResult<()>,
) -> CompositionResult<Composite> {
    check_duplicates(&components)?;
    let conflicts = overlapping_names(&components);
    let mut builder = ResolverBuilder::new(&conflicts);
    factory(&mut builder)?;
    let resolutions = builder.into_map();
    finish(components, conflicts, resolutions)
}

fn check_duplicates(components: &[Arc<Component>]) -> CompositionResult<()> {
    for (i, component) in components.iter().enumerate() {
        if components[..i].iter().any(|c| c.id() == component.id()) {
            return Err(CompositionError::DuplicateComponent(
                component.name().to_string(),
            ));
        }
    }
    Ok(())
}

fn finish(
    components: Vec<Arc<Component>>,
    conflicts: BTreeSet<String>,
    resolutions: ConflictResolutionMap,
) -> CompositionResult<Composite> {
    let PlanOutput { plan, direct } = build_plan(&components, &conflicts, &resolutions)?;

    let positions = components
        .iter()
        .enumerate()
        .map(|(i, c)| (c.id(), i))
        .collect();

    debug!(
        components = components.len(),
        conflicts = conflicts.len(),
        "composite type built"
    );

    Ok(Composite {
        own: RefCell::new(OwnCache {
            discovered: vec![false; components.len()],
            bound: IndexMap::new(),
        }),
        components,
        positions,
        conflicts,
        plan,
        direct,
    })
}

impl Composite {
    /// Construct one composite instance from positional argument groups.
    ///
    /// A missing or `None` group means "construct with no arguments".
    pub fn construct(&self, groups: &[ArgGroup]) -> CompositionResult<CompositeInstance<'_>> {
        let mut instances = Vec::with_capacity(self.components.len());

        for (position, component) in self.components.iter().enumerate() {
            let args: &[_] = match groups.get(position) {
                Some(Some(args)) => args.as_slice(),
                _ => &[],
            };
            let fields = component.construct(args)?;
            instances.push(Rc::new(RefCell::new(fields)));
        }

        self.discover_own_members(&instances);

        Ok(CompositeInstance::new(self, instances))
    }

    /// The composed components, in list order
    pub fn components(&self) -> &[Arc<Component>] {
        &self.components
    }

    /// Number of composed components
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Whether the composite has no components
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// The classified conflicting names
    pub fn conflicts(&self) -> &BTreeSet<String> {
        &self.conflicts
    }

    /// The prototype-level binding plan
    pub fn binding_plan(&self) -> &BindingPlan {
        &self.plan
    }

    /// Structural plan summary, for diagnostics and determinism checks
    pub fn plan_summary(&self) -> Vec<(String, BindingSummary)> {
        self.plan.summary()
    }

    /// Member names the composite exposes: plan members plus own members
    /// discovered so far (own members appear once an instance has been
    /// constructed)
    pub fn member_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.plan.member_names().map(str::to_string).collect();
        for name in self.own.borrow().bound.keys() {
            if !names.iter().any(|n| n == name) {
                names.push(name.clone());
            }
        }
        names
    }

    pub(crate) fn position_of(&self, id: ComponentId) -> Option<usize> {
        self.positions.get(&id).copied()
    }

    pub(crate) fn own_binding(&self, name: &str) -> Option<OwnBinding> {
        self.own.borrow().bound.get(name).copied()
    }

    /// Bind cached own members for any component position seen for the
    /// first time. The winner rule mirrors prototype binding, restricted
    /// to own members: plan entries (including omissions) block, direct
    /// resolutions bind only at the chosen owner, and the earliest
    /// position wins.
    fn discover_own_members(&self, instances: &[Rc<RefCell<Fields>>]) {
        let mut cache = self.own.borrow_mut();

        for (position, cell) in instances.iter().enumerate() {
            if cache.discovered[position] {
                continue;
            }

            let fields = cell.borrow();
            for name in fields.names() {
                if self.plan.is_reserved(name) || cache.bound.contains_key(name) {
                    continue;
                }
                if self.conflicts.contains(name) {
                    match self.direct.get(name) {
                        Some(owner) if *owner == self.components[position].id() => {}
                        _ => continue,
                    }
                }

                let writable = fields.slot(name).map(|slot| slot.writable).unwrap_or(true);
                trace!(member = name, position, writable, "bound own member");
                cache.bound.insert(name.to_string(), OwnBinding { position, writable });
            }

            cache.discovered[position] = true;
        }
    }
}

impl std::fmt::Debug for Composite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Composite")
            .field(
                "components",
                &self.components.iter().map(|c| c.name()).collect::<Vec<_>>(),
            )
            .field("conflicts", &self.conflicts)
            .field("plan", &self.plan)
            .finish()
    }
}
