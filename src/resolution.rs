// Copyright 2025 Cowboy AI, LLC.

//! Conflict resolutions and the resolver-builder sugar
//!
//! Every conflicting member name needs exactly one [`Resolution`]: take a
//! specific component's implementation, omit the member, or synthesize it
//! with a caller-supplied resolver function. Resolutions arrive either as a
//! literal [`ConflictResolutionMap`] or through a factory closure handed a
//! [`ResolverBuilder`].

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::component::Component;
use crate::errors::{CompositionError, CompositionResult};
use crate::instance::Instances;
use crate::value::{ArgGroup, Value};

/// Resolver closure: forwarded argument groups plus identity-based instance
/// lookup in, the synthesized member's return value out
pub type ResolverFn = dyn Fn(&[ArgGroup], &Instances<'_>) -> CompositionResult<Value>;

/// Strategy for one conflicting member name
#[derive(Clone)]
pub enum Resolution {
    /// Delegate entirely to this component's implementation
    Direct(Arc<Component>),
    /// The member is absent from the composite
    Omit,
    /// Synthesize a method from a resolver function
    Resolver {
        /// Owners whose implementations are forwarded as argument groups,
        /// in declaration order; may be empty
        owners: Vec<Arc<Component>>,
        /// The resolver function
        resolve: Arc<ResolverFn>,
    },
}

impl fmt::Debug for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Direct(component) => {
                f.debug_tuple("Direct").field(&component.name()).finish()
            }
            Resolution::Omit => write!(f, "Omit"),
            Resolution::Resolver { owners, .. } => f
                .debug_struct("Resolver")
                .field("owners", &owners.iter().map(|c| c.name()).collect::<Vec<_>>())
                .finish_non_exhaustive(),
        }
    }
}

/// Ordered mapping from conflicting member names to resolutions
///
/// ```
/// use composite::{Component, ConflictResolutionMap};
///
/// let a = Component::builder("A").field("value").build();
/// let b = Component::builder("B").field("value").build();
///
/// let map = ConflictResolutionMap::new().direct("value", &a);
/// assert_eq!(map.len(), 1);
/// # let _ = b;
/// ```
#[derive(Clone, Debug, Default)]
pub struct ConflictResolutionMap {
    entries: IndexMap<String, Resolution>,
}

impl ConflictResolutionMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Resolve a name to a specific component's implementation
    pub fn direct(mut self, name: impl Into<String>, component: &Arc<Component>) -> Self {
        self.entries
            .insert(name.into(), Resolution::Direct(component.clone()));
        self
    }

    /// Omit a name from the composite
    pub fn omit(mut self, name: impl Into<String>) -> Self {
        self.entries.insert(name.into(), Resolution::Omit);
        self
    }

    /// Resolve a name with a custom resolver over the given owners
    pub fn resolver(
        mut self,
        name: impl Into<String>,
        owners: &[&Arc<Component>],
        resolve: impl Fn(&[ArgGroup], &Instances<'_>) -> CompositionResult<Value> + 'static,
    ) -> Self {
        self.entries.insert(
            name.into(),
            Resolution::Resolver {
                owners: owners.iter().map(|c| Arc::clone(c)).collect(),
                resolve: Arc::new(resolve),
            },
        );
        self
    }

    /// Insert a resolution, returning any previous one for the name
    pub fn insert(&mut self, name: impl Into<String>, resolution: Resolution) -> Option<Resolution> {
        self.entries.insert(name.into(), resolution)
    }

    /// Look up the resolution for a name
    pub fn get(&self, name: &str) -> Option<&Resolution> {
        self.entries.get(name)
    }

    /// Whether a resolution exists for a name
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Iterate entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Resolution)> {
        self.entries.iter().map(|(name, r)| (name.as_str(), r))
    }

    /// Number of resolutions
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One argument to a polymorphic resolver-builder entry
#[derive(Clone)]
pub enum ResolverArg {
    /// `null`: alone it means "omit"; leading before a resolver function it
    /// means "no owners"
    Null,
    /// A component, either the direct owner or one resolver owner
    Component(Arc<Component>),
    /// The resolver function; must come last
    Resolve(Arc<ResolverFn>),
}

impl ResolverArg {
    /// An owner or direct-choice component argument
    pub fn component(component: &Arc<Component>) -> Self {
        ResolverArg::Component(Arc::clone(component))
    }

    /// A resolver-function argument
    pub fn resolve(
        f: impl Fn(&[ArgGroup], &Instances<'_>) -> CompositionResult<Value> + 'static,
    ) -> Self {
        ResolverArg::Resolve(Arc::new(f))
    }
}

impl fmt::Debug for ResolverArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolverArg::Null => write!(f, "Null"),
            ResolverArg::Component(c) => write!(f, "Component({})", c.name()),
            ResolverArg::Resolve(_) => write!(f, "Resolve(..)"),
        }
    }
}

/// Sugar handed to a resolution-map factory closure
///
/// One polymorphic entry per conflicting name, mirroring the resolution
/// shapes: a single [`ResolverArg::Null`] omits the member, a single
/// component takes that implementation, components followed by a resolver
/// function synthesize a method (a leading `Null` stands for zero owners).
///
/// ```
/// use composite::{compose_with_resolver, Component, ResolverArg};
/// use serde_json::json;
///
/// let a = Component::builder("A")
///     .method("hello", |_f, _a| Ok(json!("a")))
///     .build();
/// let b = Component::builder("B")
///     .method("hello", |_f, _a| Ok(json!("b")))
///     .build();
///
/// let composite = compose_with_resolver(vec![a.clone(), b], |resolve| {
///     resolve.resolve("hello", vec![ResolverArg::component(&a)])
/// }).unwrap();
///
/// let built = composite.construct(&[]).unwrap();
/// assert_eq!(built.call("hello", &[]).unwrap(), json!("a"));
/// ```
pub struct ResolverBuilder<'a> {
    conflicts: &'a BTreeSet<String>,
    entries: IndexMap<String, Resolution>,
}

impl<'a> ResolverBuilder<'a> {
    pub(crate) fn new(conflicts: &'a BTreeSet<String>) -> Self {
        Self {
            conflicts,
            entries: IndexMap::new(),
        }
    }

    /// The conflicting names awaiting resolution, in stable order
    pub fn conflicts(&self) -> impl Iterator<Item = &str> {
        self.conflicts.iter().map(String::as_str)
    }

    /// Record the resolution for one conflicting name.
    ///
    /// Fails on an empty argument list, a name that is not a conflict, a
    /// second resolution for the same name, or a malformed argument
    /// sequence.
    pub fn resolve(&mut self, name: &str, args: Vec<ResolverArg>) -> CompositionResult<()> {
        if args.is_empty() {
            return Err(CompositionError::NoArguments);
        }
        if !self.conflicts.contains(name) {
            return Err(CompositionError::UnknownConflict(name.to_string()));
        }
        if self.entries.contains_key(name) {
            return Err(CompositionError::DuplicateResolution(name.to_string()));
        }

        let resolution = resolution_from_args(name, args)?;
        self.entries.insert(name.to_string(), resolution);
        Ok(())
    }

    pub(crate) fn into_map(self) -> ConflictResolutionMap {
        ConflictResolutionMap {
            entries: self.entries,
        }
    }
}

fn resolution_from_args(name: &str, mut args: Vec<ResolverArg>) -> CompositionResult<Resolution> {
    if args.len() == 1 {
        return Ok(match args.remove(0) {
            ResolverArg::Null => Resolution::Omit,
            ResolverArg::Component(component) => Resolution::Direct(component),
            ResolverArg::Resolve(resolve) => Resolution::Resolver {
                owners: Vec::new(),
                resolve,
            },
        });
    }

    let resolve = match args.pop() {
        Some(ResolverArg::Resolve(resolve)) => resolve,
        _ => {
            return Err(CompositionError::InvalidResolverArgs {
                name: name.to_string(),
                reason: "last argument must be a resolver function".to_string(),
            })
        }
    };

    // [null, fn] declares a resolver with zero owners
    if args.len() == 1 && matches!(args[0], ResolverArg::Null) {
        return Ok(Resolution::Resolver {
            owners: Vec::new(),
            resolve,
        });
    }

    let mut owners = Vec::with_capacity(args.len());
    for arg in args {
        match arg {
            ResolverArg::Component(component) => owners.push(component),
            ResolverArg::Null => {
                return Err(CompositionError::InvalidResolverArgs {
                    name: name.to_string(),
                    reason: "owners must be components".to_string(),
                })
            }
            ResolverArg::Resolve(_) => {
                return Err(CompositionError::InvalidResolverArgs {
                    name: name.to_string(),
                    reason: "only the last argument may be a resolver function".to_string(),
                })
            }
        }
    }

    Ok(Resolution::Resolver { owners, resolve })
}
