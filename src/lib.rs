// Copyright 2025 Cowboy AI, LLC.

//! # Composite
//!
//! Runtime component composition: mix several independently defined
//! component descriptors into a single composite type, with automatic
//! forwarding of non-conflicting members and explicit, per-name resolution
//! of members whose names collide.
//!
//! The building blocks:
//! - **Component**: a constructible unit with a known prototype member set
//!   and a declared own-field schema, built via [`ComponentBuilder`]
//! - **Conflict classification**: names present on two or more components
//! - **Resolution**: direct ownership, omission, or a resolver function,
//!   supplied literally or through a [`ResolverBuilder`] factory
//! - **Binding plan**: the immutable member-to-source mapping, computed and
//!   validated once per composite type
//! - **Composite instances**: per-construction composition preserving
//!   identity, mutability, and enumeration semantics of the originals
//!
//! ## Design Principles
//!
//! 1. **Declarative shape**: member schemas are registered up front; no
//!    runtime reflection over live objects
//! 2. **Fail fast**: malformed resolutions are rejected when the composite
//!    type is built, never deferred into bound members
//! 3. **Determinism**: classification and binding are order-stable and
//!    idempotent
//! 4. **Identity**: component instances keep their identity inside the
//!    composite and are reachable by position or by component
//! 5. **Synchronous lifecycle**: a composite type is fully built before any
//!    instance exists; each construction completes entirely or fails with
//!    nothing observable
//!
//! ## Example
//!
//! ```
//! use composite::{compose_with, Component, ConflictResolutionMap, Fields, Value};
//! use serde_json::json;
//!
//! let circle = Component::builder("Circle")
//!     .field("radius")
//!     .constructor(|args| {
//!         let mut fields = Fields::new();
//!         fields.insert("radius", args.first().cloned().unwrap_or(json!(0.0)));
//!         Ok(fields)
//!     })
//!     .method("area", |fields, _args| {
//!         let r = fields.get("radius").and_then(Value::as_f64).unwrap_or(0.0);
//!         Ok(json!(std::f64::consts::PI * r * r))
//!     })
//!     .build();
//!
//! let square = Component::builder("Square")
//!     .field("side")
//!     .constructor(|args| {
//!         let mut fields = Fields::new();
//!         fields.insert("side", args.first().cloned().unwrap_or(json!(0.0)));
//!         Ok(fields)
//!     })
//!     .method("area", |fields, _args| {
//!         let s = fields.get("side").and_then(Value::as_f64).unwrap_or(0.0);
//!         Ok(json!(s * s))
//!     })
//!     .build();
//!
//! // `area` conflicts; resolve it by summing both owners
//! let map = ConflictResolutionMap::new().resolver(
//!     "area",
//!     &[&circle, &square],
//!     {
//!         let (circle, square) = (circle.clone(), square.clone());
//!         move |_groups, instances| {
//!             let c = instances.get(&circle).unwrap().call("area", &[])?;
//!             let s = instances.get(&square).unwrap().call("area", &[])?;
//!             Ok(json!(c.as_f64().unwrap_or(0.0) + s.as_f64().unwrap_or(0.0)))
//!         }
//!     },
//! );
//!
//! let shape = compose_with(vec![circle, square], map).unwrap();
//! let built = shape
//!     .construct(&[Some(vec![json!(1.0)]), Some(vec![json!(2.0)])])
//!     .unwrap();
//!
//! let area = built.call("area", &[]).unwrap();
//! assert!((area.as_f64().unwrap() - (std::f64::consts::PI + 4.0)).abs() < 1e-9);
//! ```

#![warn(missing_docs)]

mod binding;
mod component;
mod composite;
mod conflict;
mod errors;
mod instance;
mod resolution;
mod value;

// Re-export core types
pub use binding::{Binding, BindingPlan, BindingSummary};
pub use component::{
    Component, ComponentBuilder, ComponentId, ConstructorFn, Fields, FieldSlot, FieldSpec,
    GetterFn, MemberImpl, MemberKind, MethodFn, SetterFn,
};
pub use composite::{compose, compose_with, compose_with_resolver, Composite};
pub use conflict::overlapping_names;
pub use errors::{CompositionError, CompositionResult};
pub use instance::{CompositeInstance, InstanceRef, Instances};
pub use resolution::{
    ConflictResolutionMap, Resolution, ResolverArg, ResolverBuilder, ResolverFn,
};
pub use value::{ArgGroup, Value};
