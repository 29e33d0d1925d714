// Copyright 2025 Cowboy AI, LLC.

//! Component descriptors: the constructible units a composite is built from
//!
//! A [`Component`] is a class-like unit with its own construction logic,
//! prototype-level members (methods, getters, setters), and a declared
//! own-field schema. In the absence of runtime reflection the schema is
//! supplied at registration time through [`ComponentBuilder`]; the actual
//! own members of an instance are still discovered from the first
//! constructed instance of each composite type.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{CompositionError, CompositionResult};
use crate::value::Value;

/// Opaque identity handle minted per component descriptor
///
/// Every lookup that is "keyed by the component itself" (instance lookup,
/// direct-resolution ownership) is keyed by this ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComponentId(Uuid);

impl ComponentId {
    /// Mint a new random component ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ComponentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of a prototype-level member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemberKind {
    /// Callable member
    Method,
    /// Read-only accessor
    Getter,
    /// Write-only accessor
    Setter,
    /// Accessor with both halves
    Accessor,
}

/// Constructor closure: argument group in, own fields out
pub type ConstructorFn = dyn Fn(&[Value]) -> CompositionResult<Fields>;

/// Method closure: invoked against the owning instance's fields
pub type MethodFn = dyn Fn(&mut Fields, &[Value]) -> CompositionResult<Value>;

/// Getter closure
pub type GetterFn = dyn Fn(&Fields) -> Value;

/// Setter closure
pub type SetterFn = dyn Fn(&mut Fields, Value);

/// One own-member slot: a value plus its declared mutability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSlot {
    /// Current value of the field
    pub value: Value,
    /// Whether forwarded writes are permitted
    pub writable: bool,
}

/// Ordered own-member storage for one component instance
///
/// Produced by a component's constructor and mutated through forwarded
/// setters and methods. Iteration order is insertion order, which keeps
/// own-member discovery deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields {
    slots: IndexMap<String, FieldSlot>,
}

impl Fields {
    /// Create empty field storage
    pub fn new() -> Self {
        Self {
            slots: IndexMap::new(),
        }
    }

    /// Insert or overwrite a writable field
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.slots.insert(
            name.into(),
            FieldSlot {
                value,
                writable: true,
            },
        );
    }

    /// Insert or overwrite a read-only field
    pub fn insert_readonly(&mut self, name: impl Into<String>, value: Value) {
        self.slots.insert(
            name.into(),
            FieldSlot {
                value,
                writable: false,
            },
        );
    }

    /// Read a field value
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.slots.get(name).map(|slot| &slot.value)
    }

    /// Write a field value, honoring its declared mutability
    pub fn write(&mut self, name: &str, value: Value) -> CompositionResult<()> {
        match self.slots.get_mut(name) {
            Some(slot) if slot.writable => {
                slot.value = value;
                Ok(())
            }
            Some(_) => Err(CompositionError::ReadOnly(name.to_string())),
            None => Err(CompositionError::MemberNotFound(name.to_string())),
        }
    }

    /// Overwrite a field value regardless of mutability.
    ///
    /// For use inside the owning component's own methods, which are not
    /// subject to the forwarded-write rules.
    pub fn store(&mut self, name: &str, value: Value) {
        match self.slots.get_mut(name) {
            Some(slot) => slot.value = value,
            None => self.insert(name.to_string(), value),
        }
    }

    /// Whether a field with this name exists
    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    /// Field names in insertion order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }

    /// Access the full slot for a field
    pub fn slot(&self, name: &str) -> Option<&FieldSlot> {
        self.slots.get(name)
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether there are no fields
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Declared own-field schema entry, used for conflict classification
/// before any instance exists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Field name
    pub name: String,
    /// Declared mutability
    pub writable: bool,
}

/// Implementation of one prototype-level member
#[derive(Clone)]
pub enum MemberImpl {
    /// Callable member
    Method(Arc<MethodFn>),
    /// Accessor; a setter exists iff the declaration had one
    Accessor {
        /// Read half, if declared
        get: Option<Arc<GetterFn>>,
        /// Write half, if declared
        set: Option<Arc<SetterFn>>,
    },
}

impl MemberImpl {
    /// Kind of this member
    pub fn kind(&self) -> MemberKind {
        match self {
            MemberImpl::Method(_) => MemberKind::Method,
            MemberImpl::Accessor {
                get: Some(_),
                set: None,
            } => MemberKind::Getter,
            MemberImpl::Accessor {
                get: None,
                set: Some(_),
            } => MemberKind::Setter,
            MemberImpl::Accessor { .. } => MemberKind::Accessor,
        }
    }
}

impl fmt::Debug for MemberImpl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MemberImpl::{:?}", self.kind())
    }
}

/// A constructible component descriptor
///
/// Identity is the [`ComponentId`] minted at build time; two descriptors
/// built from identical parts are still distinct components. Share via
/// [`Arc`] and pass the same handle to composition and resolution APIs.
pub struct Component {
    id: ComponentId,
    name: String,
    constructor: Arc<ConstructorFn>,
    prototype: IndexMap<String, MemberImpl>,
    fields: Vec<FieldSpec>,
}

impl Component {
    /// Start building a component descriptor
    pub fn builder(name: impl Into<String>) -> ComponentBuilder {
        ComponentBuilder::new(name)
    }

    /// Identity of this component
    pub fn id(&self) -> ComponentId {
        self.id
    }

    /// Human-readable name, used in diagnostics
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Construct one instance's own fields from an argument list
    pub fn construct(&self, args: &[Value]) -> CompositionResult<Fields> {
        (self.constructor)(args)
    }

    /// Prototype member table, in declaration order
    pub fn prototype(&self) -> &IndexMap<String, MemberImpl> {
        &self.prototype
    }

    /// Declared own-field schema
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// All member names this component contributes: prototype members plus
    /// the declared own-field schema
    pub fn member_names(&self) -> impl Iterator<Item = &str> {
        self.prototype
            .keys()
            .map(String::as_str)
            .chain(self.fields.iter().map(|spec| spec.name.as_str()))
    }

    /// Whether this component carries a member with the given name
    pub fn has_member(&self, name: &str) -> bool {
        self.prototype.contains_key(name) || self.fields.iter().any(|spec| spec.name == name)
    }

    /// Kind of the named prototype member, if any
    pub fn member_kind(&self, name: &str) -> Option<MemberKind> {
        self.prototype.get(name).map(MemberImpl::kind)
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("prototype", &self.prototype.keys().collect::<Vec<_>>())
            .field("fields", &self.fields)
            .finish()
    }
}

/// Builder for [`Component`] descriptors
///
/// ```
/// use composite::{Component, Fields, Value};
/// use serde_json::json;
///
/// let circle = Component::builder("Circle")
///     .field("radius")
///     .constructor(|args| {
///         let mut fields = Fields::new();
///         fields.insert("radius", args.first().cloned().unwrap_or(Value::Null));
///         Ok(fields)
///     })
///     .method("area", |fields, _args| {
///         let r = fields.get("radius").and_then(Value::as_f64).unwrap_or(0.0);
///         Ok(json!(std::f64::consts::PI * r * r))
///     })
///     .build();
///
/// assert!(circle.has_member("area"));
/// assert!(circle.has_member("radius"));
/// ```
pub struct ComponentBuilder {
    name: String,
    constructor: Option<Arc<ConstructorFn>>,
    prototype: IndexMap<String, MemberImpl>,
    fields: Vec<FieldSpec>,
}

impl ComponentBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constructor: None,
            prototype: IndexMap::new(),
            fields: Vec::new(),
        }
    }

    /// Set the construction logic.
    ///
    /// Without one, construction produces the declared fields initialized
    /// to `Null`.
    pub fn constructor(
        mut self,
        f: impl Fn(&[Value]) -> CompositionResult<Fields> + 'static,
    ) -> Self {
        self.constructor = Some(Arc::new(f));
        self
    }

    /// Add a prototype method
    pub fn method(
        mut self,
        name: impl Into<String>,
        f: impl Fn(&mut Fields, &[Value]) -> CompositionResult<Value> + 'static,
    ) -> Self {
        self.prototype
            .insert(name.into(), MemberImpl::Method(Arc::new(f)));
        self
    }

    /// Add a getter; merges with a previously declared setter of the same name
    pub fn getter(mut self, name: impl Into<String>, g: impl Fn(&Fields) -> Value + 'static) -> Self {
        let name = name.into();
        let set = match self.prototype.shift_remove(&name) {
            Some(MemberImpl::Accessor { set, .. }) => set,
            _ => None,
        };
        self.prototype.insert(
            name,
            MemberImpl::Accessor {
                get: Some(Arc::new(g)),
                set,
            },
        );
        self
    }

    /// Add a setter; merges with a previously declared getter of the same name
    pub fn setter(
        mut self,
        name: impl Into<String>,
        s: impl Fn(&mut Fields, Value) + 'static,
    ) -> Self {
        let name = name.into();
        let get = match self.prototype.shift_remove(&name) {
            Some(MemberImpl::Accessor { get, .. }) => get,
            _ => None,
        };
        self.prototype.insert(
            name,
            MemberImpl::Accessor {
                get,
                set: Some(Arc::new(s)),
            },
        );
        self
    }

    /// Declare a writable own field
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.fields.push(FieldSpec {
            name: name.into(),
            writable: true,
        });
        self
    }

    /// Declare a read-only own field
    pub fn readonly_field(mut self, name: impl Into<String>) -> Self {
        self.fields.push(FieldSpec {
            name: name.into(),
            writable: false,
        });
        self
    }

    /// Finish, minting the component's identity
    pub fn build(self) -> Arc<Component> {
        let constructor = self.constructor.unwrap_or_else(|| {
            let specs = self.fields.clone();
            Arc::new(move |_args: &[Value]| {
                let mut fields = Fields::new();
                for spec in &specs {
                    if spec.writable {
                        fields.insert(spec.name.clone(), Value::Null);
                    } else {
                        fields.insert_readonly(spec.name.clone(), Value::Null);
                    }
                }
                Ok(fields)
            })
        });

        Arc::new(Component {
            id: ComponentId::new(),
            name: self.name,
            constructor,
            prototype: self.prototype,
            fields: self.fields,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builder_collects_members_and_schema() {
        let component = Component::builder("Sample")
            .field("plain")
            .readonly_field("fixed")
            .method("run", |_fields, _args| Ok(json!("ran")))
            .getter("value", |fields| fields.get("plain").cloned().unwrap_or(Value::Null))
            .build();

        assert_eq!(component.name(), "Sample");
        assert!(component.has_member("plain"));
        assert!(component.has_member("fixed"));
        assert!(component.has_member("run"));
        assert_eq!(component.member_kind("run"), Some(MemberKind::Method));
        assert_eq!(component.member_kind("value"), Some(MemberKind::Getter));
        assert_eq!(component.member_kind("plain"), None);
    }

    #[test]
    fn getter_and_setter_merge_into_one_accessor() {
        let component = Component::builder("Merged")
            .getter("both", |_| json!(1))
            .setter("both", |fields, value| fields.store("shadow", value))
            .build();

        assert_eq!(component.member_kind("both"), Some(MemberKind::Accessor));
    }

    #[test]
    fn default_constructor_seeds_declared_fields() {
        let component = Component::builder("Bare").field("a").readonly_field("b").build();
        let fields = component.construct(&[]).unwrap();

        assert_eq!(fields.get("a"), Some(&Value::Null));
        assert!(!fields.slot("b").unwrap().writable);
    }

    #[test]
    fn write_honors_mutability() {
        let mut fields = Fields::new();
        fields.insert("open", json!(1));
        fields.insert_readonly("sealed", json!(2));

        fields.write("open", json!(10)).unwrap();
        assert_eq!(fields.get("open"), Some(&json!(10)));

        let err = fields.write("sealed", json!(20)).unwrap_err();
        assert!(matches!(err, CompositionError::ReadOnly(n) if n == "sealed"));

        let err = fields.write("absent", json!(0)).unwrap_err();
        assert!(matches!(err, CompositionError::MemberNotFound(n) if n == "absent"));
    }

    #[test]
    fn identity_is_minted_per_descriptor() {
        let a = Component::builder("Same").build();
        let b = Component::builder("Same").build();
        assert_ne!(a.id(), b.id());
    }
}
