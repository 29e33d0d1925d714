// Copyright 2025 Cowboy AI, LLC.

//! Composite instances and component-instance handles
//!
//! A [`CompositeInstance`] holds one constructed instance per component,
//! indexed by position and by component identity, and dispatches member
//! access through its composite's binding plan. [`InstanceRef`] is the
//! handle to a single component instance inside it, used both for numeric
//! index access and for resolver-side identity lookup.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use crate::binding::Binding;
use crate::component::{Component, Fields, MemberImpl};
use crate::composite::Composite;
use crate::errors::{CompositionError, CompositionResult};
use crate::value::{group_from_value, ArgGroup, Value};

/// One constructed composite instance
///
/// The set of bound members is fixed at construction; mutation of
/// underlying field values flows through forwarded setters, but the
/// binding plan never changes post-construction.
pub struct CompositeInstance<'a> {
    composite: &'a Composite,
    instances: Vec<Rc<RefCell<Fields>>>,
}

impl<'a> CompositeInstance<'a> {
    pub(crate) fn new(composite: &'a Composite, instances: Vec<Rc<RefCell<Fields>>>) -> Self {
        Self {
            composite,
            instances,
        }
    }

    /// Numeric index access: the exact instance of the component at this
    /// position, identity and type preserved
    pub fn at(&self, index: usize) -> Option<InstanceRef> {
        let component = self.composite.components().get(index)?;
        Some(InstanceRef {
            component: Arc::clone(component),
            fields: Rc::clone(&self.instances[index]),
        })
    }

    /// Identity lookup: the stored instance for this exact component, or
    /// `None` if it is not part of the composite
    pub fn instance(&self, component: &Arc<Component>) -> Option<InstanceRef> {
        self.composite
            .position_of(component.id())
            .and_then(|position| self.at(position))
    }

    /// Number of component instances
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Whether the composite holds no component instances
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Member names this instance exposes, omissions excluded
    pub fn member_names(&self) -> Vec<String> {
        self.composite.member_names()
    }

    /// Whether a member with this name is exposed
    pub fn has_member(&self, name: &str) -> bool {
        match self.composite.binding_plan().get(name) {
            Some(Binding::Omitted) => false,
            Some(_) => true,
            None => self.composite.own_binding(name).is_some(),
        }
    }

    /// Invoke a composite method.
    ///
    /// Forwarded methods receive `args` as-is against the owning instance.
    /// Resolver members interpret each argument as a group (`null` or an
    /// array), pad up to the declared owner count, and pass extra groups
    /// through unchanged.
    pub fn call(&self, name: &str, args: &[Value]) -> CompositionResult<Value> {
        match self.composite.binding_plan().get(name) {
            Some(Binding::Method { position, method }) => {
                let mut fields = self.instances[*position].borrow_mut();
                method(&mut fields, args)
            }
            Some(Binding::Resolver { arity, resolve }) => {
                let mut groups: Vec<ArgGroup> = Vec::with_capacity(args.len().max(*arity));
                for value in args {
                    groups.push(group_from_value(name, value)?);
                }
                while groups.len() < *arity {
                    groups.push(None);
                }
                let lookup = Instances {
                    components: self.composite.components(),
                    instances: &self.instances,
                };
                resolve(&groups, &lookup)
            }
            Some(Binding::Accessor { .. }) => Err(CompositionError::NotCallable(name.to_string())),
            Some(Binding::Omitted) => Err(CompositionError::MemberNotFound(name.to_string())),
            None => match self.composite.own_binding(name) {
                Some(_) => Err(CompositionError::NotCallable(name.to_string())),
                None => Err(CompositionError::MemberNotFound(name.to_string())),
            },
        }
    }

    /// Read a composite member value
    pub fn get(&self, name: &str) -> CompositionResult<Value> {
        match self.composite.binding_plan().get(name) {
            Some(Binding::Accessor { position, get, .. }) => match get {
                Some(getter) => {
                    let fields = self.instances[*position].borrow();
                    Ok(getter(&fields))
                }
                // setter-only accessors read as null
                None => Ok(Value::Null),
            },
            Some(Binding::Method { .. }) | Some(Binding::Resolver { .. }) => {
                Err(CompositionError::NotReadable(name.to_string()))
            }
            Some(Binding::Omitted) => Err(CompositionError::MemberNotFound(name.to_string())),
            None => match self.composite.own_binding(name) {
                Some(own) => {
                    let fields = self.instances[own.position].borrow();
                    Ok(fields.get(name).cloned().unwrap_or(Value::Null))
                }
                None => Err(CompositionError::MemberNotFound(name.to_string())),
            },
        }
    }

    /// Write a composite member value.
    ///
    /// Fails with [`CompositionError::ReadOnly`] when the resolved owner
    /// declared the member without a setter or the field non-writable.
    pub fn set(&self, name: &str, value: Value) -> CompositionResult<()> {
        match self.composite.binding_plan().get(name) {
            Some(Binding::Accessor { position, set, .. }) => match set {
                Some(setter) => {
                    let mut fields = self.instances[*position].borrow_mut();
                    setter(&mut fields, value);
                    Ok(())
                }
                None => Err(CompositionError::ReadOnly(name.to_string())),
            },
            Some(Binding::Method { .. }) | Some(Binding::Resolver { .. }) => {
                Err(CompositionError::ReadOnly(name.to_string()))
            }
            Some(Binding::Omitted) => Err(CompositionError::MemberNotFound(name.to_string())),
            None => match self.composite.own_binding(name) {
                Some(own) if own.writable => {
                    let mut fields = self.instances[own.position].borrow_mut();
                    fields.write(name, value)
                }
                Some(_) => Err(CompositionError::ReadOnly(name.to_string())),
                None => Err(CompositionError::MemberNotFound(name.to_string())),
            },
        }
    }
}

impl std::fmt::Debug for CompositeInstance<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeInstance")
            .field("components", &self.len())
            .field("members", &self.member_names())
            .finish()
    }
}

/// Identity-based instance lookup handed to resolver functions
pub struct Instances<'a> {
    components: &'a [Arc<Component>],
    instances: &'a [Rc<RefCell<Fields>>],
}

impl Instances<'_> {
    /// The stored instance for this exact component identity
    pub fn get(&self, component: &Arc<Component>) -> Option<InstanceRef> {
        self.components
            .iter()
            .position(|c| c.id() == component.id())
            .map(|position| InstanceRef {
                component: Arc::clone(&self.components[position]),
                fields: Rc::clone(&self.instances[position]),
            })
    }
}

/// Handle to one component instance inside a composite
///
/// Preserves the component's identity: `is_instance_of` plays the role of
/// an instance-of check, and [`InstanceRef::ptr_eq`] compares stored
/// instances.
#[derive(Clone)]
pub struct InstanceRef {
    component: Arc<Component>,
    fields: Rc<RefCell<Fields>>,
}

impl InstanceRef {
    /// The component this instance was constructed from
    pub fn component(&self) -> &Arc<Component> {
        &self.component
    }

    /// Whether this instance was constructed from the given component
    pub fn is_instance_of(&self, component: &Arc<Component>) -> bool {
        self.component.id() == component.id()
    }

    /// Whether two handles point at the same stored instance
    pub fn ptr_eq(&self, other: &InstanceRef) -> bool {
        Rc::ptr_eq(&self.fields, &other.fields)
    }

    /// Invoke one of this component's own prototype methods
    pub fn call(&self, name: &str, args: &[Value]) -> CompositionResult<Value> {
        match self.component.prototype().get(name) {
            Some(MemberImpl::Method(method)) => {
                let mut fields = self.fields.borrow_mut();
                method(&mut fields, args)
            }
            Some(MemberImpl::Accessor { .. }) => {
                Err(CompositionError::NotCallable(name.to_string()))
            }
            None => Err(CompositionError::MemberNotFound(name.to_string())),
        }
    }

    /// Read a member of this instance; own fields shadow prototype
    /// accessors
    pub fn get(&self, name: &str) -> CompositionResult<Value> {
        if let Some(value) = self.fields.borrow().get(name) {
            return Ok(value.clone());
        }
        match self.component.prototype().get(name) {
            Some(MemberImpl::Accessor { get: Some(getter), .. }) => {
                let fields = self.fields.borrow();
                Ok(getter(&fields))
            }
            Some(MemberImpl::Accessor { get: None, .. }) => Ok(Value::Null),
            Some(MemberImpl::Method(_)) => Err(CompositionError::NotReadable(name.to_string())),
            None => Err(CompositionError::MemberNotFound(name.to_string())),
        }
    }

    /// Write a member of this instance
    pub fn set(&self, name: &str, value: Value) -> CompositionResult<()> {
        if self.fields.borrow().contains(name) {
            return self.fields.borrow_mut().write(name, value);
        }
        match self.component.prototype().get(name) {
            Some(MemberImpl::Accessor { set: Some(setter), .. }) => {
                let mut fields = self.fields.borrow_mut();
                setter(&mut fields, value);
                Ok(())
            }
            Some(MemberImpl::Accessor { set: None, .. }) | Some(MemberImpl::Method(_)) => {
                Err(CompositionError::ReadOnly(name.to_string()))
            }
            None => Err(CompositionError::MemberNotFound(name.to_string())),
        }
    }
}

impl std::fmt::Debug for InstanceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceRef")
            .field("component", &self.component.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composite::compose;
    use serde_json::json;

    fn counter() -> Arc<Component> {
        Component::builder("Counter")
            .field("count")
            .constructor(|_args| {
                let mut fields = Fields::new();
                fields.insert("count", json!(0));
                Ok(fields)
            })
            .method("increment", |fields, _args| {
                let next = fields.get("count").and_then(Value::as_i64).unwrap_or(0) + 1;
                fields.store("count", json!(next));
                Ok(json!(next))
            })
            .build()
    }

    #[test]
    fn instance_ref_calls_mutate_shared_state() {
        let counter = counter();
        let composite = compose(vec![counter.clone()]).unwrap();
        let built = composite.construct(&[]).unwrap();

        let handle = built.instance(&counter).unwrap();
        handle.call("increment", &[]).unwrap();
        handle.call("increment", &[]).unwrap();

        // composite-level access observes the same instance
        assert_eq!(built.get("count").unwrap(), json!(2));
    }

    #[test]
    fn numeric_index_and_identity_lookup_agree() {
        let counter = counter();
        let composite = compose(vec![counter.clone()]).unwrap();
        let built = composite.construct(&[]).unwrap();

        let by_index = built.at(0).unwrap();
        let by_identity = built.instance(&counter).unwrap();
        assert!(by_index.ptr_eq(&by_identity));
        assert!(by_index.is_instance_of(&counter));
    }

    #[test]
    fn foreign_component_lookup_is_none() {
        let counter = counter();
        let other = Component::builder("Other").build();
        let composite = compose(vec![counter]).unwrap();
        let built = composite.construct(&[]).unwrap();

        assert!(built.instance(&other).is_none());
        assert!(built.at(1).is_none());
    }

    #[test]
    fn calling_a_field_is_not_callable() {
        let counter = counter();
        let composite = compose(vec![counter]).unwrap();
        let built = composite.construct(&[]).unwrap();

        let err = built.call("count", &[]).unwrap_err();
        assert!(matches!(err, CompositionError::NotCallable(n) if n == "count"));
    }

    #[test]
    fn reading_a_method_is_not_readable() {
        let counter = counter();
        let composite = compose(vec![counter]).unwrap();
        let built = composite.construct(&[]).unwrap();

        let err = built.get("increment").unwrap_err();
        assert!(matches!(err, CompositionError::NotReadable(n) if n == "increment"));
    }
}
