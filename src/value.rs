// Copyright 2025 Cowboy AI, LLC.

//! Dynamic values and argument groups
//!
//! Member values, method arguments, and return values are dynamic JSON
//! values. Constructor and resolver arguments travel in *groups*: one
//! ordered argument list per component, where an absent group means
//! "invoke with no arguments".

use crate::errors::{CompositionError, CompositionResult};

/// Dynamic value carried by fields, arguments, and returns
pub type Value = serde_json::Value;

/// One positional argument list, or `None` for "no arguments"
pub type ArgGroup = Option<Vec<Value>>;

/// Interpret a raw value passed to a resolver member as an argument group.
///
/// `Null` means an absent group, an array is the group itself. Anything
/// else is rejected with a descriptive error naming the member.
pub(crate) fn group_from_value(name: &str, value: &Value) -> CompositionResult<ArgGroup> {
    match value {
        Value::Null => Ok(None),
        Value::Array(items) => Ok(Some(items.clone())),
        _ => Err(CompositionError::MalformedArgumentGroup(name.to_string())),
    }
}
