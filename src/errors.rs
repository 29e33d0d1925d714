// Copyright 2025 Cowboy AI, LLC.

//! Error types for composition operations

use thiserror::Error;

/// Errors that can occur while building a composite type or constructing
/// and using composite instances
///
/// All failures surface synchronously: classification and binding errors at
/// composite build time, argument and resolution errors at construction or
/// invocation time. Nothing is retried or deferred.
#[derive(Debug, Clone, Error)]
pub enum CompositionError {
    /// A resolver-builder entry was invoked with no arguments
    #[error("No arguments provided")]
    NoArguments,

    /// The same component appears twice in the composition list
    #[error("Duplicate component in composition: {0}")]
    DuplicateComponent(String),

    /// A conflicting name was given more than one resolution
    #[error("Duplicate resolution for conflicting member: {0}")]
    DuplicateResolution(String),

    /// A resolution references a name that is not a conflict
    #[error("Resolution references unknown conflict: {0}")]
    UnknownConflict(String),

    /// A conflicting name was left without a resolution
    #[error("Unresolved conflict: {0}")]
    UnresolvedConflict(String),

    /// A resolution references a component absent from the composition list
    #[error("Component {component} is not part of the composition (resolution for {name})")]
    ForeignComponent {
        /// Name of the referenced component
        component: String,
        /// Conflicting member the resolution was for
        name: String,
    },

    /// A resolution owner does not carry the conflicting member
    #[error("Component {component} has no member named {name}")]
    MissingOwnerMember {
        /// Name of the owner component
        component: String,
        /// Member name the resolution was for
        name: String,
    },

    /// A resolver-builder entry received a malformed argument sequence
    #[error("Invalid resolver arguments for {name}: {reason}")]
    InvalidResolverArgs {
        /// Conflicting member the entry was for
        name: String,
        /// Why the argument sequence was rejected
        reason: String,
    },

    /// No member with this name exists on the composite
    #[error("No member named {0}")]
    MemberNotFound(String),

    /// The member exists but is not a method
    #[error("Member {0} is not callable")]
    NotCallable(String),

    /// The member exists but cannot be read as a value
    #[error("Member {0} is not readable")]
    NotReadable(String),

    /// Write attempt against a member whose owner declared it read-only
    #[error("Member {0} is read-only")]
    ReadOnly(String),

    /// A resolver member was invoked with a group that is neither an array
    /// nor null
    #[error("Argument group for {0} must be an array or null")]
    MalformedArgumentGroup(String),

    /// A component constructor rejected its arguments
    #[error("Construction error: {0}")]
    Construction(String),
}

/// Result type alias for composition operations
pub type CompositionResult<T> = Result<T, CompositionError>;
