//! Errors raised by the desugaring passes.

use lyra_ast::{ClassNameKind, Ident, ProperName, Qualified, Type};
use thiserror::Error;

/// Result type for desugaring operations.
pub type DesugarResult<T> = Result<T, DesugarError>;

/// Errors that can occur while desugaring.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum DesugarError {
    /// An instance referenced a class the compiler knows nothing about.
    #[error("unknown type class {0}")]
    UnknownName(Qualified<ProperName<ClassNameKind>>),

    /// An instance failed to define a required class member.
    #[error("instance does not define class member {0}")]
    MissingClassMember(Ident),

    /// An instance defined a name that is not a member of its class.
    #[error("{0} is not a member of the class")]
    ExtraneousClassMember(Ident),

    /// Mutually dependent definitions could not be ordered.
    #[error("the definitions of {} depend on each other", join_idents(.names))]
    OverlappingNamesInLet {
        /// The definitions that could not be scheduled.
        names: Vec<Ident>,
    },

    /// Context attached to an error raised while desugaring an instance.
    #[error("in instance for {}:\n{source}", instance_head(.class, .tys))]
    InInstance {
        /// The class of the instance being desugared.
        class: Qualified<ProperName<ClassNameKind>>,
        /// The instance head type arguments.
        tys: Vec<Type>,
        /// The underlying error.
        source: Box<DesugarError>,
    },

    /// Multiple errors occurred across modules.
    #[error("multiple errors")]
    Multiple(Vec<DesugarError>),

    /// An internal invariant was violated. This is a compiler bug.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DesugarError {
    /// Strip context wrappers down to the underlying error.
    #[must_use]
    pub fn unwrap_hints(&self) -> &DesugarError {
        match self {
            Self::InInstance { source, .. } => source.unwrap_hints(),
            other => other,
        }
    }
}

/// A `map_err` adapter attaching instance context to errors.
pub fn in_instance(
    class: Qualified<ProperName<ClassNameKind>>,
    tys: Vec<Type>,
) -> impl FnOnce(DesugarError) -> DesugarError {
    move |source| DesugarError::InInstance {
        class,
        tys,
        source: Box::new(source),
    }
}

fn instance_head(class: &Qualified<ProperName<ClassNameKind>>, tys: &[Type]) -> String {
    let mut head = class.to_string();
    for ty in tys {
        head.push(' ');
        head.push_str(&ty.to_string());
    }
    head
}

fn join_idents(names: &[Ident]) -> String {
    names
        .iter()
        .map(|name| name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
