use thiserror::Error;

use crate::syntax::Type;

/// Why a subtyping question could not be answered positively.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum SubtypeError {
    /// A selection refers to a position with no entry in the environment.
    #[error("unbound variable x{0}")]
    UnboundVariable(usize),
    /// The type has no member bounds.
    #[error("{0} does not expand to type member bounds")]
    NotExpandable(Type),
    /// No rule relates the two types.
    #[error("no rule relates {0} to {1}")]
    ShapeMismatch(Type, Type),
    /// The bounds of the variable are not known to be consistent, so composing through its
    /// selection is not supported.
    #[error("the bounds of x{0} are not realizable")]
    RealizabilityViolation(usize),
    /// Narrowing was asked for a position absent from the environment.
    #[error("cannot narrow x{0}: no such entry")]
    NarrowingUnsupported(usize),
    #[error("recursion budget exceeded")]
    BudgetExceeded,
    /// A public entry point was given a type with a dangling bound selection.
    #[error("{0} is not closed")]
    Unclosed(Type),
    #[error("invalid derivation: {0}")]
    InvalidDerivation(String),
}

impl SubtypeError {
    /// Returns true if the error aborts the whole query rather than only ruling out the rule
    /// that raised it.
    pub fn is_fatal(&self) -> bool {
        match *self {
            SubtypeError::RealizabilityViolation(_) | SubtypeError::BudgetExceeded => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, SubtypeError>;
