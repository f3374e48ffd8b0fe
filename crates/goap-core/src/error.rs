use thiserror::Error;

use crate::{PredicateId, ValueKind};

/// Errors raised when reading typed values out of a [`crate::Blackboard`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlackboardError {
    #[error("blackboard key `{key}` is not set")]
    MissingKey { key: String },

    #[error("blackboard key `{key}` holds {found}, expected {expected}")]
    TypeMismatch {
        key: String,
        expected: ValueKind,
        found: ValueKind,
    },
}

/// Errors raised while evaluating a predicate against a blackboard.
///
/// Callers in the planning path never propagate these: the fact is treated as unknown instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PredicateError {
    #[error("predicate `{0}` is not registered")]
    Unregistered(PredicateId),

    #[error("predicate `{id}` could not be evaluated: {source}")]
    Evaluation {
        id: PredicateId,
        #[source]
        source: BlackboardError,
    },
}

/// Errors raised while assembling predicates, actions and goals into a brain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("predicate `{0}` is registered more than once")]
    DuplicatePredicate(PredicateId),

    #[error("`{owner}` references unregistered predicate `{predicate}`")]
    UnknownPredicate { owner: String, predicate: PredicateId },

    #[error("action name `{0}` appears more than once in the catalog")]
    DuplicateAction(String),
}
