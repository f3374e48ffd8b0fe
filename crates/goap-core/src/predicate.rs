use core::fmt;
use std::borrow::Cow;
use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Blackboard, BlackboardError, CatalogError, PredicateError, WorldState};

/// Stable, name-based identifier of a planning fact.
///
/// Two predicates with the same id are the same fact as far as the planner is concerned.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct PredicateId(Cow<'static, str>);

impl PredicateId {
    pub const fn new(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn owned(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PredicateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for PredicateId {
    fn from(value: &'static str) -> Self {
        Self::new(value)
    }
}

impl From<String> for PredicateId {
    fn from(value: String) -> Self {
        Self::owned(value)
    }
}

/// Evaluator for a single predicate. Receives the blackboard by shared reference, so evaluation
/// cannot mutate agent knowledge.
pub type PredicateFn = Box<dyn Fn(&Blackboard) -> Result<bool, BlackboardError>>;

/// Explicit `PredicateId -> evaluator` table.
#[derive(Default)]
pub struct PredicateRegistry {
    evaluators: BTreeMap<PredicateId, PredicateFn>,
}

impl PredicateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        id: PredicateId,
        eval: impl Fn(&Blackboard) -> Result<bool, BlackboardError> + 'static,
    ) -> Result<(), CatalogError> {
        if self.evaluators.contains_key(&id) {
            return Err(CatalogError::DuplicatePredicate(id));
        }
        self.evaluators.insert(id, Box::new(eval));
        Ok(())
    }

    /// Builder form of [`PredicateRegistry::register`].
    pub fn with(
        mut self,
        id: PredicateId,
        eval: impl Fn(&Blackboard) -> Result<bool, BlackboardError> + 'static,
    ) -> Result<Self, CatalogError> {
        self.register(id, eval)?;
        Ok(self)
    }

    pub fn contains(&self, id: &PredicateId) -> bool {
        self.evaluators.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.evaluators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.evaluators.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &PredicateId> {
        self.evaluators.keys()
    }

    pub fn evaluate(&self, id: &PredicateId, blackboard: &Blackboard) -> Result<bool, PredicateError> {
        let eval = self
            .evaluators
            .get(id)
            .ok_or_else(|| PredicateError::Unregistered(id.clone()))?;
        eval(blackboard).map_err(|source| PredicateError::Evaluation {
            id: id.clone(),
            source,
        })
    }

    /// Evaluate `keys` against `blackboard` into a planning snapshot.
    ///
    /// Keys that fail to evaluate are logged and left out, so they read as unknown and any
    /// precondition that tests them is unsatisfied.
    pub fn snapshot<'a>(
        &self,
        keys: impl IntoIterator<Item = &'a PredicateId>,
        blackboard: &Blackboard,
    ) -> WorldState {
        let mut state = WorldState::new();
        for id in keys {
            if state.contains(id) {
                continue;
            }
            match self.evaluate(id, blackboard) {
                Ok(value) => state.set(id.clone(), value),
                Err(err) => tracing::warn!(predicate = %id, error = %err, "predicate left unknown"),
            }
        }
        state
    }
}

impl fmt::Debug for PredicateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.evaluators.keys()).finish()
    }
}
