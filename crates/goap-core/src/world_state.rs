use core::fmt;
use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::PredicateId;

/// Snapshot of predicate values, used both as planner state and as goal specification.
///
/// A key that is absent is *unknown*: it never satisfies a precondition or goal entry, whatever
/// value that entry asks for.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct WorldState {
    facts: BTreeMap<PredicateId, bool>,
}

impl WorldState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, id: impl Into<PredicateId>, value: bool) -> Self {
        self.set(id.into(), value);
        self
    }

    pub fn set(&mut self, id: PredicateId, value: bool) {
        self.facts.insert(id, value);
    }

    pub fn get(&self, id: &PredicateId) -> Option<bool> {
        self.facts.get(id).copied()
    }

    pub fn contains(&self, id: &PredicateId) -> bool {
        self.facts.contains_key(id)
    }

    pub fn remove(&mut self, id: &PredicateId) -> Option<bool> {
        self.facts.remove(id)
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PredicateId, bool)> {
        self.facts.iter().map(|(k, v)| (k, *v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &PredicateId> {
        self.facts.keys()
    }

    /// `true` iff every entry of `goal` is present here with the same value.
    pub fn satisfies(&self, goal: &WorldState) -> bool {
        goal.iter().all(|(k, v)| self.get(k) == Some(v))
    }

    /// Number of `goal` entries this state does not satisfy (unknown counts as unsatisfied).
    pub fn unsatisfied_count(&self, goal: &WorldState) -> u32 {
        goal.iter().filter(|(k, v)| self.get(k) != Some(*v)).count() as u32
    }

    /// Copy of `self` with every entry of `effects` written over it.
    pub fn apply(&self, effects: &WorldState) -> WorldState {
        let mut next = self.clone();
        next.extend(effects.iter().map(|(k, v)| (k.clone(), v)));
        next
    }
}

impl FromIterator<(PredicateId, bool)> for WorldState {
    fn from_iter<I: IntoIterator<Item = (PredicateId, bool)>>(iter: I) -> Self {
        Self {
            facts: iter.into_iter().collect(),
        }
    }
}

impl Extend<(PredicateId, bool)> for WorldState {
    fn extend<I: IntoIterator<Item = (PredicateId, bool)>>(&mut self, iter: I) {
        self.facts.extend(iter);
    }
}

impl fmt::Display for WorldState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (k, v)) in self.facts.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{k}: {v}")?;
        }
        f.write_str("}")
    }
}
