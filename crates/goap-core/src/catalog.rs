use core::fmt;
use std::collections::{BTreeSet, HashSet};

use crate::{Action, ActionSchema, CatalogError, PredicateId, PredicateRegistry};

/// Position of an action in its catalog. Lower ids win planner ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ActionId(pub usize);

impl ActionId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Ordered set of actions available to one agent.
#[derive(Default)]
pub struct ActionCatalog {
    actions: Vec<Box<dyn Action>>,
}

impl ActionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, action: impl Action) -> ActionId {
        self.push_boxed(Box::new(action))
    }

    pub fn push_boxed(&mut self, action: Box<dyn Action>) -> ActionId {
        self.actions.push(action);
        ActionId(self.actions.len() - 1)
    }

    pub fn with(mut self, action: impl Action) -> Self {
        self.push(action);
        self
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn get(&self, id: ActionId) -> Option<&dyn Action> {
        self.actions.get(id.0).map(|a| a.as_ref())
    }

    pub fn get_mut(&mut self, id: ActionId) -> Option<&mut dyn Action> {
        match self.actions.get_mut(id.0) {
            Some(action) => Some(action.as_mut()),
            None => None,
        }
    }

    pub fn schema(&self, id: ActionId) -> Option<&ActionSchema> {
        self.get(id).map(|a| a.schema())
    }

    pub fn iter(&self) -> impl Iterator<Item = (ActionId, &dyn Action)> {
        self.actions
            .iter()
            .enumerate()
            .map(|(i, a)| (ActionId(i), a.as_ref()))
    }

    /// Declarative view of the catalog, in catalog order.
    pub fn schemas(&self) -> Vec<ActionSchema> {
        self.actions.iter().map(|a| a.schema().clone()).collect()
    }

    /// Union of every predicate referenced by a precondition or effect.
    pub fn vocabulary(&self) -> BTreeSet<PredicateId> {
        self.actions
            .iter()
            .flat_map(|a| a.schema().referenced_predicates())
            .cloned()
            .collect()
    }

    /// Check that every referenced predicate has an evaluator and action names are unique.
    pub fn validate(&self, predicates: &PredicateRegistry) -> Result<(), CatalogError> {
        let mut names = HashSet::new();
        for action in &self.actions {
            let schema = action.schema();
            if !names.insert(schema.name.as_ref()) {
                return Err(CatalogError::DuplicateAction(schema.name.to_string()));
            }
            if let Some(missing) = schema
                .referenced_predicates()
                .find(|id| !predicates.contains(id))
            {
                return Err(CatalogError::UnknownPredicate {
                    owner: schema.name.to_string(),
                    predicate: missing.clone(),
                });
            }
        }
        Ok(())
    }
}

impl fmt::Debug for ActionCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.actions.iter().map(|a| &a.schema().name))
            .finish()
    }
}
