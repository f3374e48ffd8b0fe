use std::borrow::Cow;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Blackboard, PredicateId, PredicateRegistry, TickContext, WorldState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionState {
    InProgress,
    /// The action's declared effects now hold.
    Completed,
    /// The action gave up; the rest of the plan is invalid.
    Failed,
}

impl ActionState {
    pub fn is_finished(self) -> bool {
        !matches!(self, ActionState::InProgress)
    }
}

/// Declarative half of an action: what the planner reasons about.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ActionSchema {
    pub name: Cow<'static, str>,
    #[cfg_attr(feature = "serde", serde(default = "default_cost"))]
    pub cost: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub preconditions: WorldState,
    #[cfg_attr(feature = "serde", serde(default))]
    pub effects: WorldState,
}

#[cfg(feature = "serde")]
fn default_cost() -> u32 {
    1
}

impl ActionSchema {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            cost: 1,
            preconditions: WorldState::new(),
            effects: WorldState::new(),
        }
    }

    pub fn with_cost(mut self, cost: u32) -> Self {
        self.cost = cost;
        self
    }

    pub fn with_precondition(mut self, id: impl Into<PredicateId>, value: bool) -> Self {
        self.preconditions.set(id.into(), value);
        self
    }

    pub fn with_effect(mut self, id: impl Into<PredicateId>, value: bool) -> Self {
        self.effects.set(id.into(), value);
        self
    }

    pub fn is_applicable(&self, state: &WorldState) -> bool {
        state.satisfies(&self.preconditions)
    }

    pub fn apply(&self, state: &WorldState) -> WorldState {
        state.apply(&self.effects)
    }

    /// Every predicate this action tests or asserts, preconditions first.
    pub fn referenced_predicates(&self) -> impl Iterator<Item = &PredicateId> {
        self.preconditions.keys().chain(self.effects.keys())
    }
}

/// A catalog entry: declared preconditions/effects plus tick-driven behaviour.
///
/// `tick` must return within the frame; long-running work is modelled as repeated
/// [`ActionState::InProgress`]. When it returns [`ActionState::Completed`], the declared effects
/// must hold on the blackboard: the planner trusts the schema, not the implementation.
pub trait Action: 'static {
    fn schema(&self) -> &ActionSchema;

    fn tick(&mut self, ctx: &TickContext, blackboard: &mut Blackboard) -> ActionState;

    /// Live re-check of the declared preconditions against the blackboard.
    ///
    /// Predicates that fail to evaluate count as unsatisfied.
    fn check_preconditions(&self, predicates: &PredicateRegistry, blackboard: &Blackboard) -> bool {
        self.schema()
            .preconditions
            .iter()
            .all(|(id, expected)| match predicates.evaluate(id, blackboard) {
                Ok(actual) => actual == expected,
                Err(err) => {
                    tracing::warn!(
                        action = %self.schema().name,
                        error = %err,
                        "precondition could not be evaluated"
                    );
                    false
                }
            })
    }

    /// Called when a started action is abandoned before finishing (replan, invalidation).
    fn cancel(&mut self, _ctx: &TickContext, _blackboard: &mut Blackboard) {}
}

type TickFn = Box<dyn FnMut(&TickContext, &mut Blackboard) -> ActionState>;

/// An [`Action`] whose behaviour is a closure.
pub struct FnAction {
    schema: ActionSchema,
    tick: TickFn,
}

impl FnAction {
    pub fn new(
        schema: ActionSchema,
        tick: impl FnMut(&TickContext, &mut Blackboard) -> ActionState + 'static,
    ) -> Self {
        Self {
            schema,
            tick: Box::new(tick),
        }
    }
}

impl Action for FnAction {
    fn schema(&self) -> &ActionSchema {
        &self.schema
    }

    fn tick(&mut self, ctx: &TickContext, blackboard: &mut Blackboard) -> ActionState {
        (self.tick)(ctx, blackboard)
    }
}

impl core::fmt::Debug for FnAction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FnAction")
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}
