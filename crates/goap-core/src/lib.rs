//! Blackboard, predicate, world-state and action primitives for goal-oriented agents.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod action;
pub mod blackboard;
pub mod catalog;
pub mod error;
pub mod predicate;
pub mod tick;
pub mod world_state;

pub use action::{Action, ActionSchema, ActionState, FnAction};
pub use blackboard::{BbKey, BbValue, Blackboard, EntityRef, Value, ValueKind};
pub use catalog::{ActionCatalog, ActionId};
pub use error::{BlackboardError, CatalogError, PredicateError};
pub use predicate::{PredicateFn, PredicateId, PredicateRegistry};
pub use tick::TickContext;
pub use world_state::WorldState;
