//! Deterministic best-first GOAP planner and the tick-driven brain that executes its plans.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod brain;
pub mod config;
pub mod planner;

pub use brain::{Brain, BrainStatus, BrainTick};
pub use config::BrainConfig;
pub use planner::{plan, GoapPlanner, GoapPlannerConfig, Plan, SearchReport};
