use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use goap_core::{Blackboard, PredicateId, Value, WorldState};
use goap_planner::BrainConfig;
use serde::{Deserialize, Serialize};

use crate::agent;

/// A demo run: how long to tick, what the agent wants, and what it starts out knowing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    /// Upper bound on ticks for `goap run`.
    pub ticks: u64,

    /// Seconds per tick handed to actions.
    pub dt: f32,

    /// Goal facts by predicate name. Defaults to `TargetDead: true`.
    pub goal: BTreeMap<String, bool>,

    /// Entries written over the default blackboard, e.g. `hp: !int 30`.
    pub blackboard: BTreeMap<String, Value>,

    pub brain: BrainConfig,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            ticks: 20,
            dt: 0.1,
            goal: agent::default_goal()
                .iter()
                .map(|(id, value)| (id.to_string(), value))
                .collect(),
            blackboard: BTreeMap::new(),
            brain: BrainConfig::default(),
        }
    }
}

impl ScenarioConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario from {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse scenario from {}", path.display()))?;
        Ok(config)
    }

    /// Load `path` if given, otherwise the built-in scenario.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn goal_state(&self) -> WorldState {
        self.goal
            .iter()
            .map(|(name, value)| (PredicateId::owned(name.clone()), *value))
            .collect()
    }

    /// The default blackboard with this scenario's overrides applied.
    pub fn initial_blackboard(&self) -> Blackboard {
        let mut bb = agent::default_blackboard();
        bb.extend(self.blackboard.iter().map(|(k, v)| (k.clone(), v.clone())));
        bb
    }
}
