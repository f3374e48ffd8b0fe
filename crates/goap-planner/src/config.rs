#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::GoapPlannerConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct BrainConfig {
    pub planner: GoapPlannerConfig,

    /// Minimum number of ticks between planning attempts while no plan can be found. `1` retries
    /// on the very next tick.
    pub no_plan_retry_ticks: u32,
}

impl Default for BrainConfig {
    fn default() -> Self {
        Self {
            planner: GoapPlannerConfig::default(),
            no_plan_retry_ticks: 1,
        }
    }
}

impl BrainConfig {
    pub fn can_retry(&self, last_failed_attempt: Option<u64>, tick: u64) -> bool {
        let min = self.no_plan_retry_ticks.max(1) as u64;
        match last_failed_attempt {
            None => true,
            Some(last) => tick.saturating_sub(last) >= min,
        }
    }
}
