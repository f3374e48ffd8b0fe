use core::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use goap_core::{ActionCatalog, ActionId, ActionSchema, WorldState};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct GoapPlannerConfig {
    /// Optional cap on node expansions per search. `None` searches the whole reachable space,
    /// which is finite (at most `2^|vocabulary|` states).
    pub max_expansions: Option<usize>,
}

/// Ordered action sequence produced by the planner.
///
/// An empty plan is a successful result: the start state already satisfies the goal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    steps: Vec<ActionId>,
    cost: u32,
}

impl Plan {
    pub fn new(steps: Vec<ActionId>, cost: u32) -> Self {
        Self { steps, cost }
    }

    pub fn steps(&self) -> &[ActionId] {
        &self.steps
    }

    pub fn get(&self, index: usize) -> Option<ActionId> {
        self.steps.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Sum of the declared costs of every step.
    pub fn cost(&self) -> u32 {
        self.cost
    }
}

/// Outcome of a search plus bookkeeping useful for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchReport {
    pub plan: Option<Plan>,
    pub expansions: usize,
    /// `true` when the search stopped on `max_expansions` rather than an empty frontier.
    pub budget_exhausted: bool,
}

#[derive(Debug, Clone)]
pub struct GoapPlanner {
    actions: Vec<ActionSchema>,
    config: GoapPlannerConfig,
}

impl GoapPlanner {
    pub fn new(actions: Vec<ActionSchema>) -> Self {
        Self {
            actions,
            config: GoapPlannerConfig::default(),
        }
    }

    pub fn from_catalog(catalog: &ActionCatalog) -> Self {
        Self::new(catalog.schemas())
    }

    pub fn with_config(mut self, config: GoapPlannerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> GoapPlannerConfig {
        self.config
    }

    pub fn actions(&self) -> &[ActionSchema] {
        &self.actions
    }

    pub fn plan(&self, start: &WorldState, goal: &WorldState) -> Option<Plan> {
        self.search(start, goal).plan
    }

    /// Best-first search from `start` to any state satisfying `goal`.
    ///
    /// Frontier order is `(f, catalog index of the discovering action, discovery order)` with
    /// `f = g + h`, `g` the accumulated cost and `h` the number of unsatisfied goal entries.
    pub fn search(&self, start: &WorldState, goal: &WorldState) -> SearchReport {
        if start.satisfies(goal) {
            return SearchReport {
                plan: Some(Plan::default()),
                expansions: 0,
                budget_exhausted: false,
            };
        }

        let h = |state: &WorldState| state.unsatisfied_count(goal);

        let mut nodes = vec![SearchNode {
            state: start.clone(),
            g: 0,
            parent: None,
        }];
        let mut best_g: BTreeMap<WorldState, u32> = BTreeMap::new();
        let mut closed: BTreeSet<WorldState> = BTreeSet::new();
        let mut open = BinaryHeap::<OpenEntry>::new();
        let mut seq: u64 = 0;

        best_g.insert(start.clone(), 0);
        open.push(OpenEntry {
            f: h(start),
            via: 0,
            seq,
            node: 0,
        });

        let mut expansions: usize = 0;

        while let Some(entry) = open.pop() {
            if closed.contains(&nodes[entry.node].state) {
                continue; // stale heap entry
            }

            if let Some(max) = self.config.max_expansions {
                if expansions >= max {
                    tracing::warn!(max_expansions = max, "planner expansion budget exhausted");
                    return SearchReport {
                        plan: None,
                        expansions,
                        budget_exhausted: true,
                    };
                }
            }
            expansions += 1;

            if nodes[entry.node].state.satisfies(goal) {
                let plan = reconstruct(&nodes, entry.node);
                return SearchReport {
                    plan: Some(plan),
                    expansions,
                    budget_exhausted: false,
                };
            }

            let state = nodes[entry.node].state.clone();
            let g = nodes[entry.node].g;
            closed.insert(state.clone());

            for (action_idx, action) in self.actions.iter().enumerate() {
                if !action.is_applicable(&state) {
                    continue;
                }
                let next = action.apply(&state);
                if next == state || closed.contains(&next) {
                    continue;
                }

                let next_g = g.saturating_add(action.cost);
                if best_g.get(&next).is_some_and(|&prev| next_g >= prev) {
                    continue;
                }
                best_g.insert(next.clone(), next_g);

                seq += 1;
                let f = next_g.saturating_add(h(&next));
                nodes.push(SearchNode {
                    state: next,
                    g: next_g,
                    parent: Some((entry.node, action_idx)),
                });
                open.push(OpenEntry {
                    f,
                    via: action_idx,
                    seq,
                    node: nodes.len() - 1,
                });
            }
        }

        SearchReport {
            plan: None,
            expansions,
            budget_exhausted: false,
        }
    }
}

struct SearchNode {
    state: WorldState,
    g: u32,
    /// `(parent node, catalog index of the action that led here)`.
    parent: Option<(usize, usize)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenEntry {
    f: u32,
    via: usize,
    seq: u64,
    node: usize,
}

impl OpenEntry {
    fn key(&self) -> (u32, usize, u64) {
        (self.f, self.via, self.seq)
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering to make BinaryHeap behave like a min-heap.
        other.key().cmp(&self.key())
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn reconstruct(nodes: &[SearchNode], goal_node: usize) -> Plan {
    let mut steps = Vec::new();
    let mut current = goal_node;
    while let Some((prev, action_idx)) = nodes[current].parent {
        steps.push(ActionId(action_idx));
        current = prev;
    }
    steps.reverse();
    Plan::new(steps, nodes[goal_node].g)
}

/// Plan from `start` to `goal` over `actions` with the default configuration.
///
/// Returns `None` when no sequence of actions reaches the goal, and an empty plan when `start`
/// already satisfies it.
pub fn plan(start: &WorldState, goal: &WorldState, actions: &[ActionSchema]) -> Option<Plan> {
    GoapPlanner::new(actions.to_vec()).plan(start, goal)
}
