use std::collections::BTreeSet;

use goap_core::{
    ActionCatalog, ActionId, ActionState, Blackboard, CatalogError, PredicateId,
    PredicateRegistry, TickContext, WorldState,
};
use goap_tools::{TraceEvent, TraceLog, TraceSink, Tracer};

use crate::{BrainConfig, GoapPlanner, Plan};

type PassiveUpdate = Box<dyn FnMut(&TickContext, &mut Blackboard)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrainStatus {
    /// No plan held: not planned yet, goal already satisfied, or the last plan was consumed or
    /// discarded.
    Idle,
    /// The last planning attempt found no action sequence to the goal.
    NoPlan,
    Executing,
}

/// What a single [`Brain::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrainTick {
    /// A new plan replaced the old one. No action ran this tick.
    Replanned { steps: usize },
    /// Planning found the goal already satisfied.
    GoalSatisfied,
    /// Planning failed; the brain stays idle and retries later.
    NoPlan,
    /// Planning is being held back by `no_plan_retry_ticks`.
    Waiting,
    /// The current plan step was ticked.
    Ticked { action: ActionId, state: ActionState },
}

/// Tick-driven GOAP execution driver for one agent.
///
/// - Owns the agent's blackboard, predicate registry, action catalog and goal.
/// - Plans when it has no plan, the plan is exhausted, or the current step's preconditions no
///   longer hold on the live blackboard (the step is cancelled first).
/// - Ticks exactly one plan step per tick otherwise: `Completed` advances, `InProgress` stays,
///   `Failed` discards the whole plan so the next tick replans.
pub struct Brain {
    config: BrainConfig,
    blackboard: Blackboard,
    predicates: PredicateRegistry,
    actions: ActionCatalog,
    planner: GoapPlanner,
    goal: WorldState,
    vocabulary: BTreeSet<PredicateId>,

    plan: Plan,
    index: usize,
    current_started: bool,
    status: BrainStatus,

    ticks: u64,
    plan_calls: u64,
    last_failed_attempt: Option<u64>,
    started: bool,

    passive_updates: Vec<PassiveUpdate>,
    tracer: Tracer,
}

impl Brain {
    /// Assemble a brain, rejecting catalogs or goals that reference unregistered predicates.
    pub fn new(
        goal: WorldState,
        blackboard: Blackboard,
        predicates: PredicateRegistry,
        actions: ActionCatalog,
    ) -> Result<Self, CatalogError> {
        actions.validate(&predicates)?;
        if let Some(missing) = goal.keys().find(|id| !predicates.contains(id)) {
            return Err(CatalogError::UnknownPredicate {
                owner: "goal".to_string(),
                predicate: missing.clone(),
            });
        }

        let mut vocabulary = actions.vocabulary();
        vocabulary.extend(goal.keys().cloned());
        let config = BrainConfig::default();
        let planner = GoapPlanner::from_catalog(&actions).with_config(config.planner);

        Ok(Self {
            config,
            blackboard,
            predicates,
            actions,
            planner,
            goal,
            vocabulary,
            plan: Plan::default(),
            index: 0,
            current_started: false,
            status: BrainStatus::Idle,
            ticks: 0,
            plan_calls: 0,
            last_failed_attempt: None,
            started: false,
            passive_updates: Vec::new(),
            tracer: Tracer::new(),
        })
    }

    pub fn with_config(mut self, config: BrainConfig) -> Self {
        self.planner = self.planner.with_config(config.planner);
        self.config = config;
        self
    }

    /// Register a host-driven update (cooldown decay, regeneration) that runs on the blackboard
    /// at the start of every tick, before planning or acting.
    pub fn with_passive_update(
        mut self,
        update: impl FnMut(&TickContext, &mut Blackboard) + 'static,
    ) -> Self {
        self.passive_updates.push(Box::new(update));
        self
    }

    pub fn with_trace_log(mut self) -> Self {
        self.tracer.enable_log();
        self
    }

    pub fn with_trace_sink(mut self, sink: Box<dyn TraceSink>) -> Self {
        self.tracer.set_sink(sink);
        self
    }

    /// Host `Init` hook: reset all runtime bookkeeping. The blackboard is left untouched.
    pub fn init(&mut self) {
        let ctx = TickContext::new(self.ticks, 0.0);
        self.discard_plan(&ctx);
        self.status = BrainStatus::Idle;
        self.ticks = 0;
        self.plan_calls = 0;
        self.last_failed_attempt = None;
        self.started = false;
        tracing::debug!(actions = self.actions.len(), goal = %self.goal, "brain init");
        self.trace(TraceEvent::new(0, "brain.init").with_value(self.actions.len() as u64));
    }

    /// Host `BeginPlay` hook.
    pub fn begin_play(&mut self) {
        self.started = true;
        tracing::debug!(goal = %self.goal, "brain begin play");
        self.trace(TraceEvent::new(self.ticks, "brain.begin_play"));
    }

    /// Host per-frame hook.
    pub fn tick(&mut self, dt_seconds: f32) -> BrainTick {
        let ctx = TickContext::new(self.ticks, dt_seconds);
        self.ticks += 1;

        for update in self.passive_updates.iter_mut() {
            update(&ctx, &mut self.blackboard);
        }

        let Some(current) = self.current_action() else {
            return self.replan(&ctx);
        };

        let still_valid = self
            .actions
            .get(current)
            .is_some_and(|action| action.check_preconditions(&self.predicates, &self.blackboard));
        if !still_valid {
            let name = self.action_name(current);
            tracing::debug!(tick = ctx.tick, action = %name, "current action invalidated");
            self.trace(
                TraceEvent::new(ctx.tick, "goap.invalidated")
                    .with_action(name)
                    .with_value(self.index as u64),
            );
            self.discard_plan(&ctx);
            self.status = BrainStatus::Idle;
            return self.replan(&ctx);
        }

        self.tick_current(&ctx, current)
    }

    fn tick_current(&mut self, ctx: &TickContext, current: ActionId) -> BrainTick {
        let Some(action) = self.actions.get_mut(current) else {
            // Plans only hold ids from this catalog.
            self.discard_plan(ctx);
            self.status = BrainStatus::Idle;
            return self.replan(ctx);
        };

        self.current_started = true;
        let state = action.tick(ctx, &mut self.blackboard);
        let name = action.schema().name.clone();

        match state {
            ActionState::InProgress => {}
            ActionState::Completed => {
                self.index += 1;
                self.current_started = false;
                tracing::debug!(tick = ctx.tick, action = %name, "action completed");
                self.trace(
                    TraceEvent::new(ctx.tick, "goap.action.completed")
                        .with_action(name)
                        .with_value(current.index() as u64),
                );
                if self.index >= self.plan.len() {
                    self.status = BrainStatus::Idle;
                }
            }
            ActionState::Failed => {
                tracing::debug!(tick = ctx.tick, action = %name, "action failed, discarding plan");
                self.trace(
                    TraceEvent::new(ctx.tick, "goap.action.failed")
                        .with_action(name)
                        .with_value(current.index() as u64),
                );
                // The failing step already finished on its own; nothing to cancel.
                self.current_started = false;
                self.discard_plan(ctx);
                self.status = BrainStatus::Idle;
            }
        }

        BrainTick::Ticked {
            action: current,
            state,
        }
    }

    fn replan(&mut self, ctx: &TickContext) -> BrainTick {
        if self.status == BrainStatus::NoPlan
            && !self.config.can_retry(self.last_failed_attempt, ctx.tick)
        {
            return BrainTick::Waiting;
        }

        let start = self.predicates.snapshot(&self.vocabulary, &self.blackboard);
        self.plan_calls += 1;
        self.trace(TraceEvent::new(ctx.tick, "goap.plan.call").with_value(start.len() as u64));

        let report = self.planner.search(&start, &self.goal);
        self.plan = Plan::default();
        self.index = 0;
        self.current_started = false;

        match report.plan {
            Some(plan) if plan.is_empty() => {
                self.status = BrainStatus::Idle;
                self.last_failed_attempt = None;
                self.trace(TraceEvent::new(ctx.tick, "goap.done"));
                BrainTick::GoalSatisfied
            }
            Some(plan) => {
                let steps = plan.len();
                let names: Vec<String> = plan.steps().iter().map(|id| self.action_name(*id)).collect();
                tracing::debug!(
                    tick = ctx.tick,
                    steps = ?names,
                    cost = plan.cost(),
                    expansions = report.expansions,
                    "plan found"
                );
                self.trace(TraceEvent::new(ctx.tick, "goap.plan.result").with_value(steps as u64));
                self.plan = plan;
                self.status = BrainStatus::Executing;
                self.last_failed_attempt = None;
                BrainTick::Replanned { steps }
            }
            None => {
                tracing::debug!(
                    tick = ctx.tick,
                    state = %start,
                    goal = %self.goal,
                    expansions = report.expansions,
                    "no plan found"
                );
                self.trace(
                    TraceEvent::new(ctx.tick, "goap.plan.none").with_value(report.expansions as u64),
                );
                self.status = BrainStatus::NoPlan;
                self.last_failed_attempt = Some(ctx.tick);
                BrainTick::NoPlan
            }
        }
    }

    /// Drop the current plan, cancelling the current step if it already started running.
    fn discard_plan(&mut self, ctx: &TickContext) {
        if self.current_started {
            if let Some(current) = self.current_action() {
                if let Some(action) = self.actions.get_mut(current) {
                    action.cancel(ctx, &mut self.blackboard);
                }
            }
        }
        self.plan = Plan::default();
        self.index = 0;
        self.current_started = false;
    }

    fn action_name(&self, id: ActionId) -> String {
        self.actions
            .schema(id)
            .map(|s| s.name.to_string())
            .unwrap_or_else(|| format!("#{}", id.index()))
    }

    fn trace(&mut self, event: TraceEvent) {
        self.tracer.emit(event);
    }

    pub fn status(&self) -> BrainStatus {
        self.status
    }

    pub fn config(&self) -> &BrainConfig {
        &self.config
    }

    pub fn goal(&self) -> &WorldState {
        &self.goal
    }

    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    /// Index of the current step within [`Brain::plan`].
    pub fn current_index(&self) -> usize {
        self.index
    }

    pub fn current_action(&self) -> Option<ActionId> {
        self.plan.get(self.index)
    }

    pub fn current_action_name(&self) -> Option<&str> {
        let id = self.current_action()?;
        self.actions.schema(id).map(|s| s.name.as_ref())
    }

    /// Names of the steps not yet completed, current step first.
    pub fn remaining_plan(&self) -> Vec<&str> {
        self.plan
            .steps()
            .iter()
            .skip(self.index)
            .filter_map(|id| self.actions.schema(*id))
            .map(|s| s.name.as_ref())
            .collect()
    }

    /// Number of times the planner has been invoked.
    pub fn plan_calls(&self) -> u64 {
        self.plan_calls
    }

    /// Number of ticks since construction or the last [`Brain::init`].
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn has_begun_play(&self) -> bool {
        self.started
    }

    pub fn blackboard(&self) -> &Blackboard {
        &self.blackboard
    }

    /// Host-side access for changes made outside any plan (damage, other systems). The next tick
    /// re-checks the current step against whatever is written here.
    pub fn blackboard_mut(&mut self) -> &mut Blackboard {
        &mut self.blackboard
    }

    pub fn actions(&self) -> &ActionCatalog {
        &self.actions
    }

    pub fn predicates(&self) -> &PredicateRegistry {
        &self.predicates
    }

    /// The facts snapshotted on every planning attempt.
    pub fn vocabulary(&self) -> &BTreeSet<PredicateId> {
        &self.vocabulary
    }

    /// Evaluate the vocabulary against the live blackboard, as the next planning attempt would.
    pub fn world_state(&self) -> WorldState {
        self.predicates.snapshot(&self.vocabulary, &self.blackboard)
    }

    pub fn trace_log(&self) -> Option<&TraceLog> {
        self.tracer.log()
    }
}
