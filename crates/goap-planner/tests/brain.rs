use std::cell::Cell;
use std::rc::Rc;

use goap_core::{
    Action, ActionCatalog, ActionId, ActionSchema, ActionState, BbKey, Blackboard, CatalogError,
    FnAction, PredicateId, PredicateRegistry, TickContext, Value, WorldState,
};
use goap_planner::{Brain, BrainConfig, BrainStatus, BrainTick};

const ENEMY_SET: PredicateId = PredicateId::new("EnemySet");
const AIMED: PredicateId = PredicateId::new("Aimed");
const HAS_AMMO: PredicateId = PredicateId::new("HasAmmo");
const TARGET_DEAD: PredicateId = PredicateId::new("TargetDead");

const ENEMY: BbKey<bool> = BbKey::new("enemy");
const IS_AIMED: BbKey<bool> = BbKey::new("is_aimed");
const AMMO: BbKey<i64> = BbKey::new("ammo");
const DEAD: BbKey<bool> = BbKey::new("target_dead");

const SEARCH: ActionId = ActionId(0);
const AIM: ActionId = ActionId(1);
const SHOOT: ActionId = ActionId(2);
const RELOAD: ActionId = ActionId(3);

fn predicates() -> PredicateRegistry {
    PredicateRegistry::new()
        .with(ENEMY_SET, |bb| bb.get_or(ENEMY, false))
        .and_then(|p| p.with(AIMED, |bb| bb.get_or(IS_AIMED, false)))
        .and_then(|p| p.with(HAS_AMMO, |bb| Ok(bb.get_or(AMMO, 0)? > 0)))
        .and_then(|p| p.with(TARGET_DEAD, |bb| bb.get_or(DEAD, false)))
        .unwrap()
}

fn search() -> FnAction {
    FnAction::new(
        ActionSchema::new("Search").with_effect(ENEMY_SET, true),
        |_, bb| {
            bb.set(ENEMY, true);
            ActionState::Completed
        },
    )
}

fn aim_schema() -> ActionSchema {
    ActionSchema::new("Aim")
        .with_precondition(ENEMY_SET, true)
        .with_effect(AIMED, true)
}

fn aim() -> FnAction {
    FnAction::new(aim_schema(), |_, bb| {
        bb.set(IS_AIMED, true);
        ActionState::Completed
    })
}

fn shoot() -> FnAction {
    FnAction::new(
        ActionSchema::new("Shoot")
            .with_precondition(ENEMY_SET, true)
            .with_precondition(AIMED, true)
            .with_precondition(HAS_AMMO, true)
            .with_effect(TARGET_DEAD, true),
        |_, bb| {
            let ammo = bb.get_or(AMMO, 0).unwrap_or(0);
            bb.set(AMMO, ammo - 1);
            bb.set(DEAD, true);
            ActionState::Completed
        },
    )
}

/// Takes `ticks` ticks to finish; records cancellations.
struct Reload {
    schema: ActionSchema,
    ticks: u32,
    progress: u32,
    cancelled: Rc<Cell<u32>>,
}

impl Reload {
    fn new(ticks: u32, cancelled: Rc<Cell<u32>>) -> Self {
        Self {
            schema: ActionSchema::new("Reload")
                .with_precondition(HAS_AMMO, false)
                .with_effect(HAS_AMMO, true),
            ticks,
            progress: 0,
            cancelled,
        }
    }
}

impl Action for Reload {
    fn schema(&self) -> &ActionSchema {
        &self.schema
    }

    fn tick(&mut self, _ctx: &TickContext, blackboard: &mut Blackboard) -> ActionState {
        self.progress += 1;
        if self.progress < self.ticks {
            return ActionState::InProgress;
        }
        self.progress = 0;
        blackboard.set(AMMO, 5);
        ActionState::Completed
    }

    fn cancel(&mut self, _ctx: &TickContext, _blackboard: &mut Blackboard) {
        self.progress = 0;
        self.cancelled.set(self.cancelled.get() + 1);
    }
}

fn goal() -> WorldState {
    WorldState::new().with(TARGET_DEAD, true)
}

fn blackboard(ammo: i64) -> Blackboard {
    let mut bb = Blackboard::new();
    bb.set(AMMO, ammo);
    bb
}

fn shooter_catalog() -> ActionCatalog {
    ActionCatalog::new().with(search()).with(aim()).with(shoot())
}

fn brain(ammo: i64, actions: ActionCatalog) -> Brain {
    Brain::new(goal(), blackboard(ammo), predicates(), actions).expect("valid brain")
}

#[test]
fn runs_search_aim_shoot_to_completion() {
    let mut brain = brain(2, shooter_catalog());

    assert_eq!(brain.tick(0.1), BrainTick::Replanned { steps: 3 });
    assert_eq!(brain.remaining_plan(), ["Search", "Aim", "Shoot"]);
    assert_eq!(brain.status(), BrainStatus::Executing);

    for expected in [SEARCH, AIM, SHOOT] {
        assert_eq!(
            brain.tick(0.1),
            BrainTick::Ticked {
                action: expected,
                state: ActionState::Completed,
            }
        );
    }
    assert_eq!(brain.status(), BrainStatus::Idle);
    assert_eq!(brain.blackboard().get(AMMO), Ok(1));

    assert_eq!(brain.tick(0.1), BrainTick::GoalSatisfied);
    assert_eq!(brain.plan_calls(), 2);
    assert!(brain.plan().is_empty());
}

#[test]
fn missing_reload_leaves_brain_without_plan() {
    let mut brain = brain(0, shooter_catalog());

    assert_eq!(brain.tick(0.1), BrainTick::NoPlan);
    assert_eq!(brain.status(), BrainStatus::NoPlan);
    assert!(brain.plan().is_empty());
    assert_eq!(brain.current_action(), None);
}

#[test]
fn in_progress_step_keeps_index_until_completed() {
    let cancelled = Rc::new(Cell::new(0));
    let mut brain = brain(0, shooter_catalog().with(Reload::new(2, cancelled.clone())));

    assert_eq!(brain.tick(0.1), BrainTick::Replanned { steps: 4 });
    assert_eq!(brain.remaining_plan(), ["Search", "Aim", "Reload", "Shoot"]);
    brain.tick(0.1);
    brain.tick(0.1);
    assert_eq!(brain.current_index(), 2);

    assert_eq!(
        brain.tick(0.1),
        BrainTick::Ticked {
            action: RELOAD,
            state: ActionState::InProgress,
        }
    );
    assert_eq!(brain.current_index(), 2);
    assert_eq!(brain.current_action_name(), Some("Reload"));

    assert_eq!(
        brain.tick(0.1),
        BrainTick::Ticked {
            action: RELOAD,
            state: ActionState::Completed,
        }
    );
    assert_eq!(brain.current_index(), 3);
    assert_eq!(brain.current_action(), Some(SHOOT));
    assert_eq!(brain.plan_calls(), 1);
    assert_eq!(cancelled.get(), 0);
}

#[test]
fn failed_step_discards_plan_and_replans() {
    let failures = Rc::new(Cell::new(0));
    let failing_aim = {
        let failures = failures.clone();
        FnAction::new(aim_schema(), move |_, bb| {
            if failures.get() == 0 {
                failures.set(1);
                return ActionState::Failed;
            }
            bb.set(IS_AIMED, true);
            ActionState::Completed
        })
    };
    let catalog = ActionCatalog::new().with(search()).with(failing_aim).with(shoot());
    let mut brain = brain(2, catalog);

    brain.tick(0.1);
    brain.tick(0.1);
    assert_eq!(
        brain.tick(0.1),
        BrainTick::Ticked {
            action: AIM,
            state: ActionState::Failed,
        }
    );
    assert_eq!(brain.plan_calls(), 1);
    assert!(brain.plan().is_empty());
    assert_eq!(brain.status(), BrainStatus::Idle);

    assert_eq!(brain.tick(0.1), BrainTick::Replanned { steps: 2 });
    assert_eq!(brain.plan_calls(), 2);
    assert_eq!(brain.plan().steps(), [AIM, SHOOT]);
}

#[test]
fn external_change_invalidates_current_step() {
    let mut brain = brain(2, shooter_catalog()).with_trace_log();
    for _ in 0..3 {
        brain.tick(0.1);
    }
    assert_eq!(brain.current_action(), Some(SHOOT));

    // The enemy slipped away between frames.
    brain.blackboard_mut().set(ENEMY, false);

    assert_eq!(brain.tick(0.1), BrainTick::Replanned { steps: 2 });
    assert_eq!(brain.plan().steps(), [SEARCH, SHOOT]);
    assert_eq!(brain.plan_calls(), 2);
    let log = brain.trace_log().expect("trace log enabled");
    assert_eq!(log.count("goap.invalidated"), 1);
}

#[test]
fn invalidated_running_step_is_cancelled() {
    let cancelled = Rc::new(Cell::new(0));
    let mut brain = brain(0, shooter_catalog().with(Reload::new(5, cancelled.clone())));
    for _ in 0..4 {
        brain.tick(0.1);
    }
    assert_eq!(brain.current_action(), Some(RELOAD));

    // Someone handed the agent a magazine mid-reload.
    brain.blackboard_mut().set(AMMO, 3);

    assert_eq!(brain.tick(0.1), BrainTick::Replanned { steps: 1 });
    assert_eq!(cancelled.get(), 1);
    assert_eq!(brain.plan().steps(), [SHOOT]);
}

#[test]
fn unstarted_step_is_not_cancelled() {
    let cancelled = Rc::new(Cell::new(0));
    let mut brain = brain(0, shooter_catalog().with(Reload::new(5, cancelled.clone())));
    for _ in 0..3 {
        brain.tick(0.1);
    }
    assert_eq!(brain.current_action(), Some(RELOAD));

    brain.blackboard_mut().set(AMMO, 3);
    brain.tick(0.1);
    assert_eq!(cancelled.get(), 0);
}

#[test]
fn no_plan_retries_are_spaced_out() {
    let mut brain = brain(0, shooter_catalog()).with_config(BrainConfig {
        no_plan_retry_ticks: 3,
        ..BrainConfig::default()
    });

    assert_eq!(brain.tick(0.1), BrainTick::NoPlan);
    assert_eq!(brain.tick(0.1), BrainTick::Waiting);
    assert_eq!(brain.tick(0.1), BrainTick::Waiting);
    assert_eq!(brain.tick(0.1), BrainTick::NoPlan);
    assert_eq!(brain.plan_calls(), 2);

    brain.blackboard_mut().set(AMMO, 1);
    assert_eq!(brain.tick(0.1), BrainTick::Waiting);
    assert_eq!(brain.tick(0.1), BrainTick::Waiting);
    assert_eq!(brain.tick(0.1), BrainTick::Replanned { steps: 3 });
}

#[test]
fn badly_typed_blackboard_entry_fails_closed() {
    let mut bb = Blackboard::new();
    bb.set_value("ammo", Value::Str("plenty".to_string()));
    let mut brain = Brain::new(goal(), bb, predicates(), shooter_catalog()).expect("brain");

    assert!(!brain.world_state().contains(&HAS_AMMO));
    assert_eq!(brain.tick(0.1), BrainTick::NoPlan);
}

#[test]
fn passive_updates_run_every_tick() {
    const COOLDOWN: BbKey<i64> = BbKey::new("cooldown_remaining");
    let mut bb = blackboard(0);
    bb.set(COOLDOWN, 3);

    let mut brain = Brain::new(goal(), bb, predicates(), shooter_catalog())
        .expect("brain")
        .with_passive_update(|_, bb| {
            let _ = bb.update(COOLDOWN, |c| (c - 1).max(0));
        });

    for _ in 0..5 {
        brain.tick(0.1);
    }
    assert_eq!(brain.blackboard().get(COOLDOWN), Ok(0));
    assert_eq!(brain.ticks(), 5);
}

#[test]
fn goal_must_use_registered_predicates() {
    let goal = WorldState::new().with(PredicateId::new("Fed"), true);
    let err = Brain::new(goal, Blackboard::new(), predicates(), shooter_catalog())
        .err()
        .expect("unknown goal predicate");

    assert_eq!(
        err,
        CatalogError::UnknownPredicate {
            owner: "goal".to_string(),
            predicate: PredicateId::new("Fed"),
        }
    );
}

#[test]
fn vocabulary_includes_goal_keys() {
    let actions = ActionCatalog::new().with(search());
    let brain = Brain::new(goal(), blackboard(1), predicates(), actions).expect("brain");

    let vocab: Vec<_> = brain.vocabulary().iter().cloned().collect();
    assert_eq!(vocab, vec![ENEMY_SET, TARGET_DEAD]);
}

#[test]
fn init_resets_runtime_state() {
    let mut brain = brain(2, shooter_catalog());
    brain.begin_play();
    brain.tick(0.1);
    brain.tick(0.1);
    assert!(brain.has_begun_play());

    brain.init();
    assert_eq!(brain.ticks(), 0);
    assert_eq!(brain.plan_calls(), 0);
    assert!(brain.plan().is_empty());
    assert_eq!(brain.status(), BrainStatus::Idle);
    assert!(!brain.has_begun_play());
    assert_eq!(brain.blackboard().get(ENEMY), Ok(true));
}

#[test]
fn trace_tags_follow_lifecycle() {
    let mut brain = brain(2, shooter_catalog()).with_trace_log();
    brain.init();
    brain.begin_play();
    for _ in 0..5 {
        brain.tick(0.1);
    }

    let tags: Vec<&str> = brain.trace_log().expect("trace log").tags().collect();
    assert_eq!(
        tags,
        [
            "brain.init",
            "brain.begin_play",
            "goap.plan.call",
            "goap.plan.result",
            "goap.action.completed",
            "goap.action.completed",
            "goap.action.completed",
            "goap.plan.call",
            "goap.done",
        ]
    );
}
