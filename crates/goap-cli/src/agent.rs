//! The shooter demo agent: hunt down a target, reloading, fleeing and healing as needed.

use goap_core::{
    Action, ActionCatalog, ActionSchema, ActionState, BbKey, Blackboard, CatalogError, EntityRef,
    FnAction, PredicateId, PredicateRegistry, TickContext, WorldState,
};
use goap_planner::{Brain, BrainConfig, BrainTick};
use goap_tools::{TraceEvent, TraceSink};

pub const IS_HIGH_HP: PredicateId = PredicateId::new("IsHighHP");
pub const ENEMY_SET: PredicateId = PredicateId::new("EnemySet");
pub const TARGET_DEAD: PredicateId = PredicateId::new("TargetDead");
pub const HAS_AMMO: PredicateId = PredicateId::new("HasAmmo");
pub const IS_AIMED: PredicateId = PredicateId::new("IsAimed");
pub const CAN_SHOOT: PredicateId = PredicateId::new("CanShoot");

pub const HP: BbKey<i64> = BbKey::new("hp");
pub const ENEMY: BbKey<EntityRef> = BbKey::new("enemy");
pub const AMMO: BbKey<i64> = BbKey::new("ammo");
pub const COOLDOWN: BbKey<i64> = BbKey::new("cooldown_remaining");
pub const AIMED: BbKey<bool> = BbKey::new("is_aimed");
pub const DEAD: BbKey<bool> = BbKey::new("target_dead");
pub const RELOAD_PROGRESS: BbKey<i64> = BbKey::new("reload_progress");
pub const HEALING: BbKey<bool> = BbKey::new("is_healing");
pub const HEALING_PROGRESS: BbKey<i64> = BbKey::new("healing_progress");

const MAX_HP: i64 = 100;
const HIGH_HP: i64 = 50;
const HEAL_PER_TICK: i64 = 20;
const MAGAZINE: i64 = 5;
const RELOAD_TICKS: i64 = 2;
const SHOT_COOLDOWN: i64 = 3;
const SPOTTED_ENEMY: EntityRef = EntityRef(1);

/// Starting blackboard: full health, two rounds, nothing in sight.
pub fn default_blackboard() -> Blackboard {
    let mut bb = Blackboard::new();
    bb.set(HP, MAX_HP);
    bb.set(AMMO, 2);
    bb.set(COOLDOWN, 0);
    bb
}

pub fn default_goal() -> WorldState {
    WorldState::new().with(TARGET_DEAD, true)
}

pub fn predicates() -> Result<PredicateRegistry, CatalogError> {
    PredicateRegistry::new()
        .with(IS_HIGH_HP, |bb| Ok(bb.get_or(HP, 0)? > HIGH_HP))
        .and_then(|p| p.with(ENEMY_SET, |bb| Ok(bb.contains(ENEMY.name()))))
        .and_then(|p| p.with(TARGET_DEAD, |bb| bb.get_or(DEAD, false)))
        .and_then(|p| p.with(HAS_AMMO, |bb| Ok(bb.get_or(AMMO, 0)? > 0)))
        .and_then(|p| p.with(IS_AIMED, |bb| bb.get_or(AIMED, false)))
        .and_then(|p| p.with(CAN_SHOOT, |bb| Ok(bb.get_or(COOLDOWN, 0)? <= 0)))
}

/// Catalog order doubles as planner tie-break priority.
pub fn actions() -> ActionCatalog {
    ActionCatalog::new()
        .with(search_for_enemy())
        .with(aim())
        .with(shoot())
        .with(Reload::new())
        .with(flee())
        .with(Heal::new())
}

fn search_for_enemy() -> FnAction {
    FnAction::new(
        ActionSchema::new("SearchForEnemy").with_effect(ENEMY_SET, true),
        |_, bb| {
            bb.set(ENEMY, SPOTTED_ENEMY);
            ActionState::Completed
        },
    )
}

fn aim() -> FnAction {
    FnAction::new(
        ActionSchema::new("Aim")
            .with_precondition(ENEMY_SET, true)
            .with_precondition(IS_AIMED, false)
            .with_effect(IS_AIMED, true),
        |_, bb| {
            bb.set(AIMED, true);
            ActionState::Completed
        },
    )
}

fn shoot() -> FnAction {
    FnAction::new(
        ActionSchema::new("Shoot")
            .with_precondition(ENEMY_SET, true)
            .with_precondition(IS_AIMED, true)
            .with_precondition(HAS_AMMO, true)
            .with_precondition(CAN_SHOOT, true)
            .with_effect(TARGET_DEAD, true),
        |_, bb| {
            if bb.update(AMMO, |ammo| ammo - 1).is_err() {
                return ActionState::Failed;
            }
            bb.set(COOLDOWN, SHOT_COOLDOWN);
            bb.set(DEAD, true);
            ActionState::Completed
        },
    )
}

fn flee() -> FnAction {
    FnAction::new(
        ActionSchema::new("Flee")
            .with_precondition(ENEMY_SET, true)
            .with_precondition(IS_HIGH_HP, false)
            .with_effect(ENEMY_SET, false),
        |_, bb| {
            bb.remove(ENEMY.name());
            bb.remove(HEALING.name());
            bb.remove(HEALING_PROGRESS.name());
            ActionState::Completed
        },
    )
}

/// Takes [`RELOAD_TICKS`] ticks; progress lives on the blackboard.
struct Reload {
    schema: ActionSchema,
}

impl Reload {
    fn new() -> Self {
        Self {
            schema: ActionSchema::new("Reload")
                .with_precondition(HAS_AMMO, false)
                .with_effect(HAS_AMMO, true),
        }
    }
}

impl Action for Reload {
    fn schema(&self) -> &ActionSchema {
        &self.schema
    }

    fn tick(&mut self, _ctx: &TickContext, bb: &mut Blackboard) -> ActionState {
        let progress = match bb.get_or(RELOAD_PROGRESS, 0) {
            Ok(progress) => progress + 1,
            Err(_) => return ActionState::Failed,
        };
        if progress < RELOAD_TICKS {
            bb.set(RELOAD_PROGRESS, progress);
            return ActionState::InProgress;
        }
        bb.remove(RELOAD_PROGRESS.name());
        bb.set(AMMO, MAGAZINE);
        ActionState::Completed
    }

    fn cancel(&mut self, _ctx: &TickContext, bb: &mut Blackboard) {
        bb.remove(RELOAD_PROGRESS.name());
    }
}

/// Restores [`HEAL_PER_TICK`] HP per tick until full.
struct Heal {
    schema: ActionSchema,
}

impl Heal {
    fn new() -> Self {
        Self {
            schema: ActionSchema::new("Heal")
                .with_precondition(ENEMY_SET, false)
                .with_precondition(IS_HIGH_HP, false)
                .with_effect(IS_HIGH_HP, true),
        }
    }

    fn clear(bb: &mut Blackboard) {
        bb.remove(HEALING.name());
        bb.remove(HEALING_PROGRESS.name());
    }
}

impl Action for Heal {
    fn schema(&self) -> &ActionSchema {
        &self.schema
    }

    fn tick(&mut self, _ctx: &TickContext, bb: &mut Blackboard) -> ActionState {
        if !bb.get_or(HEALING, false).unwrap_or(false) {
            bb.set(HEALING, true);
            bb.set(HEALING_PROGRESS, 0);
        }

        let hp = match bb.get_or(HP, 0) {
            Ok(hp) => (hp + HEAL_PER_TICK).min(MAX_HP),
            Err(_) => return ActionState::Failed,
        };
        bb.set(HP, hp);
        let progress = bb.get_or(HEALING_PROGRESS, 0).unwrap_or(0);
        bb.set(HEALING_PROGRESS, progress + 1);

        if hp < MAX_HP {
            return ActionState::InProgress;
        }
        Self::clear(bb);
        ActionState::Completed
    }

    fn cancel(&mut self, _ctx: &TickContext, bb: &mut Blackboard) {
        Self::clear(bb);
    }
}

/// Forwards brain trace events to `tracing` at debug level.
#[derive(Debug, Default)]
pub struct LogTraceSink;

impl TraceSink for LogTraceSink {
    fn emit(&mut self, event: TraceEvent) {
        tracing::debug!(
            tick = event.tick,
            tag = %event.tag,
            action = event.action.as_deref().unwrap_or("-"),
            value = event.value,
            "trace"
        );
    }
}

/// Host component owning one shooter brain.
pub struct Agent {
    brain: Brain,
}

impl Agent {
    pub fn new(
        goal: WorldState,
        blackboard: Blackboard,
        config: BrainConfig,
    ) -> Result<Self, CatalogError> {
        let brain = Brain::new(goal, blackboard, predicates()?, actions())?
            .with_config(config)
            .with_passive_update(|_, bb| {
                let cooldown = bb.get_or(COOLDOWN, 0).unwrap_or(0);
                if cooldown > 0 {
                    bb.set(COOLDOWN, cooldown - 1);
                }
            })
            .with_trace_sink(Box::new(LogTraceSink));
        Ok(Self { brain })
    }

    pub fn init(&mut self) {
        tracing::info!("agent init");
        self.brain.init();
    }

    pub fn begin_play(&mut self) {
        tracing::info!("agent begin play");
        self.brain.begin_play();
    }

    pub fn tick(&mut self, dt_seconds: f32) -> BrainTick {
        self.brain.tick(dt_seconds)
    }

    pub fn brain(&self) -> &Brain {
        &self.brain
    }
}
