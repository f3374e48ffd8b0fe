//! GOAP demo CLI.
//!
//! Single binary that provides:
//! - `goap run` - tick the shooter agent through a scenario
//! - `goap plan` - show the plan the agent would make from the scenario's start state
//! - `goap catalog` - list the agent's actions

mod agent;
mod config;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use goap_core::ActionState;
use goap_planner::{BrainTick, GoapPlanner};
use tracing_subscriber::{fmt, EnvFilter};

use crate::agent::Agent;
use crate::config::ScenarioConfig;

#[derive(Parser)]
#[command(name = "goap")]
#[command(about = "Goal-oriented action planning demo agent", version)]
struct Cli {
    /// Scenario file (YAML). Uses the built-in scenario when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Tick the agent until its goal holds or the tick budget runs out
    Run {
        /// Override the scenario's tick budget
        #[arg(long)]
        ticks: Option<u64>,
    },

    /// Plan once from the scenario's start state and print the result
    Plan,

    /// List the agent's actions
    Catalog,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    if cli.json {
        fmt().json().with_env_filter(filter).with_target(false).init();
    } else {
        fmt().with_env_filter(filter).with_target(false).init();
    }

    let scenario = ScenarioConfig::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Run { ticks } => run_agent(&scenario, ticks.unwrap_or(scenario.ticks)),
        Commands::Plan => show_plan(&scenario),
        Commands::Catalog => show_catalog(),
    }
}

fn build_agent(scenario: &ScenarioConfig) -> Result<Agent> {
    Agent::new(
        scenario.goal_state(),
        scenario.initial_blackboard(),
        scenario.brain,
    )
    .context("Failed to assemble agent")
}

fn run_agent(scenario: &ScenarioConfig, ticks: u64) -> Result<()> {
    let mut agent = build_agent(scenario)?;
    tracing::info!(goal = %agent.brain().goal(), ticks, "Starting run");

    agent.init();
    agent.begin_play();

    for tick in 0..ticks {
        let outcome = agent.tick(scenario.dt);
        println!("tick {tick:>3}  {}", describe(&agent, outcome));
        if outcome == BrainTick::GoalSatisfied {
            println!();
            println!(
                "Goal satisfied after {} ticks ({} planner calls)",
                tick + 1,
                agent.brain().plan_calls()
            );
            return Ok(());
        }
    }

    println!();
    println!(
        "Stopped after {ticks} ticks ({:?}, {} planner calls)",
        agent.brain().status(),
        agent.brain().plan_calls()
    );
    Ok(())
}

fn describe(agent: &Agent, outcome: BrainTick) -> String {
    let brain = agent.brain();
    match outcome {
        BrainTick::Replanned { .. } => format!("plan    [{}]", brain.remaining_plan().join(", ")),
        BrainTick::GoalSatisfied => "goal satisfied".to_string(),
        BrainTick::NoPlan => format!("no plan from {}", brain.world_state()),
        BrainTick::Waiting => "waiting to replan".to_string(),
        BrainTick::Ticked { action, state } => {
            let name = brain
                .actions()
                .schema(action)
                .map(|s| s.name.as_ref())
                .unwrap_or("?");
            let state = match state {
                ActionState::InProgress => "in progress",
                ActionState::Completed => "completed",
                ActionState::Failed => "failed",
            };
            format!("{name:<14} {state}")
        }
    }
}

fn show_plan(scenario: &ScenarioConfig) -> Result<()> {
    let agent = build_agent(scenario)?;
    let brain = agent.brain();
    let start = brain.world_state();
    let planner = GoapPlanner::from_catalog(brain.actions()).with_config(scenario.brain.planner);
    let report = planner.search(&start, brain.goal());

    println!("Start: {start}");
    println!("Goal:  {}", brain.goal());
    println!();

    match report.plan {
        Some(plan) if plan.is_empty() => println!("Goal already satisfied."),
        Some(plan) => {
            println!("Plan (cost {}, {} expansions):", plan.cost(), report.expansions);
            for (i, id) in plan.steps().iter().enumerate() {
                if let Some(schema) = brain.actions().schema(*id) {
                    println!("  {}. {} (cost {})", i + 1, schema.name, schema.cost);
                }
            }
        }
        None if report.budget_exhausted => {
            println!("No plan: expansion budget exhausted after {} expansions.", report.expansions)
        }
        None => println!("No plan: goal unreachable ({} expansions).", report.expansions),
    }

    Ok(())
}

fn show_catalog() -> Result<()> {
    let actions = agent::actions();
    println!("Actions: {}", actions.len());
    for (id, action) in actions.iter() {
        let schema = action.schema();
        println!(
            "  {:>2} {:<14} cost {}  pre {}  eff {}",
            id.index(),
            schema.name,
            schema.cost,
            schema.preconditions,
            schema.effects
        );
    }
    Ok(())
}
