//! Run random-agent episodes against a real game binary and print the
//! evaluation statistics.
//!
//! ```text
//! RUST_LOG=info roguebox --game ./rogue/rogue --episodes 5 --reward stair-seeker
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use roguebox_agents::{run_episodes, RandomAgent, RecordingAgent};
use roguebox_core::RogueBox;
use roguebox_strategies::{reward_by_name, state_by_name, EpisodeEvaluator};
use roguebox_types::RogueBoxOptions;

/// Drive Rogue as a programmatic environment with a random agent.
#[derive(Parser, Debug)]
#[command(name = "roguebox", version, about)]
struct Cli {
    /// Path to the game executable (default: resolve `rogue` from PATH)
    #[arg(long)]
    game: Option<PathBuf>,

    /// TOML options file; CLI flags override its fields
    #[arg(long)]
    options: Option<PathBuf>,

    /// Number of episodes to run
    #[arg(long, default_value_t = 10)]
    episodes: usize,

    /// Step budget per episode
    #[arg(long)]
    max_steps: Option<u32>,

    /// Reward generator name (dummy, stairs-only, stair-seeker)
    #[arg(long)]
    reward: Option<String>,

    /// State generator name (dummy, full-map, single-layer)
    #[arg(long)]
    state: Option<String>,

    /// Record each post-action screen under this directory
    #[arg(long)]
    record: Option<PathBuf>,

    /// RNG seed for a reproducible agent
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let mut options = match &cli.options {
        Some(path) => RogueBoxOptions::load(path)?,
        None => RogueBoxOptions::default(),
    };
    if let Some(game) = cli.game {
        options.game_exe_path = Some(game);
    }
    if let Some(max_steps) = cli.max_steps {
        options.max_step_count = max_steps;
    }
    if let Some(reward) = cli.reward {
        options.reward_generator = reward;
    }
    if let Some(state) = cli.state {
        options.state_generator = state;
    }

    let reward = reward_by_name(&options.reward_generator, &options)
        .with_context(|| format!("no reward generator named {:?}", options.reward_generator))?;
    let state = state_by_name(&options.state_generator)
        .with_context(|| format!("no state generator named {:?}", options.state_generator))?;
    let evaluator =
        EpisodeEvaluator::new(options.max_step_count, options.episodes_for_evaluation);
    let stats = evaluator.clone();

    let mut rb = RogueBox::new(options, reward, state, Box::new(evaluator))?;

    let random = match cli.seed {
        Some(seed) => RandomAgent::seeded(seed),
        None => RandomAgent::new(),
    };
    match cli.record {
        Some(dir) => {
            let mut agent = RecordingAgent::new(random, dir)?;
            run_episodes(&mut agent, &mut rb, cli.episodes)?;
        }
        None => {
            let mut agent = random;
            run_episodes(&mut agent, &mut rb, cli.episodes)?;
        }
    }

    println!("{}", serde_json::to_string_pretty(&stats.statistics())?);
    Ok(())
}
