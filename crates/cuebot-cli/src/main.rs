//! Command-line driver for cuebot.
//!
//! Runs triggers and scene rules against the simulated OBS host, persisting
//! the host globals to a JSON file between runs.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use cuebot_core::app::PlayerBuilder;
use cuebot_core::automation::{MicSceneRule, RewardSceneRule};
use cuebot_core::config::Config;
use cuebot_core::domain::{BatchOutcome, Trigger};
use cuebot_core::impls::{
    FsMediaLibrary, InMemoryStore, JsonFileStore, SimulatedObs, SimulatedRewards, TracingChat,
};
use cuebot_core::picker::WeightedPicker;
use cuebot_core::ports::{KeyValueStore, Reward};
use cuebot_core::queue::MediaPlayer;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// TOML config file. Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// JSON file holding the host globals (queue, history, durations).
    /// An in-memory store is used when omitted.
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Duration the simulated OBS reports for any loaded media.
    #[arg(long, global = true, default_value_t = 3_000)]
    duration_ms: i64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play media for a channel-point redemption.
    Redeem { name: String },
    /// Play media for a typed chat command.
    Command { name: String, input: Option<String> },
    /// Apply the reward and mic rules for a newly active scene.
    Scene { name: String },
    /// Print the stored queue state.
    Status,
    /// Run the fairness-weighted picker and print how often each item came up.
    Pick {
        #[arg(required = true)]
        items: Vec<String>,
        #[arg(long, default_value_t = 100)]
        rounds: u32,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Validate the config file.
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load_or_default(args.config.as_deref()).context("load config")?;
    init_tracing(&config);
    debug!(config = ?args.config, store = ?args.store, "cuebot starting");

    match args.command {
        Command::Redeem { ref name } => {
            let player = build_player(&args, &config)?;
            run_trigger(&player, Trigger::reward(name.clone())).await?;
        }
        Command::Command {
            ref name,
            ref input,
        } => {
            let player = build_player(&args, &config)?;
            run_trigger(&player, Trigger::command(name.clone(), input.clone())).await?;
        }
        Command::Scene { ref name } => apply_scene_rules(&config, name).await?,
        Command::Status => {
            let player = build_player(&args, &config)?;
            let status = player.status().await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Command::Pick {
            ref items,
            rounds,
            seed,
        } => pick(items, rounds, seed)?,
        Command::Check => check(&config)?,
    }

    Ok(())
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn open_store(path: Option<&PathBuf>) -> Result<Arc<dyn KeyValueStore>> {
    Ok(match path {
        Some(path) => Arc::new(
            JsonFileStore::open(path)
                .with_context(|| format!("open globals file {}", path.display()))?,
        ),
        None => Arc::new(InMemoryStore::new()),
    })
}

/// OBS stand-in showing the configured scene with the media source on it.
fn simulated_obs(config: &Config, duration_ms: i64) -> Arc<SimulatedObs> {
    let obs = SimulatedObs::new(config.obs.scene.clone());
    obs.add_source(&config.obs.scene, &config.obs.source);
    obs.set_default_duration(Some(duration_ms));
    Arc::new(obs)
}

fn build_player(args: &Args, config: &Config) -> Result<MediaPlayer> {
    let player = PlayerBuilder::from_config(config)
        .store(open_store(args.store.as_ref())?)
        .obs(simulated_obs(config, args.duration_ms))
        .library(FsMediaLibrary::new())
        .chat(TracingChat)
        .build()?;
    Ok(player)
}

async fn run_trigger(player: &MediaPlayer, trigger: Trigger) -> Result<()> {
    let outcome = player.handle(&trigger).await?;
    let output = match &outcome {
        BatchOutcome::Busy => json!({ "outcome": outcome.kind() }),
        BatchOutcome::Played(report) => json!({ "outcome": outcome.kind(), "report": report }),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn apply_scene_rules(config: &Config, scene: &str) -> Result<()> {
    let rules = &config.scene_rules;
    let rewards = Arc::new(SimulatedRewards::new(
        rules
            .rewards
            .rewards
            .iter()
            .enumerate()
            .map(|(i, title)| Reward {
                id: format!("reward-{i}"),
                title: title.clone(),
                is_ours: true,
                enabled: true,
                paused: false,
            })
            .collect(),
    ));
    let obs = Arc::new(SimulatedObs::new(scene));

    let changed = RewardSceneRule::new(rewards.clone(), rules.rewards.clone())
        .apply(scene)
        .await?;
    let muted = MicSceneRule::new(obs, rules.mic.clone()).apply(scene).await?;

    let output = json!({
        "scene": scene,
        "rewards_changed": changed,
        "rewards": rewards.snapshot(),
        "mic_muted": muted,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn pick(items: &[String], rounds: u32, seed: Option<u64>) -> Result<()> {
    let mut picker = match seed {
        Some(seed) => WeightedPicker::with_seed(items.iter().cloned(), seed),
        None => WeightedPicker::from_entropy(items.iter().cloned()),
    };
    let mut sequence = Vec::with_capacity(rounds as usize);
    for _ in 0..rounds {
        sequence.push(picker.pick()?);
    }

    let counts: serde_json::Map<String, serde_json::Value> = picker
        .counts()
        .map(|(item, count)| (item.clone(), json!(count)))
        .collect();
    let output = json!({
        "seed": seed,
        "rounds": rounds,
        "total_selections": picker.total_selections(),
        "counts": counts,
        "sequence": sequence,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn check(config: &Config) -> Result<()> {
    let problems = config.problems();
    if problems.is_empty() {
        println!("config ok");
        return Ok(());
    }
    for problem in &problems {
        println!("- {problem}");
    }
    bail!("{} config problem(s)", problems.len())
}
