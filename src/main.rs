// src/main.rs
//
// Research-harness CLI entrypoint.
//
// Runs N episodes of a configured scenario under the policy adapter
// (random fallback unless an artifact path is given). Deterministic per
// --seed; episode e uses seed + e. Optional JSONL step log.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{ArgAction, Parser, ValueEnum};

use aegis::config::{resolve_effective_profile, ScenarioProfile};
use aegis::engine::TransitionEngine;
use aegis::logging::{EventSink, FileSink, NoopSink};
use aegis::rl::observation::{encode, ObservationSpec};
use aegis::rl::policy::PolicyAdapter;
use aegis::state::WorldState;
use aegis::types::ActionSpace;

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ProfileArg {
    Drill,
    Moderate,
    Severe,
}

#[derive(Debug, Parser)]
#[command(
    name = "aegis",
    about = "Disaster-response simulator + policy rollout harness",
    version
)]
struct Args {
    /// Number of episodes to run.
    #[arg(long, default_value_t = 1)]
    episodes: u64,

    /// Base seed; episode e runs with seed + e.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Scenario severity preset (optional).
    /// If omitted, uses AEGIS_SCENARIO_PROFILE (default moderate).
    #[arg(long, value_enum)]
    profile: Option<ProfileArg>,

    /// Override: number of population zones.
    #[arg(long)]
    zones: Option<usize>,

    /// Override: number of shelters.
    #[arg(long)]
    shelters: Option<usize>,

    /// Override: number of mobile resources.
    #[arg(long)]
    resources: Option<usize>,

    /// Override: episode length in steps.
    #[arg(long)]
    timesteps: Option<u64>,

    /// Override: disaster intensity in [0,1].
    #[arg(long)]
    intensity: Option<f64>,

    /// Policy artifact to load (falls back to random if unusable).
    #[arg(long)]
    model_path: Option<PathBuf>,

    /// Write per-step JSONL telemetry to this file.
    #[arg(long)]
    log: Option<PathBuf>,

    /// Verbosity: -v prints per-step lines.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let cli_profile = args.profile.map(|p| match p {
        ProfileArg::Drill => ScenarioProfile::Drill,
        ProfileArg::Moderate => ScenarioProfile::Moderate,
        ProfileArg::Severe => ScenarioProfile::Severe,
    });

    // Profile precedence: CLI > env > default. Individual flags override
    // whatever the profile chose.
    let effective = resolve_effective_profile(cli_profile);
    effective.log_startup();

    let mut config = effective.profile.config();
    if let Some(z) = args.zones {
        config.num_zones = z;
    }
    if let Some(s) = args.shelters {
        config.num_shelters = s;
    }
    if let Some(r) = args.resources {
        config.num_resources = r;
    }
    if let Some(t) = args.timesteps {
        config.max_timesteps = t;
    }
    if let Some(i) = args.intensity {
        config.disaster_intensity = i;
    }
    config.validate().context("scenario configuration")?;

    let adapter = Arc::new(PolicyAdapter::load(
        args.model_path.as_deref(),
        ObservationSpec::from_config(&config),
        ActionSpace::new(config.num_resources, config.num_zones),
    ));

    println!(
        "aegis | zones={} shelters={} resources={} timesteps={} intensity={} | episodes={} seed={} | model={}",
        config.num_zones,
        config.num_shelters,
        config.num_resources,
        config.max_timesteps,
        config.disaster_intensity,
        args.episodes,
        args.seed,
        adapter.status().model_type,
    );

    let mut sink: Box<dyn EventSink> = match &args.log {
        Some(path) => {
            let path = path.to_str().context("log path must be valid UTF-8")?;
            Box::new(FileSink::create(path).context("creating step log")?)
        }
        None => Box::new(NoopSink),
    };

    let engine = TransitionEngine::default();

    for episode in 0..args.episodes {
        let seed = args.seed + episode;
        let mut world = WorldState::reset(&config, seed)?;

        let mut episode_reward = 0.0;
        let mut failed_actions = 0u64;

        loop {
            let observation = encode(&world);
            let (action, _confidence) = adapter.predict(&observation, false)?;

            let outcome = engine.step(&mut world, &action);
            sink.log_step(&world, &action, &outcome);

            episode_reward += outcome.reward;
            if !outcome.action_success {
                failed_actions += 1;
            }

            if args.verbose > 0 {
                println!(
                    "  step {:>3} | reward {:>10.3} | casualties {:>9.2} | evacuated {:>8.0}",
                    world.current_step, outcome.reward, world.total_casualties,
                    world.total_evacuated,
                );
            }

            if outcome.terminated {
                println!(
                    "episode {:>3} | seed {} | reward {:>11.3} | casualties {:>9.2} | evacuated {:>8.0} ({:>5.1}%) | failed_actions {}",
                    episode,
                    seed,
                    episode_reward,
                    world.total_casualties,
                    world.total_evacuated,
                    world.evacuation_rate() * 100.0,
                    failed_actions,
                );
                break;
            }
        }
    }

    Ok(())
}
