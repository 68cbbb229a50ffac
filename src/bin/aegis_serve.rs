// src/bin/aegis_serve.rs
//
// Decision-server binary: loads the policy artifact (random fallback if
// missing or unusable) and serves predict / explain / evaluate / status
// over HTTP until killed.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use aegis::config::ScenarioConfig;
use aegis::rl::observation::ObservationSpec;
use aegis::rl::policy::PolicyAdapter;
use aegis::serve::http::{run_decision_server, HealthState, ServeMetrics};
use aegis::types::ActionSpace;

/// Env var consulted when --model-path is not given.
const MODEL_PATH_ENV_VAR: &str = "AEGIS_MODEL_PATH";

#[derive(Debug, Parser)]
#[command(
    name = "aegis_serve",
    about = "Decision server for the disaster-response policy",
    version
)]
struct Args {
    /// Listen address.
    #[arg(long, default_value = "0.0.0.0:8001")]
    addr: String,

    /// Policy artifact path. Falls back to AEGIS_MODEL_PATH, then to the
    /// random policy.
    #[arg(long)]
    model_path: Option<PathBuf>,

    /// Zones the served policy was trained against.
    #[arg(long, default_value_t = 25)]
    zones: usize,

    /// Shelters the served policy was trained against.
    #[arg(long, default_value_t = 5)]
    shelters: usize,

    /// Resources the served policy was trained against.
    #[arg(long, default_value_t = 10)]
    resources: usize,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let model_path = args
        .model_path
        .or_else(|| std::env::var(MODEL_PATH_ENV_VAR).ok().map(PathBuf::from));

    let config = ScenarioConfig {
        num_zones: args.zones,
        num_shelters: args.shelters,
        num_resources: args.resources,
        ..ScenarioConfig::default()
    };

    let adapter = Arc::new(PolicyAdapter::load(
        model_path.as_deref(),
        ObservationSpec::from_config(&config),
        ActionSpace::new(config.num_resources, config.num_zones),
    ));

    let status = adapter.status();
    println!(
        "aegis_serve | addr={} | zones={} shelters={} resources={} | model_loaded={} | model_type={} | model_path={}",
        args.addr,
        config.num_zones,
        config.num_shelters,
        config.num_resources,
        status.model_loaded,
        status.model_type,
        status.model_path.as_deref().unwrap_or("none"),
    );

    let metrics = ServeMetrics::new();
    let health = HealthState::new();
    health.set_ready(true);

    run_decision_server(&args.addr, adapter, metrics, health)?;
    Ok(())
}
