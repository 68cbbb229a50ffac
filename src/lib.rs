//! Aegis core library.
//!
//! A deterministic-plus-stochastic disaster-response simulator and the
//! serving layer that wraps a trained decision policy. The binaries are
//! thin harnesses around these components.
//!
//! # Architecture
//!
//! The codebase separates the simulation core from the serving surface:
//!
//! - **State** (`state`): one `WorldState` per simulation session, created
//!   by `reset` with an explicit seed and owning its own RNG.
//!
//! - **Engine** (`engine`): the single mutator of `WorldState`. Applies one
//!   action per step, advances disaster progression, accrues casualties,
//!   and prices the step.
//!
//! - **RL surface** (`rl`): the observation encoding contract, the policy
//!   capability (trained artifact or random fallback), and the gym-style
//!   `DisasterEnv` / `VecEnv` entry points the training harness drives.
//!
//! - **Serving** (`serve`): stateless prediction / explanation /
//!   comparison handlers over an injected `PolicyAdapter`, plus the HTTP
//!   surface with health and metrics endpoints.
//!
//! Sessions never share state; the serving layer is read-only after
//! construction and safe to call concurrently.

pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod reward;
pub mod rl;
pub mod serve;
pub mod state;
pub mod types;

// --- Re-exports for ergonomic external use ---------------------------------

pub use config::{
    resolve_effective_profile, EffectiveProfile, ProfileSource, ScenarioConfig, ScenarioProfile,
};

pub use error::{Error, Result};

pub use engine::{StepOutcome, TransitionEngine};

pub use logging::{EventSink, FileSink, NoopSink};

pub use reward::{RewardComponents, RewardWeights};

pub use state::{Resource, RoadNetwork, Shelter, WorldState, Zone};

pub use types::{Action, ActionSpace, ActionType, ResourceKind};

pub use rl::{
    encode, DisasterEnv, LinearPolicy, ModelStatus, ObservationSpec, Policy, PolicyAdapter,
    PolicyArtifact, RandomPolicy, StepInfo, StepResult, VecEnv, ARTIFACT_VERSION,
    NO_MODEL_EXPLANATION, OBS_VERSION, RANDOM_CONFIDENCE, TRAINED_CONFIDENCE,
};

pub use serve::{
    http::{run_decision_server, start_decision_server, HealthState, ServeMetrics},
    AlternativeAction, ComparisonEngine, ComparisonReport, DecisionServer, Divergence,
    Explanation, Prediction,
};
