// src/rl/sim_env.rs
//
// Gym-style environment around the transition engine:
// - DisasterEnv: single environment (reset, step)
// - VecEnv: N independent environments for parallel rollouts
//
// Deterministic given seeds. The training harness drives these two entry
// points and nothing else.

use serde::{Deserialize, Serialize};

use crate::config::ScenarioConfig;
use crate::engine::{StepOutcome, TransitionEngine};
use crate::error::{Error, Result};
use crate::reward::{RewardComponents, RewardWeights};
use crate::state::WorldState;
use crate::types::{Action, ActionSpace};

use super::observation::{encode, ObservationSpec};

/// Info bag attached to every reset/step result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepInfo {
    /// Steps completed so far.
    pub timestep: u64,
    /// Whether this step's action had its intended effect (true at reset).
    pub action_success: bool,
    pub total_casualties: f64,
    pub total_evacuated: f64,
    pub evacuation_rate: f64,
    pub resources_used: u64,
    pub average_risk: f64,
    /// Reward breakdown; absent at reset.
    pub reward_components: Option<RewardComponents>,
}

impl StepInfo {
    fn from_world(world: &WorldState, action_success: bool) -> Self {
        Self {
            timestep: world.current_step,
            action_success,
            total_casualties: world.total_casualties,
            total_evacuated: world.total_evacuated,
            evacuation_rate: world.evacuation_rate(),
            resources_used: world.resources_used,
            average_risk: world.average_risk(),
            reward_components: None,
        }
    }
}

/// Result of a single environment step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    /// Observation after the step.
    pub observation: Vec<f64>,
    pub reward: f64,
    pub terminated: bool,
    /// Always false in this model.
    pub truncated: bool,
    pub info: StepInfo,
}

/// Single disaster-response environment.
///
/// Owns exactly one WorldState per episode; the engine invoked here is the
/// only mutator of that state. Seeds are explicit; there is no hidden
/// generator behind `reset`.
#[derive(Debug, Clone)]
pub struct DisasterEnv {
    config: ScenarioConfig,
    engine: TransitionEngine,
    world: Option<WorldState>,
    done: bool,
}

impl DisasterEnv {
    pub fn new(config: ScenarioConfig) -> Self {
        Self::with_weights(config, RewardWeights::default())
    }

    /// Construction is infallible; configuration problems surface from the
    /// first `reset`.
    pub fn with_weights(config: ScenarioConfig, weights: RewardWeights) -> Self {
        Self {
            config,
            engine: TransitionEngine::new(weights),
            world: None,
            done: false,
        }
    }

    /// Begin a new episode. Returns the initial observation and info bag.
    pub fn reset(&mut self, seed: u64) -> Result<(Vec<f64>, StepInfo)> {
        let world = WorldState::reset(&self.config, seed)?;
        let observation = encode(&world);
        let info = StepInfo::from_world(&world, true);
        self.world = Some(world);
        self.done = false;
        Ok((observation, info))
    }

    /// Advance one step. Stepping a finished episode returns the terminal
    /// observation with zero reward and no further state change.
    pub fn step(&mut self, action: &Action) -> Result<StepResult> {
        let action_space = self.action_space();
        let world = self
            .world
            .as_mut()
            .ok_or_else(|| Error::Validation("environment must be reset before stepping".into()))?;

        if self.done {
            let info = StepInfo::from_world(world, true);
            return Ok(StepResult {
                observation: encode(world),
                reward: 0.0,
                terminated: true,
                truncated: false,
                info,
            });
        }

        if !action_space.contains(action) {
            return Err(Error::Validation(format!(
                "action {:?} outside scenario bounds",
                action.to_wire()
            )));
        }

        let outcome: StepOutcome = self.engine.step(world, action);
        self.done = outcome.terminated;

        let mut info = StepInfo::from_world(world, outcome.action_success);
        info.reward_components = Some(outcome.components);

        Ok(StepResult {
            observation: encode(world),
            reward: outcome.reward,
            terminated: outcome.terminated,
            truncated: outcome.truncated,
            info,
        })
    }

    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    pub fn observation_spec(&self) -> ObservationSpec {
        ObservationSpec::from_config(&self.config)
    }

    pub fn action_space(&self) -> ActionSpace {
        ActionSpace::new(self.config.num_resources, self.config.num_zones)
    }

    /// Current world (for tests and harness reporting).
    pub fn world(&self) -> Option<&WorldState> {
        self.world.as_ref()
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn seed(&self) -> Option<u64> {
        self.world.as_ref().map(|w| w.seed)
    }
}

/// Vectorised environment: N independent sessions stepped together.
///
/// Sessions never share a WorldState, so stepping them in any order (or in
/// parallel from the training harness) is safe.
#[derive(Debug, Clone)]
pub struct VecEnv {
    envs: Vec<DisasterEnv>,
}

impl VecEnv {
    pub fn new(n: usize, config: ScenarioConfig) -> Self {
        Self {
            envs: (0..n).map(|_| DisasterEnv::new(config)).collect(),
        }
    }

    pub fn num_envs(&self) -> usize {
        self.envs.len()
    }

    /// Reset every environment with its own explicit seed.
    pub fn reset_all(&mut self, seeds: &[u64]) -> Result<Vec<(Vec<f64>, StepInfo)>> {
        if seeds.len() != self.envs.len() {
            return Err(Error::Validation(format!(
                "expected {} seeds, got {}",
                self.envs.len(),
                seeds.len()
            )));
        }
        self.envs
            .iter_mut()
            .zip(seeds)
            .map(|(env, &seed)| env.reset(seed))
            .collect()
    }

    /// Step every environment with its paired action.
    pub fn step(&mut self, actions: &[Action]) -> Result<Vec<StepResult>> {
        if actions.len() != self.envs.len() {
            return Err(Error::Validation(format!(
                "expected {} actions, got {}",
                self.envs.len(),
                actions.len()
            )));
        }
        self.envs
            .iter_mut()
            .zip(actions)
            .map(|(env, action)| env.step(action))
            .collect()
    }

    pub fn dones(&self) -> Vec<bool> {
        self.envs.iter().map(|e| e.is_done()).collect()
    }

    pub fn envs(&self) -> &[DisasterEnv] {
        &self.envs
    }
}
