// src/rl/policy.rs
//
// Decision policies over encoded observations.
//
// Two implementations share one trait: a trained linear scoring policy
// loaded from a JSON artifact, and the uniform-random fallback that keeps
// the serving layer available when no artifact is usable. Loading never
// fails outward; a broken artifact is observable only through ModelStatus.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{Action, ActionSpace, ActionType};

use super::observation::ObservationSpec;

/// Current policy artifact schema version.
pub const ARTIFACT_VERSION: u32 = 1;

/// Placeholder confidence reported for a loaded artifact. Not derived from
/// the policy distribution; callers must not treat it as a probability.
pub const TRAINED_CONFIDENCE: f64 = 0.85;
/// Confidence reported by the random fallback.
pub const RANDOM_CONFIDENCE: f64 = 0.0;
/// Explanation attached to fallback predictions.
pub const NO_MODEL_EXPLANATION: &str = "Random action (no model loaded)";

/// A decision policy mapping observations to actions.
///
/// Implementations are shared read-only across sessions; `predict` must not
/// mutate state observable by other callers.
pub trait Policy: Send + Sync {
    /// Stable identifier for status reporting.
    fn model_type(&self) -> &'static str;

    /// Choose an action for the observation.
    ///
    /// With `deterministic` set, the same observation must map to the same
    /// action for the lifetime of the process. Returns the action and a
    /// confidence score.
    fn predict(&self, observation: &[f64], deterministic: bool) -> (Action, f64);
}

/// Uniform-random fallback policy.
///
/// Draws each component independently from its valid range. The observation
/// content is ignored; only the action space matters.
#[derive(Debug, Clone, Copy)]
pub struct RandomPolicy {
    space: ActionSpace,
}

impl RandomPolicy {
    pub fn new(space: ActionSpace) -> Self {
        Self { space }
    }
}

impl Policy for RandomPolicy {
    fn model_type(&self) -> &'static str {
        "random"
    }

    fn predict(&self, _observation: &[f64], _deterministic: bool) -> (Action, f64) {
        let mut rng = rand::thread_rng();
        let action = Action {
            action_type: ActionType::ALL[rng.gen_range(0..ActionType::COUNT)],
            resource_id: rng.gen_range(0..self.space.num_resources),
            target_zone: rng.gen_range(0..self.space.num_zones),
        };
        (action, RANDOM_CONFIDENCE)
    }
}

/// One linear scoring head: `logits = W * obs + b`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearHead {
    /// Row per output, column per observation feature.
    pub weights: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
}

impl LinearHead {
    fn logits(&self, observation: &[f64]) -> Vec<f64> {
        self.weights
            .iter()
            .zip(&self.bias)
            .map(|(row, b)| {
                row.iter()
                    .zip(observation)
                    .map(|(w, x)| w * x)
                    .sum::<f64>()
                    + b
            })
            .collect()
    }

    fn validate(&self, outputs: usize, obs_dim: usize, name: &str) -> Result<()> {
        if self.weights.len() != outputs || self.bias.len() != outputs {
            return Err(Error::Validation(format!(
                "{} head must have {} outputs",
                name, outputs
            )));
        }
        if let Some(row) = self.weights.iter().find(|row| row.len() != obs_dim) {
            return Err(Error::Validation(format!(
                "{} head row has {} features, expected {}",
                name,
                row.len(),
                obs_dim
            )));
        }
        Ok(())
    }
}

/// Serialized form of a trained policy.
///
/// Produced by the external training harness; the serving process only ever
/// reads it. Three independent heads score action type, resource, and zone
/// over the same observation vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyArtifact {
    pub version: u32,
    pub obs_dim: usize,
    pub num_resources: usize,
    pub num_zones: usize,
    pub type_head: LinearHead,
    pub resource_head: LinearHead,
    pub zone_head: LinearHead,
}

impl PolicyArtifact {
    /// Read and structurally validate an artifact file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|e| Error::Validation(format!("cannot read artifact: {e}")))?;
        let artifact: PolicyArtifact = serde_json::from_str(&raw)
            .map_err(|e| Error::Validation(format!("cannot parse artifact: {e}")))?;
        artifact.validate()?;
        Ok(artifact)
    }

    pub fn validate(&self) -> Result<()> {
        if self.version != ARTIFACT_VERSION {
            return Err(Error::Validation(format!(
                "unsupported artifact version {}",
                self.version
            )));
        }
        self.type_head
            .validate(ActionType::COUNT, self.obs_dim, "type")?;
        self.resource_head
            .validate(self.num_resources, self.obs_dim, "resource")?;
        self.zone_head.validate(self.num_zones, self.obs_dim, "zone")?;
        Ok(())
    }
}

/// Trained policy: per-head argmax when deterministic, per-head softmax
/// sampling otherwise. Argmax ties break toward the lower index, which
/// keeps deterministic prediction reproducible across calls.
pub struct LinearPolicy {
    artifact: PolicyArtifact,
}

impl LinearPolicy {
    pub fn new(artifact: PolicyArtifact) -> Self {
        Self { artifact }
    }

    fn choose(logits: &[f64], deterministic: bool) -> usize {
        if deterministic {
            argmax(logits)
        } else {
            sample_softmax(logits, &mut rand::thread_rng())
        }
    }
}

impl fmt::Debug for LinearPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinearPolicy")
            .field("obs_dim", &self.artifact.obs_dim)
            .field("num_resources", &self.artifact.num_resources)
            .field("num_zones", &self.artifact.num_zones)
            .finish()
    }
}

impl Policy for LinearPolicy {
    fn model_type(&self) -> &'static str {
        "linear"
    }

    fn predict(&self, observation: &[f64], deterministic: bool) -> (Action, f64) {
        let type_idx = Self::choose(&self.artifact.type_head.logits(observation), deterministic);
        let resource_id = Self::choose(
            &self.artifact.resource_head.logits(observation),
            deterministic,
        );
        let target_zone =
            Self::choose(&self.artifact.zone_head.logits(observation), deterministic);

        let action = Action {
            action_type: ActionType::ALL[type_idx],
            resource_id,
            target_zone,
        };
        (action, TRAINED_CONFIDENCE)
    }
}

/// Index of the largest logit, lowest index on ties.
fn argmax(logits: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in logits.iter().enumerate() {
        if v > logits[best] {
            best = i;
        }
    }
    best
}

/// Sample an index from the softmax distribution over logits.
fn sample_softmax<R: Rng>(logits: &[f64], rng: &mut R) -> usize {
    let max = logits.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let weights: Vec<f64> = logits.iter().map(|&l| (l - max).exp()).collect();
    let total: f64 = weights.iter().sum();

    let mut threshold = rng.gen::<f64>() * total;
    for (i, w) in weights.iter().enumerate() {
        threshold -= w;
        if threshold <= 0.0 {
            return i;
        }
    }
    logits.len() - 1
}

/// Loaded-model introspection for the serving surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelStatus {
    pub model_loaded: bool,
    pub model_path: Option<String>,
    pub model_type: String,
}

impl ModelStatus {
    /// Degraded status reported when the serving process is unreachable.
    pub fn unavailable() -> Self {
        Self {
            model_loaded: false,
            model_path: None,
            model_type: "unavailable".to_string(),
        }
    }
}

/// The capability handed to the serving layer: a policy plus the contracts
/// needed to validate inputs against it.
///
/// Construction never fails. A missing or unusable artifact falls back to
/// the random policy; the only trace of the failure is the status report.
pub struct PolicyAdapter {
    policy: Box<dyn Policy>,
    obs_spec: ObservationSpec,
    space: ActionSpace,
    model_loaded: bool,
    model_path: Option<PathBuf>,
}

impl PolicyAdapter {
    /// Load an artifact if a path is given and it is compatible with the
    /// configured scenario; otherwise fall back to the random policy.
    pub fn load(path: Option<&Path>, obs_spec: ObservationSpec, space: ActionSpace) -> Self {
        let Some(path) = path else {
            return Self::random(obs_spec, space);
        };

        match PolicyArtifact::from_path(path) {
            Ok(artifact)
                if artifact.obs_dim == obs_spec.dim()
                    && artifact.num_resources == space.num_resources
                    && artifact.num_zones == space.num_zones =>
            {
                Self {
                    policy: Box::new(LinearPolicy::new(artifact)),
                    obs_spec,
                    space,
                    model_loaded: true,
                    model_path: Some(path.to_path_buf()),
                }
            }
            Ok(_) => {
                eprintln!(
                    "policy artifact {} does not match scenario shape; using random policy",
                    path.display()
                );
                Self {
                    model_path: Some(path.to_path_buf()),
                    ..Self::random(obs_spec, space)
                }
            }
            Err(err) => {
                eprintln!(
                    "failed to load policy artifact {}: {err}; using random policy",
                    path.display()
                );
                Self {
                    model_path: Some(path.to_path_buf()),
                    ..Self::random(obs_spec, space)
                }
            }
        }
    }

    /// Adapter with the uniform-random policy.
    pub fn random(obs_spec: ObservationSpec, space: ActionSpace) -> Self {
        Self {
            policy: Box::new(RandomPolicy::new(space)),
            obs_spec,
            space,
            model_loaded: false,
            model_path: None,
        }
    }

    /// Validate the observation and delegate to the policy.
    pub fn predict(&self, observation: &[f64], deterministic: bool) -> Result<(Action, f64)> {
        self.obs_spec.validate(observation)?;
        Ok(self.policy.predict(observation, deterministic))
    }

    pub fn is_model_loaded(&self) -> bool {
        self.model_loaded
    }

    pub fn action_space(&self) -> ActionSpace {
        self.space
    }

    pub fn observation_spec(&self) -> ObservationSpec {
        self.obs_spec
    }

    pub fn status(&self) -> ModelStatus {
        ModelStatus {
            model_loaded: self.model_loaded,
            model_path: self
                .model_path
                .as_ref()
                .map(|p| p.display().to_string()),
            model_type: self.policy.model_type().to_string(),
        }
    }
}

impl fmt::Debug for PolicyAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicyAdapter")
            .field("model_loaded", &self.model_loaded)
            .field("model_type", &self.policy.model_type())
            .field("space", &self.space)
            .finish()
    }
}
