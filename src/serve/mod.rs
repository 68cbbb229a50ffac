// src/serve/mod.rs
//
// Decision-serving layer: stateless request handlers over a shared
// PolicyAdapter. The adapter is injected at construction and treated as
// immutable, so one server instance is safe to share across sessions.

pub mod compare;
pub mod http;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::rl::policy::{ModelStatus, PolicyAdapter, NO_MODEL_EXPLANATION};
use crate::types::WIRE_ACTION_LEN;

pub use compare::{ComparisonEngine, ComparisonReport, Divergence};

/// Placeholder probability attached to the first synthetic alternative.
pub const ALTERNATIVE_PROBABILITY_RESOURCE: f64 = 0.10;
/// Placeholder probability attached to the second synthetic alternative.
pub const ALTERNATIVE_PROBABILITY_ZONE: f64 = 0.05;

/// Suggested action for a single observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub action: [u32; WIRE_ACTION_LEN],
    pub confidence: f64,
    pub explanation: String,
}

/// A synthetic nearby action shown alongside an explanation.
///
/// The probability is an illustrative constant, not sampled from the policy
/// distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlternativeAction {
    pub action: [u32; WIRE_ACTION_LEN],
    pub probability: f64,
}

/// Detailed explanation of a decision.
///
/// The reasoning bullets are fixed presentation strings, not derived from
/// model internals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub action: [u32; WIRE_ACTION_LEN],
    pub action_description: String,
    pub reasoning: Vec<String>,
    pub confidence: f64,
    pub alternative_actions: Vec<AlternativeAction>,
}

/// Stateless decision handlers over an injected adapter.
#[derive(Debug, Clone)]
pub struct DecisionServer {
    adapter: Arc<PolicyAdapter>,
}

impl DecisionServer {
    pub fn new(adapter: Arc<PolicyAdapter>) -> Self {
        Self { adapter }
    }

    pub fn adapter(&self) -> &Arc<PolicyAdapter> {
        &self.adapter
    }

    /// Suggest an action for the observation.
    ///
    /// Works with or without a trained artifact; the fallback announces
    /// itself in the explanation text and a zero confidence.
    pub fn predict(&self, observation: &[f64]) -> Result<Prediction> {
        let (action, confidence) = self.adapter.predict(observation, true)?;

        let explanation = if self.adapter.is_model_loaded() {
            format!(
                "Action: {} - Resource #{} to Zone #{}",
                action.action_type.label(),
                action.resource_id,
                action.target_zone
            )
        } else {
            NO_MODEL_EXPLANATION.to_string()
        };

        Ok(Prediction {
            action: action.to_wire(),
            confidence,
            explanation,
        })
    }

    /// Explain the decision for the observation.
    ///
    /// Requires a loaded artifact. Alternatives are generated by stepping
    /// the resource and zone indices modulo their ranges.
    pub fn explain(&self, observation: &[f64]) -> Result<Explanation> {
        if !self.adapter.is_model_loaded() {
            return Err(Error::ResourceUnavailable);
        }

        let (action, confidence) = self.adapter.predict(observation, true)?;
        let space = self.adapter.action_space();
        let wire = action.to_wire();

        let alternative_actions = vec![
            AlternativeAction {
                action: [
                    wire[0],
                    ((action.resource_id + 1) % space.num_resources) as u32,
                    wire[2],
                ],
                probability: ALTERNATIVE_PROBABILITY_RESOURCE,
            },
            AlternativeAction {
                action: [
                    wire[0],
                    wire[1],
                    ((action.target_zone + 1) % space.num_zones) as u32,
                ],
                probability: ALTERNATIVE_PROBABILITY_ZONE,
            },
        ];

        Ok(Explanation {
            action: wire,
            action_description: format!(
                "{} to Zone {}",
                action.action_type.label(),
                action.target_zone
            ),
            reasoning: vec![
                "High casualty risk detected in target zone".to_string(),
                "Resource availability confirmed".to_string(),
                "Road network accessible".to_string(),
                "Shelter capacity available".to_string(),
            ],
            confidence,
            alternative_actions,
        })
    }

    /// Report whether a trained artifact is loaded. Never fails; callers
    /// that reach this server remotely fold transport failures into
    /// `ModelStatus::unavailable()` themselves.
    pub fn model_status(&self) -> ModelStatus {
        self.adapter.status()
    }
}
