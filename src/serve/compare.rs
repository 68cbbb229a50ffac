// src/serve/compare.rs
//
// Human-vs-policy comparison over a recorded trace.
//
// For each recorded observation the policy's deterministic action is
// computed and compared against the human action at the same index.
// Agreement is judged on action type alone; divergence records carry both
// actions for the caller's drill-down views.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::rl::policy::PolicyAdapter;
use crate::types::{Action, WIRE_ACTION_LEN};

/// One timestep where the human and the policy disagreed.
///
/// Only mismatches are recorded, so `matched` is always false on emitted
/// records; it is kept explicit for consumers that merge traces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Divergence {
    pub timestep: usize,
    pub human_action: [u32; WIRE_ACTION_LEN],
    pub ai_action: [u32; WIRE_ACTION_LEN],
    pub matched: bool,
}

/// Full comparison result for a trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    /// Fraction of steps where the action types agreed; 0 for empty traces.
    pub agreement_rate: f64,
    pub ai_actions: Vec<[u32; WIRE_ACTION_LEN]>,
    pub divergences: Vec<Divergence>,
    pub total_steps: usize,
}

/// Compares recorded human traces against the trained policy.
///
/// Unlike prediction, comparison refuses to run on the random fallback:
/// agreement against noise is meaningless, so a missing artifact is fatal
/// for this call.
#[derive(Debug, Clone)]
pub struct ComparisonEngine {
    adapter: Arc<PolicyAdapter>,
}

impl ComparisonEngine {
    pub fn new(adapter: Arc<PolicyAdapter>) -> Self {
        Self { adapter }
    }

    /// Compare a trace of observations against the paired human actions.
    ///
    /// Observations and actions are paired positionally and must have equal
    /// length; anything else is a hard validation error, never a silent
    /// truncation.
    pub fn compare(
        &self,
        observations: &[Vec<f64>],
        human_actions: &[Action],
    ) -> Result<ComparisonReport> {
        if !self.adapter.is_model_loaded() {
            return Err(Error::ResourceUnavailable);
        }
        if observations.len() != human_actions.len() {
            return Err(Error::Validation(format!(
                "trace length mismatch: {} observations vs {} actions",
                observations.len(),
                human_actions.len()
            )));
        }

        let mut ai_actions = Vec::with_capacity(observations.len());
        let mut divergences = Vec::new();
        let mut agreements = 0usize;

        for (timestep, (observation, human)) in
            observations.iter().zip(human_actions).enumerate()
        {
            let (ai_action, _) = self.adapter.predict(observation, true)?;
            if ai_action.action_type == human.action_type {
                agreements += 1;
            } else {
                divergences.push(Divergence {
                    timestep,
                    human_action: human.to_wire(),
                    ai_action: ai_action.to_wire(),
                    matched: false,
                });
            }
            ai_actions.push(ai_action.to_wire());
        }

        let total_steps = human_actions.len();
        let agreement_rate = if total_steps > 0 {
            agreements as f64 / total_steps as f64
        } else {
            0.0
        };

        Ok(ComparisonReport {
            agreement_rate,
            ai_actions,
            divergences,
            total_steps,
        })
    }
}
