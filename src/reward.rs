// src/reward.rs
//
// Reward weights and per-step reward breakdown.
//
// The scalar reward is a weighted mix of running totals plus the per-step
// casualty and failure terms. Defaults preserve the reference constants;
// the weights struct exists so research runs can re-balance terms without
// touching the engine.

use serde::{Deserialize, Serialize};

use crate::state::WorldState;

/// Weights applied to each reward term.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RewardWeights {
    /// Penalty per new casualty this step.
    pub casualty_penalty: f64,
    /// Reward per unit of cumulative evacuation rate.
    pub evacuation_reward: f64,
    /// Cost per committed resource (cumulative count).
    pub resource_cost: f64,
    /// Flat penalty when the step's action failed.
    pub failure_penalty: f64,
    /// Flat bonus when the efficiency criteria are met.
    pub efficiency_bonus: f64,
    /// Evacuation rate that must be exceeded for the bonus.
    pub efficiency_evacuation_rate: f64,
    /// Cumulative casualties must stay below this for the bonus.
    pub efficiency_casualty_limit: f64,
}

impl Default for RewardWeights {
    fn default() -> Self {
        Self {
            casualty_penalty: 100.0,
            evacuation_reward: 50.0,
            resource_cost: 0.1,
            failure_penalty: 5.0,
            efficiency_bonus: 100.0,
            efficiency_evacuation_rate: 0.8,
            efficiency_casualty_limit: 10.0,
        }
    }
}

/// Weighted reward terms for one step. Summing them reproduces the scalar
/// reward exactly, which keeps step logs reconstructible.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RewardComponents {
    /// `-casualty_penalty * new_casualties` (per-step delta).
    pub casualty_penalty: f64,
    /// `+evacuation_reward * evacuation_rate` (running total).
    pub evacuation_reward: f64,
    /// `-resource_cost * resources_used` (running total).
    pub resource_cost: f64,
    /// `-failure_penalty` if the action failed, else 0.
    pub failure_penalty: f64,
    /// `+efficiency_bonus` if both criteria hold, else 0.
    pub efficiency_bonus: f64,
}

impl RewardComponents {
    /// Compute the breakdown from post-accrual world totals.
    pub fn from_step(
        world: &WorldState,
        new_casualties: f64,
        action_success: bool,
        weights: &RewardWeights,
    ) -> Self {
        let evacuation_rate = world.evacuation_rate();

        let efficiency_met = evacuation_rate > weights.efficiency_evacuation_rate
            && world.total_casualties < weights.efficiency_casualty_limit;

        Self {
            casualty_penalty: -weights.casualty_penalty * new_casualties,
            evacuation_reward: weights.evacuation_reward * evacuation_rate,
            resource_cost: -weights.resource_cost * world.resources_used as f64,
            failure_penalty: if action_success {
                0.0
            } else {
                -weights.failure_penalty
            },
            efficiency_bonus: if efficiency_met {
                weights.efficiency_bonus
            } else {
                0.0
            },
        }
    }

    /// Scalar reward for the step.
    pub fn total(&self) -> f64 {
        self.casualty_penalty
            + self.evacuation_reward
            + self.resource_cost
            + self.failure_penalty
            + self.efficiency_bonus
    }
}
