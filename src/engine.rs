// src/engine.rs
//
// The state-transition engine: applies one action to a WorldState, advances
// disaster progression, accrues casualties, and prices the step.
//
// This is the single mutator of WorldState. A failed action never aborts a
// step; it is recorded on the outcome and penalized in the reward, while
// progression and casualty accrual still run.

use serde::{Deserialize, Serialize};

use crate::reward::{RewardComponents, RewardWeights};
use crate::state::WorldState;
use crate::types::{Action, ActionType};

/// Hard cap on people moved by one EVACUATE_ZONE action.
pub const EVACUEES_PER_ACTION: f64 = 50.0;
/// Multiplier applied to a zone's risk by a dispatch action.
pub const DISPATCH_RISK_RELIEF: f64 = 0.9;
/// Per-step multiplicative risk intensification.
pub const RISK_GROWTH: f64 = 1.02;
/// Upper bound of the per-link uniform road decay per step.
pub const ROAD_DECAY_MAX: f64 = 0.01;
/// Fraction of unprotected population lost per unit of risk per step.
pub const CASUALTY_RATE: f64 = 0.01;

/// What one step did to the world.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    /// Whether the action had its intended effect.
    pub action_success: bool,
    /// Casualties accrued across all zones this step.
    pub new_casualties: f64,
    /// Scalar reward for the step.
    pub reward: f64,
    /// Weighted reward breakdown (sums to `reward`).
    pub components: RewardComponents,
    /// Episode has reached its step limit.
    pub terminated: bool,
    /// Always false; no external time-limit wrapper exists in this model.
    pub truncated: bool,
}

/// Applies actions to world state. Stateless apart from the reward weights,
/// so one engine can serve any number of sessions.
#[derive(Debug, Clone, Default)]
pub struct TransitionEngine {
    weights: RewardWeights,
}

impl TransitionEngine {
    pub fn new(weights: RewardWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &RewardWeights {
        &self.weights
    }

    /// Advance the world by one step under `action`.
    ///
    /// Order is fixed: execute action, intensify risk and degrade roads,
    /// accrue casualties against post-progression risk, price the step,
    /// advance the step counter, check termination.
    pub fn step(&self, world: &mut WorldState, action: &Action) -> StepOutcome {
        let action_success = Self::execute_action(world, action);

        Self::advance_disaster(world);

        let new_casualties = Self::accrue_casualties(world);
        world.total_casualties += new_casualties;

        let components =
            RewardComponents::from_step(world, new_casualties, action_success, &self.weights);
        let reward = components.total();

        world.current_step += 1;
        let terminated = world.current_step >= world.max_timesteps;

        StepOutcome {
            action_success,
            new_casualties,
            reward,
            components,
            terminated,
            truncated: false,
        }
    }

    /// Execute the action; returns false when it has no effect.
    ///
    /// An unavailable (or out-of-range) resource fails the action outright.
    /// EVACUATE_ZONE scans shelters in index order and commits evacuees to
    /// the first one with spare capacity. Dispatch actions relieve the
    /// target zone's risk. OPEN_SHELTER has no defined effect and fails.
    fn execute_action(world: &mut WorldState, action: &Action) -> bool {
        let available = world
            .resources
            .get(action.resource_id)
            .map(|r| r.available)
            .unwrap_or(false);
        if !available {
            return false;
        }

        match action.action_type {
            ActionType::EvacuateZone => {
                let Some(zone) = world.zones.get_mut(action.target_zone) else {
                    return false;
                };
                let evacuees = zone.unprotected().min(EVACUEES_PER_ACTION);
                if evacuees <= 0.0 {
                    return false;
                }
                for shelter in &mut world.shelters {
                    let spare = shelter.spare_capacity();
                    if spare > 0.0 {
                        let moved = evacuees.min(spare);
                        zone.evacuated += moved;
                        shelter.occupancy += moved;
                        world.total_evacuated += moved;
                        world.resources_used += 1;
                        return true;
                    }
                }
                false
            }
            ActionType::SendAmbulance
            | ActionType::SendMedicalTeam
            | ActionType::SendSupplyTruck => {
                let Some(zone) = world.zones.get_mut(action.target_zone) else {
                    return false;
                };
                zone.risk *= DISPATCH_RISK_RELIEF;
                world.resources_used += 1;
                true
            }
            ActionType::OpenShelter => false,
        }
    }

    /// Disaster progression, applied every step regardless of the action:
    /// risk intensifies multiplicatively and roads decay stochastically.
    fn advance_disaster(world: &mut WorldState) {
        for zone in &mut world.zones {
            zone.risk = (zone.risk * RISK_GROWTH).clamp(0.0, 1.0);
        }
        world.roads.degrade(&mut world.rng, ROAD_DECAY_MAX);
    }

    /// Accrue casualties in every zone from its unprotected population and
    /// current (post-progression) risk. Returns the step total.
    fn accrue_casualties(world: &mut WorldState) -> f64 {
        let mut total = 0.0;
        for zone in &mut world.zones {
            let lost = zone.unprotected() * zone.risk * CASUALTY_RATE;
            zone.casualties += lost;
            total += lost;
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScenarioConfig;

    fn setup(cfg: &ScenarioConfig) -> (TransitionEngine, WorldState) {
        (
            TransitionEngine::default(),
            WorldState::reset(cfg, 42).unwrap(),
        )
    }

    fn evacuate(zone: usize) -> Action {
        Action::new(ActionType::EvacuateZone, 0, zone)
    }

    #[test]
    fn evacuation_caps_at_fifty_and_fills_first_shelter() {
        let cfg = ScenarioConfig {
            num_zones: 2,
            num_shelters: 2,
            num_resources: 1,
            max_timesteps: 10,
            disaster_intensity: 0.0,
        };
        let (engine, mut world) = setup(&cfg);
        world.zones[0].population = 100.0;
        world.zones[1].population = 100.0;
        world.total_population = 200.0;
        world.shelters[0].capacity = 300.0;

        let outcome = engine.step(&mut world, &evacuate(0));

        assert!(outcome.action_success);
        assert_eq!(world.zones[0].evacuated, 50.0);
        assert_eq!(world.shelters[0].occupancy, 50.0);
        assert_eq!(world.shelters[1].occupancy, 0.0);
        assert_eq!(world.total_evacuated, 50.0);
        assert_eq!(world.resources_used, 1);
    }

    #[test]
    fn evacuation_limited_by_shelter_capacity() {
        let cfg = ScenarioConfig {
            num_zones: 2,
            num_shelters: 1,
            num_resources: 1,
            max_timesteps: 10,
            disaster_intensity: 0.0,
        };
        let (engine, mut world) = setup(&cfg);
        world.zones[0].population = 100.0;
        world.shelters[0].capacity = 30.0;

        let outcome = engine.step(&mut world, &evacuate(0));

        assert!(outcome.action_success);
        assert_eq!(world.zones[0].evacuated, 30.0);
        assert_eq!(world.shelters[0].occupancy, 30.0);
    }

    #[test]
    fn evacuation_fails_when_shelters_full_or_zone_empty() {
        let cfg = ScenarioConfig {
            num_zones: 1,
            num_shelters: 1,
            num_resources: 1,
            max_timesteps: 10,
            disaster_intensity: 0.0,
        };
        let (engine, mut world) = setup(&cfg);

        world.shelters[0].occupancy = world.shelters[0].capacity;
        let outcome = engine.step(&mut world, &evacuate(0));
        assert!(!outcome.action_success, "full shelters fail the action");

        world.shelters[0].occupancy = 0.0;
        world.zones[0].evacuated = world.zones[0].population;
        let outcome = engine.step(&mut world, &evacuate(0));
        assert!(!outcome.action_success, "nothing left to evacuate");
    }

    #[test]
    fn dispatch_relieves_risk_and_succeeds() {
        let cfg = ScenarioConfig {
            num_zones: 3,
            num_shelters: 1,
            num_resources: 2,
            max_timesteps: 10,
            disaster_intensity: 1.0,
        };
        let (engine, mut world) = setup(&cfg);
        world.zones[1].risk = 0.5;

        let action = Action::new(ActionType::SendMedicalTeam, 1, 1);
        let outcome = engine.step(&mut world, &action);

        assert!(outcome.action_success);
        // Relief (x0.9) then progression (x1.02).
        let expected = 0.5 * DISPATCH_RISK_RELIEF * RISK_GROWTH;
        assert!((world.zones[1].risk - expected).abs() < 1e-12);
        assert_eq!(world.resources_used, 1);
    }

    #[test]
    fn unavailable_resource_fails_but_world_still_progresses() {
        let cfg = ScenarioConfig {
            num_zones: 2,
            num_shelters: 1,
            num_resources: 1,
            max_timesteps: 10,
            disaster_intensity: 0.8,
        };
        let (engine, mut world) = setup(&cfg);
        world.resources[0].available = false;
        let risk_before: Vec<f64> = world.zones.iter().map(|z| z.risk).collect();

        let outcome = engine.step(&mut world, &evacuate(0));

        assert!(!outcome.action_success);
        assert_eq!(world.zones[0].evacuated, 0.0);
        assert_eq!(world.resources_used, 0);
        assert!(outcome.new_casualties > 0.0, "casualties still accrue");
        for (before, zone) in risk_before.iter().zip(&world.zones) {
            assert!(zone.risk >= *before, "risk still intensifies");
        }
        assert!(outcome.components.failure_penalty < 0.0);
    }

    #[test]
    fn open_shelter_has_no_defined_effect() {
        let cfg = ScenarioConfig {
            num_zones: 1,
            num_shelters: 1,
            num_resources: 1,
            max_timesteps: 10,
            disaster_intensity: 0.0,
        };
        let (engine, mut world) = setup(&cfg);
        let outcome = engine.step(&mut world, &Action::new(ActionType::OpenShelter, 0, 0));
        assert!(!outcome.action_success);
        assert_eq!(world.resources_used, 0);
    }

    #[test]
    fn risk_stays_clamped_over_long_runs() {
        let cfg = ScenarioConfig {
            num_zones: 3,
            num_shelters: 1,
            num_resources: 1,
            max_timesteps: 1_000,
            disaster_intensity: 1.0,
        };
        let (engine, mut world) = setup(&cfg);
        for _ in 0..500 {
            engine.step(&mut world, &Action::new(ActionType::OpenShelter, 0, 0));
        }
        for zone in &world.zones {
            assert!((0.0..=1.0).contains(&zone.risk));
        }
    }

    #[test]
    fn terminates_exactly_at_max_timesteps() {
        let cfg = ScenarioConfig {
            num_zones: 1,
            num_shelters: 1,
            num_resources: 1,
            max_timesteps: 5,
            disaster_intensity: 0.1,
        };
        let (engine, mut world) = setup(&cfg);
        let action = Action::new(ActionType::SendAmbulance, 0, 0);
        for i in 0..4 {
            let outcome = engine.step(&mut world, &action);
            assert!(!outcome.terminated, "step {} should not terminate", i);
            assert!(!outcome.truncated);
        }
        let outcome = engine.step(&mut world, &action);
        assert!(outcome.terminated);
        assert!(!outcome.truncated);
    }

    #[test]
    fn reward_matches_component_sum() {
        let cfg = ScenarioConfig::default();
        let (engine, mut world) = setup(&cfg);
        let outcome = engine.step(&mut world, &Action::new(ActionType::SendAmbulance, 0, 3));
        assert!((outcome.reward - outcome.components.total()).abs() < 1e-12);
    }
}
