// src/rl/observation.rs
//
// Observation encoding: the fixed-length, soft-normalized projection of a
// WorldState consumed by policies.
//
// Field order and normalization are a compatibility contract. A policy
// trained against one layout is incompatible with any other, so changes
// here must bump OBS_VERSION.

use serde::{Deserialize, Serialize};

use crate::config::ScenarioConfig;
use crate::error::{Error, Result};
use crate::state::WorldState;

/// Current observation layout version.
pub const OBS_VERSION: u32 = 1;

/// Normalizer for zone population and evacuated counts.
pub const POPULATION_SCALE: f64 = 1000.0;
/// Normalizer for cumulative zone casualties.
pub const CASUALTY_SCALE: f64 = 100.0;
/// Normalizer for shelter capacity and occupancy.
pub const SHELTER_SCALE: f64 = 500.0;

/// Observation dimensions for a configured scenario.
///
/// Consumers must validate vector length against `dim()` before use;
/// a mismatch means the scenario shapes disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservationSpec {
    pub num_zones: usize,
    pub num_shelters: usize,
    pub num_resources: usize,
}

impl ObservationSpec {
    pub fn new(num_zones: usize, num_shelters: usize, num_resources: usize) -> Self {
        Self {
            num_zones,
            num_shelters,
            num_resources,
        }
    }

    pub fn from_config(config: &ScenarioConfig) -> Self {
        Self {
            num_zones: config.num_zones,
            num_shelters: config.num_shelters,
            num_resources: config.num_resources,
        }
    }

    /// Total vector length: `3Z + 2S + 3R + Z^2 + 1`.
    pub fn dim(&self) -> usize {
        3 * self.num_zones
            + 2 * self.num_shelters
            + 3 * self.num_resources
            + self.num_zones * self.num_zones
            + 1
    }

    /// Length check for consumer-side inputs.
    pub fn validate(&self, observation: &[f64]) -> Result<()> {
        let expected = self.dim();
        if observation.len() != expected {
            return Err(Error::DimensionMismatch {
                expected,
                actual: observation.len(),
            });
        }
        Ok(())
    }
}

/// Encode a world into the flat observation vector.
///
/// Layout, in order:
/// zone populations /1000, zone evacuated /1000, zone casualties /100,
/// shelter capacities /500, shelter occupancies /500,
/// resource positions flattened pairwise (x0,y0,x1,y1,...),
/// resource availability flags (0/1),
/// road matrix flattened row-major,
/// current_step / max_timesteps.
///
/// Values are soft-normalized to roughly [0,1] and deliberately not
/// clamped; out-of-distribution scenarios may exceed 1.
pub fn encode(world: &WorldState) -> Vec<f64> {
    let spec = ObservationSpec::new(
        world.num_zones(),
        world.num_shelters(),
        world.num_resources(),
    );
    let mut obs = Vec::with_capacity(spec.dim());

    for zone in &world.zones {
        obs.push(zone.population / POPULATION_SCALE);
    }
    for zone in &world.zones {
        obs.push(zone.evacuated / POPULATION_SCALE);
    }
    for zone in &world.zones {
        obs.push(zone.casualties / CASUALTY_SCALE);
    }

    for shelter in &world.shelters {
        obs.push(shelter.capacity / SHELTER_SCALE);
    }
    for shelter in &world.shelters {
        obs.push(shelter.occupancy / SHELTER_SCALE);
    }

    for resource in &world.resources {
        obs.push(resource.x);
        obs.push(resource.y);
    }
    for resource in &world.resources {
        obs.push(if resource.available { 1.0 } else { 0.0 });
    }

    obs.extend_from_slice(world.roads.values());

    obs.push(world.current_step as f64 / world.max_timesteps as f64);

    obs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(z: usize, s: usize, r: usize) -> ScenarioConfig {
        ScenarioConfig {
            num_zones: z,
            num_shelters: s,
            num_resources: r,
            max_timesteps: 100,
            disaster_intensity: 0.5,
        }
    }

    #[test]
    fn dim_formula() {
        let spec = ObservationSpec::new(25, 5, 10);
        assert_eq!(spec.dim(), 3 * 25 + 2 * 5 + 3 * 10 + 25 * 25 + 1);
    }

    #[test]
    fn encoded_length_matches_spec() {
        for (z, s, r) in [(2, 1, 1), (25, 5, 10), (4, 3, 6)] {
            let world = WorldState::reset(&cfg(z, s, r), 5).unwrap();
            let obs = encode(&world);
            let spec = ObservationSpec::from_config(&cfg(z, s, r));
            assert_eq!(obs.len(), spec.dim());
            assert!(spec.validate(&obs).is_ok());
        }
    }

    #[test]
    fn validate_rejects_wrong_length() {
        let spec = ObservationSpec::new(2, 1, 1);
        let err = spec.validate(&vec![0.0; spec.dim() + 1]).unwrap_err();
        match err {
            Error::DimensionMismatch { expected, actual } => {
                assert_eq!(expected, spec.dim());
                assert_eq!(actual, spec.dim() + 1);
            }
            other => panic!("expected dimension mismatch, got {other:?}"),
        }
    }

    #[test]
    fn layout_starts_with_populations_and_ends_with_progress() {
        let config = cfg(3, 2, 2);
        let mut world = WorldState::reset(&config, 8).unwrap();
        world.current_step = 25;

        let obs = encode(&world);

        for (i, zone) in world.zones.iter().enumerate() {
            assert_eq!(obs[i], zone.population / POPULATION_SCALE);
        }
        assert_eq!(*obs.last().unwrap(), 0.25);
    }

    #[test]
    fn availability_flags_follow_positions() {
        let config = cfg(2, 1, 3);
        let mut world = WorldState::reset(&config, 8).unwrap();
        world.resources[1].available = false;

        let obs = encode(&world);

        // Offset: 3 zone blocks + 2 shelter blocks + position pairs.
        let avail_start = 3 * 2 + 2 * 1 + 2 * 3;
        assert_eq!(obs[avail_start], 1.0);
        assert_eq!(obs[avail_start + 1], 0.0);
        assert_eq!(obs[avail_start + 2], 1.0);
    }

    #[test]
    fn soft_normalization_is_not_clamped() {
        let config = cfg(1, 1, 1);
        let mut world = WorldState::reset(&config, 8).unwrap();
        world.zones[0].population = 2500.0;

        let obs = encode(&world);
        assert!(obs[0] > 1.0, "pathological population may exceed 1");
    }
}
