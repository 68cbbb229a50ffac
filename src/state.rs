// src/state.rs
//
// Mutable world state for a single disaster session.
//
// A WorldState is created by `reset`, owned by exactly one simulation
// session, and mutated only by the transition engine. It carries its own
// seeded RNG so that two concurrently stepped sessions stay independent and
// reproducible per seed.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::config::ScenarioConfig;
use crate::error::Result;
use crate::types::ResourceKind;

/// One abstract population zone.
///
/// Casualties accumulate independently of the evacuation counter: each step
/// draws from `population - evacuated` without ever removing casualties from
/// the population, so `casualties + evacuated` can exceed `population` over
/// long runs. That looseness is part of the model contract; do not rebalance
/// it here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: usize,
    pub population: f64,
    pub evacuated: f64,
    pub casualties: f64,
    /// Hazard level in [0,1]; drives casualty accrual.
    pub risk: f64,
}

impl Zone {
    /// Population not yet moved to a shelter.
    pub fn unprotected(&self) -> f64 {
        self.population - self.evacuated
    }
}

/// A capacity-bounded evacuation destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shelter {
    pub id: usize,
    pub capacity: f64,
    pub occupancy: f64,
}

impl Shelter {
    pub fn spare_capacity(&self) -> f64 {
        self.capacity - self.occupancy
    }
}

/// A mobile unit (ambulance, medical team, supply truck).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: usize,
    pub kind: ResourceKind,
    /// Position in the unit square.
    pub x: f64,
    pub y: f64,
    pub available: bool,
}

/// Dense pairwise road connectivity over all zone pairs.
///
/// Status values live in [0,1] (1 = fully passable) and only ever decrease.
/// Entries are independent, including the diagonal and both directions of a
/// pair, matching the reference degradation model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadNetwork {
    num_zones: usize,
    status: Vec<f64>,
}

impl RoadNetwork {
    /// All links fully passable.
    pub fn all_passable(num_zones: usize) -> Self {
        Self {
            num_zones,
            status: vec![1.0; num_zones * num_zones],
        }
    }

    pub fn num_zones(&self) -> usize {
        self.num_zones
    }

    /// Link status from zone `i` to zone `j`.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.status[i * self.num_zones + j]
    }

    /// Row-major view of all link statuses.
    pub fn values(&self) -> &[f64] {
        &self.status
    }

    /// Degrade every link by an independent uniform amount in [0, max_decay),
    /// clamped to [0,1]. Roads are never repaired.
    pub(crate) fn degrade(&mut self, rng: &mut ChaCha8Rng, max_decay: f64) {
        for s in &mut self.status {
            *s = (*s - rng.gen::<f64>() * max_decay).clamp(0.0, 1.0);
        }
    }
}

/// Aggregate state of one disaster session.
#[derive(Debug, Clone)]
pub struct WorldState {
    pub zones: Vec<Zone>,
    pub shelters: Vec<Shelter>,
    pub resources: Vec<Resource>,
    pub roads: RoadNetwork,

    /// Steps completed so far.
    pub current_step: u64,
    /// Episode length; after this many steps the episode terminates.
    pub max_timesteps: u64,
    /// Sum of zone populations at reset. Constant per episode; the
    /// denominator for evacuation-rate terms.
    pub total_population: f64,
    pub total_casualties: f64,
    pub total_evacuated: f64,
    /// Count of successful resource commitments across the episode.
    pub resources_used: u64,
    pub disaster_intensity: f64,

    /// Seed this session was reset with.
    pub seed: u64,
    /// Per-session generator; every stochastic transition draws from here.
    pub(crate) rng: ChaCha8Rng,
}

impl WorldState {
    /// Build the initial state for a scenario.
    ///
    /// Sampling order is fixed and part of the determinism contract:
    /// zone populations, zone risks, shelter capacities, resource positions.
    pub fn reset(config: &ScenarioConfig, seed: u64) -> Result<Self> {
        config.validate()?;

        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let mut zones: Vec<Zone> = (0..config.num_zones)
            .map(|id| Zone {
                id,
                population: rng.gen_range(100..1000) as f64,
                evacuated: 0.0,
                casualties: 0.0,
                risk: 0.0,
            })
            .collect();
        for zone in &mut zones {
            zone.risk = rng.gen::<f64>() * config.disaster_intensity;
        }

        let shelters: Vec<Shelter> = (0..config.num_shelters)
            .map(|id| Shelter {
                id,
                capacity: rng.gen_range(200..500) as f64,
                occupancy: 0.0,
            })
            .collect();

        let resources: Vec<Resource> = (0..config.num_resources)
            .map(|id| Resource {
                id,
                kind: ResourceKind::for_index(id),
                x: rng.gen::<f64>(),
                y: rng.gen::<f64>(),
                available: true,
            })
            .collect();

        let total_population = zones.iter().map(|z| z.population).sum();

        Ok(Self {
            zones,
            shelters,
            resources,
            roads: RoadNetwork::all_passable(config.num_zones),
            current_step: 0,
            max_timesteps: config.max_timesteps,
            total_population,
            total_casualties: 0.0,
            total_evacuated: 0.0,
            resources_used: 0,
            disaster_intensity: config.disaster_intensity,
            seed,
            rng,
        })
    }

    pub fn num_zones(&self) -> usize {
        self.zones.len()
    }

    pub fn num_shelters(&self) -> usize {
        self.shelters.len()
    }

    pub fn num_resources(&self) -> usize {
        self.resources.len()
    }

    /// Fraction of the initial population evacuated so far.
    pub fn evacuation_rate(&self) -> f64 {
        if self.total_population > 0.0 {
            self.total_evacuated / self.total_population
        } else {
            0.0
        }
    }

    /// Mean zone risk.
    pub fn average_risk(&self) -> f64 {
        if self.zones.is_empty() {
            return 0.0;
        }
        self.zones.iter().map(|z| z.risk).sum::<f64>() / self.zones.len() as f64
    }
}
