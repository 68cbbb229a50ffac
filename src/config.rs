// src/config.rs
//
// Scenario configuration for the disaster-response environment.
// This is the single source of truth for scenario shape (zone / shelter /
// resource counts, episode length, disaster intensity) plus the coarse
// severity presets used by the CLI harness.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Shape and difficulty of one disaster scenario.
///
/// Counts are fixed for the lifetime of a session; they determine the
/// observation dimension and the valid action index ranges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Number of population zones.
    pub num_zones: usize,
    /// Number of evacuation shelters.
    pub num_shelters: usize,
    /// Number of mobile resource units.
    pub num_resources: usize,
    /// Episode length in steps.
    pub max_timesteps: u64,
    /// Disaster intensity in [0,1]; scales initial zone risk.
    pub disaster_intensity: f64,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            num_zones: 25,
            num_shelters: 5,
            num_resources: 10,
            max_timesteps: 100,
            disaster_intensity: 0.5,
        }
    }
}

impl ScenarioConfig {
    /// Reject impossible scenarios before any state is allocated.
    pub fn validate(&self) -> Result<()> {
        if self.num_zones == 0 {
            return Err(Error::Configuration("num_zones must be > 0".into()));
        }
        if self.num_shelters == 0 {
            return Err(Error::Configuration("num_shelters must be > 0".into()));
        }
        if self.num_resources == 0 {
            return Err(Error::Configuration("num_resources must be > 0".into()));
        }
        if self.max_timesteps == 0 {
            return Err(Error::Configuration("max_timesteps must be > 0".into()));
        }
        if !(0.0..=1.0).contains(&self.disaster_intensity) {
            return Err(Error::Configuration(format!(
                "disaster_intensity must be in [0,1], got {}",
                self.disaster_intensity
            )));
        }
        Ok(())
    }
}

/// Coarse severity preset used by the CLI / research harness.
///
/// Presets only tweak disaster intensity on top of the default scenario
/// shape; every field can still be overridden individually.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioProfile {
    Drill,
    Moderate,
    Severe,
}

impl ScenarioProfile {
    /// Stable lowercase name for the profile (used in logs).
    pub fn as_str(&self) -> &'static str {
        match self {
            ScenarioProfile::Drill => "drill",
            ScenarioProfile::Moderate => "moderate",
            ScenarioProfile::Severe => "severe",
        }
    }

    /// Parse a profile name (case-insensitive). Returns None if unrecognized.
    pub fn parse(s: &str) -> Option<ScenarioProfile> {
        match s.trim().to_ascii_lowercase().as_str() {
            "drill" | "d" => Some(ScenarioProfile::Drill),
            "moderate" | "mod" | "m" => Some(ScenarioProfile::Moderate),
            "severe" | "sev" | "s" => Some(ScenarioProfile::Severe),
            _ => None,
        }
    }

    /// Scenario defaults for this profile.
    pub fn config(&self) -> ScenarioConfig {
        let disaster_intensity = match self {
            ScenarioProfile::Drill => 0.2,
            ScenarioProfile::Moderate => 0.5,
            ScenarioProfile::Severe => 0.8,
        };
        ScenarioConfig {
            disaster_intensity,
            ..ScenarioConfig::default()
        }
    }
}

/// Where the effective profile came from (for log/debug precedence).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileSource {
    Cli,
    Env,
    Default,
}

impl ProfileSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileSource::Cli => "cli",
            ProfileSource::Env => "env",
            ProfileSource::Default => "default",
        }
    }
}

/// Resolved profile with provenance.
#[derive(Debug, Clone, Copy)]
pub struct EffectiveProfile {
    pub profile: ScenarioProfile,
    pub source: ProfileSource,
}

impl EffectiveProfile {
    /// One startup line so runs are attributable from logs alone.
    pub fn log_startup(&self) {
        println!(
            "aegis | scenario_profile={} | profile_source={}",
            self.profile.as_str(),
            self.source.as_str()
        );
    }
}

/// Environment variable consulted when no CLI profile is given.
pub const PROFILE_ENV_VAR: &str = "AEGIS_SCENARIO_PROFILE";

/// Resolve the effective profile: CLI > env > default (Moderate).
pub fn resolve_effective_profile(cli: Option<ScenarioProfile>) -> EffectiveProfile {
    if let Some(profile) = cli {
        return EffectiveProfile {
            profile,
            source: ProfileSource::Cli,
        };
    }
    if let Ok(raw) = std::env::var(PROFILE_ENV_VAR) {
        if let Some(profile) = ScenarioProfile::parse(&raw) {
            return EffectiveProfile {
                profile,
                source: ProfileSource::Env,
            };
        }
    }
    EffectiveProfile {
        profile: ScenarioProfile::Moderate,
        source: ProfileSource::Default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(ScenarioConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_counts_rejected() {
        for field in 0..4 {
            let mut cfg = ScenarioConfig::default();
            match field {
                0 => cfg.num_zones = 0,
                1 => cfg.num_shelters = 0,
                2 => cfg.num_resources = 0,
                _ => cfg.max_timesteps = 0,
            }
            let err = cfg.validate().unwrap_err();
            assert!(
                matches!(err, Error::Configuration(_)),
                "field {} should fail as configuration error",
                field
            );
        }
    }

    #[test]
    fn intensity_bounds_rejected() {
        let mut cfg = ScenarioConfig::default();
        cfg.disaster_intensity = -0.1;
        assert!(cfg.validate().is_err());
        cfg.disaster_intensity = 1.1;
        assert!(cfg.validate().is_err());
        cfg.disaster_intensity = 1.0;
        assert!(cfg.validate().is_ok());
        cfg.disaster_intensity = 0.0;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn profile_parse_and_presets() {
        assert_eq!(ScenarioProfile::parse("Severe"), Some(ScenarioProfile::Severe));
        assert_eq!(ScenarioProfile::parse("m"), Some(ScenarioProfile::Moderate));
        assert_eq!(ScenarioProfile::parse("nope"), None);

        let severe = ScenarioProfile::Severe.config();
        assert!(severe.validate().is_ok());
        assert!(severe.disaster_intensity > ScenarioProfile::Drill.config().disaster_intensity);
    }

    #[test]
    fn cli_profile_wins() {
        let effective = resolve_effective_profile(Some(ScenarioProfile::Drill));
        assert_eq!(effective.profile, ScenarioProfile::Drill);
        assert_eq!(effective.source, ProfileSource::Cli);
    }
}
