//! Configuration types for the simulation.

use crate::error::{Error, Result};
use crate::types::Topology;
use serde::{Deserialize, Serialize};

/// Grid dimensions and edge policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Number of rows
    pub height: u32,
    /// Number of columns
    pub width: u32,
    /// Edge handling for neighbor coordinates
    pub topology: Topology,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            height: 30,
            width: 30,
            topology: Topology::Bounded,
        }
    }
}

impl GridConfig {
    pub fn validate(&self) -> Result<()> {
        let min = match self.topology {
            Topology::Bounded => 2,
            // Smaller toroidal grids would alias neighbors onto each other.
            Topology::Toroidal => 3,
        };
        if self.height < min || self.width < min {
            return Err(Error::InvalidConfig(format!(
                "{:?} grid must be at least {min}x{min}, got {}x{}",
                self.topology, self.height, self.width
            )));
        }
        if self.height > i32::MAX as u32 || self.width > i32::MAX as u32 {
            return Err(Error::InvalidConfig("grid dimensions too large".to_string()));
        }
        Ok(())
    }
}

/// Phase periods and thresholds for the five cell rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    /// Vegetation spreads on ticks divisible by this period
    pub growth_period: u64,
    /// Herbivore spawning is considered when `tick % spawn_period < spawn_window`
    pub spawn_period: u64,
    pub spawn_window: u64,
    /// Spawn succeeds when a roll in `0..spawn_roll_sides` exceeds the threshold
    pub spawn_roll_sides: i64,
    pub spawn_roll_threshold: i64,
    /// Inclusive range for the number of herbivores spawned at once
    pub spawn_min: i64,
    pub spawn_max: i64,
    /// Spawning always allowed below this many herbivores; below the floor
    /// the `max_herbivore_ratio` cap does not apply
    pub herbivore_floor: usize,
    /// Above the floor, vegetation must exceed this before spawning resumes
    pub vegetation_surplus: usize,
    /// Above the floor, herbivores must stay under this fraction of vegetation
    pub max_herbivore_ratio: f64,
    /// Herbivores burst onto their diagonals on ticks divisible by this period
    pub repop_period: u64,
    /// Inclusive range for the number of neighbors a herbivore tries to eat
    pub eat_min: i64,
    pub eat_max: i64,
    /// A herbivore decays when more than this many eat attempts fail
    pub starvation_threshold: usize,
    /// Decayed cells flip to vegetation or empty on ticks divisible by this period
    pub decay_period: u64,
    /// Decayed cells stay decayed on ticks divisible by this period
    pub decay_dormant_period: Option<u64>,
    /// Once vegetation exceeds this, decayed cells never regrow for the rest of the run
    pub regrowth_cap: Option<usize>,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            growth_period: 2,
            spawn_period: 5,
            spawn_window: 1,
            spawn_roll_sides: 7,
            spawn_roll_threshold: 4,
            spawn_min: 1,
            spawn_max: 4,
            herbivore_floor: 5,
            vegetation_surplus: 300,
            max_herbivore_ratio: 0.5,
            repop_period: 3,
            eat_min: 2,
            eat_max: 4,
            starvation_threshold: 2,
            decay_period: 5,
            decay_dormant_period: Some(105),
            regrowth_cap: Some(70_000),
        }
    }
}

impl RuleConfig {
    pub fn validate(&self) -> Result<()> {
        let periods = [
            ("growth_period", self.growth_period),
            ("spawn_period", self.spawn_period),
            ("repop_period", self.repop_period),
            ("decay_period", self.decay_period),
        ];
        for (name, value) in periods {
            if value == 0 {
                return Err(Error::InvalidConfig(format!("{name} must be positive")));
            }
        }
        if self.decay_dormant_period == Some(0) {
            return Err(Error::InvalidConfig(
                "decay_dormant_period must be positive".to_string(),
            ));
        }
        if self.spawn_roll_sides < 1 {
            return Err(Error::InvalidConfig(
                "spawn_roll_sides must be at least 1".to_string(),
            ));
        }
        if self.spawn_min < 0 || self.spawn_min > self.spawn_max {
            return Err(Error::InvalidConfig(format!(
                "spawn range {}..={} is invalid",
                self.spawn_min, self.spawn_max
            )));
        }
        if self.eat_min < 0 || self.eat_min > self.eat_max {
            return Err(Error::InvalidConfig(format!(
                "eat range {}..={} is invalid",
                self.eat_min, self.eat_max
            )));
        }
        if !(self.max_herbivore_ratio >= 0.0 && self.max_herbivore_ratio.is_finite()) {
            return Err(Error::InvalidConfig(
                "max_herbivore_ratio must be a finite non-negative number".to_string(),
            ));
        }
        Ok(())
    }
}

/// Which grid `reset()` returns to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetPolicy {
    /// All cells empty
    #[default]
    Blank,
    /// The grid as it was when the run was last started
    InitialConfiguration,
}

/// Everything the simulation loop needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub grid: GridConfig,
    pub rules: RuleConfig,
    /// Stop after this many ticks; unbounded when `None`
    pub tick_limit: Option<u64>,
    /// Random seed for reproducibility
    pub seed: u64,
    pub reset_policy: ResetPolicy,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            rules: RuleConfig::default(),
            tick_limit: None,
            seed: 0,
            reset_policy: ResetPolicy::Blank,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.tick_limit == Some(0) {
            return Err(Error::InvalidConfig(
                "tick_limit must be positive when set".to_string(),
            ));
        }
        self.grid.validate()?;
        self.rules.validate()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}

/// Densities for a randomly seeded starting grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    /// Vegetation density (0.0 to 1.0)
    pub vegetation_density: f32,
    /// Herbivore density (0.0 to 1.0)
    pub herbivore_density: f32,
    /// Decayed density (0.0 to 1.0)
    pub decayed_density: f32,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            vegetation_density: 0.05,
            herbivore_density: 0.01,
            decayed_density: 0.0,
        }
    }
}

impl SeedConfig {
    pub fn validate(&self) -> Result<()> {
        let densities = [
            self.vegetation_density,
            self.herbivore_density,
            self.decayed_density,
        ];
        if densities.iter().any(|d| !(0.0..=1.0).contains(d)) || densities.iter().sum::<f32>() > 1.0
        {
            return Err(Error::InvalidConfig(
                "seed densities must lie in 0..=1 and sum to at most 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configs() {
        let config = SimulationConfig::default();
        assert_eq!(config.grid.height, 30);
        assert_eq!(config.grid.width, 30);
        assert_eq!(config.rules.growth_period, 2);
        assert_eq!(config.rules.starvation_threshold, 2);
        assert_eq!(config.tick_limit, None);
        assert!(config.validate().is_ok());
        assert!(SeedConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = SimulationConfig::from_json(
            r#"{ "grid": { "height": 20, "topology": "toroidal" }, "tick_limit": 50 }"#,
        )
        .unwrap();
        assert_eq!(config.grid.height, 20);
        assert_eq!(config.grid.width, 30);
        assert_eq!(config.grid.topology, Topology::Toroidal);
        assert_eq!(config.tick_limit, Some(50));
        assert_eq!(config.rules, RuleConfig::default());
    }

    #[test]
    fn test_rejects_zero_period() {
        let rules = RuleConfig {
            decay_period: 0,
            ..Default::default()
        };
        assert!(matches!(rules.validate(), Err(Error::InvalidConfig(_))));

        let err = SimulationConfig::from_json(r#"{ "rules": { "growth_period": 0 } }"#);
        assert!(matches!(err, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_zero_tick_limit() {
        let config = SimulationConfig {
            tick_limit: Some(0),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let err = SimulationConfig::from_json(r#"{ "tick_limit": 0 }"#);
        assert!(matches!(err, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_tiny_grids() {
        let grid = GridConfig {
            height: 1,
            ..Default::default()
        };
        assert!(grid.validate().is_err());

        let grid = GridConfig {
            height: 2,
            width: 2,
            topology: Topology::Toroidal,
        };
        assert!(grid.validate().is_err());
    }

    #[test]
    fn test_rejects_inverted_ranges() {
        let rules = RuleConfig {
            eat_min: 5,
            eat_max: 2,
            ..Default::default()
        };
        assert!(rules.validate().is_err());
    }

    #[test]
    fn test_malformed_json() {
        let err = SimulationConfig::from_json("{ not json");
        assert!(matches!(err, Err(Error::Serialization(_))));
    }
}
