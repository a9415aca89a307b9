//! Engine configuration: îlot size mix, corridor geometry, accessibility
//! policy and the evolutionary-search parameters, with the valid ranges
//! enforced before a run starts.

use crate::error::LayoutError;
use serde::{Deserialize, Serialize};

/// Percentage split of îlot counts across the three size buckets.
/// Must sum to 100 (±1 tolerance).
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct SizeMix {
    pub small: f64,
    pub medium: f64,
    pub large: f64,
}

impl Default for SizeMix {
    fn default() -> Self {
        SizeMix {
            small: 30.0,
            medium: 50.0,
            large: 20.0,
        }
    }
}

impl SizeMix {
    pub fn total(&self) -> f64 {
        self.small + self.medium + self.large
    }
}

/// Weights of the four fitness terms. Must sum to 1 (±1e-6).
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct FitnessWeights {
    pub space: f64,
    pub access: f64,
    pub corridor: f64,
    pub ada: f64,
}

impl Default for FitnessWeights {
    fn default() -> Self {
        FitnessWeights {
            space: 0.4,
            access: 0.3,
            corridor: 0.2,
            ada: 0.1,
        }
    }
}

impl FitnessWeights {
    pub fn total(&self) -> f64 {
        self.space + self.access + self.corridor + self.ada
    }
}

/// Full engine configuration. `Default` gives a valid mid-size setup;
/// deserialized configs fill missing fields from it.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    pub size_mix: SizeMix,
    /// Corridor width in meters, 0.8–3.0.
    pub corridor_width: f64,
    /// Minimum gap between îlots in meters, 0.5–2.0.
    pub min_clearance: f64,
    /// When true the ADA term is active and only corridors of at least
    /// 1.22 m count as accessible.
    pub ada_compliance: bool,
    /// Percentage cap on target utilization.
    pub max_density: f64,
    /// Evolutionary population size, 10–200.
    pub population_size: usize,
    /// Generation budget, 50–500.
    pub generations: usize,
    /// Per-child mutation probability, 0.01–0.5.
    pub mutation_rate: f64,
    /// Per-child crossover probability, 0.5–1.0.
    pub crossover_rate: f64,
    /// Candidates copied verbatim into the next generation, 0–population/2.
    pub elite_size: usize,
    pub fitness_weights: FitnessWeights,
    /// Walkability-grid cell size in meters.
    pub grid_cell_size: f64,
    /// Best fitness above which the run terminates early, 0.5–1.0.
    pub convergence_fitness: f64,
    /// Emit straight corridors above and below the îlot bounding box.
    pub perimeter_corridors: bool,
    /// PRNG seed. Leaving it unset draws a time-derived seed, which breaks
    /// run-to-run determinism; always set it in tests.
    pub seed: Option<u64>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            size_mix: SizeMix::default(),
            corridor_width: 1.2,
            min_clearance: 1.2,
            ada_compliance: true,
            max_density: 80.0,
            population_size: 50,
            generations: 100,
            mutation_rate: 0.10,
            crossover_rate: 0.80,
            elite_size: 5,
            fitness_weights: FitnessWeights::default(),
            grid_cell_size: 0.5,
            convergence_fitness: 0.9,
            perimeter_corridors: false,
            seed: None,
        }
    }
}

impl LayoutConfig {
    /// Check every parameter against its documented range.
    pub fn validate(&self) -> Result<(), LayoutError> {
        fn range(
            name: &str,
            value: f64,
            lo: f64,
            hi: f64,
        ) -> Result<(), LayoutError> {
            if !value.is_finite() || value < lo || value > hi {
                return Err(LayoutError::InvalidConfig(format!(
                    "{name} = {value} outside [{lo}, {hi}]"
                )));
            }
            Ok(())
        }

        let mix = &self.size_mix;
        for (name, v) in [
            ("sizeMix.small", mix.small),
            ("sizeMix.medium", mix.medium),
            ("sizeMix.large", mix.large),
        ] {
            range(name, v, 0.0, 100.0)?;
        }
        if (mix.total() - 100.0).abs() > 1.0 {
            return Err(LayoutError::InvalidConfig(format!(
                "size mix sums to {}, expected 100 (±1)",
                mix.total()
            )));
        }

        range("corridorWidth", self.corridor_width, 0.8, 3.0)?;
        range("minClearance", self.min_clearance, 0.5, 2.0)?;
        range("maxDensity", self.max_density, 1.0, 100.0)?;
        range("mutationRate", self.mutation_rate, 0.01, 0.5)?;
        range("crossoverRate", self.crossover_rate, 0.5, 1.0)?;
        range("gridCellSize", self.grid_cell_size, 0.05, 5.0)?;
        range("convergenceFitness", self.convergence_fitness, 0.5, 1.0)?;

        if !(10..=200).contains(&self.population_size) {
            return Err(LayoutError::InvalidConfig(format!(
                "populationSize = {} outside [10, 200]",
                self.population_size
            )));
        }
        if !(50..=500).contains(&self.generations) {
            return Err(LayoutError::InvalidConfig(format!(
                "generations = {} outside [50, 500]",
                self.generations
            )));
        }
        if self.elite_size > self.population_size / 2 {
            return Err(LayoutError::InvalidConfig(format!(
                "eliteSize = {} exceeds populationSize / 2 = {}",
                self.elite_size,
                self.population_size / 2
            )));
        }

        let w = &self.fitness_weights;
        for (name, v) in [
            ("fitnessWeights.space", w.space),
            ("fitnessWeights.access", w.access),
            ("fitnessWeights.corridor", w.corridor),
            ("fitnessWeights.ada", w.ada),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(LayoutError::InvalidConfig(format!(
                    "{name} = {v} must be non-negative"
                )));
            }
        }
        if (w.total() - 1.0).abs() > 1e-6 {
            return Err(LayoutError::InvalidConfig(format!(
                "fitness weights sum to {}, expected 1",
                w.total()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(LayoutConfig::default().validate().is_ok());
    }

    #[test]
    fn size_mix_must_sum_to_hundred() {
        let config = LayoutConfig {
            size_mix: SizeMix {
                small: 50.0,
                medium: 30.0,
                large: 10.0,
            },
            ..LayoutConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(LayoutError::InvalidConfig(_))
        ));
    }

    #[test]
    fn weights_must_sum_to_one() {
        let config = LayoutConfig {
            fitness_weights: FitnessWeights {
                space: 0.5,
                access: 0.5,
                corridor: 0.5,
                ada: 0.0,
            },
            ..LayoutConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn out_of_range_parameters_rejected() {
        let mut config = LayoutConfig {
            corridor_width: 5.0,
            ..LayoutConfig::default()
        };
        assert!(config.validate().is_err());

        config = LayoutConfig {
            population_size: 4,
            ..LayoutConfig::default()
        };
        assert!(config.validate().is_err());

        config = LayoutConfig {
            elite_size: 40,
            ..LayoutConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: LayoutConfig =
            serde_json::from_str(r#"{ "corridorWidth": 1.5, "seed": 7 }"#).unwrap();
        assert_eq!(config.corridor_width, 1.5);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.population_size, 50);
        assert!(config.validate().is_ok());
    }
}
