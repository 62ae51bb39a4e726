//! Run configuration.
//!
//! A [`Config`] is built once, validated, and then passed by reference into
//! every component. Nothing reads settings from global state.

use crate::ga::GaConfig;
use crate::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How the packer decides whether a candidate position collides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CollisionMode {
    /// Cached no-fit polygon lookups (point-in-forbidden-region).
    #[default]
    Nfp,
    /// Direct polygon intersection and separation-distance test.
    Direct,
}

/// Settings for a strip nesting run.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Config {
    /// Fixed strip width.
    pub bin_width: f64,

    /// Optional height bound (None = unbounded strip).
    pub bin_height: Option<f64>,

    /// Minimum spacing between placed footprints.
    pub spacing: f64,

    /// Allowed rotation angles in degrees.
    pub allowed_angles: Vec<f64>,

    /// Integer precision multiplier used by the NFP clipping step.
    pub nfp_scale: u32,

    /// Collision test used by the packer.
    pub collision_mode: CollisionMode,

    /// Simplification tolerance applied to part outlines (0 disables).
    pub simplify_tolerance: f64,

    // GA parameters
    /// Population size.
    pub population_size: usize,

    /// Number of generations.
    pub generations: u32,

    /// Tournament size for parent selection.
    pub tournament_size: usize,

    /// Fraction of the population carried over unchanged.
    pub elite_fraction: f64,

    /// Lower bound on the number of elites.
    pub min_elites: usize,

    /// Probability of a swap mutation per offspring.
    pub swap_mutation_rate: f64,

    /// Probability of an angle mutation per offspring.
    pub angle_mutation_rate: f64,

    /// Leading fraction of the genome excluded from swap mutation.
    pub protected_prefix: f64,

    /// Fraction of the initial population seeded strictly big-first.
    pub elite_band: f64,

    /// Fraction of the initial population seeded big-first with a few swaps.
    pub perturbed_band: f64,

    /// Weight of the order penalty in the fitness.
    pub order_weight: f64,

    /// Weight of the skyline roughness penalty in the fitness.
    pub roughness_weight: f64,

    /// Observer cadence in generations.
    pub observer_interval: u32,

    /// RNG seed (None = seeded from entropy).
    pub seed: Option<u64>,

    /// Number of worker threads (0 = rayon default).
    pub threads: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bin_width: 3000.0,
            bin_height: None,
            spacing: 5.0,
            allowed_angles: vec![0.0, 90.0, 180.0, 270.0],
            nfp_scale: 1000,
            collision_mode: CollisionMode::default(),
            simplify_tolerance: 0.5,
            population_size: 40,
            generations: 100,
            tournament_size: 3,
            elite_fraction: 0.1,
            min_elites: 2,
            swap_mutation_rate: 0.2,
            angle_mutation_rate: 0.1,
            protected_prefix: 0.3,
            elite_band: 0.2,
            perturbed_band: 0.6,
            order_weight: 0.000_05,
            roughness_weight: 0.000_01,
            observer_interval: 10,
            seed: None,
            threads: 0,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the strip width.
    pub fn with_bin_width(mut self, width: f64) -> Self {
        self.bin_width = width;
        self
    }

    /// Sets a finite height bound.
    pub fn with_bin_height(mut self, height: f64) -> Self {
        self.bin_height = Some(height);
        self
    }

    /// Sets the spacing between footprints.
    pub fn with_spacing(mut self, spacing: f64) -> Self {
        self.spacing = spacing;
        self
    }

    /// Sets the allowed rotation angles in degrees.
    pub fn with_angles(mut self, angles: Vec<f64>) -> Self {
        self.allowed_angles = angles;
        self
    }

    /// Sets the NFP precision multiplier.
    pub fn with_nfp_scale(mut self, scale: u32) -> Self {
        self.nfp_scale = scale;
        self
    }

    /// Sets the collision test.
    pub fn with_collision_mode(mut self, mode: CollisionMode) -> Self {
        self.collision_mode = mode;
        self
    }

    /// Sets the population size.
    pub fn with_population_size(mut self, size: usize) -> Self {
        self.population_size = size;
        self
    }

    /// Sets the number of generations.
    pub fn with_generations(mut self, generations: u32) -> Self {
        self.generations = generations;
        self
    }

    /// Sets the mutation probabilities.
    pub fn with_mutation_rates(mut self, swap: f64, angle: f64) -> Self {
        self.swap_mutation_rate = swap;
        self.angle_mutation_rate = angle;
        self
    }

    /// Sets the fitness penalty weights.
    pub fn with_penalty_weights(mut self, order: f64, roughness: f64) -> Self {
        self.order_weight = order;
        self.roughness_weight = roughness;
        self
    }

    /// Sets the observer cadence.
    pub fn with_observer_interval(mut self, interval: u32) -> Self {
        self.observer_interval = interval;
        self
    }

    /// Sets the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the outline simplification tolerance.
    pub fn with_simplify_tolerance(mut self, tolerance: f64) -> Self {
        self.simplify_tolerance = tolerance;
        self
    }

    /// Sets the worker thread count.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Checks every setting, failing on the first invalid one.
    pub fn validate(&self) -> Result<()> {
        if !self.bin_width.is_finite() || self.bin_width <= 0.0 {
            return Err(Error::ConfigError(format!(
                "bin_width must be positive, got {}",
                self.bin_width
            )));
        }
        if let Some(height) = self.bin_height {
            if height.is_nan() || height <= 0.0 {
                return Err(Error::ConfigError(format!(
                    "bin_height must be positive, got {}",
                    height
                )));
            }
        }
        if !self.spacing.is_finite() || self.spacing < 0.0 {
            return Err(Error::ConfigError(format!(
                "spacing must be >= 0, got {}",
                self.spacing
            )));
        }
        if self.allowed_angles.is_empty() {
            return Err(Error::ConfigError("allowed_angles is empty".into()));
        }
        if self.allowed_angles.iter().any(|a| !a.is_finite()) {
            return Err(Error::ConfigError(
                "allowed_angles contains a non-finite angle".into(),
            ));
        }
        if self.nfp_scale == 0 {
            return Err(Error::ConfigError("nfp_scale must be positive".into()));
        }
        if self.population_size < 4 {
            return Err(Error::ConfigError(format!(
                "population_size must be >= 4, got {}",
                self.population_size
            )));
        }
        if self.generations == 0 {
            return Err(Error::ConfigError("generations must be >= 1".into()));
        }
        if self.tournament_size == 0 || self.tournament_size > self.population_size {
            return Err(Error::ConfigError(format!(
                "tournament_size must be in 1..={}, got {}",
                self.population_size, self.tournament_size
            )));
        }
        let fractions = [
            ("elite_fraction", self.elite_fraction),
            ("swap_mutation_rate", self.swap_mutation_rate),
            ("angle_mutation_rate", self.angle_mutation_rate),
            ("protected_prefix", self.protected_prefix),
            ("elite_band", self.elite_band),
            ("perturbed_band", self.perturbed_band),
        ];
        for (name, value) in fractions {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::ConfigError(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }
        if self.elite_band + self.perturbed_band > 1.0 {
            return Err(Error::ConfigError(
                "elite_band + perturbed_band must not exceed 1".into(),
            ));
        }
        if self.min_elites > self.population_size {
            return Err(Error::ConfigError(format!(
                "min_elites must not exceed population_size {}, got {}",
                self.population_size, self.min_elites
            )));
        }
        let non_negative = [
            ("order_weight", self.order_weight),
            ("roughness_weight", self.roughness_weight),
            ("simplify_tolerance", self.simplify_tolerance),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::ConfigError(format!(
                    "{} must be finite and >= 0, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }

    /// Returns the height bound, infinite when unbounded.
    pub fn height_bound(&self) -> f64 {
        self.bin_height.unwrap_or(f64::INFINITY)
    }

    /// Derives the GA runner settings.
    pub fn ga_config(&self) -> GaConfig {
        GaConfig {
            population_size: self.population_size,
            generations: self.generations,
            tournament_size: self.tournament_size,
            elite_fraction: self.elite_fraction,
            min_elites: self.min_elites,
            observer_interval: self.observer_interval.max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_non_positive_width() {
        let config = Config::new().with_bin_width(0.0);
        assert!(matches!(config.validate(), Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_rejects_empty_angles() {
        let config = Config::new().with_angles(vec![]);
        assert!(matches!(config.validate(), Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_rejects_small_population() {
        let config = Config::new().with_population_size(3);
        assert!(matches!(config.validate(), Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_rejects_negative_spacing() {
        let config = Config::new().with_spacing(-1.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_nan_penalty_weights() {
        let config = Config::new().with_penalty_weights(f64::NAN, 0.0);
        assert!(matches!(config.validate(), Err(Error::ConfigError(_))));
        let config = Config::new().with_penalty_weights(0.0, f64::INFINITY);
        assert!(matches!(config.validate(), Err(Error::ConfigError(_))));
        let config = Config::new().with_simplify_tolerance(f64::NAN);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_min_elites_above_population() {
        let mut config = Config::new().with_population_size(6);
        config.min_elites = 7;
        assert!(matches!(config.validate(), Err(Error::ConfigError(_))));
        config.min_elites = 6;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_height_bound() {
        assert!(Config::new().height_bound().is_infinite());
        assert_eq!(Config::new().with_bin_height(500.0).height_bound(), 500.0);
    }

    #[test]
    fn test_ga_config_derivation() {
        let ga = Config::new()
            .with_population_size(20)
            .with_generations(7)
            .ga_config();
        assert_eq!(ga.population_size, 20);
        assert_eq!(ga.generations, 7);
        assert_eq!(ga.tournament_size, 3);
        assert_eq!(ga.elite_count(), 2);
    }
}
