//! Configuration system for evoshift experiments.
//!
//! Supports YAML configuration files with sensible defaults.

use crate::creature::{MutatableTrait, Traits};
use crate::interpolator::Interpolator;
use crate::rng::SimRng;
use crate::stage::Stage;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub experiment: ExperimentConfig,
    /// Environment both conditions are trained in
    pub training_env: EnvironmentConfig,
    /// Environment survivors are moved to afterwards
    pub transfer_env: EnvironmentConfig,
    pub grid_search: GridSearchConfig,
    pub creature: CreatureConfig,
    #[serde(default)]
    pub behaviour: BehaviourConfig,
    #[serde(default)]
    pub statistics: StatisticsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Replication settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Generations in the training environment
    pub training_generations: usize,
    /// Generations in the transfer environment
    pub transfer_generations: usize,
    /// Independent replications per condition
    pub num_runs: usize,
    /// Initial population per run and per grid point
    pub population_size: usize,
    /// Run `r` is seeded with `base_seed + r`
    pub base_seed: u64,
    /// Evaluate grid points on the rayon pool
    #[serde(default)]
    pub parallel_grid: bool,
    /// Also run the random-trait baseline condition
    #[serde(default)]
    pub random_baseline: bool,
    /// Start the transfer phase from a fresh population when training left no survivors
    #[serde(default)]
    pub respawn_on_extinction: bool,
}

/// One arena
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// Side length of the square arena
    pub world_size: f64,
    /// Food pellets sampled per generation
    pub food_per_generation: f64,
    /// Edges (0 bottom, 1 right, 2 top, 3 left) that cannot serve as home
    #[serde(default)]
    pub disabled_edges: Vec<usize>,
    /// Optional `(generation, food)` points overriding `food_per_generation`
    #[serde(default)]
    pub food_schedule: Option<Vec<(f64, f64)>>,
    #[serde(default)]
    pub food_layout: FoodLayout,
}

/// How pellets are scattered over the arena
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FoodLayout {
    /// Every pellet uniformly over the arena
    #[default]
    Uniform,
    /// Pellets around `clusters` uniformly placed centres with gaussian
    /// spread `spread`, clipped to the arena
    Clustered { clusters: usize, spread: f64 },
}

/// Candidate values for the exhaustive search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSearchConfig {
    /// Used for both the speed and the size axis
    pub speed_size_values: Vec<f64>,
    pub sense_values: Vec<f64>,
}

/// Initial trait values and mutation spreads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatureConfig {
    pub speed: f64,
    pub size: f64,
    pub sense_range: f64,
    pub reach: f64,
    pub flee_distance: f64,
    pub life_span: f64,
    pub speed_variance: f64,
    pub size_variance: f64,
    pub sense_range_variance: f64,
    pub reach_variance: f64,
    pub flee_distance_variance: f64,
    pub life_span_variance: f64,
    /// Energy budget per generation
    pub energy: f64,
    /// Ranges the random baseline draws speed, size and sense range from
    #[serde(default)]
    pub random_ranges: TraitRanges,
}

/// Inclusive-exclusive `(min, max)` ranges for uniformly drawn traits
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TraitRanges {
    pub speed: (f64, f64),
    pub size: (f64, f64),
    pub sense_range: (f64, f64),
}

/// Behaviour pipeline tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviourConfig {
    /// Predator qualifies when `predator.size * ratio >= prey.size`
    pub cannibalism_size_ratio: f64,
    /// Also register the standalone homesick behaviour
    pub homesick: bool,
}

/// Comparison settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsConfig {
    /// Bonferroni divisor for the comparison report
    pub num_comparisons: usize,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            experiment: ExperimentConfig::default(),
            training_env: EnvironmentConfig::new(500.0, 50.0, Vec::new()),
            transfer_env: EnvironmentConfig::new(800.0, 30.0, vec![2, 3]),
            grid_search: GridSearchConfig::default(),
            creature: CreatureConfig::default(),
            behaviour: BehaviourConfig::default(),
            statistics: StatisticsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            training_generations: 100,
            transfer_generations: 50,
            num_runs: 30,
            population_size: 50,
            base_seed: 1000,
            parallel_grid: false,
            random_baseline: false,
            respawn_on_extinction: false,
        }
    }
}

impl Default for GridSearchConfig {
    fn default() -> Self {
        Self {
            speed_size_values: (1..=8).map(|i| 3.0 * i as f64).collect(),
            sense_values: (1..=8).map(|i| 5.0 * i as f64).collect(),
        }
    }
}

impl Default for CreatureConfig {
    fn default() -> Self {
        Self {
            speed: 10.0,
            size: 10.0,
            sense_range: 20.0,
            reach: 1.0,
            flee_distance: 1e12,
            life_span: 1e4,
            speed_variance: 1.0,
            size_variance: 1.0,
            sense_range_variance: 1.0,
            reach_variance: 0.3,
            flee_distance_variance: 0.0,
            life_span_variance: 0.0,
            energy: 500.0,
            random_ranges: TraitRanges::default(),
        }
    }
}

impl Default for TraitRanges {
    fn default() -> Self {
        Self {
            speed: (1.0, 20.0),
            size: (1.0, 20.0),
            sense_range: (1.0, 40.0),
        }
    }
}

impl Default for BehaviourConfig {
    fn default() -> Self {
        Self {
            cannibalism_size_ratio: 0.8,
            homesick: false,
        }
    }
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self { num_comparisons: 10 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl EnvironmentConfig {
    pub fn new(world_size: f64, food_per_generation: f64, disabled_edges: Vec<usize>) -> Self {
        Self {
            world_size,
            food_per_generation,
            disabled_edges,
            food_schedule: None,
            food_layout: FoodLayout::Uniform,
        }
    }

    /// Same arena with pellets gathered into clusters
    pub fn clustered(mut self, clusters: usize, spread: f64) -> Self {
        self.food_layout = FoodLayout::Clustered { clusters, spread };
        self
    }

    pub fn stage(&self) -> Stage {
        Stage::new(self.world_size)
    }

    /// Food per generation, constant unless a schedule is given
    pub fn food_schedule(&self) -> Interpolator {
        match &self.food_schedule {
            Some(points) if !points.is_empty() => Interpolator::new(points.clone()),
            _ => Interpolator::constant(self.food_per_generation),
        }
    }
}

impl CreatureConfig {
    /// Default traits with their configured mutation spreads
    pub fn traits(&self) -> Traits {
        Traits {
            speed: MutatableTrait::new(self.speed, self.speed_variance),
            size: MutatableTrait::new(self.size, self.size_variance),
            sense_range: MutatableTrait::new(self.sense_range, self.sense_range_variance),
            reach: MutatableTrait::new(self.reach, self.reach_variance),
            flee_distance: MutatableTrait::new(self.flee_distance, self.flee_distance_variance),
            life_span: MutatableTrait::new(self.life_span, self.life_span_variance),
        }
    }

    /// Traits the evolutionary condition starts from: speed, size and sense
    /// range mutate with their configured spreads, the rest stay put
    pub fn evolutionary_traits(&self) -> Traits {
        Traits {
            reach: MutatableTrait::fixed(self.reach),
            flee_distance: MutatableTrait::fixed(self.flee_distance),
            life_span: MutatableTrait::fixed(self.life_span),
            ..self.traits()
        }
    }

    /// Non-mutating traits with speed, size and sense range drawn from `random_ranges`
    pub fn random_traits(&self, rng: &mut SimRng) -> Traits {
        let r = &self.random_ranges;
        let speed = rng.uniform(r.speed.0, r.speed.1);
        let size = rng.uniform(r.size.0, r.size.1);
        let sense_range = rng.uniform(r.sense_range.0, r.sense_range.1);
        self.fixed_traits(speed, size, sense_range)
    }

    /// Non-mutating traits at a chosen (speed, size, sense range) point
    pub fn fixed_traits(&self, speed: f64, size: f64, sense_range: f64) -> Traits {
        Traits {
            speed: MutatableTrait::fixed(speed),
            size: MutatableTrait::fixed(size),
            sense_range: MutatableTrait::fixed(sense_range),
            reach: MutatableTrait::fixed(self.reach),
            flee_distance: MutatableTrait::fixed(self.flee_distance),
            life_span: MutatableTrait::fixed(self.life_span),
        }
    }

    fn variances(&self) -> [f64; 6] {
        [
            self.speed_variance,
            self.size_variance,
            self.sense_range_variance,
            self.reach_variance,
            self.flee_distance_variance,
            self.life_span_variance,
        ]
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Number of single-generation evaluations the grid search performs
    pub fn grid_size(&self) -> usize {
        let axis = self.grid_search.speed_size_values.len();
        axis * axis * self.grid_search.sense_values.len()
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        for (name, env) in [("training_env", &self.training_env), ("transfer_env", &self.transfer_env)] {
            if env.world_size <= 0.0 || !env.world_size.is_finite() {
                return Err(format!("{}.world_size must be a positive number", name));
            }
            if env.food_per_generation < 0.0 {
                return Err(format!("{}.food_per_generation must be >= 0", name));
            }
            if env.disabled_edges.iter().any(|&e| e > 3) {
                return Err(format!("{}.disabled_edges must be in 0..=3", name));
            }
            if let FoodLayout::Clustered { clusters, spread } = env.food_layout {
                if clusters == 0 || spread.is_nan() || spread < 0.0 {
                    return Err(format!("{}.food_layout needs clusters >= 1 and spread >= 0", name));
                }
            }
        }
        if self.experiment.population_size == 0 {
            return Err("population_size must be > 0".to_string());
        }
        if self.experiment.num_runs == 0 {
            return Err("num_runs must be > 0".to_string());
        }
        if self.experiment.training_generations == 0 || self.experiment.transfer_generations == 0 {
            return Err("generation counts must be > 0".to_string());
        }
        if self.grid_search.speed_size_values.is_empty() || self.grid_search.sense_values.is_empty() {
            return Err("grid search value sets must not be empty".to_string());
        }
        if self.creature.variances().iter().any(|&v| v < 0.0) {
            return Err("trait variances must be >= 0".to_string());
        }
        let r = &self.creature.random_ranges;
        if [r.speed, r.size, r.sense_range].iter().any(|&(lo, hi)| lo.is_nan() || hi.is_nan() || lo < 0.0 || hi < lo) {
            return Err("random trait ranges must satisfy 0 <= min <= max".to_string());
        }
        if self.creature.energy <= 0.0 {
            return Err("creature energy must be > 0".to_string());
        }
        let ratio = self.behaviour.cannibalism_size_ratio;
        if ratio.is_nan() || ratio <= 0.0 || ratio > 1.0 {
            return Err("cannibalism_size_ratio must be in (0, 1]".to_string());
        }
        if self.statistics.num_comparisons == 0 {
            return Err("num_comparisons must be > 0".to_string());
        }
        Ok(())
    }
}
