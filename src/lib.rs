//! # evoshift
//!
//! Evolutionary training vs. grid-search optimisation under environmental shift.
//!
//! Populations of foraging creatures live out generations in a square arena.
//! One condition (ET) evolves its traits by mutate-and-breed; the other (GS)
//! clones the single best trait combination found by exhaustive search. Both
//! are then moved to a harsher arena and compared statistically. A random-trait
//! baseline and a step-budgeted hill climb are available for reference.
//!
//! ## Features
//!
//! - **Reproducible**: every simulation owns a ChaCha8 stream keyed by a seed label
//! - **Pluggable**: behaviours are trait objects run in ordered phases
//! - **Parallel**: grid points can be evaluated on the Rayon pool without changing results
//! - **Configurable**: YAML configuration files
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use evoshift::{run_full_experiment, ComparisonReport, Config};
//!
//! let config = Config::default();
//! let results = run_full_experiment(&config, |p| println!("{:.1}%", p.percent_complete), || false)
//!     .expect("not cancelled");
//!
//! println!("{}", ComparisonReport::from_results(&results));
//! ```
//!
//! ## Single simulation
//!
//! ```rust
//! use evoshift::{Config, Simulation};
//! use evoshift::behaviour::BasicReproduction;
//!
//! let config = Config::default();
//! let mut sim = Simulation::for_environment(
//!     &config.training_env,
//!     &config.behaviour,
//!     "doc-example",
//!     Box::new(BasicReproduction),
//! );
//! let creatures = sim.spawn_population(20, config.creature.evolutionary_traits(), config.creature.energy);
//! sim.run(creatures, 3);
//! assert!(!sim.generations.is_empty());
//! ```

pub mod analysis;
pub mod behaviour;
pub mod config;
pub mod creature;
pub mod diversity;
pub mod experiment;
pub mod food;
pub mod generation;
pub mod geometry;
pub mod grid_search;
pub mod interpolator;
pub mod metrics;
pub mod rng;
pub mod simulation;
pub mod stage;

// Re-export main types
pub use analysis::{ComparisonReport, ExportSystem};
pub use config::Config;
pub use creature::{Creature, MutatableTrait, Traits};
pub use experiment::{
    run_full_experiment, ExperimentHandle, ExperimentOutcome, ExperimentResults, ProgressUpdate, RunResult,
};
pub use generation::Generation;
pub use grid_search::{run_grid_search, run_hill_climb, GridSearchResult, HillClimbResult};
pub use metrics::GenerationMetrics;
pub use rng::SimRng;
pub use simulation::Simulation;
pub use stage::Stage;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Time a mutate-and-breed simulation in the default training environment
pub fn benchmark(generations: usize, population: usize) -> BenchmarkResult {
    use std::time::Instant;

    let config = Config::default();
    let mut sim = Simulation::for_environment(
        &config.training_env,
        &config.behaviour,
        "benchmark",
        Box::new(behaviour::BasicReproduction),
    );
    let creatures = sim.spawn_population(population, config.creature.evolutionary_traits(), config.creature.energy);

    let start = Instant::now();
    sim.run(creatures, generations);
    let elapsed = start.elapsed().as_secs_f64();

    let generations_run = sim.generations.len();
    BenchmarkResult {
        generations,
        generations_run,
        initial_population: population,
        final_population: sim.survivors().len(),
        total_steps: sim.generations.iter().map(|g| g.steps as u64).sum(),
        elapsed_secs: elapsed,
        generations_per_second: if elapsed > 0.0 { generations_run as f64 / elapsed } else { 0.0 },
    }
}

/// Benchmark result
#[derive(Debug, Clone)]
pub struct BenchmarkResult {
    pub generations: usize,
    /// Fewer than requested when the population died out
    pub generations_run: usize,
    pub initial_population: usize,
    pub final_population: usize,
    pub total_steps: u64,
    pub elapsed_secs: f64,
    pub generations_per_second: f64,
}

impl std::fmt::Display for BenchmarkResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Benchmark Results ===")?;
        writeln!(f, "Generations: {} of {}", self.generations_run, self.generations)?;
        writeln!(f, "Population: {} -> {}", self.initial_population, self.final_population)?;
        writeln!(f, "Steps: {}", self.total_steps)?;
        writeln!(f, "Time: {:.3}s", self.elapsed_secs)?;
        writeln!(f, "Speed: {:.1} generations/s", self.generations_per_second)?;
        Ok(())
    }
}
