//! Full experiment: grid search, then paired ET and GS replications (plus an
//! optional random-trait baseline) across the training and transfer
//! environments.

use crate::behaviour::{BasicReproduction, CloneReproduction, RandomReproduction, ReproductionBehaviour};
use crate::config::{Config, EnvironmentConfig};
use crate::creature::{Creature, Traits};
use crate::grid_search::{run_grid_search_until, run_hill_climb, GridSearchResult, GridSearchSetup, HillClimbResult};
use crate::metrics::{collect_all, GenerationMetrics};
use crate::simulation::Simulation;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

/// Experimental conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Condition {
    /// Mutate-and-breed from the default traits
    Evolutionary,
    /// Clone the best grid point
    GridSearch,
    /// Fresh uniformly random traits every generation
    Random,
}

impl Condition {
    pub fn label(self) -> &'static str {
        match self {
            Condition::Evolutionary => "et",
            Condition::GridSearch => "gs",
            Condition::Random => "rnd",
        }
    }

    /// Conditions `config` asks for, in run order
    pub fn enabled(config: &Config) -> Vec<Condition> {
        let mut conditions = vec![Condition::Evolutionary, Condition::GridSearch];
        if config.experiment.random_baseline {
            conditions.push(Condition::Random);
        }
        conditions
    }

    fn reproduction(self, config: &Config) -> Box<dyn ReproductionBehaviour> {
        match self {
            Condition::Evolutionary => Box::new(BasicReproduction),
            Condition::GridSearch => Box::new(CloneReproduction),
            Condition::Random => Box::new(RandomReproduction::new(
                config.experiment.population_size,
                config.creature.clone(),
            )),
        }
    }

    fn phases(self) -> (ProgressPhase, ProgressPhase) {
        match self {
            Condition::Evolutionary => (ProgressPhase::EtTraining, ProgressPhase::EtTransfer),
            Condition::GridSearch => (ProgressPhase::GsTraining, ProgressPhase::GsTransfer),
            Condition::Random => (ProgressPhase::RndTraining, ProgressPhase::RndTransfer),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProgressPhase {
    GridSearch,
    EtTraining,
    EtTransfer,
    GsTraining,
    GsTransfer,
    RndTraining,
    RndTransfer,
}

impl fmt::Display for ProgressPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProgressPhase::GridSearch => "grid-search",
            ProgressPhase::EtTraining => "et-training",
            ProgressPhase::EtTransfer => "et-transfer",
            ProgressPhase::GsTraining => "gs-training",
            ProgressPhase::GsTransfer => "gs-transfer",
            ProgressPhase::RndTraining => "rnd-training",
            ProgressPhase::RndTransfer => "rnd-transfer",
        };
        write!(f, "{}", s)
    }
}

/// Progress report emitted between units of work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub phase: ProgressPhase,
    /// 1-based run index; 0 during grid search
    pub current_run: usize,
    pub total_runs: usize,
    pub current_generation: usize,
    pub total_generations: usize,
    pub percent_complete: f64,
}

/// One replication of one condition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub seed: u64,
    pub training_metrics: Vec<GenerationMetrics>,
    pub transfer_metrics: Vec<GenerationMetrics>,
    /// Living creatures at the end of the transfer phase
    pub final_creatures: Vec<Creature>,
}

impl RunResult {
    /// Generation steps spent in the training phase
    pub fn training_steps(&self) -> u64 {
        self.training_metrics.iter().map(|m| u64::from(m.computation_steps)).sum()
    }
}

/// Everything the experiment produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentResults {
    pub config: Config,
    pub grid_search_result: GridSearchResult,
    pub et_runs: Vec<RunResult>,
    pub gs_runs: Vec<RunResult>,
    /// Random baseline runs; empty unless `experiment.random_baseline` is set
    #[serde(default)]
    pub rnd_runs: Vec<RunResult>,
    pub wall_clock_ms: u64,
}

/// Metrics and survivors of one phase
pub struct PhaseOutcome {
    pub metrics: Vec<GenerationMetrics>,
    pub survivors: Vec<Creature>,
}

fn run_phase(sim: &mut Simulation, creatures: Vec<Creature>, generations: usize) -> PhaseOutcome {
    sim.run(creatures, generations);
    PhaseOutcome {
        metrics: collect_all(&sim.generations),
        survivors: sim.survivors(),
    }
}

fn phase_simulation(config: &Config, env: &EnvironmentConfig, label: &str, condition: Condition) -> Simulation {
    Simulation::for_environment(env, &config.behaviour, label, condition.reproduction(config))
}

/// Starting traits for a condition; `None` when every creature draws its own
pub fn initial_traits(config: &Config, condition: Condition, grid: &GridSearchResult) -> Option<Traits> {
    match condition {
        Condition::Evolutionary => Some(config.creature.evolutionary_traits()),
        Condition::GridSearch => Some(config.creature.fixed_traits(
            grid.best_speed,
            grid.best_size,
            grid.best_sense_range,
        )),
        Condition::Random => None,
    }
}

fn spawn_initial(sim: &mut Simulation, config: &Config, condition: Condition, grid: &GridSearchResult) -> Vec<Creature> {
    let count = config.experiment.population_size;
    match initial_traits(config, condition, grid) {
        Some(traits) => sim.spawn_population(count, traits, config.creature.energy),
        None => sim.spawn_random_population(count, &config.creature),
    }
}

/// Training phase of one replication
pub fn run_training(config: &Config, condition: Condition, seed: u64, grid: &GridSearchResult) -> PhaseOutcome {
    let label = format!("{}-train-{}", condition.label(), seed);
    let mut sim = phase_simulation(config, &config.training_env, &label, condition);
    let creatures = spawn_initial(&mut sim, config, condition, grid);
    run_phase(&mut sim, creatures, config.experiment.training_generations)
}

/// Transfer phase: survivors pass through the reproduction policy once, then run.
///
/// With `experiment.respawn_on_extinction` an empty survivor set is replaced
/// by a fresh starting population for the condition.
pub fn run_transfer(
    config: &Config,
    condition: Condition,
    seed: u64,
    survivors: &[Creature],
    grid: &GridSearchResult,
) -> PhaseOutcome {
    let label = format!("{}-transfer-{}", condition.label(), seed);
    let mut sim = phase_simulation(config, &config.transfer_env, &label, condition);
    let creatures = if survivors.is_empty() && config.experiment.respawn_on_extinction {
        log::info!("{}: no survivors to transfer, respawning", label);
        spawn_initial(&mut sim, config, condition, grid)
    } else {
        sim.exec_reproduction(survivors)
    };
    run_phase(&mut sim, creatures, config.experiment.transfer_generations)
}

/// One full replication (training then transfer) with seed `base_seed + run_index`
pub fn run_replication(
    config: &Config,
    condition: Condition,
    run_index: usize,
    grid: &GridSearchResult,
) -> RunResult {
    let seed = config.experiment.base_seed + run_index as u64;
    let training = run_training(config, condition, seed, grid);
    let transfer = run_transfer(config, condition, seed, &training.survivors, grid);

    RunResult {
        seed,
        training_metrics: training.metrics,
        transfer_metrics: transfer.metrics,
        final_creatures: transfer.survivors,
    }
}

fn training_setup(config: &Config, seed: u64) -> GridSearchSetup<'_> {
    GridSearchSetup {
        env: &config.training_env,
        behaviour: &config.behaviour,
        creature: &config.creature,
        population_size: config.experiment.population_size,
        seed,
    }
}

/// Hill climb over the training environment, seeded like run `seed`
pub fn run_config_hill_climb(config: &Config, seed: u64, budget: u64) -> HillClimbResult {
    run_hill_climb(&training_setup(config, seed), budget)
}

/// Grid search over the training environment with the configured value sets
pub fn run_config_grid_search<F>(config: &Config, on_progress: F) -> GridSearchResult
where
    F: Fn(usize, usize) + Sync,
{
    run_config_grid_search_until(config, on_progress, || false)
        .unwrap_or_else(|| GridSearchResult::empty(&config.creature))
}

/// Cancellable grid search; `None` once `should_cancel` fires
pub fn run_config_grid_search_until<F, C>(config: &Config, on_progress: F, should_cancel: C) -> Option<GridSearchResult>
where
    F: Fn(usize, usize) + Sync,
    C: Fn() -> bool + Sync,
{
    let setup = training_setup(config, config.experiment.base_seed);
    let values = &config.grid_search;
    run_grid_search_until(
        &values.speed_size_values,
        &values.speed_size_values,
        &values.sense_values,
        &setup,
        config.experiment.parallel_grid,
        on_progress,
        should_cancel,
    )
}

/// Run the whole experiment.
///
/// `should_cancel` is polled after every grid point, before every run, and
/// between each run's training and transfer phases; a cancelled experiment
/// returns `None` and its partial results are discarded. Every run phase
/// counts as one unit of work next to the grid points.
pub fn run_full_experiment<P, C>(config: &Config, on_progress: P, should_cancel: C) -> Option<ExperimentResults>
where
    P: Fn(ProgressUpdate) + Sync,
    C: Fn() -> bool + Sync,
{
    let start = Instant::now();
    let runs = config.experiment.num_runs;
    let grid_evals = config.grid_size();
    let conditions = Condition::enabled(config);
    let total_work = (grid_evals + runs * 2 * conditions.len()).max(1);

    let report = |phase: ProgressPhase, run: usize, generation: usize, total_generations: usize, done: usize| {
        on_progress(ProgressUpdate {
            phase,
            current_run: run,
            total_runs: runs,
            current_generation: generation,
            total_generations,
            percent_complete: done as f64 / total_work as f64 * 100.0,
        });
    };

    log::info!("Grid search over {} points", grid_evals);
    let grid = match run_config_grid_search_until(
        config,
        |done, total| report(ProgressPhase::GridSearch, 0, done, total, done),
        &should_cancel,
    ) {
        Some(grid) => grid,
        None => {
            log::info!("Experiment cancelled during grid search");
            return None;
        }
    };

    let training_gens = config.experiment.training_generations;
    let transfer_gens = config.experiment.transfer_generations;
    let (mut et_runs, mut gs_runs, mut rnd_runs) = (Vec::new(), Vec::new(), Vec::new());

    for (offset, &condition) in conditions.iter().enumerate() {
        let (training_phase, transfer_phase) = condition.phases();
        let mut results = Vec::with_capacity(runs);

        log::info!("Running {} {} replications", runs, condition.label().to_uppercase());

        for r in 0..runs {
            if should_cancel() {
                log::info!("Experiment cancelled before {} run {}", condition.label(), r + 1);
                return None;
            }

            let base = grid_evals + offset * runs * 2 + r * 2;
            let seed = config.experiment.base_seed + r as u64;

            report(training_phase, r + 1, 0, training_gens, base);
            let training = run_training(config, condition, seed, &grid);

            if should_cancel() {
                log::info!("Experiment cancelled after {} run {} training", condition.label(), r + 1);
                return None;
            }

            report(transfer_phase, r + 1, 0, transfer_gens, base + 1);
            let transfer = run_transfer(config, condition, seed, &training.survivors, &grid);

            log::info!(
                "{} run {}/{} (seed {}): {} training and {} transfer generations, {} survivors",
                condition.label().to_uppercase(),
                r + 1,
                runs,
                seed,
                training.metrics.len(),
                transfer.metrics.len(),
                transfer.survivors.len()
            );

            results.push(RunResult {
                seed,
                training_metrics: training.metrics,
                transfer_metrics: transfer.metrics,
                final_creatures: transfer.survivors,
            });
            report(transfer_phase, r + 1, transfer_gens, transfer_gens, base + 2);
        }

        match condition {
            Condition::Evolutionary => et_runs = results,
            Condition::GridSearch => gs_runs = results,
            Condition::Random => rnd_runs = results,
        }
    }

    let wall_clock_ms = start.elapsed().as_millis() as u64;
    log::info!("Experiment finished in {:.1}s", wall_clock_ms as f64 / 1000.0);

    Some(ExperimentResults {
        config: config.clone(),
        grid_search_result: grid,
        et_runs,
        gs_runs,
        rnd_runs,
        wall_clock_ms,
    })
}
