//! Search over (speed, size, sense range) using single-generation evaluations:
//! an exhaustive grid, and a hill climb bounded by a step budget.

use crate::behaviour::CloneReproduction;
use crate::config::{BehaviourConfig, CreatureConfig, EnvironmentConfig};
use crate::rng::SimRng;
use crate::simulation::Simulation;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Result of evaluating one grid point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSearchEntry {
    pub speed: f64,
    pub size: f64,
    pub sense_range: f64,
    /// Food eaten per creature in the evaluation generation
    pub mean_food_eaten: f64,
    /// Creatures that ate at least once
    pub population_survived: usize,
}

/// All entries plus the best point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSearchResult {
    pub entries: Vec<GridSearchEntry>,
    pub best_speed: f64,
    pub best_size: f64,
    pub best_sense_range: f64,
    pub best_fitness: f64,
}

impl GridSearchResult {
    /// Pick the best entry; the earliest wins ties, creature defaults apply when empty
    fn from_entries(entries: Vec<GridSearchEntry>, defaults: &CreatureConfig) -> Self {
        let mut best: Option<&GridSearchEntry> = None;
        for entry in &entries {
            if best.map_or(true, |b| entry.mean_food_eaten > b.mean_food_eaten) {
                best = Some(entry);
            }
        }

        let (best_speed, best_size, best_sense_range, best_fitness) = match best {
            Some(b) => (b.speed, b.size, b.sense_range, b.mean_food_eaten),
            None => (defaults.speed, defaults.size, defaults.sense_range, 0.0),
        };

        Self {
            entries,
            best_speed,
            best_size,
            best_sense_range,
            best_fitness,
        }
    }

    /// No entries; the best point falls back to the creature defaults
    pub fn empty(defaults: &CreatureConfig) -> Self {
        Self::from_entries(Vec::new(), defaults)
    }

    pub fn best_entry(&self) -> Option<&GridSearchEntry> {
        self.entries.iter().find(|e| {
            e.speed == self.best_speed && e.size == self.best_size && e.sense_range == self.best_sense_range
        })
    }
}

/// Everything a grid evaluation needs besides the point itself
#[derive(Debug, Clone)]
pub struct GridSearchSetup<'a> {
    pub env: &'a EnvironmentConfig,
    pub behaviour: &'a BehaviourConfig,
    pub creature: &'a CreatureConfig,
    pub population_size: usize,
    pub seed: u64,
}

/// Seed label of one grid point
pub fn eval_label(seed: u64, speed: f64, size: f64, sense_range: f64) -> String {
    format!("gs-eval-{}-{}-{}-{}", seed, speed, size, sense_range)
}

/// Run one clone population for a single generation at the given point
pub fn evaluate_point(setup: &GridSearchSetup, speed: f64, size: f64, sense_range: f64) -> GridSearchEntry {
    let label = eval_label(setup.seed, speed, size, sense_range);
    evaluate_labelled(setup, &label, speed, size, sense_range).0
}

/// Evaluate a point under an explicit seed label; also returns the
/// generation's step count
fn evaluate_labelled(
    setup: &GridSearchSetup,
    label: &str,
    speed: f64,
    size: f64,
    sense_range: f64,
) -> (GridSearchEntry, u32) {
    let mut sim = Simulation::for_environment(setup.env, setup.behaviour, label, Box::new(CloneReproduction));

    let traits = setup.creature.fixed_traits(speed, size, sense_range);
    let creatures = sim.spawn_population(setup.population_size, traits, setup.creature.energy);
    let generation = sim.run_single_generation(creatures);

    let n = generation.creatures.len();
    let total_food = generation.total_food_eaten();
    let survived = generation.creatures.iter().filter(|c| c.food_count() > 0).count();

    let entry = GridSearchEntry {
        speed,
        size,
        sense_range,
        mean_food_eaten: if n > 0 { total_food as f64 / n as f64 } else { 0.0 },
        population_survived: survived,
    };

    log::debug!(
        "Grid point speed={} size={} sense={}: mean food {:.3}, {} survived",
        speed,
        size,
        sense_range,
        entry.mean_food_eaten,
        survived
    );

    (entry, generation.steps)
}

/// Evaluate the Cartesian product of the value sets.
///
/// Each point owns its simulation and seed label, so the parallel path yields
/// exactly the sequential result. `on_progress(done, total)` is called after
/// every point (in completion order when parallel).
pub fn run_grid_search<F>(
    speed_values: &[f64],
    size_values: &[f64],
    sense_values: &[f64],
    setup: &GridSearchSetup,
    parallel: bool,
    on_progress: F,
) -> GridSearchResult
where
    F: Fn(usize, usize) + Sync,
{
    let result = run_grid_search_until(
        speed_values,
        size_values,
        sense_values,
        setup,
        parallel,
        on_progress,
        || false,
    );
    result.unwrap_or_else(|| GridSearchResult::empty(setup.creature))
}

/// Like [`run_grid_search`], polling `should_cancel` after every point.
///
/// Returns `None` once cancelled; points already running on the pool finish
/// but their results are discarded.
pub fn run_grid_search_until<F, C>(
    speed_values: &[f64],
    size_values: &[f64],
    sense_values: &[f64],
    setup: &GridSearchSetup,
    parallel: bool,
    on_progress: F,
    should_cancel: C,
) -> Option<GridSearchResult>
where
    F: Fn(usize, usize) + Sync,
    C: Fn() -> bool + Sync,
{
    let points: Vec<(f64, f64, f64)> = speed_values
        .iter()
        .flat_map(|&speed| {
            size_values
                .iter()
                .flat_map(move |&size| sense_values.iter().map(move |&sense| (speed, size, sense)))
        })
        .collect();
    let total = points.len();

    log::info!("Grid search: evaluating {} points", total);

    let entries: Vec<GridSearchEntry> = if parallel {
        let done = AtomicUsize::new(0);
        let cancelled = AtomicBool::new(false);
        points
            .par_iter()
            .map(|&(speed, size, sense)| {
                if cancelled.load(Ordering::Relaxed) {
                    return None;
                }
                let entry = evaluate_point(setup, speed, size, sense);
                let count = done.fetch_add(1, Ordering::Relaxed) + 1;
                on_progress(count, total);
                if should_cancel() {
                    cancelled.store(true, Ordering::Relaxed);
                    return None;
                }
                Some(entry)
            })
            .collect::<Option<Vec<_>>>()?
    } else {
        let mut entries = Vec::with_capacity(total);
        for (i, &(speed, size, sense)) in points.iter().enumerate() {
            entries.push(evaluate_point(setup, speed, size, sense));
            on_progress(i + 1, total);
            if should_cancel() {
                log::info!("Grid search cancelled after {} of {} points", i + 1, total);
                return None;
            }
        }
        entries
    };

    let result = GridSearchResult::from_entries(entries, setup.creature);
    log::info!(
        "Grid search best: speed={} size={} sense={} (mean food {:.3})",
        result.best_speed,
        result.best_size,
        result.best_sense_range,
        result.best_fitness
    );
    Some(result)
}

/// Standard deviation of one hill-climb perturbation
pub const PERTURBATION_SD: f64 = 1.0;

/// Lower bounds for speed, size and sense range while climbing
const CLIMB_FLOORS: [f64; 3] = [0.01, 0.01, 0.0];

/// Outcome of [`run_hill_climb`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HillClimbResult {
    pub best_speed: f64,
    pub best_size: f64,
    pub best_sense_range: f64,
    pub best_fitness: f64,
    /// Evaluations including the starting point
    pub evaluations: usize,
    /// Generation steps spent across all evaluations
    pub steps_used: u64,
    /// Incumbent fitness after each evaluation
    pub history: Vec<f64>,
}

/// Seed label of one hill-climb evaluation
pub fn climb_label(seed: u64, evaluation: usize) -> String {
    format!("opt-eval-{}-{}", seed, evaluation)
}

/// Hill climb from the creature defaults until `budget` generation steps are spent.
///
/// Each iteration nudges one of speed, size or sense range by a gaussian
/// offset and keeps the candidate only if it eats strictly more. The start
/// point is always evaluated, so a zero budget still yields one evaluation.
pub fn run_hill_climb(setup: &GridSearchSetup, budget: u64) -> HillClimbResult {
    let mut rng = SimRng::from_label(&format!("opt-climb-{}", setup.seed));
    let mut best = [setup.creature.speed, setup.creature.size, setup.creature.sense_range];

    let (start, cost) = evaluate_labelled(setup, &climb_label(setup.seed, 0), best[0], best[1], best[2]);
    let mut best_fitness = start.mean_food_eaten;
    let mut steps_used = u64::from(cost.max(1));
    let mut history = vec![best_fitness];

    while steps_used < budget {
        let axis = (rng.uniform(0.0, 3.0) as usize).min(2);
        let offset = rng.gaussian(0.0, PERTURBATION_SD);
        let mut candidate = best;
        candidate[axis] = (candidate[axis] + offset).max(CLIMB_FLOORS[axis]);

        let label = climb_label(setup.seed, history.len());
        let (entry, cost) = evaluate_labelled(setup, &label, candidate[0], candidate[1], candidate[2]);
        steps_used += u64::from(cost.max(1));

        if entry.mean_food_eaten > best_fitness {
            best = candidate;
            best_fitness = entry.mean_food_eaten;
        }
        history.push(best_fitness);
    }

    log::info!(
        "Hill climb: {} evaluations, {} of {} steps, best speed={:.2} size={:.2} sense={:.2} (mean food {:.3})",
        history.len(),
        steps_used,
        budget,
        best[0],
        best[1],
        best[2],
        best_fitness
    );

    HillClimbResult {
        best_speed: best[0],
        best_size: best[1],
        best_sense_range: best[2],
        best_fitness,
        evaluations: history.len(),
        steps_used,
        history,
    }
}
