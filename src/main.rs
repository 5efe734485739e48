//! evoshift - CLI Entry Point
//!
//! Evolutionary training vs. grid search under environmental shift.

use clap::{Parser, Subcommand};
use evoshift::analysis::{final_metric_values, initial_metric_values, MetricPhase};
use evoshift::behaviour::{BasicReproduction, CloneReproduction, RandomReproduction, ReproductionBehaviour};
use evoshift::diversity::mean;
use evoshift::experiment::{run_config_grid_search, run_config_hill_climb, run_training, Condition};
use evoshift::metrics::collect_all;
use evoshift::{
    benchmark, ComparisonReport, Config, ExperimentHandle, ExperimentOutcome, ExportSystem, GridSearchResult, RunResult,
    Simulation,
};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "evoshift")]
#[command(version)]
#[command(about = "Evolutionary training vs. grid-search optimisation under environmental shift")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full ET-vs-GS experiment
    Run {
        /// Configuration file (YAML)
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,

        /// Output directory for CSV/JSON results
        #[arg(short, long, default_value = "output")]
        output: PathBuf,

        /// Base seed (run r uses seed + r)
        #[arg(long)]
        seed: Option<u64>,

        /// Replications per condition
        #[arg(long)]
        runs: Option<usize>,

        /// Also run the random-trait baseline
        #[arg(long)]
        random_baseline: bool,

        /// Quiet mode (minimal output)
        #[arg(short, long)]
        quiet: bool,
    },

    /// Run only the grid search
    GridSearch {
        /// Configuration file (YAML)
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,

        /// Write the grid entries to this CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run a single simulation in the training environment
    Simulate {
        /// Configuration file (YAML)
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,

        /// Number of generations
        #[arg(short, long, default_value = "100")]
        generations: usize,

        /// Random seed
        #[arg(long, default_value = "1000")]
        seed: u64,

        /// Clone the configured traits instead of mutating them
        #[arg(long, conflicts_with = "random")]
        clone: bool,

        /// Draw fresh random traits every generation
        #[arg(long)]
        random: bool,
    },

    /// Hill-climb (speed, size, sense) under the step budget of one ET training run
    Optimize {
        /// Configuration file (YAML)
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,

        /// Seed of the ET run whose budget is matched
        #[arg(long, default_value = "1000")]
        seed: u64,

        /// Explicit step budget instead of measuring an ET run
        #[arg(long)]
        budget: Option<u64>,
    },

    /// Generate default configuration file
    Init {
        /// Output path
        #[arg(short, long, default_value = "config.yaml")]
        output: PathBuf,
    },

    /// Run performance benchmark
    Benchmark {
        /// Number of generations
        #[arg(short, long, default_value = "50")]
        generations: usize,

        /// Population size
        #[arg(short, long, default_value = "100")]
        population: usize,
    },

    /// Print the comparison report of a saved results.json
    Analyze {
        /// Results file
        results: PathBuf,
    },
}

fn init_logging(level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn load_config(path: &Path) -> Result<Config, Box<dyn std::error::Error>> {
    if path.exists() {
        println!("Loading config from: {:?}", path);
        Config::from_file(path)
    } else {
        println!("Using default configuration");
        Ok(Config::default())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            output,
            seed,
            runs,
            random_baseline,
            quiet,
        } => run_experiment(config, output, seed, runs, random_baseline, quiet),

        Commands::GridSearch { config, output } => grid_search(config, output),

        Commands::Simulate {
            config,
            generations,
            seed,
            clone,
            random,
        } => simulate(config, generations, seed, clone, random),

        Commands::Optimize { config, seed, budget } => optimize(config, seed, budget),

        Commands::Init { output } => {
            init_logging("info");
            generate_config(output)
        }

        Commands::Benchmark { generations, population } => {
            init_logging("info");
            run_benchmark(generations, population)
        }

        Commands::Analyze { results } => {
            init_logging("info");
            analyze_results(results)
        }
    }
}

fn run_experiment(
    config_path: PathBuf,
    output: PathBuf,
    seed: Option<u64>,
    runs: Option<usize>,
    random_baseline: bool,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config(&config_path)?;
    init_logging(&config.logging.log_level);

    if let Some(s) = seed {
        println!("Using base seed: {}", s);
        config.experiment.base_seed = s;
    }
    if let Some(r) = runs {
        config.experiment.num_runs = r;
    }
    if random_baseline {
        config.experiment.random_baseline = true;
    }
    config.validate()?;

    std::fs::create_dir_all(&output)?;

    println!("Starting experiment");
    println!("  Runs per condition: {}", config.experiment.num_runs);
    println!(
        "  Generations: {} training + {} transfer",
        config.experiment.training_generations, config.experiment.transfer_generations
    );
    println!("  Grid points: {}", config.grid_size());
    println!();

    let start = Instant::now();
    let handle = ExperimentHandle::spawn(config);
    let mut last_percent = f64::NEG_INFINITY;

    let outcome = handle.wait(|update| {
        if quiet || update.percent_complete - last_percent < 1.0 {
            return;
        }
        last_percent = update.percent_complete;
        if update.current_run == 0 {
            println!("[{:5.1}%] {}", update.percent_complete, update.phase);
        } else {
            println!(
                "[{:5.1}%] {} run {}/{}",
                update.percent_complete, update.phase, update.current_run, update.total_runs
            );
        }
    });

    let results = match outcome {
        ExperimentOutcome::Complete(results) => results,
        ExperimentOutcome::Cancelled => {
            println!("Experiment cancelled");
            return Ok(());
        }
        ExperimentOutcome::Error(msg) => return Err(msg.into()),
    };

    let grid = &results.grid_search_result;
    println!();
    println!("=== Experiment Complete ===");
    println!("Time: {:.2}s", start.elapsed().as_secs_f64());
    println!(
        "Grid search best: speed={} size={} sense={} (fitness {:.3})",
        grid.best_speed, grid.best_size, grid.best_sense_range, grid.best_fitness
    );
    println!();
    println!("{}", ComparisonReport::from_results(&results));
    print_random_baseline(&results.rnd_runs);

    let manifest = ExportSystem::export_all(&results, &output)?;
    println!();
    println!("Results: {}", manifest.results_file);
    println!("Grid search: {}", manifest.grid_file);
    for file in &manifest.metrics_files {
        println!("Metrics: {}", file);
    }

    Ok(())
}

fn grid_search(config_path: PathBuf, output: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(&config_path)?;
    init_logging(&config.logging.log_level);
    config.validate()?;

    let start = Instant::now();
    let result = run_config_grid_search(&config, |done, total| {
        log::debug!("Grid point {}/{}", done, total);
    });

    println!("=== Grid Search Complete ===");
    println!("Points: {}", result.entries.len());
    println!("Time: {:.2}s", start.elapsed().as_secs_f64());
    println!("Best speed: {}", result.best_speed);
    println!("Best size: {}", result.best_size);
    println!("Best sense range: {}", result.best_sense_range);
    println!("Best fitness: {:.3}", result.best_fitness);

    if let Some(path) = output {
        ExportSystem::export_grid_csv(&result, &path)?;
        println!("Grid entries: {:?}", path);
    }

    Ok(())
}

fn simulate(
    config_path: PathBuf,
    generations: usize,
    seed: u64,
    clone: bool,
    random: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(&config_path)?;
    init_logging(&config.logging.log_level);
    config.validate()?;

    let c = &config.creature;
    let count = config.experiment.population_size;
    let (label, traits, reproduction): (String, _, Box<dyn ReproductionBehaviour>) = if clone {
        (
            format!("gs-train-{}", seed),
            Some(c.fixed_traits(c.speed, c.size, c.sense_range)),
            Box::new(CloneReproduction),
        )
    } else if random {
        (
            format!("rnd-train-{}", seed),
            None,
            Box::new(RandomReproduction::new(count, c.clone())),
        )
    } else {
        (format!("et-train-{}", seed), Some(c.evolutionary_traits()), Box::new(BasicReproduction))
    };

    let mut sim = Simulation::for_environment(&config.training_env, &config.behaviour, &label, reproduction);
    let creatures = match traits {
        Some(traits) => sim.spawn_population(count, traits, c.energy),
        None => sim.spawn_random_population(count, c),
    };

    println!("Simulating {} ({} reproduction)", label, sim.reproduction_name());
    println!();

    let start = Instant::now();
    sim.run(creatures, generations);

    for m in collect_all(&sim.generations) {
        println!(
            "Gen {:>4} | Pop: {:>4} | Food: {:>6.3} | Survival: {:>5.1}% | Speed: {:>6.2} | Size: {:>6.2} | Sense: {:>6.2} | Steps: {:>5}",
            m.generation,
            m.population,
            m.mean_food_eaten,
            m.survival_rate * 100.0,
            m.mean_speed,
            m.mean_size,
            m.mean_sense_range,
            m.computation_steps
        );
    }

    println!();
    println!("=== Simulation Complete ===");
    println!("Time: {:.2}s", start.elapsed().as_secs_f64());
    println!("Generations: {}", sim.generations.len());
    println!("Survivors: {}", sim.survivors().len());

    Ok(())
}

fn optimize(config_path: PathBuf, seed: u64, budget: Option<u64>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(&config_path)?;
    init_logging(&config.logging.log_level);
    config.validate()?;

    let budget = match budget {
        Some(b) => b,
        None => {
            let grid = GridSearchResult::empty(&config.creature);
            let et = run_training(&config, Condition::Evolutionary, seed, &grid);
            let steps: u64 = et.metrics.iter().map(|m| u64::from(m.computation_steps)).sum();
            println!("ET training (seed {}) used {} steps over {} generations", seed, steps, et.metrics.len());
            steps
        }
    };

    let start = Instant::now();
    let result = run_config_hill_climb(&config, seed, budget);

    println!();
    println!("=== Hill Climb Complete ===");
    println!("Time: {:.2}s", start.elapsed().as_secs_f64());
    println!("Evaluations: {}", result.evaluations);
    println!("Steps: {} of {}", result.steps_used, budget);
    println!("Best speed: {:.3}", result.best_speed);
    println!("Best size: {:.3}", result.best_size);
    println!("Best sense range: {:.3}", result.best_sense_range);
    println!("Best fitness: {:.3}", result.best_fitness);

    Ok(())
}

fn print_random_baseline(runs: &[RunResult]) {
    if runs.is_empty() {
        return;
    }
    let food = |m: &evoshift::GenerationMetrics| m.mean_food_eaten;
    println!();
    println!("Random baseline ({} runs)", runs.len());
    println!(
        "  Final training fitness (mean): {:.4}",
        mean(&final_metric_values(runs, MetricPhase::Training, food, Some(10)))
    );
    println!(
        "  Transfer fitness (gen 1-10):   {:.4}",
        mean(&initial_metric_values(runs, MetricPhase::Transfer, food, 10))
    );
}

fn run_benchmark(generations: usize, population: usize) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== evoshift Benchmark ===");
    println!("Generations: {}", generations);
    println!("Population: {}", population);
    println!();

    let result = benchmark(generations, population);
    println!("{}", result);

    Ok(())
}

fn generate_config(output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    config.save(&output)?;
    println!("Configuration saved to: {:?}", output);
    Ok(())
}

fn analyze_results(path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Results Analysis ===");
    println!("File: {:?}", path);
    println!();

    let results = ExportSystem::load_results_json(&path)?;
    let grid = &results.grid_search_result;

    println!("ET runs: {}", results.et_runs.len());
    println!("GS runs: {}", results.gs_runs.len());
    if !results.rnd_runs.is_empty() {
        println!("RND runs: {}", results.rnd_runs.len());
    }
    println!("Wall clock: {:.2}s", results.wall_clock_ms as f64 / 1000.0);
    println!(
        "Grid search best: speed={} size={} sense={} (fitness {:.3})",
        grid.best_speed, grid.best_size, grid.best_sense_range, grid.best_fitness
    );
    println!();
    println!("{}", ComparisonReport::from_results(&results));
    print_random_baseline(&results.rnd_runs);

    Ok(())
}
