//! Transfer sweep: measures how ET and GS survivors cope with a range of
//! transfer arenas.

use clap::Parser;
use evoshift::config::EnvironmentConfig;
use evoshift::diversity::{mean, sample_variance};
use evoshift::experiment::{run_config_grid_search, run_training, run_transfer, Condition};
use evoshift::Config;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "transfer-sweep")]
struct Args {
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,
    /// Replications per condition
    #[arg(short, long, default_value = "5")]
    runs: usize,
    /// Transfer arena sizes
    #[arg(long, value_delimiter = ',', default_value = "500,650,800,1000")]
    sizes: Vec<f64>,
    /// Food per generation in the transfer arena
    #[arg(long, value_delimiter = ',', default_value = "50,30,15")]
    foods: Vec<f64>,
}

struct VariantResult {
    world_size: f64,
    food: f64,
    et_fitness: Vec<f64>,
    gs_fitness: Vec<f64>,
}

fn mean_fitness(metrics: &[evoshift::GenerationMetrics]) -> f64 {
    if metrics.is_empty() {
        return 0.0;
    }
    mean(&metrics.iter().map(|m| m.mean_food_eaten).collect::<Vec<_>>())
}

fn summary(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let m = mean(values);
    (m, sample_variance(values, m).sqrt())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let mut config = if args.config.exists() {
        Config::from_file(&args.config)?
    } else {
        Config::default()
    };
    config.experiment.num_runs = args.runs;
    config.validate()?;

    println!("=== Transfer Sweep ===");
    println!("Runs per condition: {}", args.runs);
    println!("Variants: {}", args.sizes.len() * args.foods.len());
    println!();

    println!("Grid search ({} points)...", config.grid_size());
    let grid = run_config_grid_search(&config, |_, _| {});
    println!(
        "Best: speed={} size={} sense={}",
        grid.best_speed, grid.best_size, grid.best_sense_range
    );
    println!();

    // Train once per run and condition, then reuse the survivors for every variant
    let mut trained = Vec::new();
    for condition in [Condition::Evolutionary, Condition::GridSearch] {
        for r in 0..args.runs {
            let seed = config.experiment.base_seed + r as u64;
            let outcome = run_training(&config, condition, seed, &grid);
            println!(
                "Trained {} run {}: {} survivors",
                condition.label().to_uppercase(),
                r + 1,
                outcome.survivors.len()
            );
            trained.push((condition, seed, outcome.survivors));
        }
    }
    println!();

    let mut results = Vec::new();
    for &world_size in &args.sizes {
        for &food in &args.foods {
            let mut variant = config.clone();
            variant.transfer_env = EnvironmentConfig {
                world_size,
                food_per_generation: food,
                ..config.transfer_env.clone()
            };

            let mut et_fitness = Vec::new();
            let mut gs_fitness = Vec::new();
            for (condition, seed, survivors) in &trained {
                let outcome = run_transfer(&variant, *condition, *seed, survivors, &grid);
                let fitness = mean_fitness(&outcome.metrics);
                if *condition == Condition::Evolutionary {
                    et_fitness.push(fitness);
                } else {
                    gs_fitness.push(fitness);
                }
            }

            results.push(VariantResult {
                world_size,
                food,
                et_fitness,
                gs_fitness,
            });
        }
    }

    // Summary
    println!("=== SUMMARY ===");
    println!("{:>8} {:>6} {:>16} {:>16} {:>8}", "size", "food", "ET fitness", "GS fitness", "winner");
    let mut et_wins = 0;
    for r in &results {
        let (et_mean, et_sd) = summary(&r.et_fitness);
        let (gs_mean, gs_sd) = summary(&r.gs_fitness);
        let winner = if et_mean > gs_mean {
            et_wins += 1;
            "ET"
        } else if gs_mean > et_mean {
            "GS"
        } else {
            "tie"
        };
        println!(
            "{:>8} {:>6} {:>8.3} ± {:<5.3} {:>8.3} ± {:<5.3} {:>8}",
            r.world_size, r.food, et_mean, et_sd, gs_mean, gs_sd, winner
        );
    }

    println!();
    println!("ET ahead in {}/{} variants", et_wins, results.len());

    Ok(())
}
