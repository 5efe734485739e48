//! Data export system for analysis in external tools.

use crate::analysis::comparison::{ComparisonReport, MetricPhase};
use crate::experiment::{ExperimentResults, RunResult};
use crate::grid_search::GridSearchResult;
use crate::metrics::GenerationMetrics;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Result, Write};
use std::path::Path;

/// Header of the per-generation metrics CSV
pub const METRICS_HEADER: &str = "run,seed,generation,population,meanFoodEaten,medianFoodEaten,survivalRate,reproductionRate,meanSpeed,meanSize,meanSenseRange,meanReach,meanFleeDistance,speedVariance,sizeVariance,senseRangeVariance,reachVariance,traitDiversity,shannonDiversity,creaturesEaten,energyEfficiency,computationSteps";

/// Header of the grid search CSV
pub const GRID_HEADER: &str = "speed,size,senseRange,meanFoodEaten,populationSurvived";

/// Files written by [`ExportSystem::export_all`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportManifest {
    pub results_file: String,
    pub grid_file: String,
    pub metrics_files: Vec<String>,
    pub report_file: String,
}

/// Export system for saving experiment data
pub struct ExportSystem;

fn write_metrics_row<W: Write>(out: &mut W, run: usize, seed: u64, m: &GenerationMetrics) -> Result<()> {
    writeln!(
        out,
        "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
        run,
        seed,
        m.generation,
        m.population,
        m.mean_food_eaten,
        m.median_food_eaten,
        m.survival_rate,
        m.reproduction_rate,
        m.mean_speed,
        m.mean_size,
        m.mean_sense_range,
        m.mean_reach,
        m.mean_flee_distance,
        m.speed_variance,
        m.size_variance,
        m.sense_range_variance,
        m.reach_variance,
        m.trait_diversity,
        m.shannon_diversity,
        m.creatures_eaten,
        m.energy_efficiency,
        m.computation_steps,
    )
}

impl ExportSystem {
    /// Write one phase of every run as CSV; run numbers are 1-based
    pub fn write_metrics_csv<W: Write>(out: &mut W, runs: &[RunResult], phase: MetricPhase) -> Result<()> {
        writeln!(out, "{}", METRICS_HEADER)?;
        for (i, run) in runs.iter().enumerate() {
            let metrics = match phase {
                MetricPhase::Training => &run.training_metrics,
                MetricPhase::Transfer => &run.transfer_metrics,
            };
            for m in metrics {
                write_metrics_row(out, i + 1, run.seed, m)?;
            }
        }
        Ok(())
    }

    pub fn write_grid_csv<W: Write>(out: &mut W, grid: &GridSearchResult) -> Result<()> {
        writeln!(out, "{}", GRID_HEADER)?;
        for e in &grid.entries {
            writeln!(
                out,
                "{},{},{},{},{}",
                e.speed, e.size, e.sense_range, e.mean_food_eaten, e.population_survived
            )?;
        }
        Ok(())
    }

    /// Export per-generation metrics to CSV
    pub fn export_metrics_csv<P: AsRef<Path>>(runs: &[RunResult], phase: MetricPhase, path: P) -> Result<()> {
        let mut file = BufWriter::new(File::create(path)?);
        Self::write_metrics_csv(&mut file, runs, phase)?;
        file.flush()
    }

    /// Export grid search entries to CSV
    pub fn export_grid_csv<P: AsRef<Path>>(grid: &GridSearchResult, path: P) -> Result<()> {
        let mut file = BufWriter::new(File::create(path)?);
        Self::write_grid_csv(&mut file, grid)?;
        file.flush()
    }

    /// Export the full results to JSON
    pub fn export_results_json<P: AsRef<Path>>(results: &ExperimentResults, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load results written by [`Self::export_results_json`]
    pub fn load_results_json<P: AsRef<Path>>(path: P) -> Result<ExperimentResults> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Export the comparison table as text
    pub fn export_report<P: AsRef<Path>>(report: &ComparisonReport, path: P) -> Result<()> {
        let mut file = File::create(path)?;
        writeln!(file, "{}", report)?;
        Ok(())
    }

    /// Export results, grid, the metric tables of every condition that ran,
    /// and the report into `base_path`
    pub fn export_all<P: AsRef<Path>>(results: &ExperimentResults, base_path: P) -> Result<ExportManifest> {
        let base = base_path.as_ref();
        std::fs::create_dir_all(base)?;

        let results_path = base.join("results.json");
        let grid_path = base.join("grid_search.csv");
        let report_path = base.join("comparison.txt");

        Self::export_results_json(results, &results_path)?;
        Self::export_grid_csv(&results.grid_search_result, &grid_path)?;

        let tables = [
            ("training_metrics_et.csv", &results.et_runs, MetricPhase::Training),
            ("transfer_metrics_et.csv", &results.et_runs, MetricPhase::Transfer),
            ("training_metrics_gs.csv", &results.gs_runs, MetricPhase::Training),
            ("transfer_metrics_gs.csv", &results.gs_runs, MetricPhase::Transfer),
            ("training_metrics_rnd.csv", &results.rnd_runs, MetricPhase::Training),
            ("transfer_metrics_rnd.csv", &results.rnd_runs, MetricPhase::Transfer),
        ];
        let mut metrics_files = Vec::with_capacity(tables.len());
        for (name, runs, phase) in tables {
            // the random baseline is optional
            if runs.is_empty() && name.ends_with("_rnd.csv") {
                continue;
            }
            let path = base.join(name);
            Self::export_metrics_csv(runs, phase, &path)?;
            metrics_files.push(path.to_string_lossy().to_string());
        }

        Self::export_report(&ComparisonReport::from_results(results), &report_path)?;

        log::info!("Exported results to {}", base.display());

        Ok(ExportManifest {
            results_file: results_path.to_string_lossy().to_string(),
            grid_file: grid_path.to_string_lossy().to_string(),
            metrics_files,
            report_file: report_path.to_string_lossy().to_string(),
        })
    }
}
