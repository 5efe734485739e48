//! Derived measures over replicated runs and the ET-vs-GS comparison report.

use crate::analysis::statistics::{
    descriptive_stats, linear_regression, mann_whitney_u, set_num_comparisons, welch_t_test_with,
    ComparisonResult,
};
use crate::diversity::mean;
use crate::experiment::{ExperimentResults, RunResult};
use crate::metrics::GenerationMetrics;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Generations averaged by the windowed measures
pub const WINDOW: usize = 10;

/// Generations averaged at each end by the recovery rate
pub const RECOVERY_WINDOW: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricPhase {
    Training,
    Transfer,
}

fn phase_metrics(run: &RunResult, phase: MetricPhase) -> &[GenerationMetrics] {
    match phase {
        MetricPhase::Training => &run.training_metrics,
        MetricPhase::Transfer => &run.transfer_metrics,
    }
}

fn mean_or_zero(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        mean(values)
    }
}

fn column<F>(metrics: &[GenerationMetrics], f: F) -> Vec<f64>
where
    F: Fn(&GenerationMetrics) -> f64,
{
    metrics.iter().map(f).collect()
}

/// Per run: the last value of `f`, or the mean of the last `last_n` values.
/// Runs without metrics contribute 0.
pub fn final_metric_values<F>(runs: &[RunResult], phase: MetricPhase, f: F, last_n: Option<usize>) -> Vec<f64>
where
    F: Fn(&GenerationMetrics) -> f64,
{
    runs.iter()
        .map(|run| {
            let values = column(phase_metrics(run, phase), &f);
            match (values.last(), last_n) {
                (None, _) => 0.0,
                (Some(&last), None) => last,
                (Some(_), Some(n)) => mean_or_zero(&values[values.len().saturating_sub(n)..]),
            }
        })
        .collect()
}

/// Per run: mean of the first `first_n` values of `f` (0 without metrics)
pub fn initial_metric_values<F>(runs: &[RunResult], phase: MetricPhase, f: F, first_n: usize) -> Vec<f64>
where
    F: Fn(&GenerationMetrics) -> f64,
{
    runs.iter()
        .map(|run| {
            let values = column(phase_metrics(run, phase), &f);
            mean_or_zero(&values[..first_n.min(values.len())])
        })
        .collect()
}

/// Per run: late-training fitness minus early-transfer fitness
pub fn generalization_gap(runs: &[RunResult]) -> Vec<f64> {
    runs.iter()
        .map(|run| {
            let train = column(&run.training_metrics, |m| m.mean_food_eaten);
            let transfer = column(&run.transfer_metrics, |m| m.mean_food_eaten);
            let late_train = mean_or_zero(&train[train.len().saturating_sub(WINDOW)..]);
            let early_transfer = mean_or_zero(&transfer[..WINDOW.min(transfer.len())]);
            late_train - early_transfer
        })
        .collect()
}

/// Per run: regression slope of mean food eaten across generations
pub fn fitness_trend_slopes(runs: &[RunResult], phase: MetricPhase) -> Vec<f64> {
    runs.iter()
        .map(|run| linear_regression(&column(phase_metrics(run, phase), |m| m.mean_food_eaten)).slope)
        .collect()
}

/// Relative change of mean food eaten between the first and last five
/// transfer generations; 0 for short runs or a zero baseline
pub fn recovery_rate(runs: &[RunResult]) -> Vec<f64> {
    runs.iter()
        .map(|run| {
            let values = column(&run.transfer_metrics, |m| m.mean_food_eaten);
            if values.len() < 2 * RECOVERY_WINDOW {
                return 0.0;
            }
            let first = mean(&values[..RECOVERY_WINDOW]);
            let last = mean(&values[values.len() - RECOVERY_WINDOW..]);
            if first > 0.0 {
                (last - first) / first
            } else {
                0.0
            }
        })
        .collect()
}

/// Per run: simulation steps summed over both phases
pub fn total_computation_steps(runs: &[RunResult]) -> Vec<f64> {
    runs.iter()
        .map(|run| {
            run.training_metrics
                .iter()
                .chain(&run.transfer_metrics)
                .map(|m| m.computation_steps as f64)
                .sum()
        })
        .collect()
}

/// One generation of a confidence-band chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartDataPoint {
    pub generation: usize,
    pub et_mean: f64,
    /// Lower edge of the 95% interval
    pub et_lower: f64,
    /// Interval width, never negative
    pub et_band: f64,
    pub gs_mean: f64,
    pub gs_lower: f64,
    pub gs_band: f64,
}

fn values_at<F>(runs: &[RunResult], phase: MetricPhase, generation: usize, f: &F) -> Vec<f64>
where
    F: Fn(&GenerationMetrics) -> f64,
{
    runs.iter()
        .filter_map(|run| phase_metrics(run, phase).get(generation).map(f))
        .collect()
}

/// Mean and 95% band per generation for both conditions. Runs that ended
/// early simply stop contributing.
pub fn chart_data<F>(et_runs: &[RunResult], gs_runs: &[RunResult], phase: MetricPhase, f: F) -> Vec<ChartDataPoint>
where
    F: Fn(&GenerationMetrics) -> f64,
{
    let longest = et_runs
        .iter()
        .chain(gs_runs)
        .map(|run| phase_metrics(run, phase).len())
        .max()
        .unwrap_or(0);

    (0..longest)
        .map(|generation| {
            let et = descriptive_stats(&values_at(et_runs, phase, generation, &f));
            let gs = descriptive_stats(&values_at(gs_runs, phase, generation, &f));
            ChartDataPoint {
                generation,
                et_mean: et.mean,
                et_lower: et.ci95_lower,
                et_band: (et.ci95_upper - et.ci95_lower).max(0.0),
                gs_mean: gs.mean,
                gs_lower: gs.ci95_lower,
                gs_band: (gs.ci95_upper - gs.ci95_lower).max(0.0),
            }
        })
        .collect()
}

/// Mean trait values at one index of the concatenated training+transfer timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraitEvolutionPoint {
    pub generation: usize,
    pub speed: f64,
    pub size: f64,
    pub sense_range: f64,
    pub reach: f64,
}

/// Average trait trajectories; each run's transfer generations follow its
/// own training generations
pub fn trait_evolution(runs: &[RunResult]) -> Vec<TraitEvolutionPoint> {
    let longest = runs
        .iter()
        .map(|r| r.training_metrics.len() + r.transfer_metrics.len())
        .max()
        .unwrap_or(0);
    let mut sums: Vec<([f64; 4], usize)> = vec![([0.0; 4], 0); longest];

    for run in runs {
        for (i, m) in run.training_metrics.iter().chain(&run.transfer_metrics).enumerate() {
            let (acc, count) = &mut sums[i];
            acc[0] += m.mean_speed;
            acc[1] += m.mean_size;
            acc[2] += m.mean_sense_range;
            acc[3] += m.mean_reach;
            *count += 1;
        }
    }

    sums.into_iter()
        .enumerate()
        .map(|(generation, (acc, count))| {
            let n = count as f64;
            TraitEvolutionPoint {
                generation,
                speed: acc[0] / n,
                size: acc[1] / n,
                sense_range: acc[2] / n,
                reach: acc[3] / n,
            }
        })
        .collect()
}

/// One measure of the report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub metric: String,
    pub result: ComparisonResult,
}

/// The ET-vs-GS comparison table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub num_comparisons: usize,
    pub rows: Vec<ComparisonRow>,
}

fn compare(metric: &str, et: &[f64], gs: &[f64], comparisons: usize) -> ComparisonRow {
    ComparisonRow {
        metric: metric.to_string(),
        result: ComparisonResult {
            et_stats: descriptive_stats(et),
            gs_stats: descriptive_stats(gs),
            t_test: welch_t_test_with(et, gs, comparisons),
            mann_whitney: mann_whitney_u(et, gs),
        },
    }
}

impl ComparisonReport {
    /// Build the standard ten-row table with a Bonferroni divisor of `num_comparisons`
    pub fn build(et_runs: &[RunResult], gs_runs: &[RunResult], num_comparisons: usize) -> Self {
        set_num_comparisons(num_comparisons);
        let n = num_comparisons;

        let both = |phase: MetricPhase, f: fn(&GenerationMetrics) -> f64, last_n: Option<usize>| {
            (
                final_metric_values(et_runs, phase, f, last_n),
                final_metric_values(gs_runs, phase, f, last_n),
            )
        };

        let mut rows = Vec::with_capacity(10);

        let (et, gs) = both(MetricPhase::Training, |m| m.mean_food_eaten, None);
        rows.push(compare("Final training fitness (mean)", &et, &gs, n));

        let (et, gs) = both(MetricPhase::Training, |m| m.median_food_eaten, None);
        rows.push(compare("Final training fitness (median)", &et, &gs, n));

        let et = initial_metric_values(et_runs, MetricPhase::Transfer, |m| m.mean_food_eaten, WINDOW);
        let gs = initial_metric_values(gs_runs, MetricPhase::Transfer, |m| m.mean_food_eaten, WINDOW);
        rows.push(compare("Transfer fitness (gen 1-10)", &et, &gs, n));

        let (et, gs) = both(MetricPhase::Transfer, |m| m.mean_food_eaten, Some(WINDOW));
        rows.push(compare("Transfer fitness (last 10 gen)", &et, &gs, n));

        rows.push(compare(
            "Generalization gap",
            &generalization_gap(et_runs),
            &generalization_gap(gs_runs),
            n,
        ));
        rows.push(compare(
            "Transfer trend slope",
            &fitness_trend_slopes(et_runs, MetricPhase::Transfer),
            &fitness_trend_slopes(gs_runs, MetricPhase::Transfer),
            n,
        ));
        rows.push(compare("Recovery rate (%Δ)", &recovery_rate(et_runs), &recovery_rate(gs_runs), n));

        let (et, gs) = both(MetricPhase::Training, |m| m.trait_diversity, None);
        rows.push(compare("Trait diversity (CV²)", &et, &gs, n));

        let (et, gs) = both(MetricPhase::Training, |m| m.shannon_diversity, None);
        rows.push(compare("Shannon diversity (H)", &et, &gs, n));

        let (et, gs) = both(MetricPhase::Training, |m| m.energy_efficiency, None);
        rows.push(compare("Energy efficiency", &et, &gs, n));

        Self {
            num_comparisons,
            rows,
        }
    }

    pub fn from_results(results: &ExperimentResults) -> Self {
        Self::build(
            &results.et_runs,
            &results.gs_runs,
            results.config.statistics.num_comparisons,
        )
    }

    pub fn row(&self, metric: &str) -> Option<&ComparisonRow> {
        self.rows.iter().find(|r| r.metric == metric)
    }
}

impl fmt::Display for ComparisonReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<34} {:>10} {:>10} {:>8} {:>10} {:>8} {:>10}",
            "Metric", "ET mean", "GS mean", "t", "p (Bonf)", "d", "effect"
        )?;
        writeln!(f, "{}", "-".repeat(96))?;
        for row in &self.rows {
            let r = &row.result;
            writeln!(
                f,
                "{:<34} {:>10.4} {:>10.4} {:>8.3} {:>10.4} {:>8.3} {:>10}",
                row.metric,
                r.et_stats.mean,
                r.gs_stats.mean,
                r.t_test.t,
                r.t_test.p_bonferroni,
                r.t_test.cohens_d,
                r.t_test.interpretation.to_string()
            )?;
        }
        write!(f, "Bonferroni correction over {} comparisons", self.num_comparisons)
    }
}
