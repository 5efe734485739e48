//! Analysis module: statistics, ET-vs-GS comparison, and data export.

pub mod comparison;
pub mod export;
pub mod statistics;

pub use comparison::{
    chart_data, final_metric_values, fitness_trend_slopes, generalization_gap, initial_metric_values,
    recovery_rate, total_computation_steps, trait_evolution, ChartDataPoint, ComparisonReport,
    ComparisonRow, MetricPhase, TraitEvolutionPoint,
};
pub use export::{ExportManifest, ExportSystem};
pub use statistics::{
    compare_conditions, descriptive_stats, linear_regression, mann_whitney_u, set_num_comparisons,
    welch_t_test, ComparisonResult, DescriptiveStats, EffectSize, LinearRegressionResult,
    MannWhitneyResult, TTestResult,
};
