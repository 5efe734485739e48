//! Experiment orchestration: the replicated ET-vs-GS protocol (with an
//! optional random baseline) and its background worker.

pub mod runner;
pub mod worker;

pub use runner::{
    initial_traits, run_config_grid_search, run_config_grid_search_until, run_config_hill_climb,
    run_full_experiment, run_replication, run_training, run_transfer, Condition, ExperimentResults,
    PhaseOutcome, ProgressPhase, ProgressUpdate, RunResult,
};
pub use worker::{ExperimentEvent, ExperimentHandle, ExperimentOutcome, ExperimentState};
