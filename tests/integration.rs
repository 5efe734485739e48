//! Integration tests for evoshift

use evoshift::analysis::{linear_regression, mann_whitney_u, welch_t_test, ComparisonReport};
use evoshift::behaviour::{will_reproduce, BasicReproduction, CloneReproduction, ReproductionBehaviour};
use evoshift::config::{BehaviourConfig, CreatureConfig, EnvironmentConfig};
use evoshift::creature::Creature;
use evoshift::experiment::{run_full_experiment, run_replication, Condition};
use evoshift::food::Edible;
use evoshift::generation::MAX_STEPS;
use evoshift::geometry::Vec2;
use evoshift::grid_search::{run_grid_search, GridSearchSetup};
use evoshift::metrics::collect_all;
use evoshift::simulation::SimContext;
use evoshift::{Config, ExperimentHandle, ExperimentOutcome, Simulation, Stage};

fn small_config() -> Config {
    let mut config = Config::default();
    config.experiment.training_generations = 5;
    config.experiment.transfer_generations = 4;
    config.experiment.num_runs = 2;
    config.experiment.population_size = 12;
    config.training_env = EnvironmentConfig::new(200.0, 15.0, Vec::new());
    config.transfer_env = EnvironmentConfig::new(260.0, 10.0, vec![2, 3]);
    config.grid_search.speed_size_values = vec![6.0, 12.0];
    config.grid_search.sense_values = vec![10.0, 30.0];
    config
}

fn fed_creature(id: u64, foods: usize) -> Creature {
    let mut c = Creature::with_default_traits(id, Vec2::new(0.0, 50.0));
    for i in 0..foods {
        c.eat(i as u32, Edible::Pellet(i as u64));
    }
    c
}

#[test]
fn test_replication_is_deterministic() {
    let config = small_config();
    let grid = evoshift::experiment::run_config_grid_search(&config, |_, _| {});

    for condition in [Condition::Evolutionary, Condition::GridSearch] {
        let first = run_replication(&config, condition, 0, &grid);
        let second = run_replication(&config, condition, 0, &grid);

        assert_eq!(first.training_metrics, second.training_metrics);
        assert_eq!(first.transfer_metrics, second.transfer_metrics);
        let traits = |r: &evoshift::RunResult| r.final_creatures.iter().map(|c| c.traits).collect::<Vec<_>>();
        assert_eq!(traits(&first), traits(&second));
    }
}

#[test]
fn test_different_seeds_differ() {
    let config = small_config();
    let grid = evoshift::experiment::run_config_grid_search(&config, |_, _| {});
    let a = run_replication(&config, Condition::Evolutionary, 0, &grid);
    let b = run_replication(&config, Condition::Evolutionary, 1, &grid);
    assert_ne!(a.seed, b.seed);
    assert_ne!(a.training_metrics, b.training_metrics);
}

#[test]
fn test_generations_terminate_within_ceiling() {
    let env = EnvironmentConfig::new(150.0, 5.0, Vec::new());
    let behaviour = BehaviourConfig::default();
    let creature = CreatureConfig::default();

    for (label, energy) in [("tiny-energy", 1.0), ("default-energy", 500.0), ("huge-energy", 1e9)] {
        let mut sim = Simulation::for_environment(&env, &behaviour, label, Box::new(BasicReproduction));
        let creatures = sim.spawn_population(20, creature.traits(), energy);
        let generation = sim.run_single_generation(creatures);

        assert!(!generation.has_active_creatures(), "{} left active creatures", label);
        assert!(generation.steps <= MAX_STEPS);
    }

    // a single creature is enough to run a generation
    let mut sim = Simulation::for_environment(&env, &behaviour, "single", Box::new(BasicReproduction));
    let creatures = sim.spawn_population(1, creature.traits(), 500.0);
    assert!(!sim.run_single_generation(creatures).has_active_creatures());
}

#[test]
fn test_reproduction_threshold() {
    let parents: Vec<Creature> = (0..5).map(|i| fed_creature(i, i as usize)).collect();
    let expected_offspring = parents.iter().filter(|c| will_reproduce(c)).count();
    assert_eq!(expected_offspring, 3);

    let policies: [Box<dyn ReproductionBehaviour>; 2] = [Box::new(BasicReproduction), Box::new(CloneReproduction)];
    for policy in policies {
        let mut ctx = SimContext::new(Stage::new(100.0), 3);
        ctx.adopt(&parents);
        let next = policy.reproduce(&parents, &mut ctx);

        assert_eq!(next.len(), parents.len() + expected_offspring, "{}", policy.name());
        let offspring: Vec<&Creature> = next.iter().filter(|c| c.id >= 5).collect();
        assert_eq!(offspring.len(), expected_offspring);
        assert!(offspring.iter().all(|c| c.age == 0));
        assert!(next.iter().filter(|c| c.id < 5).all(|c| c.age == 1));
    }
}

#[test]
fn test_clone_fidelity_draws_nothing() {
    let creature = CreatureConfig::default();
    let parents: Vec<Creature> = (0..6)
        .map(|i| {
            let mut c = Creature::new(i, Vec2::new(0.0, 10.0 * i as f64), creature.traits(), 500.0);
            c.eat(1, Edible::Pellet(0));
            c.eat(2, Edible::Pellet(1));
            c
        })
        .collect();

    let mut ctx = SimContext::new(Stage::new(100.0), 11);
    ctx.adopt(&parents);
    let before = ctx.rng.draws();
    let next = CloneReproduction.reproduce(&parents, &mut ctx);

    assert_eq!(ctx.rng.draws(), before);
    for child in next.iter().filter(|c| c.id >= 6) {
        assert_eq!(child.traits, creature.traits());
    }

    // mutate-and-breed does consume randomness
    let before = ctx.rng.draws();
    BasicReproduction.reproduce(&parents, &mut ctx);
    assert!(ctx.rng.draws() > before);
}

#[test]
fn test_grid_search_size_and_best() {
    let env = EnvironmentConfig::new(200.0, 20.0, Vec::new());
    let behaviour = BehaviourConfig::default();
    let creature = CreatureConfig::default();
    let setup = GridSearchSetup {
        env: &env,
        behaviour: &behaviour,
        creature: &creature,
        population_size: 10,
        seed: 1000,
    };

    let result = run_grid_search(&[4.0, 8.0, 12.0], &[5.0, 10.0], &[10.0, 20.0, 30.0, 40.0], &setup, false, |_, _| {});

    assert_eq!(result.entries.len(), 3 * 2 * 4);
    assert!(result.entries.iter().all(|e| e.mean_food_eaten <= result.best_fitness));
    let best = result.best_entry().unwrap();
    assert_eq!(best.mean_food_eaten, result.best_fitness);
}

#[test]
fn test_end_to_end_scenario() {
    let config = Config::default();
    let food = config.training_env.food_per_generation as usize;
    let mut sim = Simulation::for_environment(
        &config.training_env,
        &config.behaviour,
        "et-train-1000",
        Box::new(BasicReproduction),
    );
    let creatures = sim.spawn_population(50, config.creature.evolutionary_traits(), config.creature.energy);
    sim.run(creatures, 100);

    let metrics = collect_all(&sim.generations);
    assert_eq!(metrics.len(), 100);
    assert_eq!(metrics[0].population, 50);

    for pair in metrics.windows(2) {
        // every survivor ate once and every parent ate twice, out of pellets plus prey
        assert!(pair[1].population >= 1);
        assert!(pair[1].population <= food + pair[0].creatures_eaten);
    }

    let first: f64 = metrics[..10].iter().map(|m| m.mean_food_eaten).sum::<f64>() / 10.0;
    let last: f64 = metrics[90..].iter().map(|m| m.mean_food_eaten).sum::<f64>() / 10.0;
    assert!(last >= first, "mean food eaten fell: {} -> {}", first, last);
}

#[test]
fn test_random_baseline_and_clustered_transfer() {
    let mut config = small_config();
    config.experiment.random_baseline = true;
    config.transfer_env = config.transfer_env.clone().clustered(3, 20.0);
    assert!(config.validate().is_ok());

    let results = run_full_experiment(&config, |_| {}, || false).unwrap();
    assert_eq!(results.rnd_runs.len(), 2);

    // ET keeps reach fixed through both phases
    for run in &results.et_runs {
        for m in run.training_metrics.iter().chain(&run.transfer_metrics) {
            if m.population > 0 {
                assert_eq!(m.mean_reach, 1.0);
                assert_eq!(m.reach_variance, 0.0);
            }
        }
    }

    // random creatures never inherit, so their traits spread across the configured ranges
    let ranges = config.creature.random_ranges;
    for run in &results.rnd_runs {
        for m in &run.training_metrics {
            assert_eq!(m.population, config.experiment.population_size);
            assert!(m.mean_speed >= ranges.speed.0 && m.mean_speed < ranges.speed.1);
            assert!(m.speed_variance > 0.0);
        }
    }

    let replay = run_replication(&config, Condition::Random, 1, &results.grid_search_result);
    assert_eq!(replay.training_metrics, results.rnd_runs[1].training_metrics);
    assert_eq!(replay.transfer_metrics, results.rnd_runs[1].transfer_metrics);
}

#[test]
fn test_full_experiment_and_report() {
    let config = small_config();
    let results = run_full_experiment(&config, |_| {}, || false).unwrap();

    assert_eq!(results.et_runs.len(), 2);
    assert_eq!(results.gs_runs.len(), 2);
    assert_eq!(results.grid_search_result.entries.len(), 8);

    // GS creatures are clones of the best grid point for the whole training phase
    let grid = &results.grid_search_result;
    for run in &results.gs_runs {
        for m in &run.training_metrics {
            if m.population > 0 {
                assert!((m.mean_speed - grid.best_speed).abs() < 1e-9);
                assert_eq!(m.speed_variance, 0.0);
            }
        }
    }

    let report = ComparisonReport::from_results(&results);
    assert_eq!(report.rows.len(), 10);
    for row in &report.rows {
        assert_eq!(row.result.et_stats.n, 2);
        assert!(row.result.t_test.p_bonferroni >= 0.0 && row.result.t_test.p_bonferroni <= 1.0);
    }
}

#[test]
fn test_worker_cancellation() {
    let mut config = small_config();
    config.experiment.num_runs = 500;
    let handle = ExperimentHandle::spawn(config);
    handle.cancel();

    assert!(matches!(handle.wait(|_| {}), ExperimentOutcome::Cancelled));
}

#[test]
fn test_statistics_goldens() {
    let t = welch_t_test(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]);
    assert!((t.cohens_d + 3.0).abs() < 1e-12);
    assert!((t.df - 4.0).abs() < 1e-9);
    assert!(t.t < 0.0);

    let mw = mann_whitney_u(&[1.0, 2.0, 3.0], &[10.0, 11.0, 12.0]);
    assert_eq!(mw.u, 0.0);

    let reg = linear_regression(&[1.0, 2.0, 3.0, 4.0, 5.0]);
    assert!((reg.slope - 1.0).abs() < 1e-12);
    assert!((reg.intercept - 1.0).abs() < 1e-12);
    assert!((reg.r2 - 1.0).abs() < 1e-12);
}
