//! Per-generation metrics snapshots.

use crate::behaviour::will_reproduce;
use crate::diversity::{mean, median, sample_variance, shannon_diversity, trait_diversity};
use crate::generation::Generation;
use serde::{Deserialize, Serialize};

/// Read-only snapshot of one generation
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationMetrics {
    /// Generation index within its phase
    pub generation: usize,
    /// Creatures that took part, dead or alive
    pub population: usize,
    pub mean_food_eaten: f64,
    pub median_food_eaten: f64,
    /// Fraction still alive at the end of the generation
    pub survival_rate: f64,
    /// Fraction that ate enough to reproduce
    pub reproduction_rate: f64,
    pub mean_speed: f64,
    pub mean_size: f64,
    pub mean_sense_range: f64,
    pub mean_reach: f64,
    pub mean_flee_distance: f64,
    pub speed_variance: f64,
    pub size_variance: f64,
    pub sense_range_variance: f64,
    pub reach_variance: f64,
    /// Sum of CV² over speed, size and sense range
    pub trait_diversity: f64,
    /// Entropy of the binned (speed, size, sense range) distribution
    pub shannon_diversity: f64,
    /// Predation events
    pub creatures_eaten: usize,
    /// Food eaten per move taken
    pub energy_efficiency: f64,
    /// Steps the generation ran for
    pub computation_steps: u32,
}

/// Summarise `generation`; an empty population yields zeros
pub fn collect_generation_metrics(generation: &Generation, index: usize) -> GenerationMetrics {
    let creatures = &generation.creatures;
    let n = creatures.len();

    if n == 0 {
        return GenerationMetrics {
            generation: index,
            computation_steps: generation.steps,
            ..GenerationMetrics::default()
        };
    }

    let foods: Vec<f64> = creatures.iter().map(|c| c.food_count() as f64).collect();
    let speeds: Vec<f64> = creatures.iter().map(|c| c.traits.speed.value).collect();
    let sizes: Vec<f64> = creatures.iter().map(|c| c.traits.size.value).collect();
    let senses: Vec<f64> = creatures.iter().map(|c| c.traits.sense_range.value).collect();
    let reaches: Vec<f64> = creatures.iter().map(|c| c.traits.reach.value).collect();
    let flees: Vec<f64> = creatures.iter().map(|c| c.traits.flee_distance.value).collect();

    let alive = creatures.iter().filter(|c| c.is_alive()).count();
    let reproducing = creatures.iter().filter(|c| will_reproduce(c)).count();
    let creatures_eaten: usize = creatures.iter().map(|c| c.creatures_eaten()).sum();

    let mean_speed = mean(&speeds);
    let mean_size = mean(&sizes);
    let mean_sense = mean(&senses);
    let mean_reach = mean(&reaches);

    let speed_variance = sample_variance(&speeds, mean_speed);
    let size_variance = sample_variance(&sizes, mean_size);
    let sense_variance = sample_variance(&senses, mean_sense);

    let points: Vec<[f64; 3]> = (0..n).map(|i| [speeds[i], sizes[i], senses[i]]).collect();

    let moves = generation.total_moves();
    let total_food = generation.total_food_eaten();

    GenerationMetrics {
        generation: index,
        population: n,
        mean_food_eaten: mean(&foods),
        median_food_eaten: median(&foods),
        survival_rate: alive as f64 / n as f64,
        reproduction_rate: reproducing as f64 / n as f64,
        mean_speed,
        mean_size,
        mean_sense_range: mean_sense,
        mean_reach,
        mean_flee_distance: mean(&flees),
        speed_variance,
        size_variance,
        sense_range_variance: sense_variance,
        reach_variance: sample_variance(&reaches, mean_reach),
        trait_diversity: trait_diversity(&[
            (speed_variance, mean_speed),
            (size_variance, mean_size),
            (sense_variance, mean_sense),
        ]),
        shannon_diversity: shannon_diversity(&points),
        creatures_eaten,
        energy_efficiency: if moves > 0 { total_food as f64 / moves as f64 } else { 0.0 },
        computation_steps: generation.steps,
    }
}

/// Metrics for every generation in order
pub fn collect_all(generations: &[Generation]) -> Vec<GenerationMetrics> {
    generations
        .iter()
        .enumerate()
        .map(|(i, g)| collect_generation_metrics(g, i))
        .collect()
}

/// Extract one column from a metrics sequence
pub fn series<F>(metrics: &[GenerationMetrics], f: F) -> Vec<f64>
where
    F: Fn(&GenerationMetrics) -> f64,
{
    metrics.iter().map(f).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creature::Creature;
    use crate::food::Edible;
    use crate::geometry::Vec2;

    #[test]
    fn test_empty_generation_is_zeroed() {
        let generation = Generation::new(Vec::new(), &[]);
        let m = collect_generation_metrics(&generation, 4);
        assert_eq!(m.generation, 4);
        assert_eq!(m.population, 0);
        assert_eq!(m.mean_food_eaten, 0.0);
        assert_eq!(m.computation_steps, 1);
    }

    #[test]
    fn test_rates_and_counts() {
        let mut a = Creature::with_default_traits(0, Vec2::ZERO);
        a.eat(1, Edible::Pellet(0));
        a.eat(2, Edible::Prey(5));
        a.eat(3, Edible::Pellet(1));
        a.move_to(Vec2::new(1.0, 0.0));
        a.move_to(Vec2::new(2.0, 0.0));
        let mut b = Creature::with_default_traits(1, Vec2::ZERO);
        b.eat(1, Edible::Pellet(2));
        b.move_to(Vec2::new(0.0, 1.0));
        let mut c = Creature::with_default_traits(2, Vec2::ZERO);
        c.kill();
        let mut d = Creature::with_default_traits(3, Vec2::ZERO);
        d.kill();

        let generation = Generation::new(vec![a, b, c, d], &[]);
        let m = collect_generation_metrics(&generation, 0);

        assert_eq!(m.population, 4);
        assert_eq!(m.mean_food_eaten, 1.0);
        assert_eq!(m.median_food_eaten, 0.5);
        assert_eq!(m.survival_rate, 0.5);
        assert_eq!(m.reproduction_rate, 0.25);
        assert_eq!(m.creatures_eaten, 1);
        assert!((m.energy_efficiency - 4.0 / 3.0).abs() < 1e-12);
        // Identical traits
        assert_eq!(m.trait_diversity, 0.0);
        assert_eq!(m.shannon_diversity, 0.0);
        assert_eq!(m.speed_variance, 0.0);
    }

    #[test]
    fn test_series() {
        let metrics = vec![
            GenerationMetrics {
                mean_food_eaten: 1.0,
                ..Default::default()
            },
            GenerationMetrics {
                mean_food_eaten: 2.0,
                ..Default::default()
            },
        ];
        assert_eq!(series(&metrics, |m| m.mean_food_eaten), vec![1.0, 2.0]);
    }
}
