//! One generation: a fixed population stepping through phases until nobody is active.

use crate::behaviour::{Phase, StepBehaviour};
use crate::creature::Creature;
use crate::food::Food;
use crate::geometry::Vec2;
use crate::simulation::SimContext;
use serde::{Deserialize, Serialize};

/// Hard ceiling on steps per generation
pub const MAX_STEPS: u32 = 10_000;

/// Creatures and food for one epoch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Generation {
    /// Current step, starting at 1
    pub steps: u32,
    pub creatures: Vec<Creature>,
    pub food: Vec<Food>,
}

impl Generation {
    /// Set up a generation without stepping it
    pub fn new(creatures: Vec<Creature>, food_locations: &[Vec2]) -> Self {
        let food = food_locations
            .iter()
            .enumerate()
            .map(|(i, &pos)| Food::new(i as u64, pos))
            .collect();

        Self {
            steps: 1,
            creatures,
            food,
        }
    }

    /// Build a generation and step it to completion
    pub fn run(
        creatures: Vec<Creature>,
        food_locations: &[Vec2],
        behaviours: &[Box<dyn StepBehaviour>],
        ctx: &mut SimContext,
    ) -> Self {
        let mut generation = Self::new(creatures, food_locations);

        generation.run_phase(Phase::Init, behaviours, ctx);
        while generation.has_active_creatures() {
            generation.step(behaviours, ctx);
        }
        generation.run_phase(Phase::Final, behaviours, ctx);

        generation
    }

    fn run_phase(&mut self, phase: Phase, behaviours: &[Box<dyn StepBehaviour>], ctx: &mut SimContext) {
        for behaviour in behaviours {
            behaviour.apply(phase, self, ctx);
        }
    }

    fn step(&mut self, behaviours: &[Box<dyn StepBehaviour>], ctx: &mut SimContext) {
        if self.steps >= MAX_STEPS {
            let stuck = self.creatures.iter().filter(|c| c.is_active()).count();
            log::warn!("Step ceiling reached; killing {} active creatures", stuck);
            for creature in self.creatures.iter_mut().filter(|c| c.is_active()) {
                creature.kill();
            }
            return;
        }

        ctx.rng.shuffle(&mut self.creatures);
        for phase in Phase::STEP {
            self.run_phase(phase, behaviours, ctx);
        }
        self.steps += 1;
    }

    pub fn has_living_creatures(&self) -> bool {
        self.creatures.iter().any(|c| c.is_alive())
    }

    pub fn has_active_creatures(&self) -> bool {
        self.creatures.iter().any(|c| c.is_active())
    }

    pub fn living_creatures(&self) -> Vec<Creature> {
        self.creatures.iter().filter(|c| c.is_alive()).cloned().collect()
    }

    pub fn available_food(&self) -> impl Iterator<Item = &Food> {
        self.food.iter().filter(|f| !f.is_eaten())
    }

    pub fn available_food_count(&self) -> usize {
        self.available_food().count()
    }

    /// `(index into food, position)` for every uneaten pellet
    pub fn available_food_positions(&self) -> Vec<(usize, Vec2)> {
        self.food
            .iter()
            .enumerate()
            .filter(|(_, f)| !f.is_eaten())
            .map(|(i, f)| (i, f.position))
            .collect()
    }

    pub fn mark_food_eaten(&mut self, index: usize) {
        let step = self.steps;
        if let Some(food) = self.food.get_mut(index) {
            food.mark_eaten(step);
        }
    }

    /// Moves taken by all creatures
    pub fn total_moves(&self) -> usize {
        self.creatures.iter().map(|c| c.moves_taken()).sum()
    }

    pub fn total_food_eaten(&self) -> usize {
        self.creatures.iter().map(|c| c.food_count()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behaviour::standard_pipeline;
    use crate::creature::{MutatableTrait, Traits, DEFAULT_ENERGY};
    use crate::stage::Stage;

    fn population(ctx: &mut SimContext, n: usize) -> Vec<Creature> {
        let traits = Traits {
            speed: MutatableTrait::new(10.0, 1.0),
            size: MutatableTrait::new(10.0, 1.0),
            sense_range: MutatableTrait::new(20.0, 1.0),
            reach: MutatableTrait::new(1.0, 0.3),
            flee_distance: MutatableTrait::fixed(1e12),
            life_span: MutatableTrait::fixed(1e4),
        };
        (0..n)
            .map(|_| {
                let pos = ctx.stage.nearest_edge_point(ctx.stage.random_location(&mut ctx.rng));
                let id = ctx.next_id();
                Creature::new(id, pos, traits, DEFAULT_ENERGY)
            })
            .collect()
    }

    #[test]
    fn test_generation_terminates() {
        let mut ctx = SimContext::new(Stage::new(200.0), 5);
        let creatures = population(&mut ctx, 20);
        let food: Vec<Vec2> = (0..20).map(|_| ctx.stage.random_location(&mut ctx.rng)).collect();

        let generation = Generation::run(creatures, &food, &standard_pipeline(0.8, &[]), &mut ctx);

        assert!(!generation.has_active_creatures());
        assert!(generation.steps <= MAX_STEPS);
        assert_eq!(generation.creatures.len(), 20);
        // Every survivor ate something
        assert!(generation
            .creatures
            .iter()
            .filter(|c| c.is_alive())
            .all(|c| c.food_count() > 0));
    }

    #[test]
    fn test_step_ceiling_kills_active() {
        let mut ctx = SimContext::new(Stage::new(100.0), 5);
        let creatures = population(&mut ctx, 3);
        let mut generation = Generation::new(creatures, &[]);
        generation.steps = MAX_STEPS;

        generation.step(&[], &mut ctx);

        assert!(!generation.has_active_creatures());
        assert_eq!(generation.steps, MAX_STEPS);
    }

    #[test]
    fn test_available_food_view() {
        let mut generation = Generation::new(Vec::new(), &[Vec2::new(1.0, 1.0), Vec2::new(2.0, 2.0)]);
        generation.steps = 6;
        generation.mark_food_eaten(0);
        assert_eq!(generation.available_food_count(), 1);
        assert_eq!(generation.available_food_positions(), vec![(1, Vec2::new(2.0, 2.0))]);
    }
}
