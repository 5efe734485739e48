//! Foraging for food pellets.

use super::{Phase, StepBehaviour};
use crate::creature::{Creature, Objective, ObjectiveIntensity};
use crate::generation::Generation;
use crate::geometry::Vec2;
use crate::simulation::SimContext;

/// Food items a creature keeps foraging for
pub const HUNGER_LIMIT: usize = 2;

fn is_hungry(creature: &Creature) -> bool {
    creature.is_active() && creature.food_count() < HUNGER_LIMIT
}

/// Index into `available` of the pellet nearest to `pos`; the first wins ties
fn nearest_food(pos: Vec2, available: &[(usize, Vec2)]) -> Option<usize> {
    let mut best = None;
    let mut best_dist = f64::INFINITY;
    for (slot, (_, food_pos)) in available.iter().enumerate() {
        let d = pos.distance(*food_pos);
        if d < best_dist {
            best_dist = d;
            best = Some(slot);
        }
    }
    best
}

/// Hungry creatures chase the nearest visible pellet and eat whatever they reach
pub struct ScavengeBehaviour;

impl ScavengeBehaviour {
    fn orient(&self, generation: &mut Generation) {
        let available = generation.available_food_positions();

        for creature in generation.creatures.iter_mut().filter(|c| is_hungry(c)) {
            if let Some(slot) = nearest_food(creature.pos, &available) {
                let target = available[slot].1;
                if creature.can_see(target) {
                    let intensity = ObjectiveIntensity::hunger_craving(creature.food_count());
                    creature.add_objective(Objective::new(target, intensity, "see food"));
                }
            }
        }
    }

    fn act(&self, generation: &mut Generation) {
        let step = generation.steps;
        let mut available = generation.available_food_positions();

        for i in 0..generation.creatures.len() {
            if !is_hungry(&generation.creatures[i]) {
                continue;
            }
            let slot = match nearest_food(generation.creatures[i].pos, &available) {
                Some(slot) => slot,
                None => continue,
            };
            let (food_idx, food_pos) = available[slot];
            if !generation.creatures[i].can_reach(food_pos) {
                continue;
            }

            let edible = generation.food[food_idx].as_edible();
            generation.creatures[i].eat(step, edible);
            generation.mark_food_eaten(food_idx);
            available.remove(slot);
        }
    }
}

impl StepBehaviour for ScavengeBehaviour {
    fn name(&self) -> &'static str {
        "scavenge"
    }

    fn apply(&self, phase: Phase, generation: &mut Generation, _ctx: &mut SimContext) {
        match phase {
            Phase::Orient => self.orient(generation),
            Phase::Act => self.act(generation),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::food::{FoodKind, FoodStatus};
    use crate::stage::Stage;

    #[test]
    fn test_orient_targets_nearest_visible() {
        let c = Creature::with_default_traits(0, Vec2::new(10.0, 10.0));
        let food = [Vec2::new(10.5, 10.0), Vec2::new(10.0, 10.9), Vec2::new(90.0, 90.0)];
        let mut generation = Generation::new(vec![c], &food);
        let mut ctx = SimContext::new(Stage::new(100.0), 1);

        ScavengeBehaviour.apply(Phase::Orient, &mut generation, &mut ctx);
        let objective = generation.creatures[0].objective.as_ref().unwrap();
        assert_eq!(objective.target, Vec2::new(10.5, 10.0));
        assert_eq!(objective.intensity, ObjectiveIntensity::VitalCraving);
    }

    #[test]
    fn test_orient_ignores_invisible_food() {
        let c = Creature::with_default_traits(0, Vec2::new(10.0, 10.0));
        let mut generation = Generation::new(vec![c], &[Vec2::new(90.0, 90.0)]);
        let mut ctx = SimContext::new(Stage::new(100.0), 1);
        ScavengeBehaviour.apply(Phase::Orient, &mut generation, &mut ctx);
        assert!(generation.creatures[0].objective.is_none());
    }

    #[test]
    fn test_first_reacher_wins() {
        let a = Creature::with_default_traits(0, Vec2::new(10.0, 10.0));
        let b = Creature::with_default_traits(1, Vec2::new(10.2, 10.0));
        let mut generation = Generation::new(vec![a, b], &[Vec2::new(10.1, 10.0)]);
        generation.steps = 3;
        let mut ctx = SimContext::new(Stage::new(100.0), 1);

        ScavengeBehaviour.apply(Phase::Act, &mut generation, &mut ctx);

        assert_eq!(generation.creatures[0].food_count(), 1);
        assert_eq!(generation.creatures[0].foods_eaten[0].kind, FoodKind::FoodBall);
        assert_eq!(generation.creatures[0].foods_eaten[0].step, 3);
        assert_eq!(generation.creatures[1].food_count(), 0);
        assert_eq!(generation.food[0].status, FoodStatus::Eaten(3));
        assert_eq!(generation.available_food_count(), 0);
    }

    #[test]
    fn test_fed_creatures_stop_eating() {
        let mut c = Creature::with_default_traits(0, Vec2::new(10.0, 10.0));
        c.eat(1, crate::food::Edible::Pellet(90));
        c.eat(2, crate::food::Edible::Pellet(91));
        let mut generation = Generation::new(vec![c], &[Vec2::new(10.1, 10.0)]);
        let mut ctx = SimContext::new(Stage::new(100.0), 1);
        ScavengeBehaviour.apply(Phase::Act, &mut generation, &mut ctx);
        assert_eq!(generation.available_food_count(), 1);
    }
}
