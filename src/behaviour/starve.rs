//! Starvation rules.

use super::{Phase, StepBehaviour};
use crate::generation::Generation;
use crate::simulation::SimContext;

/// Kills immobile creatures at `Init`, hungry creatures once food runs out,
/// and every creature that ate nothing at `Final`
pub struct StarveBehaviour;

impl StepBehaviour for StarveBehaviour {
    fn name(&self) -> &'static str {
        "starve"
    }

    fn apply(&self, phase: Phase, generation: &mut Generation, _ctx: &mut SimContext) {
        match phase {
            Phase::Init => {
                for creature in generation.creatures.iter_mut() {
                    if creature.effective_speed() == 0.0 {
                        creature.kill();
                    }
                }
            }
            Phase::Post => {
                if generation.available_food_count() > 0 {
                    return;
                }
                for creature in generation.creatures.iter_mut() {
                    if creature.is_active() && creature.food_count() == 0 {
                        creature.kill();
                    }
                }
            }
            Phase::Final => {
                for creature in generation.creatures.iter_mut() {
                    if creature.is_alive() && creature.food_count() == 0 {
                        creature.kill();
                    }
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creature::{Creature, CreatureState};
    use crate::food::Edible;
    use crate::geometry::Vec2;
    use crate::stage::Stage;

    #[test]
    fn test_post_kills_hungry_only_without_food() {
        let mut fed = Creature::with_default_traits(0, Vec2::ZERO);
        fed.eat(1, Edible::Pellet(0));
        let hungry = Creature::with_default_traits(1, Vec2::ZERO);
        let mut ctx = SimContext::new(Stage::new(100.0), 1);

        let mut generation = Generation::new(vec![fed.clone(), hungry.clone()], &[Vec2::new(5.0, 5.0)]);
        StarveBehaviour.apply(Phase::Post, &mut generation, &mut ctx);
        assert!(generation.creatures.iter().all(|c| c.is_active()));

        let mut generation = Generation::new(vec![fed, hungry], &[]);
        StarveBehaviour.apply(Phase::Post, &mut generation, &mut ctx);
        assert!(generation.creatures[0].is_active());
        assert_eq!(generation.creatures[1].state, CreatureState::Dead);
    }

    #[test]
    fn test_final_kills_sleeping_unfed() {
        let mut sleeper = Creature::with_default_traits(0, Vec2::ZERO);
        sleeper.sleep();
        let mut generation = Generation::new(vec![sleeper], &[]);
        let mut ctx = SimContext::new(Stage::new(100.0), 1);
        StarveBehaviour.apply(Phase::Final, &mut generation, &mut ctx);
        assert!(!generation.creatures[0].is_alive());
    }

    #[test]
    fn test_init_kills_immobile() {
        let mut still = Creature::with_default_traits(0, Vec2::ZERO);
        still.traits.speed.value = 0.0;
        let mut generation = Generation::new(vec![still], &[]);
        let mut ctx = SimContext::new(Stage::new(100.0), 1);
        StarveBehaviour.apply(Phase::Init, &mut generation, &mut ctx);
        assert!(!generation.creatures[0].is_alive());
    }
}
