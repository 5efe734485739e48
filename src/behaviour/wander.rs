//! Random heading drift.

use super::{Phase, StepBehaviour};
use crate::creature::{Objective, ObjectiveIntensity};
use crate::generation::Generation;
use crate::simulation::SimContext;
use std::f64::consts::FRAC_PI_4;

/// Proposes a small random turn as a minor craving; heads for the stage
/// center when the turn would leave the arena
pub struct WanderBehaviour;

impl StepBehaviour for WanderBehaviour {
    fn name(&self) -> &'static str {
        "wander"
    }

    fn apply(&self, phase: Phase, generation: &mut Generation, ctx: &mut SimContext) {
        if phase != Phase::Orient {
            return;
        }

        for creature in generation.creatures.iter_mut().filter(|c| c.is_active()) {
            let angle = ctx.rng.uniform(-FRAC_PI_4, FRAC_PI_4);
            let target = creature.pos + creature.direction().rotate(angle);

            let target = if ctx.stage.can_move_to(target) {
                target
            } else {
                ctx.stage.center()
            };

            creature.add_objective(Objective::new(target, ObjectiveIntensity::MinorCraving, "wandering"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creature::Creature;
    use crate::geometry::Vec2;
    use crate::stage::Stage;

    #[test]
    fn test_wander_draws_once_per_active_creature() {
        let mut asleep = Creature::with_default_traits(1, Vec2::new(50.0, 0.0));
        asleep.sleep();
        let creatures = vec![Creature::with_default_traits(0, Vec2::new(50.0, 50.0)), asleep];

        let mut generation = Generation::new(creatures, &[]);
        let mut ctx = SimContext::new(Stage::new(100.0), 4);
        WanderBehaviour.apply(Phase::Orient, &mut generation, &mut ctx);

        assert_eq!(ctx.rng.draws(), 1);
        let objective = generation.creatures[0].objective.as_ref().unwrap();
        assert_eq!(objective.intensity, ObjectiveIntensity::MinorCraving);
        assert!((objective.target.distance(Vec2::new(50.0, 50.0)) - 1.0).abs() < 1e-9);
        assert!(generation.creatures[1].objective.is_none());
    }

    #[test]
    fn test_wander_at_edge_heads_to_center() {
        // Default heading is +x, so a creature on the right edge would leave the arena
        let c = Creature::with_default_traits(0, Vec2::new(100.0, 50.0));
        let mut generation = Generation::new(vec![c], &[]);
        let mut ctx = SimContext::new(Stage::new(100.0), 4);
        WanderBehaviour.apply(Phase::Orient, &mut generation, &mut ctx);

        let objective = generation.creatures[0].objective.as_ref().unwrap();
        assert_eq!(objective.target, Vec2::new(50.0, 50.0));
    }
}
