//! Straight-line motion along the resolved heading.

use super::{Phase, StepBehaviour};
use crate::generation::Generation;
use crate::simulation::SimContext;

/// Advances active creatures by their effective speed, clamped to the stage
pub struct BasicMoveBehaviour;

impl StepBehaviour for BasicMoveBehaviour {
    fn name(&self) -> &'static str {
        "basic_move"
    }

    fn apply(&self, phase: Phase, generation: &mut Generation, ctx: &mut SimContext) {
        if phase != Phase::Move {
            return;
        }

        for creature in generation.creatures.iter_mut().filter(|c| c.is_active()) {
            let target = creature.pos + creature.direction() * creature.effective_speed();
            creature.move_to(ctx.stage.constrain_within(target));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creature::{Creature, Objective, ObjectiveIntensity};
    use crate::geometry::Vec2;
    use crate::stage::Stage;

    #[test]
    fn test_move_towards_objective() {
        let mut c = Creature::with_default_traits(0, Vec2::new(0.0, 50.0));
        c.traits.speed.value = 10.0;
        c.traits.size.value = 10.0;
        c.add_objective(Objective::new(Vec2::new(50.0, 50.0), ObjectiveIntensity::MinorCraving, "test"));

        let mut generation = Generation::new(vec![c], &[]);
        let mut ctx = SimContext::new(Stage::new(100.0), 1);
        BasicMoveBehaviour.apply(Phase::Move, &mut generation, &mut ctx);

        let moved = &generation.creatures[0];
        assert!((moved.pos.x - 10.0).abs() < 1e-12);
        assert_eq!(moved.movement_history.len(), 2);
        assert!(moved.energy_consumed > 0.0);
    }

    #[test]
    fn test_move_clamped_to_stage() {
        let mut c = Creature::with_default_traits(0, Vec2::new(0.0, 50.0));
        c.traits.speed.value = 10.0;
        c.traits.size.value = 10.0;
        c.add_objective(Objective::new(Vec2::new(-50.0, 50.0), ObjectiveIntensity::MinorCraving, "test"));

        let mut generation = Generation::new(vec![c], &[]);
        let mut ctx = SimContext::new(Stage::new(100.0), 1);
        BasicMoveBehaviour.apply(Phase::Move, &mut generation, &mut ctx);

        assert_eq!(generation.creatures[0].pos, Vec2::new(0.0, 50.0));
        assert_eq!(generation.creatures[0].movement_history.len(), 2);
    }
}
