//! Predation between creatures of sufficiently different size.

use super::{Phase, StepBehaviour};
use crate::creature::{Creature, CreatureId, Objective, ObjectiveIntensity};
use crate::food::Edible;
use crate::generation::Generation;
use crate::simulation::SimContext;
use std::collections::HashMap;
use std::f64::consts::FRAC_PI_4;

/// Larger creatures hunt smaller ones; prey flee.
///
/// A pair qualifies when `predator.size * size_ratio >= prey.size`.
pub struct CannibalismBehaviour {
    pub size_ratio: f64,
}

impl CannibalismBehaviour {
    pub fn new(size_ratio: f64) -> Self {
        Self { size_ratio }
    }

    /// Visit every qualifying (predator, prey) pair of active creatures.
    ///
    /// Pairs are taken as `(creatures[j], creatures[i])` with `j < i`; on equal
    /// size the later creature is the predator.
    fn for_pred_prey_pair<F>(&self, creatures: &mut [Creature], mut func: F)
    where
        F: FnMut(&mut Creature, &mut Creature),
    {
        for i in 1..creatures.len() {
            if !creatures[i].is_active() {
                continue;
            }
            let (left, right) = creatures.split_at_mut(i);
            let b = &mut right[0];

            for a in left.iter_mut() {
                if !a.is_active() || !b.is_active() {
                    continue;
                }

                let (predator, prey) = if a.size() > b.size() {
                    (&mut *a, &mut *b)
                } else {
                    (&mut *b, &mut *a)
                };

                if predator.size() * self.size_ratio < prey.size() {
                    continue;
                }

                func(predator, prey);
            }
        }
    }

    fn orient(&self, generation: &mut Generation, ctx: &mut SimContext) {
        // Slowest prey seen so far per predator
        let mut target_speed: HashMap<CreatureId, f64> = HashMap::new();

        self.for_pred_prey_pair(&mut generation.creatures, |predator, prey| {
            if prey.within_flee_distance(predator.pos) {
                let angle = ctx.rng.uniform(-FRAC_PI_4, FRAC_PI_4);
                let away = prey.pos + (predator.pos - prey.pos).rotate(angle);
                prey.add_objective(Objective::new(
                    away,
                    ObjectiveIntensity::VitalAversion,
                    "running away",
                ));
            }

            if !predator.can_see(prey.pos) {
                return;
            }

            let prey_speed = prey.effective_speed();
            if let Some(&current) = target_speed.get(&predator.id) {
                if current <= prey_speed {
                    return;
                }
            }
            target_speed.insert(predator.id, prey_speed);

            let intensity = ObjectiveIntensity::hunger_craving(predator.food_count());
            predator.add_objective(Objective::new(prey.pos, intensity, "see prey"));
        });
    }

    fn act(&self, generation: &mut Generation) {
        let step = generation.steps;

        self.for_pred_prey_pair(&mut generation.creatures, |predator, prey| {
            if !predator.can_reach(prey.pos) {
                return;
            }
            predator.eat(step, Edible::Prey(prey.id));
            prey.kill();
        });
    }
}

impl StepBehaviour for CannibalismBehaviour {
    fn name(&self) -> &'static str {
        "cannibalism"
    }

    fn apply(&self, phase: Phase, generation: &mut Generation, ctx: &mut SimContext) {
        match phase {
            Phase::Orient => self.orient(generation, ctx),
            Phase::Act => self.act(generation),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creature::{CreatureState, MutatableTrait, Traits, DEFAULT_ENERGY};
    use crate::food::FoodKind;
    use crate::geometry::Vec2;
    use crate::stage::Stage;

    fn sized(id: CreatureId, pos: Vec2, size: f64) -> Creature {
        let traits = Traits {
            speed: MutatableTrait::new(10.0, 0.0),
            size: MutatableTrait::new(size, 0.0),
            sense_range: MutatableTrait::new(20.0, 0.0),
            reach: MutatableTrait::new(1.0, 0.0),
            flee_distance: MutatableTrait::new(1e12, 0.0),
            life_span: MutatableTrait::new(1e4, 0.0),
        };
        Creature::new(id, pos, traits, DEFAULT_ENERGY)
    }

    #[test]
    fn test_similar_sizes_ignore_each_other() {
        let creatures = vec![sized(0, Vec2::new(10.0, 10.0), 10.0), sized(1, Vec2::new(11.0, 10.0), 9.0)];
        let mut generation = Generation::new(creatures, &[]);
        let mut ctx = SimContext::new(Stage::new(100.0), 1);

        CannibalismBehaviour::new(0.8).apply(Phase::Orient, &mut generation, &mut ctx);
        CannibalismBehaviour::new(0.8).apply(Phase::Act, &mut generation, &mut ctx);

        assert!(generation.creatures.iter().all(|c| c.objective.is_none() && c.is_active()));
        assert_eq!(ctx.rng.draws(), 0);
    }

    #[test]
    fn test_orient_predator_and_prey() {
        let prey = sized(0, Vec2::new(10.0, 10.0), 5.0);
        let predator = sized(1, Vec2::new(20.0, 10.0), 10.0);
        let mut generation = Generation::new(vec![prey, predator], &[]);
        let mut ctx = SimContext::new(Stage::new(100.0), 1);

        CannibalismBehaviour::new(0.8).apply(Phase::Orient, &mut generation, &mut ctx);

        let fleeing = generation.creatures[0].objective.as_ref().unwrap();
        assert_eq!(fleeing.intensity, ObjectiveIntensity::VitalAversion);
        // Aversion steers away from the predator, within the jitter cone
        assert!(generation.creatures[0].direction().x < 0.0);

        let hunting = generation.creatures[1].objective.as_ref().unwrap();
        assert_eq!(hunting.intensity, ObjectiveIntensity::VitalCraving);
        assert_eq!(hunting.target, Vec2::new(10.0, 10.0));
        assert_eq!(ctx.rng.draws(), 1);
    }

    #[test]
    fn test_predator_prefers_slowest_prey() {
        let slow = sized(0, Vec2::new(10.0, 10.0), 3.0);
        let fast = sized(1, Vec2::new(11.5, 10.0), 5.0);
        let predator = sized(2, Vec2::new(11.0, 10.0), 10.0);
        let mut generation = Generation::new(vec![slow, fast, predator], &[]);
        let mut ctx = SimContext::new(Stage::new(100.0), 1);

        CannibalismBehaviour::new(0.8).apply(Phase::Orient, &mut generation, &mut ctx);

        let hunting = generation.creatures[2].objective.as_ref().unwrap();
        assert_eq!(hunting.target, Vec2::new(10.0, 10.0));
    }

    #[test]
    fn test_act_eats_reachable_prey() {
        let prey = sized(7, Vec2::new(10.0, 10.0), 5.0);
        let predator = sized(8, Vec2::new(11.0, 10.0), 10.0);
        let mut generation = Generation::new(vec![prey, predator], &[]);
        generation.steps = 4;
        let mut ctx = SimContext::new(Stage::new(100.0), 1);

        CannibalismBehaviour::new(0.8).apply(Phase::Act, &mut generation, &mut ctx);

        assert_eq!(generation.creatures[0].state, CreatureState::Dead);
        let record = generation.creatures[1].foods_eaten[0];
        assert_eq!(record.kind, FoodKind::Creature);
        assert_eq!(record.food_id, 7);
        assert_eq!(record.step, 4);
    }
}
