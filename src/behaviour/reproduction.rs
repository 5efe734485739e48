//! Reproduction policies applied at generation boundaries.

use super::ReproductionBehaviour;
use crate::config::CreatureConfig;
use crate::creature::Creature;
use crate::simulation::SimContext;

/// A creature that ate more than one item leaves one offspring
pub fn will_reproduce(creature: &Creature) -> bool {
    creature.food_count() > 1
}

/// Mutate-and-breed: each reproducing survivor adds a mutated offspring,
/// and every survivor carries over one generation older
pub struct BasicReproduction;

impl ReproductionBehaviour for BasicReproduction {
    fn name(&self) -> &'static str {
        "mutate"
    }

    fn reproduce(&self, creatures: &[Creature], ctx: &mut SimContext) -> Vec<Creature> {
        let mut next = Vec::with_capacity(creatures.len() * 2);

        for parent in creatures.iter().filter(|c| c.is_alive()) {
            if will_reproduce(parent) {
                let child_id = ctx.next_id();
                next.push(parent.mutate(child_id, &mut ctx.rng));
            }
            next.push(parent.grow_older());
        }

        next
    }
}

/// Clone: like [`BasicReproduction`] but offspring are exact trait copies
/// and no randomness is consumed
pub struct CloneReproduction;

impl ReproductionBehaviour for CloneReproduction {
    fn name(&self) -> &'static str {
        "clone"
    }

    fn reproduce(&self, creatures: &[Creature], ctx: &mut SimContext) -> Vec<Creature> {
        let mut next = Vec::with_capacity(creatures.len() * 2);

        for parent in creatures.iter().filter(|c| c.is_alive()) {
            if will_reproduce(parent) {
                next.push(parent.cloned_offspring(ctx.next_id()));
            }
            next.push(parent.grow_older());
        }

        next
    }
}

/// `count` fresh creatures on random edge points, each with its own
/// uniformly drawn speed, size and sense range
pub fn random_population(count: usize, creature: &CreatureConfig, ctx: &mut SimContext) -> Vec<Creature> {
    (0..count)
        .map(|_| {
            let raw = ctx.stage.random_location(&mut ctx.rng);
            let pos = ctx.stage.nearest_edge_point(raw);
            let traits = creature.random_traits(&mut ctx.rng);
            Creature::new(ctx.next_id(), pos, traits, creature.energy)
        })
        .collect()
}

/// Random baseline: parents are discarded and a new random population of
/// fixed size replaces them every generation
pub struct RandomReproduction {
    pub count: usize,
    pub creature: CreatureConfig,
}

impl RandomReproduction {
    pub fn new(count: usize, creature: CreatureConfig) -> Self {
        Self { count, creature }
    }
}

impl ReproductionBehaviour for RandomReproduction {
    fn name(&self) -> &'static str {
        "random"
    }

    fn reproduce(&self, _creatures: &[Creature], ctx: &mut SimContext) -> Vec<Creature> {
        random_population(self.count, &self.creature, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::food::Edible;
    use crate::geometry::Vec2;
    use crate::stage::Stage;

    fn fed(id: u64, foods: usize) -> Creature {
        let mut c = Creature::with_default_traits(id, Vec2::new(0.0, 10.0));
        for i in 0..foods {
            c.eat(i as u32, Edible::Pellet(i as u64));
        }
        c
    }

    fn parents() -> Vec<Creature> {
        let mut dead = fed(3, 2);
        dead.kill();
        vec![fed(0, 0), fed(1, 1), fed(2, 2), dead]
    }

    #[test]
    fn test_basic_threshold() {
        let mut ctx = SimContext::new(Stage::new(100.0), 1);
        ctx.adopt(&parents());
        let next = BasicReproduction.reproduce(&parents(), &mut ctx);

        // Three survivors carried over plus one offspring
        assert_eq!(next.len(), 4);
        assert_eq!(next.iter().filter(|c| c.age == 0).count(), 1);
        assert_eq!(next.iter().filter(|c| c.age == 1).count(), 3);
        assert_eq!(ctx.rng.draws(), 12);
        assert!(next.iter().all(|c| c.id != 3));
    }

    #[test]
    fn test_clone_is_exact_and_draws_nothing() {
        let mut ctx = SimContext::new(Stage::new(100.0), 1);
        ctx.adopt(&parents());
        let next = CloneReproduction.reproduce(&parents(), &mut ctx);

        assert_eq!(next.len(), 4);
        assert_eq!(ctx.rng.draws(), 0);

        let parent = &parents()[2];
        let child = next.iter().find(|c| c.age == 0).unwrap();
        assert_eq!(child.traits, parent.traits);
        assert_ne!(child.id, parent.id);
        assert!(next.iter().filter(|c| c.id == child.id).count() == 1);
    }

    #[test]
    fn test_random_replaces_parents() {
        let mut ctx = SimContext::new(Stage::new(100.0), 1);
        ctx.adopt(&parents());
        let policy = RandomReproduction::new(6, CreatureConfig::default());
        let next = policy.reproduce(&parents(), &mut ctx);

        assert_eq!(next.len(), 6);
        assert!(next.iter().all(|c| c.id > 3 && c.age == 0 && c.foods_eaten.is_empty()));
        // two draws for the position, three for the traits
        assert_eq!(ctx.rng.draws(), 30);
        assert_eq!(policy.name(), "random");

        // an extinct population still gets a full replacement
        assert_eq!(policy.reproduce(&[], &mut ctx).len(), 6);
    }
}
