//! Multi-generation simulation driver.

use crate::behaviour::{
    random_population, standard_pipeline, BasicReproduction, HomesickBehaviour, ReproductionBehaviour,
    ResetBehaviour, StepBehaviour,
};
use crate::config::{BehaviourConfig, CreatureConfig, EnvironmentConfig, FoodLayout};
use crate::creature::{Creature, CreatureId, Traits};
use crate::generation::Generation;
use crate::geometry::Vec2;
use crate::interpolator::Interpolator;
use crate::rng::SimRng;
use crate::stage::Stage;

/// Mutable state every behaviour may touch: the random stream, the arena,
/// and the id allocator
#[derive(Debug, Clone)]
pub struct SimContext {
    pub rng: SimRng,
    pub stage: Stage,
    next_id: CreatureId,
}

impl SimContext {
    pub fn new(stage: Stage, seed: u64) -> Self {
        Self::with_rng(stage, SimRng::new(seed))
    }

    pub fn with_rng(stage: Stage, rng: SimRng) -> Self {
        Self {
            rng,
            stage,
            next_id: 0,
        }
    }

    /// Allocate a fresh creature id
    pub fn next_id(&mut self) -> CreatureId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Make sure future ids never collide with creatures born elsewhere
    pub fn adopt(&mut self, creatures: &[Creature]) {
        if let Some(max) = creatures.iter().map(|c| c.id).max() {
            self.next_id = self.next_id.max(max + 1);
        }
    }
}

/// Owns the random stream, arena, food schedule, behaviour pipeline, and
/// reproduction policy, and records every completed generation
pub struct Simulation {
    pub ctx: SimContext,
    food_schedule: Interpolator,
    food_layout: FoodLayout,
    behaviours: Vec<Box<dyn StepBehaviour>>,
    reproduction: Box<dyn ReproductionBehaviour>,
    pub generations: Vec<Generation>,
}

impl Simulation {
    /// New simulation with only the objective reset registered and
    /// mutate-and-breed reproduction
    pub fn new(stage: Stage, rng: SimRng, food_schedule: Interpolator) -> Self {
        Self {
            ctx: SimContext::with_rng(stage, rng),
            food_schedule,
            food_layout: FoodLayout::Uniform,
            behaviours: vec![Box::new(ResetBehaviour)],
            reproduction: Box::new(BasicReproduction),
            generations: Vec::new(),
        }
    }

    /// New simulation keyed by a textual seed label
    pub fn from_label(stage: Stage, label: &str, food_schedule: Interpolator) -> Self {
        Self::new(stage, SimRng::from_label(label), food_schedule)
    }

    /// Simulation of `env` with the standard pipeline and the given reproduction policy
    pub fn for_environment(
        env: &EnvironmentConfig,
        behaviour: &BehaviourConfig,
        label: &str,
        reproduction: Box<dyn ReproductionBehaviour>,
    ) -> Self {
        let mut sim = Self::from_label(env.stage(), label, env.food_schedule());
        sim.set_food_layout(env.food_layout);
        sim.set_behaviours(standard_pipeline(behaviour.cannibalism_size_ratio, &env.disabled_edges));
        if behaviour.homesick {
            sim.add_behaviour(Box::new(HomesickBehaviour));
        }
        sim.set_reproduction(reproduction);
        sim
    }

    pub fn set_food_layout(&mut self, layout: FoodLayout) {
        self.food_layout = layout;
    }

    pub fn add_behaviour(&mut self, behaviour: Box<dyn StepBehaviour>) {
        self.behaviours.push(behaviour);
    }

    /// Replace the whole pipeline
    pub fn set_behaviours(&mut self, behaviours: Vec<Box<dyn StepBehaviour>>) {
        self.behaviours = behaviours;
    }

    pub fn behaviour_names(&self) -> Vec<&'static str> {
        self.behaviours.iter().map(|b| b.name()).collect()
    }

    pub fn set_reproduction(&mut self, reproduction: Box<dyn ReproductionBehaviour>) {
        self.reproduction = reproduction;
    }

    pub fn reproduction_name(&self) -> &'static str {
        self.reproduction.name()
    }

    pub fn stage(&self) -> &Stage {
        &self.ctx.stage
    }

    /// Sample this generation's pellets: the count comes from the schedule,
    /// the positions from the layout
    pub fn generate_food(&mut self) -> Vec<Vec2> {
        let count = self.food_schedule.get(self.generations.len() as f64).round().max(0.0) as usize;
        let ctx = &mut self.ctx;

        match self.food_layout {
            FoodLayout::Clustered { clusters, spread } if clusters > 0 => {
                let centres: Vec<Vec2> = (0..clusters).map(|_| ctx.stage.random_location(&mut ctx.rng)).collect();
                (0..count)
                    .map(|_| {
                        let pick = (ctx.rng.uniform(0.0, clusters as f64) as usize).min(clusters - 1);
                        let offset = Vec2::new(ctx.rng.gaussian(0.0, spread), ctx.rng.gaussian(0.0, spread));
                        ctx.stage.constrain_within(centres[pick] + offset)
                    })
                    .collect()
            }
            _ => (0..count).map(|_| ctx.stage.random_location(&mut ctx.rng)).collect(),
        }
    }

    /// Spawn `count` fresh creatures on the arena edges
    pub fn spawn_population(&mut self, count: usize, traits: Traits, energy: f64) -> Vec<Creature> {
        (0..count)
            .map(|_| {
                let raw = self.ctx.stage.random_location(&mut self.ctx.rng);
                let pos = self.ctx.stage.nearest_edge_point(raw);
                let id = self.ctx.next_id();
                Creature::new(id, pos, traits, energy)
            })
            .collect()
    }

    /// Spawn `count` creatures on the arena edges, each with its own random traits
    pub fn spawn_random_population(&mut self, count: usize, creature: &CreatureConfig) -> Vec<Creature> {
        random_population(count, creature, &mut self.ctx)
    }

    /// Apply the reproduction policy to `creatures`
    pub fn exec_reproduction(&mut self, creatures: &[Creature]) -> Vec<Creature> {
        self.ctx.adopt(creatures);
        self.reproduction.reproduce(creatures, &mut self.ctx)
    }

    fn build_generation(&mut self, creatures: Vec<Creature>) -> Generation {
        self.ctx.adopt(&creatures);
        let food = self.generate_food();
        Generation::run(creatures, &food, &self.behaviours, &mut self.ctx)
    }

    /// Run up to `max_generations`, stopping early once a generation ends with
    /// nobody alive
    pub fn run(&mut self, creatures: Vec<Creature>, max_generations: usize) {
        let mut generation = self.build_generation(creatures);
        let mut keep_going = generation.has_living_creatures();

        for gen in 1..max_generations {
            if !keep_going {
                log::debug!("Population extinct after {} generations", gen);
                break;
            }

            log::debug!(
                "Generation {}: {} creatures, {} steps, {} alive",
                gen - 1,
                generation.creatures.len(),
                generation.steps,
                generation.creatures.iter().filter(|c| c.is_alive()).count()
            );

            let next = self.exec_reproduction(&generation.creatures);
            self.generations.push(generation);
            generation = self.build_generation(next);
            keep_going = generation.has_living_creatures();
        }

        self.generations.push(generation);
    }

    /// Evaluate one generation without recording it
    pub fn run_single_generation(&mut self, creatures: Vec<Creature>) -> Generation {
        self.build_generation(creatures)
    }

    pub fn last_generation(&self) -> Option<&Generation> {
        self.generations.last()
    }

    /// Living creatures of the last recorded generation
    pub fn survivors(&self) -> Vec<Creature> {
        self.last_generation()
            .map(|g| g.living_creatures())
            .unwrap_or_default()
    }
}
