//! Step behaviours and reproduction policies.
//!
//! This module contains:
//! - The phase enum driving each generation step
//! - Step behaviours (movement, wandering, predation, foraging, homing, starvation)
//! - Reproduction policies applied between generations (mutate-and-breed, clone, random)

pub mod cannibalism;
pub mod edge_home;
pub mod movement;
pub mod reproduction;
pub mod reset;
pub mod satisfied;
pub mod scavenge;
pub mod starve;
pub mod wander;

pub use cannibalism::CannibalismBehaviour;
pub use edge_home::EdgeHomeBehaviour;
pub use movement::BasicMoveBehaviour;
pub use reproduction::{random_population, will_reproduce, BasicReproduction, CloneReproduction, RandomReproduction};
pub use reset::ResetBehaviour;
pub use satisfied::{how_homesick, HomesickBehaviour, SatisfiedBehaviour};
pub use scavenge::ScavengeBehaviour;
pub use starve::StarveBehaviour;
pub use wander::WanderBehaviour;

use crate::creature::Creature;
use crate::generation::Generation;
use crate::simulation::SimContext;
use serde::{Deserialize, Serialize};

/// One stage of a generation step.
///
/// `Init` runs once before the first step and `Final` once after the last;
/// the remaining phases run in order on every step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Init,
    Pre,
    Orient,
    Move,
    Act,
    Post,
    Final,
}

impl Phase {
    /// Phases run on every step, in order
    pub const STEP: [Phase; 5] = [Phase::Pre, Phase::Orient, Phase::Move, Phase::Act, Phase::Post];
}

/// A behaviour that reacts to generation phases
pub trait StepBehaviour: Send + Sync {
    fn name(&self) -> &'static str;

    fn apply(&self, phase: Phase, generation: &mut Generation, ctx: &mut SimContext);
}

/// Policy that turns one generation's creatures into the next generation's
pub trait ReproductionBehaviour: Send + Sync {
    fn name(&self) -> &'static str;

    fn reproduce(&self, creatures: &[Creature], ctx: &mut SimContext) -> Vec<Creature>;
}

/// The standard pipeline, in registration order.
///
/// `Reset` always comes first so objectives are cleared before anything proposes one.
pub fn standard_pipeline(size_ratio: f64, disabled_edges: &[usize]) -> Vec<Box<dyn StepBehaviour>> {
    vec![
        Box::new(ResetBehaviour),
        Box::new(BasicMoveBehaviour),
        Box::new(WanderBehaviour),
        Box::new(CannibalismBehaviour::new(size_ratio)),
        Box::new(ScavengeBehaviour),
        Box::new(SatisfiedBehaviour),
        Box::new(EdgeHomeBehaviour::new(disabled_edges.to_vec())),
        Box::new(StarveBehaviour),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_pipeline_order() {
        let names: Vec<_> = standard_pipeline(0.8, &[]).iter().map(|b| b.name()).collect();
        assert_eq!(
            names,
            vec!["reset", "basic_move", "wander", "cannibalism", "scavenge", "satisfied", "edge_home", "starve"]
        );
    }
}
