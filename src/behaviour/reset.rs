//! Clears objectives at the start of every step.

use super::{Phase, StepBehaviour};
use crate::generation::Generation;
use crate::simulation::SimContext;

/// Clears every active creature's objective during `Pre`
pub struct ResetBehaviour;

impl StepBehaviour for ResetBehaviour {
    fn name(&self) -> &'static str {
        "reset"
    }

    fn apply(&self, phase: Phase, generation: &mut Generation, _ctx: &mut SimContext) {
        if phase != Phase::Pre {
            return;
        }

        for creature in generation.creatures.iter_mut().filter(|c| c.is_active()) {
            creature.reset_objective();
        }
    }
}
