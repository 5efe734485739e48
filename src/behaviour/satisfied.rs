//! Returning home once fed, or once energy runs low.

use super::{Phase, StepBehaviour};
use crate::creature::{Creature, Objective, ObjectiveIntensity};
use crate::generation::Generation;
use crate::simulation::SimContext;

/// Urge to head home given remaining energy and distance.
///
/// The margin is the number of moves the creature can still afford beyond the
/// trip home; the smaller it gets, the stronger the craving.
pub fn how_homesick(creature: &Creature) -> Option<Objective> {
    let speed = creature.effective_speed();
    if speed == 0.0 {
        return None;
    }

    let steps_to_home = creature.pos.distance(creature.home_pos) / speed;
    let cost = creature.motion_energy_cost();
    let margin = if cost > 0.0 {
        creature.energy_left() / cost - steps_to_home
    } else {
        f64::INFINITY
    };

    let intensity = if margin > 10.0 {
        return None;
    } else if margin > 5.0 {
        ObjectiveIntensity::MinorCraving
    } else if margin > 0.0 {
        ObjectiveIntensity::MajorCraving
    } else {
        ObjectiveIntensity::VitalCraving
    };

    Some(Objective::new(creature.home_pos, intensity, "low energy"))
}

fn satisfied_objective(creature: &Creature) -> Option<Objective> {
    match creature.food_count() {
        0 => None,
        1 => how_homesick(creature),
        _ => Some(Objective::new(
            creature.home_pos,
            ObjectiveIntensity::MajorCraving,
            "satisfied",
        )),
    }
}

/// Fed creatures head home and sleep once they can reach it
pub struct SatisfiedBehaviour;

impl StepBehaviour for SatisfiedBehaviour {
    fn name(&self) -> &'static str {
        "satisfied"
    }

    fn apply(&self, phase: Phase, generation: &mut Generation, _ctx: &mut SimContext) {
        if phase != Phase::Orient {
            return;
        }

        for creature in generation.creatures.iter_mut().filter(|c| c.is_active()) {
            if let Some(objective) = satisfied_objective(creature) {
                creature.add_objective(objective);
                if creature.can_reach(creature.home_pos) {
                    creature.sleep();
                }
            }
        }
    }
}

/// Every active creature weighs its energy against the trip home
pub struct HomesickBehaviour;

impl StepBehaviour for HomesickBehaviour {
    fn name(&self) -> &'static str {
        "homesick"
    }

    fn apply(&self, phase: Phase, generation: &mut Generation, _ctx: &mut SimContext) {
        if phase != Phase::Orient {
            return;
        }

        for creature in generation.creatures.iter_mut().filter(|c| c.is_active()) {
            if let Some(objective) = how_homesick(creature) {
                if creature.can_reach(creature.home_pos) {
                    creature.sleep();
                } else {
                    creature.add_objective(objective);
                }
            }
        }
    }
}
