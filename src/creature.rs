//! Creature structure, derived quantities, and state transitions.

use crate::food::{Edible, FoodKind};
use crate::geometry::{distance_to_line, Vec2, DEFAULT_HEADING};
use crate::rng::SimRng;
use serde::{Deserialize, Serialize};

/// Unique creature identifier within a simulation
pub type CreatureId = u64;

/// Scale applied to the motion energy formula
pub const ENERGY_COST_SCALE_FACTOR: f64 = 1e-4;

/// Energy budget given to a freshly spawned creature
pub const DEFAULT_ENERGY: f64 = 500.0;

/// Smallest positive `f64`, used as the floor for traits that must stay non-zero
pub const SMALLEST_POSITIVE: f64 = 4.9406564584124654e-324;

/// A heritable scalar with its own mutation spread
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MutatableTrait {
    pub value: f64,
    /// Mutation spread; always >= 0 and never itself mutated
    pub variance: f64,
}

impl MutatableTrait {
    pub fn new(value: f64, variance: f64) -> Self {
        Self {
            value,
            variance: variance.max(0.0),
        }
    }

    /// A trait that never drifts under mutation
    pub fn fixed(value: f64) -> Self {
        Self::new(value, 0.0)
    }

    fn mutate_positive_nonzero(&self, rng: &mut SimRng) -> Self {
        Self {
            value: rng.gaussian(self.value, self.variance).max(SMALLEST_POSITIVE),
            variance: self.variance,
        }
    }

    fn mutate_positive(&self, rng: &mut SimRng) -> Self {
        Self {
            value: rng.gaussian(self.value, self.variance).max(0.0),
            variance: self.variance,
        }
    }
}

/// The six heritable traits of a creature
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Traits {
    pub speed: MutatableTrait,
    pub size: MutatableTrait,
    pub sense_range: MutatableTrait,
    pub reach: MutatableTrait,
    pub flee_distance: MutatableTrait,
    pub life_span: MutatableTrait,
}

impl Default for Traits {
    fn default() -> Self {
        Self {
            speed: MutatableTrait::new(1.0, 1.0),
            size: MutatableTrait::new(1.0, 1.0),
            sense_range: MutatableTrait::new(1.0, 1.0),
            reach: MutatableTrait::new(1.0, 1.0),
            flee_distance: MutatableTrait::new(1.0, 1.0),
            life_span: MutatableTrait::new(1.0, 1.0),
        }
    }
}

impl Traits {
    /// Draw one mutated copy; trait order is fixed so the RNG stream stays reproducible
    pub fn mutate(&self, rng: &mut SimRng) -> Self {
        Self {
            speed: self.speed.mutate_positive_nonzero(rng),
            size: self.size.mutate_positive_nonzero(rng),
            sense_range: self.sense_range.mutate_positive(rng),
            reach: self.reach.mutate_positive_nonzero(rng),
            flee_distance: self.flee_distance.mutate_positive(rng),
            life_span: self.life_span.mutate_positive_nonzero(rng),
        }
    }
}

/// Lifecycle within one generation: Active -> Asleep -> Dead, or Active -> Dead
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CreatureState {
    Active,
    Asleep,
    Dead,
}

/// Objective priority; later variants out-rank earlier ones
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ObjectiveIntensity {
    MinorCraving,
    MinorAversion,
    ModerateCraving,
    ModerateAversion,
    MajorCraving,
    MajorAversion,
    VitalCraving,
    VitalAversion,
}

impl ObjectiveIntensity {
    pub fn is_aversion(self) -> bool {
        matches!(
            self,
            ObjectiveIntensity::MinorAversion
                | ObjectiveIntensity::ModerateAversion
                | ObjectiveIntensity::MajorAversion
                | ObjectiveIntensity::VitalAversion
        )
    }

    /// Craving tier for a creature that has eaten `foods` items this generation
    pub fn hunger_craving(foods: usize) -> Self {
        match foods {
            0 => ObjectiveIntensity::VitalCraving,
            1 => ObjectiveIntensity::ModerateCraving,
            _ => ObjectiveIntensity::MinorCraving,
        }
    }
}

/// A transient per-step desire to move towards (or away from) a point
#[derive(Debug, Clone, PartialEq)]
pub struct Objective {
    pub target: Vec2,
    pub intensity: ObjectiveIntensity,
    pub reason: &'static str,
}

impl Objective {
    pub fn new(target: Vec2, intensity: ObjectiveIntensity, reason: &'static str) -> Self {
        Self {
            target,
            intensity,
            reason,
        }
    }
}

/// One eaten item
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FoodRecord {
    pub step: u32,
    pub food_id: u64,
    pub kind: FoodKind,
}

/// A creature in the simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Creature {
    // Identity
    pub id: CreatureId,

    // Heritable traits
    pub traits: Traits,

    // Energy
    pub energy: f64,
    pub energy_consumed: f64,

    /// Generations survived
    pub age: u32,

    // Position
    pub pos: Vec2,
    pub home_pos: Vec2,
    #[serde(skip)]
    pub movement_history: Vec<Vec2>,

    // Per-generation state
    pub foods_eaten: Vec<FoodRecord>,
    pub state: CreatureState,
    #[serde(skip)]
    pub objective: Option<Objective>,
}

impl Creature {
    /// Freshly spawned creature at `pos`, which is also its home
    pub fn new(id: CreatureId, pos: Vec2, traits: Traits, energy: f64) -> Self {
        Self {
            id,
            traits,
            energy,
            energy_consumed: 0.0,
            age: 0,
            pos,
            home_pos: pos,
            movement_history: vec![pos],
            foods_eaten: Vec::new(),
            state: CreatureState::Active,
            objective: None,
        }
    }

    /// Creature with the stock trait set and energy budget
    pub fn with_default_traits(id: CreatureId, pos: Vec2) -> Self {
        Self::new(id, pos, Traits::default(), DEFAULT_ENERGY)
    }

    // --- Derived quantities ---

    pub fn size(&self) -> f64 {
        self.traits.size.value
    }

    pub fn effective_speed(&self) -> f64 {
        self.traits.speed.value * self.traits.size.value / 10.0
    }

    pub fn sense_range(&self) -> f64 {
        self.traits.sense_range.value
    }

    pub fn effective_reach(&self) -> f64 {
        self.traits.reach.value.max(self.size() / 4.0)
    }

    pub fn life_span(&self) -> f64 {
        self.traits.life_span.value
    }

    /// Energy spent per move: `k * (size^3 * speed^2 + sense_range)`
    pub fn motion_energy_cost(&self) -> f64 {
        let s = self.size();
        let sp = self.effective_speed();
        ENERGY_COST_SCALE_FACTOR * (s * s * s * sp * sp + self.sense_range())
    }

    pub fn energy_left(&self) -> f64 {
        (self.energy - self.energy_consumed).max(0.0)
    }

    pub fn food_count(&self) -> usize {
        self.foods_eaten.len()
    }

    pub fn creatures_eaten(&self) -> usize {
        self.foods_eaten
            .iter()
            .filter(|f| f.kind == FoodKind::Creature)
            .count()
    }

    /// Moves taken this generation
    pub fn moves_taken(&self) -> usize {
        self.movement_history.len().saturating_sub(1)
    }

    // --- Lifecycle ---

    pub fn is_alive(&self) -> bool {
        self.state != CreatureState::Dead
    }

    pub fn is_active(&self) -> bool {
        self.state == CreatureState::Active
    }

    pub fn sleep(&mut self) {
        if self.state == CreatureState::Active {
            self.state = CreatureState::Asleep;
        }
    }

    pub fn kill(&mut self) {
        self.state = CreatureState::Dead;
    }

    /// Charge `cost` against the budget; dies once nothing is left
    pub fn apply_energy_cost(&mut self, cost: f64) {
        self.energy_consumed += cost.max(0.0);
        if self.energy_left() <= 0.0 {
            self.kill();
        }
    }

    // --- Movement and sensing ---

    /// Relocate and pay the motion cost, even for a zero-length move
    pub fn move_to(&mut self, pos: Vec2) {
        self.pos = pos;
        self.movement_history.push(pos);
        let cost = self.motion_energy_cost();
        self.apply_energy_cost(cost);
    }

    /// Position before the most recent move
    pub fn last_position(&self) -> Option<Vec2> {
        let len = self.movement_history.len();
        if len <= 1 {
            return None;
        }
        Some(self.movement_history[len - 2])
    }

    /// Unit heading: objective-relative, else previous motion, else the default heading
    pub fn direction(&self) -> Vec2 {
        if let Some(objective) = &self.objective {
            let mut d = objective.target - self.pos;
            if objective.intensity.is_aversion() {
                d = -d;
            }
            if d.norm() != 0.0 {
                return d.normalize();
            }
        }

        match self.last_position() {
            Some(last) => (self.pos - last).normalize(),
            None => DEFAULT_HEADING,
        }
    }

    pub fn can_see(&self, pt: Vec2) -> bool {
        (pt - self.pos).norm() <= self.sense_range()
    }

    pub fn can_reach_now(&self, pt: Vec2) -> bool {
        (pt - self.pos).norm() <= self.effective_reach()
    }

    /// Reachable now, or passed within reach during the last move
    pub fn can_reach(&self, pt: Vec2) -> bool {
        if self.can_reach_now(pt) {
            return true;
        }

        match self.last_position() {
            Some(last) => distance_to_line(self.pos, last, pt)
                .map_or(false, |d| d <= self.effective_reach()),
            None => false,
        }
    }

    /// Visible and closer than the flee distance
    pub fn within_flee_distance(&self, pt: Vec2) -> bool {
        self.can_see(pt) && self.pos.distance(pt) < self.traits.flee_distance.value
    }

    // --- Objectives ---

    /// Keep the higher-priority objective: intensity first, then the nearer target
    pub fn add_objective(&mut self, objective: Objective) {
        let replace = match &self.objective {
            None => true,
            Some(current) if objective.intensity > current.intensity => true,
            Some(current) if objective.intensity == current.intensity => {
                self.pos.distance(objective.target) < self.pos.distance(current.target)
            }
            Some(_) => false,
        };

        if replace {
            self.objective = Some(objective);
        }
    }

    pub fn reset_objective(&mut self) {
        self.objective = None;
    }

    pub fn eat(&mut self, step: u32, food: Edible) {
        self.foods_eaten.push(FoodRecord {
            step,
            food_id: food.edible_id(),
            kind: food.kind(),
        });
    }

    // --- Generation-to-generation transitions ---

    /// Mutated offspring spawned at this creature's home point
    pub fn mutate(&self, child_id: CreatureId, rng: &mut SimRng) -> Creature {
        Creature::new(child_id, self.home_pos, self.traits.mutate(rng), self.energy)
    }

    /// The same creature carried into the next generation, one generation older
    pub fn grow_older(&self) -> Creature {
        let mut next = Creature::new(self.id, self.home_pos, self.traits, self.energy);
        next.age = self.age + 1;
        next
    }

    /// Exact trait copy with a fresh identity; draws no randomness
    pub fn cloned_offspring(&self, child_id: CreatureId) -> Creature {
        Creature::new(child_id, self.home_pos, self.traits, self.energy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_traits() -> Traits {
        Traits {
            speed: MutatableTrait::new(10.0, 1.0),
            size: MutatableTrait::new(10.0, 1.0),
            sense_range: MutatableTrait::new(20.0, 1.0),
            reach: MutatableTrait::new(1.0, 0.3),
            flee_distance: MutatableTrait::fixed(1e12),
            life_span: MutatableTrait::fixed(1e4),
        }
    }

    fn test_creature() -> Creature {
        Creature::new(1, Vec2::new(0.0, 50.0), test_traits(), DEFAULT_ENERGY)
    }

    #[test]
    fn test_derived_quantities() {
        let c = test_creature();
        assert_eq!(c.effective_speed(), 10.0);
        assert_eq!(c.effective_reach(), 2.5);
        // 1e-4 * (1000 * 100 + 20)
        assert!((c.motion_energy_cost() - 10.002).abs() < 1e-9);
        assert_eq!(c.energy_left(), DEFAULT_ENERGY);
    }

    #[test]
    fn test_move_charges_energy_and_kills() {
        let mut c = test_creature();
        let mut consumed = 0.0;
        let mut moves = 0;
        while c.is_alive() {
            c.move_to(c.pos);
            assert!(c.energy_consumed >= consumed);
            consumed = c.energy_consumed;
            moves += 1;
        }
        assert_eq!(c.energy_left(), 0.0);
        assert_eq!(c.state, CreatureState::Dead);
        assert_eq!(moves, 50);
    }

    #[test]
    fn test_direction_fallbacks() {
        let mut c = test_creature();
        assert_eq!(c.direction(), DEFAULT_HEADING);

        c.move_to(Vec2::new(0.0, 60.0));
        let d = c.direction();
        assert!((d.y - 1.0).abs() < 1e-12);

        c.add_objective(Objective::new(Vec2::new(10.0, 60.0), ObjectiveIntensity::MinorCraving, "test"));
        assert!((c.direction().x - 1.0).abs() < 1e-12);

        c.reset_objective();
        c.add_objective(Objective::new(Vec2::new(10.0, 60.0), ObjectiveIntensity::VitalAversion, "test"));
        assert!((c.direction().x + 1.0).abs() < 1e-12);

        // Degenerate objective falls back to motion history
        c.reset_objective();
        c.add_objective(Objective::new(c.pos, ObjectiveIntensity::VitalCraving, "test"));
        assert!((c.direction().y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_can_reach_along_segment() {
        let mut c = test_creature();
        c.move_to(Vec2::new(0.0, 70.0));
        let passed = Vec2::new(1.0, 60.0);
        assert!(!c.can_reach_now(passed));
        assert!(c.can_reach(passed));
        assert!(!c.can_reach(Vec2::new(5.0, 60.0)));
    }

    #[test]
    fn test_objective_arbitration() {
        let mut c = test_creature();
        c.add_objective(Objective::new(Vec2::new(0.0, 80.0), ObjectiveIntensity::ModerateCraving, "far"));
        c.add_objective(Objective::new(Vec2::new(0.0, 60.0), ObjectiveIntensity::ModerateCraving, "near"));
        assert_eq!(c.objective.as_ref().unwrap().reason, "near");

        c.add_objective(Objective::new(Vec2::new(0.0, 55.0), ObjectiveIntensity::MinorCraving, "weak"));
        assert_eq!(c.objective.as_ref().unwrap().reason, "near");

        c.add_objective(Objective::new(Vec2::new(0.0, 90.0), ObjectiveIntensity::MajorCraving, "strong"));
        assert_eq!(c.objective.as_ref().unwrap().reason, "strong");

        // Equal distance does not replace
        c.add_objective(Objective::new(Vec2::new(0.0, 90.0), ObjectiveIntensity::MajorCraving, "tie"));
        assert_eq!(c.objective.as_ref().unwrap().reason, "strong");
    }

    #[test]
    fn test_state_transitions() {
        let mut c = test_creature();
        c.sleep();
        assert_eq!(c.state, CreatureState::Asleep);
        assert!(c.is_alive() && !c.is_active());
        c.kill();
        c.sleep();
        assert_eq!(c.state, CreatureState::Dead);
    }

    #[test]
    fn test_mutate_resets_state_and_keeps_variance() {
        let mut parent = test_creature();
        parent.home_pos = Vec2::new(0.0, 42.0);
        parent.age = 3;
        parent.move_to(Vec2::new(5.0, 50.0));
        parent.eat(1, Edible::Pellet(9));

        let mut rng = SimRng::new(11);
        let child = parent.mutate(99, &mut rng);

        assert_eq!(child.id, 99);
        assert_eq!(child.age, 0);
        assert_eq!(child.pos, parent.home_pos);
        assert_eq!(child.energy_consumed, 0.0);
        assert!(child.foods_eaten.is_empty());
        assert_eq!(child.movement_history.len(), 1);
        assert_eq!(child.traits.speed.variance, parent.traits.speed.variance);
        assert_eq!(child.traits.flee_distance.value, parent.traits.flee_distance.value);
        assert!(child.traits.speed.value > 0.0);
        assert_eq!(rng.draws(), 12);
    }

    #[test]
    fn test_grow_older_preserves_identity() {
        let mut c = test_creature();
        c.eat(4, Edible::Prey(7));
        c.sleep();
        let older = c.grow_older();
        assert_eq!(older.id, c.id);
        assert_eq!(older.age, 1);
        assert_eq!(older.traits, c.traits);
        assert!(older.is_active());
        assert!(older.foods_eaten.is_empty());
        assert_eq!(c.creatures_eaten(), 1);
    }

    #[test]
    fn test_hunger_tiers() {
        assert_eq!(ObjectiveIntensity::hunger_craving(0), ObjectiveIntensity::VitalCraving);
        assert_eq!(ObjectiveIntensity::hunger_craving(1), ObjectiveIntensity::ModerateCraving);
        assert_eq!(ObjectiveIntensity::hunger_craving(5), ObjectiveIntensity::MinorCraving);
        assert!(ObjectiveIntensity::VitalAversion > ObjectiveIntensity::VitalCraving);
    }
}
