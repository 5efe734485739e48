//! Food pellets and the things a creature can eat.

use crate::creature::CreatureId;
use crate::geometry::Vec2;
use serde::{Deserialize, Serialize};

/// Food pellet identifier, unique within a generation
pub type FoodId = u64;

/// What kind of thing was eaten
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FoodKind {
    FoodBall,
    Creature,
}

/// Identity of something edible
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Edible {
    Pellet(FoodId),
    Prey(CreatureId),
}

impl Edible {
    pub fn edible_id(&self) -> u64 {
        match *self {
            Edible::Pellet(id) => id,
            Edible::Prey(id) => id,
        }
    }

    pub fn kind(&self) -> FoodKind {
        match self {
            Edible::Pellet(_) => FoodKind::FoodBall,
            Edible::Prey(_) => FoodKind::Creature,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FoodStatus {
    Available,
    /// Eaten during the given step
    Eaten(u32),
}

/// A stationary food pellet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Food {
    pub id: FoodId,
    pub position: Vec2,
    pub status: FoodStatus,
}

impl Food {
    pub fn new(id: FoodId, position: Vec2) -> Self {
        Self {
            id,
            position,
            status: FoodStatus::Available,
        }
    }

    pub fn is_eaten(&self) -> bool {
        self.status != FoodStatus::Available
    }

    /// One-way transition to eaten; a second call keeps the first step
    pub fn mark_eaten(&mut self, step: u32) {
        if !self.is_eaten() {
            self.status = FoodStatus::Eaten(step);
        }
    }

    pub fn as_edible(&self) -> Edible {
        Edible::Pellet(self.id)
    }
}
