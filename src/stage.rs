//! Square arena the creatures live in.

use crate::geometry::Vec2;
use crate::rng::SimRng;
use serde::{Deserialize, Serialize};

/// Arena edge as a segment between two corners
pub type Edge = (Vec2, Vec2);

/// Square arena spanning `[0, size]` on both axes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub size: f64,
}

impl Stage {
    pub fn new(size: f64) -> Self {
        Self { size }
    }

    /// The four edges in order: bottom, right, top, left
    pub fn edges(&self) -> [Edge; 4] {
        let s = self.size;
        [
            (Vec2::new(0.0, 0.0), Vec2::new(s, 0.0)),
            (Vec2::new(s, 0.0), Vec2::new(s, s)),
            (Vec2::new(s, s), Vec2::new(0.0, s)),
            (Vec2::new(0.0, s), Vec2::new(0.0, 0.0)),
        ]
    }

    pub fn can_move_to(&self, to: Vec2) -> bool {
        to.x >= 0.0 && to.y >= 0.0 && to.x <= self.size && to.y <= self.size
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(0.5 * self.size, 0.5 * self.size)
    }

    pub fn random_location(&self, rng: &mut SimRng) -> Vec2 {
        let x = rng.uniform(0.0, self.size);
        let y = rng.uniform(0.0, self.size);
        Vec2::new(x, y)
    }

    /// Closest point on any of the four edges
    pub fn nearest_edge_point(&self, pos: Vec2) -> Vec2 {
        let hw = 0.5 * self.size;
        let x = if pos.x > hw { self.size } else { 0.0 };
        let y = if pos.y > hw { self.size } else { 0.0 };

        if (x - pos.x).abs() < (y - pos.y).abs() {
            Vec2::new(x, pos.y)
        } else {
            Vec2::new(pos.x, y)
        }
    }

    pub fn constrain_within(&self, pos: Vec2) -> Vec2 {
        Vec2::new(pos.x.clamp(0.0, self.size), pos.y.clamp(0.0, self.size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_containment() {
        let stage = Stage::new(100.0);
        assert!(stage.can_move_to(Vec2::new(0.0, 100.0)));
        assert!(!stage.can_move_to(Vec2::new(-0.1, 50.0)));
        assert!(!stage.can_move_to(Vec2::new(50.0, 100.1)));
    }

    #[test]
    fn test_constrain() {
        let stage = Stage::new(100.0);
        assert_eq!(stage.constrain_within(Vec2::new(-5.0, 120.0)), Vec2::new(0.0, 100.0));
        assert_eq!(stage.constrain_within(Vec2::new(30.0, 40.0)), Vec2::new(30.0, 40.0));
    }

    #[test]
    fn test_nearest_edge_point() {
        let stage = Stage::new(100.0);
        assert_eq!(stage.nearest_edge_point(Vec2::new(10.0, 40.0)), Vec2::new(0.0, 40.0));
        assert_eq!(stage.nearest_edge_point(Vec2::new(60.0, 95.0)), Vec2::new(60.0, 100.0));
        assert_eq!(stage.nearest_edge_point(Vec2::new(97.0, 30.0)), Vec2::new(100.0, 30.0));
    }

    #[test]
    fn test_random_location_inside() {
        let stage = Stage::new(50.0);
        let mut rng = SimRng::new(9);
        for _ in 0..200 {
            assert!(stage.can_move_to(stage.random_location(&mut rng)));
        }
    }

    #[test]
    fn test_edges_closed_loop() {
        let edges = Stage::new(10.0).edges();
        for i in 0..4 {
            assert_eq!(edges[i].1, edges[(i + 1) % 4].0);
        }
    }
}
