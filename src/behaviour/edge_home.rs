//! Home point assignment on the nearest enabled arena edge.

use super::{Phase, StepBehaviour};
use crate::generation::Generation;
use crate::geometry::{distance_to_line, project_to_line, Vec2};
use crate::simulation::SimContext;
use crate::stage::Stage;

/// Home used when every edge is disabled
pub const UNREACHABLE_HOME: Vec2 = Vec2::new(f64::MAX, 0.0);

/// Re-homes every living creature onto the nearest enabled edge during `Pre`
pub struct EdgeHomeBehaviour {
    /// Edge indices (bottom, right, top, left) creatures may not call home
    pub disabled_edges: Vec<usize>,
}

impl EdgeHomeBehaviour {
    pub fn new(disabled_edges: Vec<usize>) -> Self {
        Self { disabled_edges }
    }

    fn home_for(&self, stage: &Stage, pos: Vec2) -> Option<Vec2> {
        let mut nearest = None;
        let mut nearest_dist = f64::INFINITY;

        for (i, edge) in stage.edges().iter().enumerate() {
            if self.disabled_edges.contains(&i) {
                continue;
            }
            if let Some(d) = distance_to_line(edge.0, edge.1, pos) {
                if d < nearest_dist {
                    nearest_dist = d;
                    nearest = Some(*edge);
                }
            }
        }

        let (start, end) = nearest?;
        project_to_line(start, end, pos).map(|offset| start + offset)
    }
}

impl StepBehaviour for EdgeHomeBehaviour {
    fn name(&self) -> &'static str {
        "edge_home"
    }

    fn apply(&self, phase: Phase, generation: &mut Generation, ctx: &mut SimContext) {
        if phase != Phase::Pre {
            return;
        }

        for creature in generation.creatures.iter_mut().filter(|c| c.is_alive()) {
            creature.home_pos = self.home_for(&ctx.stage, creature.pos).unwrap_or(UNREACHABLE_HOME);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creature::Creature;

    fn homes(disabled: Vec<usize>, pos: Vec2) -> Vec2 {
        let mut generation = Generation::new(vec![Creature::with_default_traits(0, pos)], &[]);
        let mut ctx = SimContext::new(Stage::new(100.0), 1);
        EdgeHomeBehaviour::new(disabled).apply(Phase::Pre, &mut generation, &mut ctx);
        generation.creatures[0].home_pos
    }

    #[test]
    fn test_nearest_edge() {
        let home = homes(vec![], Vec2::new(30.0, 90.0));
        assert!((home.x - 30.0).abs() < 1e-9);
        assert!((home.y - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_disabled_edges_skipped() {
        // Top and left disabled; bottom and right tie, the first edge wins
        let home = homes(vec![2, 3], Vec2::new(10.0, 90.0));
        assert_eq!(home, Vec2::new(10.0, 0.0));
    }

    #[test]
    fn test_all_disabled_is_unreachable() {
        let home = homes(vec![0, 1, 2, 3], Vec2::new(10.0, 10.0));
        assert_eq!(home, UNREACHABLE_HOME);
    }
}
