//! Piecewise-linear schedules (e.g. food supply per generation).

use crate::geometry::lerp;
use serde::{Deserialize, Serialize};

/// Lookup table of `(x, y)` points sorted by `x`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interpolator {
    points: Vec<(f64, f64)>,
}

impl Interpolator {
    pub fn new(mut points: Vec<(f64, f64)>) -> Self {
        points.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { points }
    }

    /// A schedule that returns `value` everywhere
    pub fn constant(value: f64) -> Self {
        Self::new(vec![(0.0, value)])
    }

    /// Value at `x`; clamps to the end points outside the table, 0 when empty
    pub fn get(&self, x: f64) -> f64 {
        let (first, last) = match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return 0.0,
        };

        if x < first.0 {
            return first.1;
        }
        if x >= last.0 {
            return last.1;
        }

        let i = self
            .points
            .iter()
            .position(|&(px, _)| x < px)
            .unwrap_or(self.points.len() - 1);

        let (x1, y1) = self.points[i - 1];
        let (x2, y2) = self.points[i];
        if x1 == x2 {
            return y2;
        }

        lerp(y1, y2, (x - x1) / (x2 - x1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant() {
        let interp = Interpolator::constant(50.0);
        assert_eq!(interp.get(0.0), 50.0);
        assert_eq!(interp.get(99.0), 50.0);
        assert_eq!(interp.get(-3.0), 50.0);
    }

    #[test]
    fn test_linear_segments() {
        let interp = Interpolator::new(vec![(0.0, 50.0), (10.0, 30.0), (20.0, 30.0)]);
        assert_eq!(interp.get(5.0), 40.0);
        assert_eq!(interp.get(10.0), 30.0);
        assert_eq!(interp.get(15.0), 30.0);
        assert_eq!(interp.get(25.0), 30.0);
    }

    #[test]
    fn test_empty_is_zero() {
        let interp = Interpolator::new(Vec::new());
        assert_eq!(interp.get(1.0), 0.0);
    }
}
