//! Diversity measures over a population's trait values.

use std::collections::HashMap;

/// Bins per trait axis for the joint Shannon entropy
pub const SHANNON_BINS: usize = 10;

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Bessel-corrected variance; 0 for fewer than two samples
pub fn sample_variance(values: &[f64], mean: f64) -> f64 {
    if values.len() <= 1 {
        return 0.0;
    }
    let sum: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
    sum / (values.len() - 1) as f64
}

pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Squared coefficient of variation; 0 when the mean is not positive
pub fn normalized_variance(variance: f64, mean: f64) -> f64 {
    if mean > 0.0 {
        variance / (mean * mean)
    } else {
        0.0
    }
}

/// Sum of CV² over `(variance, mean)` pairs
pub fn trait_diversity(traits: &[(f64, f64)]) -> f64 {
    traits.iter().map(|&(var, m)| normalized_variance(var, m)).sum()
}

fn bin_index(value: f64, min: f64, max: f64) -> usize {
    let width = max - min;
    if width <= 0.0 {
        return 0;
    }
    let idx = ((value - min) / width * SHANNON_BINS as f64).floor() as usize;
    idx.min(SHANNON_BINS - 1)
}

/// Shannon entropy `-Σ p ln p` of the joint distribution of `points`, binned
/// into a 10×10×10 grid spanning each axis' observed range
pub fn shannon_diversity(points: &[[f64; 3]]) -> f64 {
    if points.is_empty() {
        return 0.0;
    }

    let mut lo = [f64::INFINITY; 3];
    let mut hi = [f64::NEG_INFINITY; 3];
    for p in points {
        for axis in 0..3 {
            lo[axis] = lo[axis].min(p[axis]);
            hi[axis] = hi[axis].max(p[axis]);
        }
    }

    let mut counts: HashMap<[usize; 3], usize> = HashMap::new();
    for p in points {
        let key = [
            bin_index(p[0], lo[0], hi[0]),
            bin_index(p[1], lo[1], hi[1]),
            bin_index(p[2], lo[2], hi[2]),
        ];
        *counts.entry(key).or_insert(0) += 1;
    }

    let total = points.len() as f64;
    counts
        .values()
        .map(|&count| {
            let p = count as f64 / total;
            -p * p.ln()
        })
        .sum()
}
