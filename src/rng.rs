//! Seeded random number stream shared by every stochastic decision in a simulation.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use std::f64::consts::PI;

/// Deterministic random stream.
///
/// One instance is owned per simulation and threaded through every call that
/// draws randomness, so the seed alone fixes the outcome of a run.
#[derive(Clone, Debug)]
pub struct SimRng {
    inner: ChaCha8Rng,
    seed: u64,
    draws: u64,
}

impl SimRng {
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
            draws: 0,
        }
    }

    /// Seed from a textual label such as `"et-train-1003"`
    pub fn from_label(label: &str) -> Self {
        Self::new(label_to_seed(label))
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of primitive draws taken from the stream so far
    pub fn draws(&self) -> u64 {
        self.draws
    }

    fn next_unit(&mut self) -> f64 {
        self.draws += 1;
        self.inner.gen::<f64>()
    }

    /// Uniform value in `[min, max)`
    pub fn uniform(&mut self, min: f64, max: f64) -> f64 {
        min + self.next_unit() * (max - min)
    }

    /// Normal sample via Box-Muller; a zero first draw is re-drawn so `ln` stays finite
    pub fn gaussian(&mut self, mean: f64, stddev: f64) -> f64 {
        let mut u1 = self.next_unit();
        let u2 = self.next_unit();
        while u1 == 0.0 {
            u1 = self.next_unit();
        }
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos();
        mean + z * stddev
    }

    /// In-place Fisher-Yates shuffle
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = (self.next_unit() * (i + 1) as f64) as usize;
            items.swap(i, j.min(i));
        }
    }
}

/// FNV-1a over the label bytes; stable across platforms and releases
pub fn label_to_seed(label: &str) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    label
        .bytes()
        .fold(OFFSET, |hash, b| (hash ^ b as u64).wrapping_mul(PRIME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_stream() {
        let mut a = SimRng::from_label("et-train-1000");
        let mut b = SimRng::from_label("et-train-1000");
        for _ in 0..100 {
            assert_eq!(a.uniform(0.0, 1.0).to_bits(), b.uniform(0.0, 1.0).to_bits());
        }
        assert_eq!(a.draws(), 100);
    }

    #[test]
    fn test_labels_differ() {
        assert_ne!(label_to_seed("gs-train-1000"), label_to_seed("gs-train-1001"));
        assert_eq!(label_to_seed(""), 0xcbf2_9ce4_8422_2325);
    }

    #[test]
    fn test_uniform_range() {
        let mut rng = SimRng::new(7);
        for _ in 0..1000 {
            let v = rng.uniform(-2.0, 3.0);
            assert!((-2.0..3.0).contains(&v));
        }
    }

    #[test]
    fn test_gaussian_moments() {
        let mut rng = SimRng::new(42);
        let n = 20_000;
        let samples: Vec<f64> = (0..n).map(|_| rng.gaussian(10.0, 2.0)).collect();
        let mean = samples.iter().sum::<f64>() / n as f64;
        let var = samples.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        assert!((mean - 10.0).abs() < 0.1, "mean was {}", mean);
        assert!((var.sqrt() - 2.0).abs() < 0.1, "sd was {}", var.sqrt());
    }

    #[test]
    fn test_gaussian_zero_stddev() {
        let mut rng = SimRng::new(1);
        assert_eq!(rng.gaussian(5.0, 0.0), 5.0);
        assert!(rng.draws() >= 2);
    }

    #[test]
    fn test_shuffle_is_permutation() {
        let mut rng = SimRng::new(3);
        let mut items: Vec<u32> = (0..50).collect();
        rng.shuffle(&mut items);
        let mut sorted = items.clone();
        sorted.sort();
        assert_eq!(sorted, (0..50).collect::<Vec<_>>());
        assert_eq!(rng.draws(), 49);
    }
}
