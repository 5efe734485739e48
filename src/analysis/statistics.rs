//! Statistical tests for comparing the two conditions.
//!
//! All routines are closed-form or short iterative approximations; none of
//! them fail; degenerate samples produce neutral results instead.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Bonferroni divisor shared by every Welch test in the process
static NUM_COMPARISONS: AtomicUsize = AtomicUsize::new(1);

/// Set the number of comparisons used for the Bonferroni adjustment
pub fn set_num_comparisons(n: usize) {
    NUM_COMPARISONS.store(n.max(1), Ordering::Relaxed);
}

pub fn num_comparisons() -> usize {
    NUM_COMPARISONS.load(Ordering::Relaxed)
}

/// Two-sided 95% critical values of Student's t by degrees of freedom
const T_CRITICAL_TABLE: [(u32, f64); 37] = [
    (1, 12.706),
    (2, 4.303),
    (3, 3.182),
    (4, 2.776),
    (5, 2.571),
    (6, 2.447),
    (7, 2.365),
    (8, 2.306),
    (9, 2.262),
    (10, 2.228),
    (11, 2.201),
    (12, 2.179),
    (13, 2.160),
    (14, 2.145),
    (15, 2.131),
    (16, 2.120),
    (17, 2.110),
    (18, 2.101),
    (19, 2.093),
    (20, 2.086),
    (21, 2.080),
    (22, 2.074),
    (23, 2.069),
    (24, 2.064),
    (25, 2.060),
    (26, 2.056),
    (27, 2.052),
    (28, 2.048),
    (29, 2.045),
    (30, 2.042),
    (40, 2.021),
    (50, 2.009),
    (60, 2.000),
    (80, 1.990),
    (100, 1.984),
    (120, 1.980),
    (1000, 1.962),
];

/// Mean, spread, and 95% confidence interval of a sample
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DescriptiveStats {
    pub mean: f64,
    pub sd: f64,
    pub median: f64,
    pub ci95_lower: f64,
    pub ci95_upper: f64,
    pub n: usize,
}

/// Magnitude bucket of Cohen's d
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectSize {
    Negligible,
    Small,
    Medium,
    Large,
    /// One of the samples was empty
    NotApplicable,
}

impl EffectSize {
    pub fn from_cohens_d(d: f64) -> Self {
        let abs = d.abs();
        if abs < 0.2 {
            EffectSize::Negligible
        } else if abs < 0.5 {
            EffectSize::Small
        } else if abs < 0.8 {
            EffectSize::Medium
        } else {
            EffectSize::Large
        }
    }
}

impl fmt::Display for EffectSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EffectSize::Negligible => "negligible",
            EffectSize::Small => "small",
            EffectSize::Medium => "medium",
            EffectSize::Large => "large",
            EffectSize::NotApplicable => "N/A",
        };
        write!(f, "{}", s)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TTestResult {
    pub t: f64,
    pub df: f64,
    pub p: f64,
    pub p_bonferroni: f64,
    pub cohens_d: f64,
    pub interpretation: EffectSize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MannWhitneyResult {
    pub u: f64,
    pub z: f64,
    pub p: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinearRegressionResult {
    pub slope: f64,
    pub intercept: f64,
    pub r2: f64,
    /// Two-sided p-value of the slope being non-zero
    pub slope_p: f64,
}

/// Everything reported for one ET-vs-GS measure
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub et_stats: DescriptiveStats,
    pub gs_stats: DescriptiveStats,
    pub t_test: TTestResult,
    pub mann_whitney: MannWhitneyResult,
}

/// Critical t for `df`, linearly interpolated between tabulated values
pub fn t_critical(df: f64) -> f64 {
    let rounded = df.round().max(1.0);

    let mut lower = T_CRITICAL_TABLE[0];
    let mut upper = T_CRITICAL_TABLE[T_CRITICAL_TABLE.len() - 1];
    if rounded >= upper.0 as f64 {
        return upper.1;
    }

    for window in T_CRITICAL_TABLE.windows(2) {
        let (lo, hi) = (window[0], window[1]);
        if lo.0 as f64 == rounded {
            return lo.1;
        }
        if (lo.0 as f64) < rounded && rounded < hi.0 as f64 {
            lower = lo;
            upper = hi;
            break;
        }
    }

    let t = (rounded - lower.0 as f64) / (upper.0 as f64 - lower.0 as f64);
    lower.1 + t * (upper.1 - lower.1)
}

/// Lanczos approximation of `ln Γ(z)` (g = 7)
pub fn ln_gamma(z: f64) -> f64 {
    const G: f64 = 7.0;
    const COEFFS: [f64; 9] = [
        0.999_999_999_999_809_93,
        676.520_368_121_885_1,
        -1_259.139_216_722_402_8,
        771.323_428_777_653_13,
        -176.615_029_162_140_59,
        12.507_343_278_686_905,
        -0.138_571_095_265_720_12,
        9.984_369_578_019_571_6e-6,
        1.505_632_735_149_311_6e-7,
    ];

    if z < 0.5 {
        // Reflection formula
        return (PI / (PI * z).sin()).ln() - ln_gamma(1.0 - z);
    }

    let z = z - 1.0;
    let mut x = COEFFS[0];
    for (i, &c) in COEFFS.iter().enumerate().skip(1) {
        x += c / (z + i as f64);
    }
    let t = z + G + 0.5;
    0.5 * (2.0 * PI).ln() + (z + 0.5) * t.ln() - t + x.ln()
}

/// Regularized incomplete beta `I_x(a, b)` by Lentz's continued fraction
pub fn incomplete_beta(x: f64, a: f64, b: f64) -> f64 {
    const TINY: f64 = 1e-30;
    const EPSILON: f64 = 1e-8;
    const MAX_ITER: usize = 200;

    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }

    // The fraction converges quickly only below the mean of the distribution
    if x > (a + 1.0) / (a + b + 2.0) {
        return 1.0 - incomplete_beta(1.0 - x, b, a);
    }

    let ln_beta = ln_gamma(a) + ln_gamma(b) - ln_gamma(a + b);
    let front = (x.ln() * a + (1.0 - x).ln() * b - ln_beta).exp() / a;

    let (mut f, mut c, mut d) = (1.0, 1.0, 0.0);
    for i in 0..=MAX_ITER {
        let m = (i / 2) as f64;
        let numerator = if i == 0 {
            1.0
        } else if i % 2 == 0 {
            (m * (b - m) * x) / ((a + 2.0 * m - 1.0) * (a + 2.0 * m))
        } else {
            -((a + m) * (a + b + m) * x) / ((a + 2.0 * m) * (a + 2.0 * m + 1.0))
        };

        d = 1.0 + numerator * d;
        if d.abs() < TINY {
            d = TINY;
        }
        d = 1.0 / d;

        c = 1.0 + numerator / c;
        if c.abs() < TINY {
            c = TINY;
        }

        let cd = c * d;
        f *= cd;
        if (cd - 1.0).abs() < EPSILON {
            break;
        }
    }

    front * (f - 1.0)
}

/// Two-sided p-value of Student's t
pub fn t_dist_p_value(t: f64, df: f64) -> f64 {
    let x = df / (df + t * t);
    incomplete_beta(x, df / 2.0, 0.5)
}

/// Standard normal CDF via the Abramowitz-Stegun erf approximation
pub fn normal_cdf(z: f64) -> f64 {
    const A1: f64 = 0.254_829_592;
    const A2: f64 = -0.284_496_736;
    const A3: f64 = 1.421_413_741;
    const A4: f64 = -1.453_152_027;
    const A5: f64 = 1.061_405_429;
    const P: f64 = 0.327_591_1;

    let sign = if z < 0.0 { -1.0 } else { 1.0 };
    let x = z.abs() / 2.0_f64.sqrt();
    let t = 1.0 / (1.0 + P * x);
    let y = 1.0 - (((((A5 * t + A4) * t) + A3) * t + A2) * t + A1) * t * (-x * x).exp();
    0.5 * (1.0 + sign * y)
}

fn mean(data: &[f64]) -> f64 {
    data.iter().sum::<f64>() / data.len() as f64
}

fn sample_variance(data: &[f64], mean: f64) -> f64 {
    if data.len() <= 1 {
        return 0.0;
    }
    data.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (data.len() - 1) as f64
}

pub fn descriptive_stats(data: &[f64]) -> DescriptiveStats {
    let n = data.len();
    if n == 0 {
        return DescriptiveStats::default();
    }

    let m = mean(data);
    let sd = sample_variance(data, m).sqrt();
    let t_crit = t_critical((n as f64 - 1.0).max(1.0));
    let se = sd / (n as f64).sqrt();

    DescriptiveStats {
        mean: m,
        sd,
        median: crate::diversity::median(data),
        ci95_lower: m - t_crit * se,
        ci95_upper: m + t_crit * se,
        n,
    }
}

/// Welch's unequal-variance t-test, Bonferroni-adjusted by the process-wide divisor
pub fn welch_t_test(a: &[f64], b: &[f64]) -> TTestResult {
    welch_t_test_with(a, b, num_comparisons())
}

/// Welch's t-test with an explicit Bonferroni divisor
pub fn welch_t_test_with(a: &[f64], b: &[f64], comparisons: usize) -> TTestResult {
    let (n1, n2) = (a.len(), b.len());
    if n1 == 0 || n2 == 0 {
        return TTestResult {
            t: 0.0,
            df: 1.0,
            p: 1.0,
            p_bonferroni: 1.0,
            cohens_d: 0.0,
            interpretation: EffectSize::NotApplicable,
        };
    }

    let (n1f, n2f) = (n1 as f64, n2 as f64);
    let (m1, m2) = (mean(a), mean(b));
    let (v1, v2) = (sample_variance(a, m1), sample_variance(b, m2));
    let (q1, q2) = (v1 / n1f, v2 / n2f);

    let se = (q1 + q2).sqrt();
    let t = if se > 0.0 { (m1 - m2) / se } else { 0.0 };

    // Welch-Satterthwaite; a single-sample group contributes no variance term
    let term = |q: f64, n: usize| if n > 1 { q * q / (n - 1) as f64 } else { 0.0 };
    let denom = term(q1, n1) + term(q2, n2);
    let df = if denom > 0.0 { (q1 + q2).powi(2) / denom } else { 1.0 };

    let p = t_dist_p_value(t, df);
    let p_bonferroni = (p * comparisons.max(1) as f64).min(1.0);

    let pooled_df = n1f + n2f - 2.0;
    let pooled_sd = if pooled_df > 0.0 {
        (((n1f - 1.0) * v1 + (n2f - 1.0) * v2) / pooled_df).sqrt()
    } else {
        0.0
    };
    let cohens_d = if pooled_sd > 0.0 { (m1 - m2) / pooled_sd } else { 0.0 };

    TTestResult {
        t,
        df,
        p,
        p_bonferroni,
        cohens_d,
        interpretation: EffectSize::from_cohens_d(cohens_d),
    }
}

/// Mann-Whitney U with mid-ranks and a normal approximation
pub fn mann_whitney_u(a: &[f64], b: &[f64]) -> MannWhitneyResult {
    let (n1, n2) = (a.len(), b.len());
    if n1 == 0 || n2 == 0 {
        return MannWhitneyResult { u: 0.0, z: 0.0, p: 1.0 };
    }

    let mut combined: Vec<(f64, bool)> = a
        .iter()
        .map(|&v| (v, true))
        .chain(b.iter().map(|&v| (v, false)))
        .collect();
    combined.sort_by(|x, y| x.0.total_cmp(&y.0));

    let mut rank_sum_a = 0.0;
    let mut i = 0;
    while i < combined.len() {
        let mut j = i;
        while j < combined.len() && combined[j].0 == combined[i].0 {
            j += 1;
        }
        let mid_rank = (i + 1 + j) as f64 / 2.0;
        rank_sum_a += mid_rank * combined[i..j].iter().filter(|(_, in_a)| *in_a).count() as f64;
        i = j;
    }

    let (n1f, n2f) = (n1 as f64, n2 as f64);
    let u1 = rank_sum_a - n1f * (n1f + 1.0) / 2.0;
    let u = u1.min(n1f * n2f - u1);

    let mean_u = n1f * n2f / 2.0;
    let sigma_u = (n1f * n2f * (n1f + n2f + 1.0) / 12.0).sqrt();
    let z = if sigma_u > 0.0 { (u - mean_u) / sigma_u } else { 0.0 };

    MannWhitneyResult {
        u,
        z,
        p: 2.0 * normal_cdf(-z.abs()),
    }
}

/// Ordinary least squares of `y` against its index
pub fn linear_regression(y: &[f64]) -> LinearRegressionResult {
    let n = y.len();
    if n < 2 {
        return LinearRegressionResult {
            slope: 0.0,
            intercept: 0.0,
            r2: 0.0,
            slope_p: 1.0,
        };
    }

    let nf = n as f64;
    let mean_x = (nf - 1.0) / 2.0;
    let mean_y = mean(y);

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for (i, &v) in y.iter().enumerate() {
        let dx = i as f64 - mean_x;
        sxx += dx * dx;
        sxy += dx * (v - mean_y);
    }

    let slope = if sxx != 0.0 { sxy / sxx } else { 0.0 };
    let intercept = mean_y - slope * mean_x;

    let mut ss_tot = 0.0;
    let mut ss_res = 0.0;
    for (i, &v) in y.iter().enumerate() {
        ss_tot += (v - mean_y).powi(2);
        ss_res += (v - (intercept + slope * i as f64)).powi(2);
    }
    let r2 = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 0.0 };

    LinearRegressionResult {
        slope,
        intercept,
        r2,
        slope_p: slope_p_value(slope, ss_res, sxx, n),
    }
}

fn slope_p_value(slope: f64, ss_res: f64, sxx: f64, n: usize) -> f64 {
    if n <= 2 || sxx == 0.0 {
        return 1.0;
    }
    let df = (n - 2) as f64;
    let se = (ss_res / df / sxx).sqrt();
    if se == 0.0 {
        return if slope == 0.0 { 1.0 } else { 0.0 };
    }
    t_dist_p_value(slope / se, df)
}

/// Descriptive stats for both conditions plus both two-sample tests
pub fn compare_conditions(et: &[f64], gs: &[f64]) -> ComparisonResult {
    ComparisonResult {
        et_stats: descriptive_stats(et),
        gs_stats: descriptive_stats(gs),
        t_test: welch_t_test(et, gs),
        mann_whitney: mann_whitney_u(et, gs),
    }
}
