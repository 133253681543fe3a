// Distance metrics between a learned template and a live bucket-stats
// vector. `L1Mean` is the metric the recognizer is wired to by default;
// the others are ported from the same source function but left as
// library-only alternatives (no CLI switch selects them).
//
// Ported from `Distance()` in the original AudioId source, where these were
// four `#if 0`/`#elif 1`-gated branches of the same function.

use crate::stats::RunningStats;

pub trait DistanceMetric {
    /// Distance between `template` (a label's learned stats) and `input`
    /// (the live bucket stats), both of length `countBuckets`. Smaller is
    /// closer; never negative.
    fn distance(&self, template: &[RunningStats], input: &[RunningStats]) -> f64;
}

/// Mean absolute difference of per-bucket means. The original source's
/// active (`#elif 1`) branch, and the default wired into the recognizer.
pub struct L1Mean;

impl DistanceMetric for L1Mean {
    fn distance(&self, template: &[RunningStats], input: &[RunningStats]) -> f64 {
        let total: f64 = template
            .iter()
            .zip(input.iter())
            .map(|(a, b)| (b.mean() - a.mean()).abs())
            .sum();
        total / template.len() as f64
    }
}

/// `1 - cosine_similarity` of the per-bucket mean vectors.
pub struct Cosine;

impl DistanceMetric for Cosine {
    fn distance(&self, template: &[RunningStats], input: &[RunningStats]) -> f64 {
        let mut sum_ab = 0.0;
        let mut sum_aa = 0.0;
        let mut sum_bb = 0.0;
        for (a, b) in template.iter().zip(input.iter()) {
            let (a, b) = (a.mean(), b.mean());
            sum_ab += a * b;
            sum_aa += a * a;
            sum_bb += b * b;
        }
        let divisor = sum_aa.sqrt() * sum_bb.sqrt();
        let cosine_similarity = if divisor < 0.00001 { 0.0 } else { sum_ab / divisor };
        1.0 - cosine_similarity
    }
}

/// Mean absolute difference of per-bucket mean vectors, each normalized to
/// unit L2 norm first.
pub struct NormalizedL2;

impl DistanceMetric for NormalizedL2 {
    fn distance(&self, template: &[RunningStats], input: &[RunningStats]) -> f64 {
        let sum_aa: f64 = template.iter().map(|s| s.mean().powi(2)).sum();
        let sum_bb: f64 = input.iter().map(|s| s.mean().powi(2)).sum();
        let norm_a = sum_aa.sqrt().max(0.001);
        let norm_b = sum_bb.sqrt().max(0.001);

        let total: f64 = template
            .iter()
            .zip(input.iter())
            .map(|(a, b)| {
                let a = a.mean() / norm_a;
                let b = b.mean() / norm_b;
                (b - a).abs()
            })
            .sum();
        total / template.len() as f64
    }
}

/// Sum of absolute z-scores of the mean difference against the pooled
/// standard error of each side.
pub struct ZScore;

impl DistanceMetric for ZScore {
    fn distance(&self, template: &[RunningStats], input: &[RunningStats]) -> f64 {
        template
            .iter()
            .zip(input.iter())
            .map(|(a, b)| {
                let sigma_a = if a.count() > 0 {
                    a.stddev() / (a.count() as f64).sqrt()
                } else {
                    0.0
                };
                let sigma_b = if b.count() > 0 {
                    b.stddev() / (b.count() as f64).sqrt()
                } else {
                    0.0
                };
                let divisor = (sigma_a * sigma_a + sigma_b * sigma_b).sqrt();
                let divisor = if divisor > 0.0 { divisor } else { 1.0 };
                ((a.mean() - b.mean()) / divisor).abs()
            })
            .sum()
    }
}
