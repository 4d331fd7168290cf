// Copyright (c) 2026 Hypermesh Foundation. All rights reserved.
// Licensed under the Business Source License 1.1.
// See the LICENSE file in the repository root for full license text.

//! Report types: sample statistics and the Monte Carlo summary.

use crate::harness::SimulationResult;
use serde::Serialize;
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Summary of a sample: mean, sample std-dev, 95% CI of the mean, extrema.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stats {
    pub mean: f64,
    pub std_dev: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
    pub min: f64,
    pub max: f64,
    pub n: usize,
}

impl Stats {
    const Z_95: f64 = 1.96;

    pub fn zero() -> Self {
        Self { mean: 0.0, std_dev: 0.0, ci_lower: 0.0, ci_upper: 0.0, min: 0.0, max: 0.0, n: 0 }
    }

    pub fn from_samples(samples: &[f64]) -> Self {
        let n = samples.len();
        if n == 0 {
            return Self::zero();
        }
        let mean = samples.iter().sum::<f64>() / n as f64;
        let variance = if n > 1 {
            samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64
        } else {
            0.0
        };
        let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
        let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Self::from_parts(n, mean, variance, min, max)
    }

    fn from_parts(n: usize, mean: f64, variance: f64, min: f64, max: f64) -> Self {
        let std_dev = variance.max(0.0).sqrt();
        let stderr = std_dev / (n as f64).sqrt();
        Self {
            mean,
            std_dev,
            ci_lower: mean - Self::Z_95 * stderr,
            ci_upper: mean + Self::Z_95 * stderr,
            min,
            max,
            n,
        }
    }

    /// Half-width of the confidence interval.
    pub fn ci_half_width(&self) -> f64 {
        (self.ci_upper - self.ci_lower) / 2.0
    }
}

// ---------------------------------------------------------------------------
// SampleMoments
// ---------------------------------------------------------------------------

/// Streaming count, sum, sum of squares and extrema of integer samples.
///
/// Sums are exact, so merging partitions in any order gives identical results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SampleMoments {
    count: u64,
    sum: i128,
    sum_sq: i128,
    min: i64,
    max: i64,
}

impl SampleMoments {
    pub fn push(&mut self, value: i64) {
        let v = i128::from(value);
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.count += 1;
        self.sum += v;
        self.sum_sq += v * v;
    }

    pub fn merge(&mut self, other: &SampleMoments) {
        if other.count == 0 {
            return;
        }
        if self.count == 0 {
            *self = *other;
            return;
        }
        self.count += other.count;
        self.sum += other.sum;
        self.sum_sq += other.sum_sq;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    pub fn stats(&self) -> Stats {
        if self.count == 0 {
            return Stats::zero();
        }
        let n = i128::from(self.count);
        let mean = self.sum as f64 / n as f64;
        // n * sum(x^2) - sum(x)^2 is exact in i128 and never negative.
        let variance = if n > 1 {
            (n * self.sum_sq - self.sum * self.sum) as f64 / (n * (n - 1)) as f64
        } else {
            0.0
        };
        Stats::from_parts(self.count as usize, mean, variance, self.min as f64, self.max as f64)
    }
}

// ---------------------------------------------------------------------------
// Monte Carlo report
// ---------------------------------------------------------------------------

/// One seeded run inside a Monte Carlo batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeededRun {
    pub seed: u64,
    pub result: SimulationResult,
}

/// Aggregate over independent seeded runs of the same configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonteCarloReport {
    pub runs: usize,
    pub transactions_per_run: u64,
    pub base_seed: u64,
    pub mean_reference_fee: Stats,
    pub mean_chosen_fee: Stats,
    pub reduction_pct: Stats,
    /// Selection counts summed over all runs.
    pub selection_counts: BTreeMap<String, u64>,
    /// Share of all simulated transactions per processor.
    pub selection_shares: BTreeMap<String, f64>,
    pub fallback_selections: u64,
    pub skipped: u64,
    pub individual_runs: Vec<SeededRun>,
}

impl MonteCarloReport {
    pub fn aggregate(transactions_per_run: u64, base_seed: u64, runs: Vec<SeededRun>) -> Self {
        let collect = |f: fn(&SimulationResult) -> f64| -> Stats {
            Stats::from_samples(&runs.iter().map(|r| f(&r.result)).collect::<Vec<_>>())
        };
        let mean_reference_fee = collect(|r| r.mean_reference_fee);
        let mean_chosen_fee = collect(|r| r.mean_chosen_fee);
        let reduction_pct = collect(|r| r.reduction_pct);

        let mut selection_counts: BTreeMap<String, u64> = BTreeMap::new();
        let mut simulated = 0u64;
        let mut fallback_selections = 0u64;
        let mut skipped = 0u64;
        for run in &runs {
            simulated += run.result.simulated;
            fallback_selections += run.result.fallback_selections;
            skipped += run.result.skipped;
            for (name, count) in &run.result.selection_counts {
                *selection_counts.entry(name.clone()).or_insert(0) += count;
            }
        }

        let selection_shares = selection_counts
            .iter()
            .map(|(name, &count)| {
                let share = if simulated > 0 { count as f64 / simulated as f64 } else { 0.0 };
                (name.clone(), share)
            })
            .collect();

        Self {
            runs: runs.len(),
            transactions_per_run,
            base_seed,
            mean_reference_fee,
            mean_chosen_fee,
            reduction_pct,
            selection_counts,
            selection_shares,
            fallback_selections,
            skipped,
            individual_runs: runs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_of_empty_sample_are_zero() {
        assert_eq!(Stats::from_samples(&[]), Stats::zero());
    }

    #[test]
    fn stats_of_single_sample_have_no_spread() {
        let s = Stats::from_samples(&[4.0]);
        assert_eq!(s.mean, 4.0);
        assert_eq!(s.std_dev, 0.0);
        assert_eq!(s.ci_lower, 4.0);
        assert_eq!(s.ci_upper, 4.0);
        assert_eq!((s.min, s.max, s.n), (4.0, 4.0, 1));
    }

    #[test]
    fn stats_use_sample_variance() {
        let s = Stats::from_samples(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!((s.mean - 5.0).abs() < 1e-12);
        // sum of squared deviations = 32, n - 1 = 7
        assert!((s.std_dev - (32.0_f64 / 7.0).sqrt()).abs() < 1e-12);
        assert!(s.ci_lower < s.mean && s.mean < s.ci_upper);
        assert!((s.ci_half_width() - 1.96 * s.std_dev / 8.0_f64.sqrt()).abs() < 1e-12);
        assert_eq!((s.min, s.max), (2.0, 9.0));
    }

    fn moments_of(values: &[i64]) -> SampleMoments {
        let mut m = SampleMoments::default();
        for &v in values {
            m.push(v);
        }
        m
    }

    #[test]
    fn moments_agree_with_sample_stats() {
        let values = [2, 4, 4, 4, 5, 5, 7, 9];
        let from_moments = moments_of(&values).stats();
        let samples: Vec<f64> = values.iter().map(|&v| v as f64).collect();
        let from_samples = Stats::from_samples(&samples);

        assert_eq!(from_moments.n, 8);
        assert_eq!(from_moments.mean, from_samples.mean);
        assert!((from_moments.std_dev - from_samples.std_dev).abs() < 1e-12);
        assert_eq!((from_moments.min, from_moments.max), (2.0, 9.0));
    }

    #[test]
    fn moments_merge_is_order_independent() {
        let left = moments_of(&[-7, 12, 3]);
        let right = moments_of(&[40, 0, 5, 5, 19]);

        let mut lr = left;
        lr.merge(&right);
        let mut rl = right;
        rl.merge(&left);

        assert_eq!(lr, rl);
        assert_eq!(lr, moments_of(&[-7, 12, 3, 40, 0, 5, 5, 19]));
        assert_eq!(lr.stats(), rl.stats());
        assert_eq!((lr.stats().min, lr.stats().max), (-7.0, 40.0));
    }

    #[test]
    fn empty_moments_merge_as_identity() {
        let values = moments_of(&[-3, -1]);
        let mut empty = SampleMoments::default();
        empty.merge(&values);
        assert_eq!(empty, values);

        let mut merged = values;
        merged.merge(&SampleMoments::default());
        assert_eq!(merged, values);
        assert_eq!(SampleMoments::default().stats(), Stats::zero());
        // negative extrema survive the first push
        assert_eq!(values.stats().max, -1.0);
    }
}
