// Copyright (c) 2026 Hypermesh Foundation. All rights reserved.
// Licensed under the Business Source License 1.1.
// See the LICENSE file in the repository root for full license text.

//! Simulation harness.
//!
//! Draws a synthetic transaction population from an injected RNG, routes each
//! transaction, prices it at both the chosen and the reference processor, and
//! folds the outcome into a [`SimulationAccumulator`]. Accumulators merge by
//! summation, so a run split into partitions reduces to the same result.

use crate::config::{ConfigError, EngineConfig, NoEligiblePolicy, SimulationConfig};
use crate::report::{SampleMoments, Stats};
use crate::selector::{ProcessorRouter, RoutingError, Selection, SelectionPath};
use crate::transaction::{Cents, PaymentMethod, Transaction};
use rand::distributions::{Distribution, WeightedIndex};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that abort a simulation run.
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("transaction #{index} ({transaction:?}): {source}")]
    Routing {
        index: u64,
        transaction: Transaction,
        #[source]
        source: RoutingError,
    },
}

// ---------------------------------------------------------------------------
// TransactionGenerator
// ---------------------------------------------------------------------------

/// Seedable source of synthetic transactions.
///
/// Amount is uniform over the configured set, method follows the configured
/// weights, sensitivity is uniform over [0, 1].
pub struct TransactionGenerator<R: Rng> {
    rng: R,
    amounts: Vec<Cents>,
    methods: WeightedIndex<f64>,
}

impl<R: Rng> TransactionGenerator<R> {
    pub fn new(rng: R, config: &SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let weights = PaymentMethod::ALL.map(|m| config.method_weights.weight_for(m));
        let methods = WeightedIndex::new(weights)
            .map_err(|e| ConfigError::InvalidMethodWeights(e.to_string()))?;
        Ok(Self {
            rng,
            amounts: config.amounts_cents.clone(),
            methods,
        })
    }

    pub fn next_transaction(&mut self) -> Transaction {
        let amount = self.amounts[self.rng.gen_range(0..self.amounts.len())];
        let method = PaymentMethod::ALL[self.methods.sample(&mut self.rng)];
        let merchant_sensitivity = self.rng.gen_range(0.0..=1.0);
        Transaction::new(amount, method, merchant_sensitivity)
    }
}

impl<R: Rng> Iterator for TransactionGenerator<R> {
    type Item = Transaction;

    fn next(&mut self) -> Option<Transaction> {
        Some(self.next_transaction())
    }
}

// ---------------------------------------------------------------------------
// Accumulation
// ---------------------------------------------------------------------------

/// Running sums and counts for a (partial) simulation run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulationAccumulator {
    pub simulated: u64,
    pub skipped: u64,
    pub fallback_selections: u64,
    reference_total: i128,
    chosen_total: i128,
    selection_counts: BTreeMap<String, u64>,
    /// Per-transaction `reference_fee - chosen_fee`, in cents.
    savings: SampleMoments,
}

impl SimulationAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, selection: &Selection) {
        self.simulated += 1;
        self.reference_total += i128::from(selection.reference_fee.0);
        self.chosen_total += i128::from(selection.fee.0);
        *self.selection_counts.entry(selection.processor.clone()).or_insert(0) += 1;
        if selection.path == SelectionPath::ReliabilityFallback {
            self.fallback_selections += 1;
        }
        self.savings.push((selection.reference_fee - selection.fee).0);
    }

    pub fn record_skip(&mut self) {
        self.skipped += 1;
    }

    /// Fold another partition into this one.
    pub fn merge(&mut self, other: SimulationAccumulator) {
        self.simulated += other.simulated;
        self.skipped += other.skipped;
        self.fallback_selections += other.fallback_selections;
        self.reference_total += other.reference_total;
        self.chosen_total += other.chosen_total;
        for (name, count) in other.selection_counts {
            *self.selection_counts.entry(name).or_insert(0) += count;
        }
        self.savings.merge(&other.savings);
    }

    /// Finalize into a result. Empty accumulators produce an all-zero result.
    pub fn finish(self) -> SimulationResult {
        let (mean_reference_fee, mean_chosen_fee) = if self.simulated > 0 {
            let n = self.simulated as f64;
            (self.reference_total as f64 / n, self.chosen_total as f64 / n)
        } else {
            (0.0, 0.0)
        };

        SimulationResult {
            requested: self.simulated + self.skipped,
            simulated: self.simulated,
            skipped: self.skipped,
            mean_reference_fee,
            mean_chosen_fee,
            reduction_pct: reduction_pct(mean_reference_fee, mean_chosen_fee),
            selection_counts: self.selection_counts,
            fallback_selections: self.fallback_selections,
            saving_per_transaction: self.savings.stats(),
        }
    }
}

/// `(reference - chosen) / reference * 100`, or 0 when the reference mean is 0.
pub fn reduction_pct(mean_reference: f64, mean_chosen: f64) -> f64 {
    if mean_reference > 0.0 {
        (mean_reference - mean_chosen) / mean_reference * 100.0
    } else {
        0.0
    }
}

/// Aggregate outcome of one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationResult {
    pub requested: u64,
    pub simulated: u64,
    pub skipped: u64,
    /// Mean fee at the reference processor, in cents.
    pub mean_reference_fee: f64,
    /// Mean fee at the selected processor, in cents.
    pub mean_chosen_fee: f64,
    /// Relative reduction of the mean fee, in percent.
    pub reduction_pct: f64,
    pub selection_counts: BTreeMap<String, u64>,
    pub fallback_selections: u64,
    pub saving_per_transaction: Stats,
}

impl SimulationResult {
    pub fn total_selections(&self) -> u64 {
        self.selection_counts.values().sum()
    }
}

// ---------------------------------------------------------------------------
// Simulator
// ---------------------------------------------------------------------------

/// Runs synthetic transaction populations through a [`ProcessorRouter`].
#[derive(Debug, Clone)]
pub struct Simulator {
    router: ProcessorRouter,
    config: SimulationConfig,
}

impl Simulator {
    pub fn new(router: ProcessorRouter, config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { router, config })
    }

    pub fn from_config(config: EngineConfig) -> Result<Self, ConfigError> {
        let router = ProcessorRouter::new(config.processors, config.scoring)?;
        Self::new(router, config.simulation)
    }

    pub fn router(&self) -> &ProcessorRouter {
        &self.router
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Simulate `n` transactions drawn from `rng`.
    pub fn run<R: Rng>(&self, n: u64, rng: R) -> Result<SimulationResult, SimulationError> {
        Ok(self.accumulate(n, rng)?.finish())
    }

    /// [`run`](Self::run) with a `ChaCha8Rng` seeded from `seed`.
    pub fn run_seeded(&self, n: u64, seed: u64) -> Result<SimulationResult, SimulationError> {
        self.run(n, ChaCha8Rng::seed_from_u64(seed))
    }

    /// Simulate `n` transactions into a fresh accumulator without finalizing,
    /// for partitioned runs that are merged afterwards.
    pub fn accumulate<R: Rng>(&self, n: u64, rng: R) -> Result<SimulationAccumulator, SimulationError> {
        let generator = TransactionGenerator::new(rng, &self.config)?;
        debug!(
            transactions = n,
            processors = self.router.processors().len(),
            reference = %self.router.processors().reference().name,
            "starting simulation"
        );
        let mut acc = SimulationAccumulator::new();
        for tx in generator.take(n as usize) {
            self.step(&tx, &mut acc)?;
        }
        Ok(acc)
    }

    /// Simulate an explicit transaction sequence.
    pub fn run_transactions<I>(&self, transactions: I) -> Result<SimulationResult, SimulationError>
    where
        I: IntoIterator<Item = Transaction>,
    {
        let mut acc = SimulationAccumulator::new();
        for tx in transactions {
            self.step(&tx, &mut acc)?;
        }
        Ok(acc.finish())
    }

    fn step(&self, tx: &Transaction, acc: &mut SimulationAccumulator) -> Result<(), SimulationError> {
        let index = acc.simulated + acc.skipped;
        match self.router.select_for(tx) {
            Ok(selection) => {
                acc.record(&selection);
                Ok(())
            }
            Err(RoutingError::NoEligibleProcessor(method))
                if self.config.on_no_eligible == NoEligiblePolicy::Skip =>
            {
                warn!(index, %method, "no eligible processor, skipping transaction");
                acc.record_skip();
                Ok(())
            }
            Err(source) => Err(SimulationError::Routing {
                index,
                transaction: *tx,
                source,
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MethodWeights;

    fn baseline() -> Simulator {
        Simulator::from_config(EngineConfig::baseline()).expect("test: baseline is valid")
    }

    #[test]
    fn zero_transactions_yield_zero_result() {
        let result = baseline().run_seeded(0, 7).expect("test: empty run succeeds");
        assert_eq!(result.simulated, 0);
        assert_eq!(result.mean_reference_fee, 0.0);
        assert_eq!(result.mean_chosen_fee, 0.0);
        assert_eq!(result.reduction_pct, 0.0);
        assert!(result.selection_counts.is_empty());
        assert_eq!(result.saving_per_transaction.n, 0);
    }

    #[test]
    fn single_transaction_means_equal_its_fees() {
        let sim = baseline();
        let result = sim.run_seeded(1, 11).expect("test: single run succeeds");
        assert_eq!(result.total_selections(), 1);

        // Replay the same draw and price it directly.
        let mut generator = TransactionGenerator::new(ChaCha8Rng::seed_from_u64(11), sim.config())
            .expect("test: valid config");
        let tx = generator.next_transaction();
        let selection = sim.router().select_for(&tx).expect("test: card is routable");
        assert_eq!(result.mean_reference_fee, selection.reference_fee.0 as f64);
        assert_eq!(result.mean_chosen_fee, selection.fee.0 as f64);
        assert_eq!(result.selection_counts.get(&selection.processor), Some(&1));
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let sim = baseline();
        let a = sim.run_seeded(500, 42).expect("test: run succeeds");
        let b = sim.run_seeded(500, 42).expect("test: run succeeds");
        assert_eq!(a, b);
    }

    #[test]
    fn generator_respects_configuration() {
        let config = SimulationConfig {
            amounts_cents: vec![Cents(700), Cents(900)],
            method_weights: MethodWeights { card: 0.0, ach: 1.0 },
            ..Default::default()
        };
        let generator = TransactionGenerator::new(ChaCha8Rng::seed_from_u64(3), &config)
            .expect("test: valid config");
        for tx in generator.take(200) {
            assert!(tx.amount_cents == Cents(700) || tx.amount_cents == Cents(900));
            assert_eq!(tx.method, PaymentMethod::Ach);
            assert!((0.0..=1.0).contains(&tx.merchant_sensitivity));
        }
    }

    #[test]
    fn merged_partitions_equal_sequential_run() {
        let sim = baseline();
        let transactions: Vec<Transaction> =
            TransactionGenerator::new(ChaCha8Rng::seed_from_u64(9), sim.config())
                .expect("test: valid config")
                .take(300)
                .collect();

        let sequential = sim
            .run_transactions(transactions.iter().copied())
            .expect("test: run succeeds");

        let mut left = SimulationAccumulator::new();
        let mut right = SimulationAccumulator::new();
        for tx in &transactions[..120] {
            sim.step(tx, &mut left).expect("test: routable");
        }
        for tx in &transactions[120..] {
            sim.step(tx, &mut right).expect("test: routable");
        }

        let mut left_then_right = left.clone();
        left_then_right.merge(right.clone());
        let mut right_then_left = right;
        right_then_left.merge(left);

        assert_eq!(left_then_right, right_then_left);
        assert_eq!(left_then_right.finish(), sequential);
        assert_eq!(right_then_left.finish(), sequential);
    }

    #[test]
    fn reduction_guard_for_zero_reference() {
        assert_eq!(reduction_pct(0.0, 0.0), 0.0);
        assert_eq!(reduction_pct(0.0, 12.0), 0.0);
        assert!((reduction_pct(100.0, 80.0) - 20.0).abs() < 1e-12);
    }
}
