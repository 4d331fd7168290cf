// Copyright (c) 2026 Hypermesh Foundation. All rights reserved.
// Licensed under the Business Source License 1.1.
// See the LICENSE file in the repository root for full license text.

//! Monte Carlo replication: N independent runs with seeds
//! `base_seed..base_seed + N`, aggregated into mean ± 95% CI.

use crate::harness::{SimulationError, Simulator};
use crate::report::{MonteCarloReport, SeededRun};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Shape of a Monte Carlo batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonteCarloParams {
    pub runs: usize,
    pub transactions: u64,
    pub base_seed: u64,
}

impl Default for MonteCarloParams {
    fn default() -> Self {
        Self { runs: 30, transactions: 5000, base_seed: 0 }
    }
}

/// Run one seeded simulation.
pub fn run_single(sim: &Simulator, transactions: u64, seed: u64) -> Result<SeededRun, SimulationError> {
    let result = sim.run_seeded(transactions, seed)?;
    Ok(SeededRun { seed, result })
}

/// Run the batch and aggregate. Any aborted run aborts the batch.
pub fn run_monte_carlo(sim: &Simulator, params: MonteCarloParams) -> Result<MonteCarloReport, SimulationError> {
    let mut runs = Vec::with_capacity(params.runs);
    for i in 0..params.runs {
        let seed = params.base_seed.wrapping_add(i as u64);
        runs.push(run_single(sim, params.transactions, seed)?);
    }

    let report = MonteCarloReport::aggregate(params.transactions, params.base_seed, runs);
    info!(
        runs = report.runs,
        transactions = params.transactions,
        reduction_pct = report.reduction_pct.mean,
        "monte carlo batch complete"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;

    fn baseline() -> Simulator {
        Simulator::from_config(EngineConfig::baseline()).expect("test: baseline is valid")
    }

    #[test]
    fn batch_uses_consecutive_seeds() {
        let sim = baseline();
        let report = run_monte_carlo(&sim, MonteCarloParams { runs: 4, transactions: 50, base_seed: 100 })
            .expect("test: batch succeeds");
        let seeds: Vec<u64> = report.individual_runs.iter().map(|r| r.seed).collect();
        assert_eq!(seeds, vec![100, 101, 102, 103]);
        assert_eq!(report.runs, 4);

        let single = run_single(&sim, 50, 102).expect("test: run succeeds");
        assert_eq!(report.individual_runs[2], single);
    }

    #[test]
    fn batch_totals_and_shares_are_consistent() {
        let report = run_monte_carlo(&baseline(), MonteCarloParams { runs: 3, transactions: 200, base_seed: 0 })
            .expect("test: batch succeeds");
        let total: u64 = report.selection_counts.values().sum();
        assert_eq!(total, 600);
        let share_sum: f64 = report.selection_shares.values().sum();
        assert!((share_sum - 1.0).abs() < 1e-9);
        assert_eq!(report.reduction_pct.n, 3);
    }

    #[test]
    fn empty_batch_is_zeroed() {
        let report = run_monte_carlo(&baseline(), MonteCarloParams { runs: 0, transactions: 100, base_seed: 0 })
            .expect("test: empty batch succeeds");
        assert_eq!(report.runs, 0);
        assert_eq!(report.reduction_pct.n, 0);
        assert!(report.selection_counts.is_empty());
    }
}
