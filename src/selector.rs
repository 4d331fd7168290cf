// Copyright (c) 2026 Hypermesh Foundation. All rights reserved.
// Licensed under the Business Source License 1.1.
// See the LICENSE file in the repository root for full license text.

//! Processor selection.
//!
//! Picks the most favorable processor for one transaction from observable
//! configuration only: fee versus the reference processor, settlement speed
//! weighted by merchant sensitivity, reliability, and categorical bonuses.
//!
//! Candidates are filtered by payment method, then gated on success rate.
//! Among gated candidates the strictly highest score wins and ties go to the
//! candidate listed first in configuration. If the gate removes everyone, the
//! most reliable eligible candidate is chosen instead (same tie rule).

use crate::config::{ConfigError, ScoringWeights};
use crate::fees::{fee_cents, FeeError};
use crate::processor::{Processor, ProcessorSet};
use crate::transaction::{Cents, PaymentMethod, Transaction};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from processor selection.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RoutingError {
    #[error("no configured processor supports {0} payments")]
    NoEligibleProcessor(PaymentMethod),
    #[error("merchant sensitivity {0} is outside [0, 1]")]
    InvalidSensitivity(f64),
    #[error(transparent)]
    Fee(#[from] FeeError),
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// How the winning processor was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPath {
    /// Highest composite score among candidates passing the reliability gate.
    Scored,
    /// Gate removed every candidate; most reliable eligible processor chosen.
    ReliabilityFallback,
}

/// Score breakdown for one eligible candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    pub processor: String,
    /// Position in the processor configuration.
    pub index: usize,
    pub fee: Cents,
    pub reference_fee: Cents,
    /// `(reference_fee - fee) / reference_fee`; negative when dearer.
    pub saving_pct: Decimal,
    pub settlement_score: Decimal,
    pub success_rate: Decimal,
    pub bonus: Decimal,
    pub score: Decimal,
    /// Whether the candidate passed the reliability gate.
    pub passes_gate: bool,
}

/// Outcome of selecting a processor for one transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub processor: String,
    pub index: usize,
    pub fee: Cents,
    pub reference_fee: Cents,
    pub path: SelectionPath,
    pub breakdown: CandidateScore,
}

// ---------------------------------------------------------------------------
// ProcessorRouter
// ---------------------------------------------------------------------------

/// Deterministic processor selector over an injected processor set.
#[derive(Debug, Clone)]
pub struct ProcessorRouter {
    processors: ProcessorSet,
    weights: ScoringWeights,
}

impl ProcessorRouter {
    pub fn new(processors: ProcessorSet, weights: ScoringWeights) -> Result<Self, ConfigError> {
        weights.validate()?;
        Ok(Self { processors, weights })
    }

    pub fn processors(&self) -> &ProcessorSet {
        &self.processors
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Fee the reference processor would charge for `amount`.
    pub fn reference_fee(&self, amount: Cents) -> Result<Cents, FeeError> {
        fee_cents(self.processors.reference(), amount)
    }

    /// Select the best processor for the given transaction parameters.
    pub fn select(
        &self,
        amount: Cents,
        method: PaymentMethod,
        merchant_sensitivity: f64,
    ) -> Result<&Processor, RoutingError> {
        let selection = self.select_detailed(amount, method, merchant_sensitivity)?;
        Ok(&self.processors.as_slice()[selection.index])
    }

    pub fn select_for(&self, tx: &Transaction) -> Result<Selection, RoutingError> {
        self.select_detailed(tx.amount_cents, tx.method, tx.merchant_sensitivity)
    }

    /// Select and return the full [`Selection`], including its score breakdown.
    pub fn select_detailed(
        &self,
        amount: Cents,
        method: PaymentMethod,
        merchant_sensitivity: f64,
    ) -> Result<Selection, RoutingError> {
        let candidates = self.score_candidates(amount, method, merchant_sensitivity)?;
        if candidates.is_empty() {
            return Err(RoutingError::NoEligibleProcessor(method));
        }

        let (winner, path) = match best_by_score(&candidates) {
            Some(best) => (best, SelectionPath::Scored),
            None => {
                let fallback = most_reliable(&candidates);
                debug!(
                    %method,
                    %amount,
                    processor = %fallback.processor,
                    "reliability gate excluded every candidate, using most reliable"
                );
                (fallback, SelectionPath::ReliabilityFallback)
            }
        };

        Ok(Selection {
            processor: winner.processor.clone(),
            index: winner.index,
            fee: winner.fee,
            reference_fee: winner.reference_fee,
            path,
            breakdown: winner.clone(),
        })
    }

    /// Score every processor eligible for `method`, in configuration order.
    ///
    /// Candidates failing the reliability gate are included with
    /// `passes_gate == false` so callers can explain a decision.
    pub fn score_candidates(
        &self,
        amount: Cents,
        method: PaymentMethod,
        merchant_sensitivity: f64,
    ) -> Result<Vec<CandidateScore>, RoutingError> {
        let sensitivity = Sensitivity::new(merchant_sensitivity)?;
        let reference_fee = self.reference_fee(amount)?;

        self.processors
            .eligible(method)
            .map(|(index, p)| -> Result<CandidateScore, RoutingError> {
                let fee = fee_cents(p, amount)?;
                Ok(self.score_one(index, p, fee, reference_fee, sensitivity))
            })
            .collect()
    }

    fn score_one(
        &self,
        index: usize,
        p: &Processor,
        fee: Cents,
        reference_fee: Cents,
        sensitivity: Sensitivity,
    ) -> CandidateScore {
        let w = &self.weights;

        let saving_pct = if reference_fee.0 > 0 {
            (reference_fee - fee).to_decimal() / reference_fee.to_decimal()
        } else {
            Decimal::ZERO
        };

        let days = Decimal::from(p.settlement_time_days);
        let settlement_score =
            (Decimal::ONE - days * sensitivity.value / w.settlement_horizon_days).clamp(Decimal::ZERO, Decimal::ONE);

        let mut bonus = Decimal::ZERO;
        if saving_pct >= w.saving_bonus_threshold {
            bonus += w.saving_bonus;
        }
        if p.instant_payout {
            bonus += w.instant_payout_bonus;
        }
        if sensitivity.exact > w.high_sensitivity_threshold && p.settlement_time_days > w.slow_settlement_days {
            bonus -= w.slow_settlement_penalty;
        }

        let score = w.saving_weight * saving_pct.max(Decimal::ZERO)
            + w.settlement_weight * settlement_score
            + w.reliability_weight * p.success_rate
            + bonus;

        CandidateScore {
            processor: p.name.clone(),
            index,
            fee,
            reference_fee,
            saving_pct,
            settlement_score,
            success_rate: p.success_rate,
            bonus,
            score,
            passes_gate: p.success_rate >= w.min_success_rate,
        }
    }
}

/// Highest score among gated candidates; first in order wins ties.
fn best_by_score(candidates: &[CandidateScore]) -> Option<&CandidateScore> {
    let mut best: Option<&CandidateScore> = None;
    for c in candidates.iter().filter(|c| c.passes_gate) {
        if best.map_or(true, |b| c.score > b.score) {
            best = Some(c);
        }
    }
    best
}

/// Highest success rate among all candidates; first in order wins ties.
/// `candidates` must be non-empty.
fn most_reliable(candidates: &[CandidateScore]) -> &CandidateScore {
    let mut best = &candidates[0];
    for c in &candidates[1..] {
        if c.success_rate > best.success_rate {
            best = c;
        }
    }
    best
}

/// Merchant sensitivity in the two decimal forms the score needs.
#[derive(Debug, Clone, Copy)]
struct Sensitivity {
    /// Shortest decimal that reads back as the same `f64`; feeds the
    /// settlement term.
    value: Decimal,
    /// Exact binary value, compared against the high-sensitivity threshold.
    exact: Decimal,
}

impl Sensitivity {
    fn new(raw: f64) -> Result<Self, RoutingError> {
        if !(0.0..=1.0).contains(&raw) {
            return Err(RoutingError::InvalidSensitivity(raw));
        }
        let value = Decimal::from_f64(raw).ok_or(RoutingError::InvalidSensitivity(raw))?;
        let exact = Decimal::from_f64_retain(raw).unwrap_or(value);
        Ok(Self { value, exact })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
