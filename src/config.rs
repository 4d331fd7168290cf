// Copyright (c) 2026 Hypermesh Foundation. All rights reserved.
// Licensed under the Business Source License 1.1.
// See the LICENSE file in the repository root for full license text.

//! Engine configuration: processor set, scoring weights and simulation
//! parameters, loaded from JSON and validated once before any run.

use crate::processor::{Processor, ProcessorSet};
use crate::transaction::{Cents, PaymentMethod};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Invalid configuration. Fatal at load time: no run proceeds.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("processor list is empty")]
    NoProcessors,
    #[error("processor with empty name")]
    EmptyProcessorName,
    #[error("duplicate processor name `{0}`")]
    DuplicateProcessor(String),
    #[error("no reference processor designated (set `reference_processor`)")]
    MissingReference,
    #[error("reference processor `{0}` is not in the processor list")]
    UnknownReference(String),
    #[error("processor `{processor}`: {field} = {value} is out of range, expected {expected}")]
    OutOfRange {
        processor: String,
        field: &'static str,
        value: String,
        expected: &'static str,
    },
    #[error("scoring.{field}: {reason}")]
    InvalidScoring { field: &'static str, reason: String },
    #[error("simulation amount set is empty")]
    NoAmounts,
    #[error("simulation amount {0} must be positive")]
    NonPositiveAmount(Cents),
    #[error("invalid method weights: {0}")]
    InvalidMethodWeights(String),
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// ScoringWeights
// ---------------------------------------------------------------------------

/// Weights and thresholds of the selector's composite score.
///
/// `score = saving_weight * max(0, saving_pct)
///        + settlement_weight * settlement_score
///        + reliability_weight * success_rate
///        + bonus`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub saving_weight: Decimal,
    pub settlement_weight: Decimal,
    pub reliability_weight: Decimal,
    /// Minimum relative saving that earns `saving_bonus`.
    pub saving_bonus_threshold: Decimal,
    pub saving_bonus: Decimal,
    pub instant_payout_bonus: Decimal,
    /// Subtracted when the merchant is highly sensitive and settlement is slow.
    pub slow_settlement_penalty: Decimal,
    /// Sensitivity strictly above this triggers the slow-settlement penalty.
    pub high_sensitivity_threshold: Decimal,
    /// Settlement strictly longer than this many days counts as slow.
    pub slow_settlement_days: u32,
    /// Days at which a fully sensitive merchant's settlement score reaches 0.
    pub settlement_horizon_days: Decimal,
    /// Reliability gate: candidates below this are excluded from scoring.
    pub min_success_rate: Decimal,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            saving_weight: dec!(10),
            settlement_weight: dec!(4),
            reliability_weight: dec!(6),
            saving_bonus_threshold: dec!(0.02),
            saving_bonus: dec!(1.5),
            instant_payout_bonus: dec!(1.0),
            slow_settlement_penalty: dec!(2.0),
            high_sensitivity_threshold: dec!(0.85),
            slow_settlement_days: 1,
            settlement_horizon_days: dec!(5),
            min_success_rate: dec!(0.90),
        }
    }
}

impl ScoringWeights {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.settlement_horizon_days <= Decimal::ZERO {
            return Err(ConfigError::InvalidScoring {
                field: "settlement_horizon_days",
                reason: "must be positive".to_string(),
            });
        }
        if self.min_success_rate < Decimal::ZERO || self.min_success_rate > Decimal::ONE {
            return Err(ConfigError::InvalidScoring {
                field: "min_success_rate",
                reason: format!("{} is outside [0, 1]", self.min_success_rate),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// SimulationConfig
// ---------------------------------------------------------------------------

/// What the harness does when no processor supports a drawn method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoEligiblePolicy {
    /// Surface the error and stop the run.
    #[default]
    Abort,
    /// Drop the transaction and count it as skipped.
    Skip,
}

/// Relative draw weights over payment methods.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MethodWeights {
    pub card: f64,
    pub ach: f64,
}

impl Default for MethodWeights {
    fn default() -> Self {
        Self { card: 1.0, ach: 0.0 }
    }
}

impl MethodWeights {
    pub fn weight_for(&self, method: PaymentMethod) -> f64 {
        match method {
            PaymentMethod::Card => self.card,
            PaymentMethod::Ach => self.ach,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for method in PaymentMethod::ALL {
            let w = self.weight_for(method);
            if !w.is_finite() || w < 0.0 {
                return Err(ConfigError::InvalidMethodWeights(format!(
                    "{method} weight {w} must be finite and non-negative"
                )));
            }
        }
        if self.card + self.ach <= 0.0 {
            return Err(ConfigError::InvalidMethodWeights(
                "weights sum to zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parameters of the synthetic transaction population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Representative amounts, drawn uniformly.
    pub amounts_cents: Vec<Cents>,
    pub method_weights: MethodWeights,
    pub on_no_eligible: NoEligiblePolicy,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            amounts_cents: vec![Cents(500), Cents(1200), Cents(2500), Cents(10000)],
            method_weights: MethodWeights::default(),
            on_no_eligible: NoEligiblePolicy::Abort,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.amounts_cents.is_empty() {
            return Err(ConfigError::NoAmounts);
        }
        if let Some(bad) = self.amounts_cents.iter().find(|a| a.0 <= 0) {
            return Err(ConfigError::NonPositiveAmount(*bad));
        }
        self.method_weights.validate()
    }
}

// ---------------------------------------------------------------------------
// EngineConfig
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawEngineConfig {
    reference_processor: Option<String>,
    processors: Vec<Processor>,
    #[serde(default)]
    scoring: ScoringWeights,
    #[serde(default)]
    simulation: SimulationConfig,
}

/// Fully validated engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub processors: ProcessorSet,
    pub scoring: ScoringWeights,
    pub simulation: SimulationConfig,
}

impl EngineConfig {
    pub fn new(
        processors: ProcessorSet,
        scoring: ScoringWeights,
        simulation: SimulationConfig,
    ) -> Result<Self, ConfigError> {
        scoring.validate()?;
        simulation.validate()?;
        Ok(Self { processors, scoring, simulation })
    }

    /// Parse and validate a JSON configuration document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let raw: RawEngineConfig = serde_json::from_str(json)?;
        let reference = raw.reference_processor.ok_or(ConfigError::MissingReference)?;
        let processors = ProcessorSet::new(raw.processors, &reference)?;
        Self::new(processors, raw.scoring, raw.simulation)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// The four-processor market the routing policy was tuned against,
    /// with Stripe as the reference.
    pub fn baseline() -> Self {
        let processors = ProcessorSet::new(baseline_processors(), "Stripe")
            .expect("baseline processor set is valid");
        Self {
            processors,
            scoring: ScoringWeights::default(),
            simulation: SimulationConfig::default(),
        }
    }
}

/// Stripe, LocalProcessorA, FastPayout and ACHProvider.
pub fn baseline_processors() -> Vec<Processor> {
    vec![
        Processor {
            name: "Stripe".to_string(),
            fee_percentage: dec!(0.029),
            fee_flat_cents: Cents(30),
            settlement_time_days: 2,
            success_rate: dec!(0.98),
            supports_card: true,
            supports_ach: true,
            instant_payout: false,
        },
        Processor {
            name: "LocalProcessorA".to_string(),
            fee_percentage: dec!(0.025),
            fee_flat_cents: Cents(25),
            settlement_time_days: 1,
            success_rate: dec!(0.965),
            supports_card: true,
            supports_ach: false,
            instant_payout: false,
        },
        Processor {
            name: "FastPayout".to_string(),
            fee_percentage: dec!(0.034),
            fee_flat_cents: Cents(10),
            settlement_time_days: 0,
            success_rate: dec!(0.96),
            supports_card: true,
            supports_ach: false,
            instant_payout: true,
        },
        Processor {
            name: "ACHProvider".to_string(),
            fee_percentage: dec!(0.008),
            fee_flat_cents: Cents(25),
            settlement_time_days: 3,
            success_rate: dec!(0.99),
            supports_card: false,
            supports_ach: true,
            instant_payout: false,
        },
    ]
}
