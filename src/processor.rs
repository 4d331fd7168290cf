// Copyright (c) 2026 Hypermesh Foundation. All rights reserved.
// Licensed under the Business Source License 1.1.
// See the LICENSE file in the repository root for full license text.

//! Processor definitions and the validated, read-only processor set.
//!
//! A [`ProcessorSet`] is built once from configuration and never mutated. It
//! keeps processors in configuration order (the tie-break order used by the
//! selector) and carries the index of the designated reference processor.

use crate::config::ConfigError;
use crate::transaction::{Cents, PaymentMethod};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// ---------------------------------------------------------------------------
// Processor
// ---------------------------------------------------------------------------

/// A payment processor as supplied by configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Processor {
    pub name: String,
    /// Fraction of the amount charged as fee, in [0, 1).
    pub fee_percentage: Decimal,
    /// Fixed per-transaction fee.
    pub fee_flat_cents: Cents,
    /// Days until funds are available.
    pub settlement_time_days: u32,
    /// Historical reliability, in [0, 1].
    pub success_rate: Decimal,
    #[serde(default)]
    pub supports_card: bool,
    #[serde(default)]
    pub supports_ach: bool,
    #[serde(default)]
    pub instant_payout: bool,
}

impl Processor {
    /// Whether this processor passes the eligibility filter for `method`.
    pub fn supports(&self, method: PaymentMethod) -> bool {
        match method {
            PaymentMethod::Card => self.supports_card,
            PaymentMethod::Ach => self.supports_ach,
        }
    }

    /// Check field ranges. Called for every processor at load time.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::EmptyProcessorName);
        }
        if self.fee_percentage < Decimal::ZERO || self.fee_percentage >= Decimal::ONE {
            return Err(self.out_of_range("fee_percentage", self.fee_percentage.to_string(), "[0, 1)"));
        }
        if self.fee_flat_cents.is_negative() {
            return Err(self.out_of_range("fee_flat_cents", self.fee_flat_cents.0.to_string(), ">= 0"));
        }
        if self.success_rate < Decimal::ZERO || self.success_rate > Decimal::ONE {
            return Err(self.out_of_range("success_rate", self.success_rate.to_string(), "[0, 1]"));
        }
        Ok(())
    }

    fn out_of_range(&self, field: &'static str, value: String, expected: &'static str) -> ConfigError {
        ConfigError::OutOfRange {
            processor: self.name.clone(),
            field,
            value,
            expected,
        }
    }
}

// ---------------------------------------------------------------------------
// ProcessorSet
// ---------------------------------------------------------------------------

/// Validated processor configuration with a designated reference processor.
#[derive(Debug, Clone)]
pub struct ProcessorSet {
    processors: Vec<Processor>,
    reference: usize,
}

#[allow(clippy::len_without_is_empty)]
impl ProcessorSet {
    /// Validate `processors` and resolve `reference_name` to the baseline.
    ///
    /// Fails on an empty list, duplicate names, out-of-range fields, or a
    /// reference name that is missing from the list.
    pub fn new(processors: Vec<Processor>, reference_name: &str) -> Result<Self, ConfigError> {
        if processors.is_empty() {
            return Err(ConfigError::NoProcessors);
        }

        let mut seen = HashSet::with_capacity(processors.len());
        for p in &processors {
            p.validate()?;
            if !seen.insert(p.name.as_str()) {
                return Err(ConfigError::DuplicateProcessor(p.name.clone()));
            }
        }

        let reference = processors
            .iter()
            .position(|p| p.name == reference_name)
            .ok_or_else(|| ConfigError::UnknownReference(reference_name.to_string()))?;

        Ok(Self { processors, reference })
    }

    /// The fee-savings baseline.
    pub fn reference(&self) -> &Processor {
        &self.processors[self.reference]
    }

    pub fn reference_index(&self) -> usize {
        self.reference
    }

    /// Processors in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = &Processor> {
        self.processors.iter()
    }

    pub fn as_slice(&self) -> &[Processor] {
        &self.processors
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    /// Processors passing the eligibility filter, with their configuration index.
    pub fn eligible(&self, method: PaymentMethod) -> impl Iterator<Item = (usize, &Processor)> {
        self.processors
            .iter()
            .enumerate()
            .filter(move |(_, p)| p.supports(method))
    }
}
