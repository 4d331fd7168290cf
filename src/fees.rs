// Copyright (c) 2026 Hypermesh Foundation. All rights reserved.
// Licensed under the Business Source License 1.1.
// See the LICENSE file in the repository root for full license text.

//! Fee calculation: `round(amount * fee_percentage + fee_flat_cents)`.
//!
//! Arithmetic is exact decimal; the single rounding step uses banker's
//! rounding (half-to-even), so `12.5c` becomes `12c` and `13.5c` becomes `14c`.

use crate::processor::Processor;
use crate::transaction::Cents;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Rounding applied to the raw fee.
pub const FEE_ROUNDING: RoundingStrategy = RoundingStrategy::MidpointNearestEven;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from fee calculation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeeError {
    #[error("invalid amount {0}: amounts must not be negative")]
    InvalidAmount(Cents),
    #[error("fee for {amount} at `{processor}` does not fit in minor units")]
    Overflow { processor: String, amount: Cents },
}

// ---------------------------------------------------------------------------
// Calculation
// ---------------------------------------------------------------------------

/// Unrounded fee in minor units.
pub fn raw_fee(processor: &Processor, amount: Cents) -> Result<Decimal, FeeError> {
    if amount.is_negative() {
        return Err(FeeError::InvalidAmount(amount));
    }
    amount
        .to_decimal()
        .checked_mul(processor.fee_percentage)
        .and_then(|pct| pct.checked_add(processor.fee_flat_cents.to_decimal()))
        .ok_or_else(|| FeeError::Overflow {
            processor: processor.name.clone(),
            amount,
        })
}

/// Fee owed to `processor` for `amount`, rounded half-to-even.
pub fn fee_cents(processor: &Processor, amount: Cents) -> Result<Cents, FeeError> {
    let raw = raw_fee(processor, amount)?;
    raw.round_dp_with_strategy(0, FEE_ROUNDING)
        .to_i64()
        .map(Cents)
        .ok_or_else(|| FeeError::Overflow {
            processor: processor.name.clone(),
            amount,
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
