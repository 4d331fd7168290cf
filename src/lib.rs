// Copyright (c) 2026 Hypermesh Foundation. All rights reserved.
// Licensed under the Business Source License 1.1.
// See the LICENSE file in the repository root for full license text.

//! Payment processor routing engine.
//!
//! Scores a fixed set of processors for each transaction and evaluates the
//! routing policy over seeded Monte Carlo transaction populations.

pub mod config;
pub mod fees;
pub mod harness;
pub mod monte_carlo;
pub mod processor;
pub mod report;
pub mod selector;
pub mod transaction;

pub use config::{ConfigError, EngineConfig, NoEligiblePolicy, ScoringWeights, SimulationConfig};
pub use fees::{fee_cents, FeeError};
pub use harness::{SimulationAccumulator, SimulationError, SimulationResult, Simulator, TransactionGenerator};
pub use monte_carlo::{run_monte_carlo, MonteCarloParams};
pub use processor::{Processor, ProcessorSet};
pub use report::{MonteCarloReport, Stats};
pub use selector::{CandidateScore, ProcessorRouter, RoutingError, Selection, SelectionPath};
pub use transaction::{Cents, PaymentMethod, Transaction};

use serde::Serialize;
use wasm_bindgen::prelude::*;

// ─── WASM Interface ──────────────────────────────────────────────────────────

/// Browser handle over a validated configuration.
#[wasm_bindgen]
pub struct WasmRouter {
    simulator: Simulator,
}

#[wasm_bindgen]
impl WasmRouter {
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str) -> Result<WasmRouter, JsValue> {
        install_panic_hook();
        let config = EngineConfig::from_json_str(config_json).map_err(js_error)?;
        let simulator = Simulator::from_config(config).map_err(js_error)?;
        Ok(Self { simulator })
    }

    /// Router over the built-in four-processor market.
    pub fn baseline() -> Result<WasmRouter, JsValue> {
        install_panic_hook();
        let simulator = Simulator::from_config(EngineConfig::baseline()).map_err(js_error)?;
        Ok(Self { simulator })
    }

    pub fn select(&self, amount_cents: i64, method: &str, sensitivity: f64) -> Result<JsValue, JsValue> {
        let method: PaymentMethod = method.parse().map_err(js_error)?;
        let selection = self
            .simulator
            .router()
            .select_detailed(Cents(amount_cents), method, sensitivity)
            .map_err(js_error)?;
        Ok(to_js(&selection))
    }

    /// Per-candidate score breakdown, in configuration order.
    pub fn explain(&self, amount_cents: i64, method: &str, sensitivity: f64) -> Result<JsValue, JsValue> {
        let method: PaymentMethod = method.parse().map_err(js_error)?;
        let scores = self
            .simulator
            .router()
            .score_candidates(Cents(amount_cents), method, sensitivity)
            .map_err(js_error)?;
        Ok(to_js(&scores))
    }

    pub fn simulate(&self, transactions: u32, seed: u64) -> Result<JsValue, JsValue> {
        let result = self
            .simulator
            .run_seeded(u64::from(transactions), seed)
            .map_err(js_error)?;
        Ok(to_js(&result))
    }

    pub fn monte_carlo(&self, runs: u32, transactions: u32, seed: u64) -> Result<JsValue, JsValue> {
        let params = MonteCarloParams {
            runs: runs as usize,
            transactions: u64::from(transactions),
            base_seed: seed,
        };
        let report = run_monte_carlo(&self.simulator, params).map_err(js_error)?;
        Ok(to_js(&report))
    }
}

fn install_panic_hook() {
    #[cfg(target_arch = "wasm32")]
    std::panic::set_hook(Box::new(console_error_panic_hook::hook));
}

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn to_js<T: Serialize>(value: &T) -> JsValue {
    serde_wasm_bindgen::to_value(value).unwrap_or(JsValue::NULL)
}
