// Copyright (c) 2026 Hypermesh Foundation. All rights reserved.
// Licensed under the Business Source License 1.1.
// See the LICENSE file in the repository root for full license text.

// Console and JSON output for the simulate runner

use payroute_engine::{CandidateScore, Cents, MonteCarloReport, PaymentMethod, Selection, SelectionPath};
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

pub fn print_report(report: &MonteCarloReport, reference: &str, elapsed: Duration) {
    println!(
        "\n  Runs: {} | Transactions/run: {} | Base seed: {}",
        report.runs, report.transactions_per_run, report.base_seed
    );
    println!("  {}", "-".repeat(64));

    if report.runs == 1 {
        println!("  Avg {} fee (cents):        {:>10.2}", reference, report.mean_reference_fee.mean);
        println!("  Avg orchestrated fee (cents):  {:>10.2}", report.mean_chosen_fee.mean);
        println!(
            "  Average per-transaction fee reduction (relative %): {:.2}%",
            report.reduction_pct.mean
        );
    } else {
        println!(
            "  Avg {} fee (cents):        {:>10.2} ±{:.2}",
            reference,
            report.mean_reference_fee.mean,
            report.mean_reference_fee.ci_half_width()
        );
        println!(
            "  Avg orchestrated fee (cents):  {:>10.2} ±{:.2}",
            report.mean_chosen_fee.mean,
            report.mean_chosen_fee.ci_half_width()
        );
        println!(
            "  Fee reduction (relative %):    {:>10.2}% ±{:.2} (min {:.2}, max {:.2})",
            report.reduction_pct.mean,
            report.reduction_pct.ci_half_width(),
            report.reduction_pct.min,
            report.reduction_pct.max
        );
    }

    println!("\n  Choice distribution:");
    for (name, count) in &report.selection_counts {
        let share = report.selection_shares.get(name).copied().unwrap_or(0.0) * 100.0;
        println!("    {:<24} {:>8} {:>6.1}%", name, count, share);
    }
    if report.fallback_selections > 0 {
        println!("    (reliability fallback used {} times)", report.fallback_selections);
    }
    if report.skipped > 0 {
        println!("    (skipped {} transactions with no eligible processor)", report.skipped);
    }

    println!("  {}", "-".repeat(64));
    println!("  Time: {:.2}s\n", elapsed.as_secs_f64());
}

pub fn print_explain(
    amount: Cents,
    method: PaymentMethod,
    sensitivity: f64,
    scores: &[CandidateScore],
    selection: &Selection,
) {
    println!("\n  amount={} method={} sensitivity={:.3}", amount, method, sensitivity);
    println!(
        "  {:<20} {:>6} {:>8} {:>8} {:>7} {:>8}  gate",
        "Processor", "Fee", "Saving%", "Settle", "Bonus", "Score"
    );
    println!("  {}", "-".repeat(70));
    for c in scores {
        println!(
            "  {:<20} {:>6} {:>7.2}% {:>8.3} {:>7.2} {:>8.3}  {}",
            c.processor,
            c.fee.0,
            c.saving_pct * Decimal::ONE_HUNDRED,
            c.settlement_score,
            c.bonus,
            c.score,
            if c.passes_gate { "pass" } else { "FAIL" }
        );
    }
    let how = match selection.path {
        SelectionPath::Scored => "highest score",
        SelectionPath::ReliabilityFallback => "reliability fallback",
    };
    println!("\n  Selected: {} ({})\n", selection.processor, how);
}

/// Pretty-print `value` as JSON to `path`, creating parent directories.
pub fn write_json<T: Serialize>(value: &T, path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    let mut file = std::fs::File::create(path)?;
    writeln!(file, "{}", json)
}
