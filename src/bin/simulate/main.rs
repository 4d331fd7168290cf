// Copyright (c) 2026 Hypermesh Foundation. All rights reserved.
// Licensed under the Business Source License 1.1.
// See the LICENSE file in the repository root for full license text.

// Routing policy evaluator — seeded Monte Carlo over synthetic transactions
//
// Usage:
//   cargo run --release --bin simulate                          # baseline market, 1 run x 5000 tx
//   cargo run --release --bin simulate -- --runs 30 --seed 42   # 30 seeded runs, mean ± 95% CI
//   cargo run --release --bin simulate -- --config config/processors.json --output out/report.json
//   cargo run --release --bin simulate -- explain --amount 2500 --method card --sensitivity 0.1

mod output;

use clap::{Args, Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use payroute_engine::{
    run_monte_carlo, Cents, EngineConfig, MonteCarloParams, NoEligiblePolicy, PaymentMethod,
    Simulator,
};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

// ─── CLI ────────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(author, version, about = "Evaluate the processor routing policy over simulated transactions")]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    /// Engine configuration (JSON). Defaults to the built-in baseline market.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    run: RunArgs,
}

#[derive(Subcommand)]
enum Command {
    /// Score every eligible processor for a single transaction
    Explain {
        /// Amount in minor units
        #[arg(long)]
        amount: i64,
        /// Payment method: card or ach
        #[arg(long)]
        method: PaymentMethod,
        /// Merchant settlement sensitivity in [0, 1]
        #[arg(long)]
        sensitivity: f64,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Transactions per run
    #[arg(short = 'n', long, default_value_t = 5000)]
    transactions: u64,

    /// Independent seeded runs
    #[arg(long, default_value_t = 1)]
    runs: usize,

    /// Base seed; run i uses seed + i
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Skip transactions no processor supports instead of aborting the run
    #[arg(long)]
    skip_ineligible: bool,

    /// Write the full JSON report to this path
    #[arg(long)]
    output: Option<PathBuf>,
}

// ─── Main ───────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => {
            info!(path = %path.display(), "loading configuration");
            EngineConfig::from_path(path).into_diagnostic()?
        }
        None => EngineConfig::baseline(),
    };

    match cli.command {
        Some(Command::Explain { amount, method, sensitivity }) => explain(config, Cents(amount), method, sensitivity),
        None => run(config, cli.run),
    }
}

fn run(mut config: EngineConfig, args: RunArgs) -> Result<()> {
    if args.skip_ineligible {
        config.simulation.on_no_eligible = NoEligiblePolicy::Skip;
    }
    let reference = config.processors.reference().name.clone();
    let simulator = Simulator::from_config(config).into_diagnostic()?;

    info!(
        processors = simulator.router().processors().len(),
        %reference,
        runs = args.runs,
        transactions = args.transactions,
        seed = args.seed,
        "PRNG: ChaCha8Rng"
    );

    let start = Instant::now();
    let params = MonteCarloParams {
        runs: args.runs,
        transactions: args.transactions,
        base_seed: args.seed,
    };
    let report = run_monte_carlo(&simulator, params).into_diagnostic()?;
    output::print_report(&report, &reference, start.elapsed());

    if let Some(path) = args.output {
        output::write_json(&report, &path).into_diagnostic()?;
        println!("  Results saved to: {}\n", path.display());
    }
    Ok(())
}

fn explain(config: EngineConfig, amount: Cents, method: PaymentMethod, sensitivity: f64) -> Result<()> {
    let simulator = Simulator::from_config(config).into_diagnostic()?;
    let router = simulator.router();
    let scores = router.score_candidates(amount, method, sensitivity).into_diagnostic()?;
    let selection = router.select_detailed(amount, method, sensitivity).into_diagnostic()?;
    output::print_explain(amount, method, sensitivity, &scores, &selection);
    Ok(())
}
