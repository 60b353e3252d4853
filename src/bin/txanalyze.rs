use anyhow::Context;
use clap::Parser;
use std::{io, path::PathBuf};
use txn_analytics::{
    compute::{Analysis, TopK},
    read::load_dataset,
    report::publish,
};

/// Aggregate a transactions CSV: average per user, failure rate per merchant and
/// busiest merchants.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Transactions CSV to analyze
    #[arg(long, short, default_value = "transactions.csv")]
    input: PathBuf,

    /// Directory receiving the result CSVs
    #[arg(long, default_value = "analysis_results")]
    output_dir: PathBuf,

    /// Users shown in the average-transaction report
    #[arg(long, default_value_t = 10)]
    top_users: usize,

    /// Merchants shown in the failure-rate report
    #[arg(long, default_value_t = 10)]
    top_failure: usize,

    /// Merchants kept in the transaction-count view
    #[arg(long, default_value_t = 5)]
    top_merchants: usize,
}

fn main() -> Result<(), anyhow::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    log::info!("Reading transaction data from {}", args.input.display());
    let dataset = load_dataset(&args.input)
        .with_context(|| format!("cannot analyze {}", args.input.display()))?;

    let top = TopK {
        users: args.top_users,
        failure_rates: args.top_failure,
        merchants: args.top_merchants,
    };
    let analysis = Analysis::run(&dataset, top)
        .with_context(|| format!("cannot analyze {}", args.input.display()))?;

    // saving failures are reported but don't fail the analysis
    publish(io::stdout().lock(), &analysis, &args.output_dir);
    Ok(())
}
