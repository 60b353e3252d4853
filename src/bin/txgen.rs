use anyhow::Context;
use clap::Parser;
use std::{collections::HashSet, path::PathBuf};
use txn_analytics::{
    data::Status,
    generate::{GeneratorConfig, TransactionGenerator},
    report::human_size,
    write::{save_records_csv, save_records_json},
};

/// Generate synthetic banking transactions as CSV and JSON.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// How many transactions to generate
    #[arg(long, short = 'n', allow_negative_numbers = true)]
    count: i64,

    /// Directory receiving transactions.csv and transactions.json
    #[arg(long, default_value = "sample_output")]
    output_dir: PathBuf,

    /// Seed for a reproducible dataset
    #[arg(long)]
    seed: Option<u64>,

    /// Size of the user pool
    #[arg(long, default_value_t = 1000)]
    users: u32,

    /// Size of the merchant pool
    #[arg(long, default_value_t = 50)]
    merchants: u32,

    /// Timestamps fall within this many days before now
    #[arg(long, default_value_t = 30)]
    window_days: u32,

    /// Only write the CSV file
    #[arg(long, conflicts_with = "json_only")]
    csv_only: bool,

    /// Only write the JSON file
    #[arg(long)]
    json_only: bool,
}

fn main() -> Result<(), anyhow::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = GeneratorConfig {
        user_pool: args.users,
        merchant_pool: args.merchants,
        window_days: args.window_days,
        seed: args.seed,
        ..GeneratorConfig::default()
    };
    let mut generator =
        TransactionGenerator::new(config).context("invalid generator configuration")?;
    let transactions = generator.generate(args.count)?;

    let csv_path = args.output_dir.join("transactions.csv");
    let json_path = args.output_dir.join("transactions.json");
    let mut written = Vec::new();
    let mut failures = 0;
    if !args.json_only {
        match save_records_csv(&csv_path, &transactions) {
            Ok(()) => written.push(("CSV", csv_path)),
            Err(e) => {
                log::error!("Error saving {}: {e}", csv_path.display());
                failures += 1;
            }
        }
    }
    if !args.csv_only {
        match save_records_json(&json_path, &transactions) {
            Ok(()) => written.push(("JSON", json_path)),
            Err(e) => {
                log::error!("Error saving {}: {e}", json_path.display());
                failures += 1;
            }
        }
    }

    let users: HashSet<_> = transactions.iter().map(|tx| tx.user_id.as_str()).collect();
    let successes = transactions
        .iter()
        .filter(|tx| tx.status == Status::Success)
        .count();
    println!("\nSummary:");
    println!("   Generated: {} transactions", transactions.len());
    println!("   Unique users: {}", users.len());
    for (kind, path) in &written {
        let size = std::fs::metadata(path)
            .map(|m| human_size(m.len()))
            .unwrap_or_else(|_| "Unknown".to_string());
        println!("   {kind} file: {} ({size})", path.display());
    }
    println!(
        "   Success rate: {:.1}%",
        successes as f64 * 100.0 / transactions.len() as f64
    );

    if failures > 0 {
        anyhow::bail!("{failures} output file(s) could not be written");
    }
    Ok(())
}
