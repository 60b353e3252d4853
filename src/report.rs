//! Console rendering. This is the only place where failure rates turn into
//! percentages.

use crate::{
    compute::{Analysis, Summary},
    write::{save_analysis, SaveReport},
};
use std::{
    io::{self, Write},
    path::Path,
};

const RULE: &str = "============================================================";
const THIN_RULE: &str = "--------------------------------------------------";

/// Fraction in `[0, 1]` as a percentage with two decimals.
pub fn percent(fraction: f64) -> String {
    format!("{:.2}%", fraction * 100.0)
}

/// File size with a binary unit, e.g. `1.5 KB`.
pub fn human_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    for unit in ["B", "KB", "MB", "GB"] {
        if size < 1024.0 {
            return format!("{size:.1} {unit}");
        }
        size /= 1024.0;
    }
    format!("{size:.1} TB")
}

fn boxed_line<'a>(widths: &[usize], cells: impl Iterator<Item = &'a str>) -> String {
    widths
        .iter()
        .zip(cells)
        .map(|(&w, c)| format!("|{c:<w$}"))
        .collect::<String>()
        + "|"
}

/// Boxed, left-aligned table in the style of a dataframe `show()`.
fn table<W: Write>(out: &mut W, headers: &[&str], rows: &[Vec<String>]) -> io::Result<()> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }
    let border: String = widths
        .iter()
        .map(|w| format!("+{}", "-".repeat(*w)))
        .collect::<String>()
        + "+";
    writeln!(out, "{border}")?;
    writeln!(out, "{}", boxed_line(&widths, headers.iter().copied()))?;
    writeln!(out, "{border}")?;
    for row in rows {
        writeln!(out, "{}", boxed_line(&widths, row.iter().map(String::as_str)))?;
    }
    writeln!(out, "{border}")?;
    if rows.is_empty() {
        writeln!(out, "(no rows)")?;
    }
    Ok(())
}

/// Print the three views: top merchants by count, top users by average, top
/// merchants by failure rate, in that order.
pub fn print_analysis<W: Write>(mut out: W, analysis: &Analysis) -> io::Result<()> {
    writeln!(out, "\n{RULE}")?;
    writeln!(out, "BANKING TRANSACTIONS ANALYSIS RESULTS")?;
    writeln!(out, "{RULE}")?;

    writeln!(
        out,
        "\nTOP {} MERCHANTS BY TRANSACTION COUNT:\n{THIN_RULE}",
        analysis.top.merchants
    )?;
    let rows: Vec<Vec<String>> = analysis
        .top_merchants
        .iter()
        .map(|m| vec![m.merchant_id.clone(), m.txn_count.to_string()])
        .collect();
    table(&mut out, &["merchant_id", "txn_count"], &rows)?;

    writeln!(
        out,
        "\nTOP {} USERS BY AVERAGE TRANSACTION AMOUNT:\n{THIN_RULE}",
        analysis.top.users
    )?;
    let rows: Vec<Vec<String>> = analysis
        .top_users()
        .iter()
        .map(|u| vec![u.user_id.clone(), u.avg_transaction.to_string()])
        .collect();
    table(&mut out, &["user_id", "avg_transaction"], &rows)?;

    writeln!(
        out,
        "\nTOP {} MERCHANTS BY FAILURE RATE:\n{THIN_RULE}",
        analysis.top.failure_rates
    )?;
    let rows: Vec<Vec<String>> = analysis
        .top_failure_rates()
        .iter()
        .map(|m| {
            vec![
                m.merchant_id.clone(),
                m.total_txns.to_string(),
                m.failed_txns.to_string(),
                percent(m.failure_rate),
            ]
        })
        .collect();
    table(
        &mut out,
        &["merchant_id", "total_txns", "failed_txns", "failure_rate"],
        &rows,
    )?;
    out.flush()
}

pub fn print_save_report<W: Write>(mut out: W, report: &SaveReport) -> io::Result<()> {
    if report.is_complete() {
        writeln!(out, "\nAll results saved to: {}", report.dir.display())?;
    } else {
        writeln!(
            out,
            "\nSome results could not be saved; the analysis itself completed, see above."
        )?;
        for (name, e) in &report.failed {
            writeln!(out, "  not saved: {name} ({e})")?;
        }
    }
    for path in &report.saved {
        writeln!(out, "  {}", path.display())?;
    }
    out.flush()
}

pub fn print_summary<W: Write>(mut out: W, summary: &Summary) -> io::Result<()> {
    let or_na = |rate: Option<f64>| rate.map_or_else(|| "n/a".to_string(), percent);
    writeln!(out, "\nSUMMARY STATISTICS:")?;
    writeln!(out, "Total users analyzed: {}", summary.users)?;
    writeln!(out, "Total merchants analyzed: {}", summary.merchants)?;
    writeln!(out, "Highest failure rate: {}", or_na(summary.max_failure_rate))?;
    writeln!(out, "Average failure rate: {}", or_na(summary.avg_failure_rate))?;
    out.flush()
}

/// Print the views, save them under `dir`, then print where they went and the
/// summary. A console that can't be written to is only logged, so saving happens
/// whatever becomes of the display, and the other way round.
pub fn publish<W: Write, P: AsRef<Path>>(mut out: W, analysis: &Analysis, dir: P) -> SaveReport {
    if let Err(e) = print_analysis(&mut out, analysis) {
        log::error!("Could not print the report: {e}");
    }
    let report = save_analysis(dir, analysis);
    if let Err(e) = print_save_report(&mut out, &report) {
        log::error!("Could not print the save report: {e}");
    }
    if let Err(e) = print_summary(&mut out, &analysis.summary()) {
        log::error!("Could not print the summary: {e}");
    }
    report
}
