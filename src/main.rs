//! Export a per-event ledger view: every audit entry with its running
//! balances, correlated with the counter side of its transaction and the
//! aggregated disposal profit/loss, as CSV or an adaptive terminal table.

mod audit;
mod export;
mod format;
mod journal;
mod record;
mod table;
mod tax;

use std::fs::File;
use std::io::{self, IsTerminal};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use terminal_size::{terminal_size, Width};

use crate::audit::AuditRecords;
use crate::tax::TaxRules;

const DEFAULT_TERM_WIDTH: usize = 120;

#[derive(Parser, Debug)]
#[command(
    name = "taxport",
    version,
    about = "Export per-event ledger balances with correlated capital gains"
)]
struct Args {
    /// Force CSV output to stdout
    #[arg(long)]
    csv: bool,

    /// Force aligned table output to stdout
    #[arg(long)]
    table: bool,

    /// Path to the source ledger workbook
    #[arg(long, default_value = "records.csv")]
    input: PathBuf,
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();
    let args = Args::parse();

    let file = File::open(&args.input)
        .with_context(|| format!("failed to open {}", args.input.display()))?;
    let records = journal::read_csv(file)?;

    let audit = AuditRecords::from_records(&records);
    let report = tax::calculate(&records, TaxRules::UkIndividual);

    let disposals = export::aggregate_disposals(&report);
    let legs = export::index_legs(&records, &audit);
    let rows = export::build_rows(&records, &audit, &disposals, &legs);

    let stdout = io::stdout();
    if output_csv(args.csv, args.table) {
        export::write_csv(&rows, stdout.lock())?;
    } else {
        let data: Vec<Vec<String>> = rows
            .iter()
            .map(|row| row.columns().map(str::to_string).to_vec())
            .collect();
        table::render(
            stdout.lock(),
            &export::HEADERS,
            &data,
            &export::NUMERIC_COLUMNS,
            term_width(),
        )?;
    }
    Ok(())
}

/// CSV when redirected, table on an interactive terminal; an explicit flag
/// always wins over the heuristic.
fn output_csv(force_csv: bool, force_table: bool) -> bool {
    if force_csv {
        return true;
    }
    if force_table {
        return false;
    }
    !io::stdout().is_terminal()
}

fn term_width() -> usize {
    match terminal_size() {
        Some((Width(width), _)) => width as usize,
        None => DEFAULT_TERM_WIDTH,
    }
}
