//! Command-line interface for the cleaning pipeline.

use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use std::time::Instant;

use crate::cleaning::{prepare, AdvancedCleaner, CleaningConfig};
use crate::utils::read_csv_path;

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString { s.truecolor(100, 210, 120) }

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "tabclean")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Configurable cleaning pipeline for tabular datasets")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Clean a dataset and write the result
    Clean {
        /// Input CSV file
        #[arg(short, long)]
        data: PathBuf,

        /// Cleaning configuration as a JSON file; defaults apply when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output CSV file
        #[arg(short, long)]
        output: PathBuf,

        /// Optional path for the statistics report (JSON)
        #[arg(short, long)]
        report: Option<PathBuf>,

        /// Drop columns with a single distinct value before cleaning
        #[arg(long)]
        drop_constant: bool,

        /// Drop string columns with more distinct values than this before cleaning
        #[arg(long)]
        max_cardinality: Option<usize>,
    },

    /// Show dataset information
    Info {
        /// Input CSV file
        #[arg(short, long)]
        data: PathBuf,
    },
}

// ─── Commands ──────────────────────────────────────────────────────────────────

#[allow(clippy::too_many_arguments)]
pub fn cmd_clean(
    data_path: &PathBuf,
    config_path: Option<&PathBuf>,
    output_path: &PathBuf,
    report_path: Option<&PathBuf>,
    drop_constant: bool,
    max_cardinality: Option<usize>,
) -> anyhow::Result<()> {
    section("Clean");

    let config: CleaningConfig = match config_path {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => CleaningConfig::default(),
    };

    step_run("Loading data");
    let mut df = read_csv_path(data_path)?;
    if drop_constant {
        df = prepare::drop_constant(&df)?;
    }
    if let Some(threshold) = max_cardinality {
        df = prepare::drop_high_cardinality(&df, threshold)?;
    }
    step_done(&format!("{} rows × {} cols", df.height(), df.width()));

    step_run("Cleaning");
    let start = Instant::now();
    let mut cleaner = AdvancedCleaner::new(config);
    let outcome = cleaner.clean_frame(df)?;
    step_done(&format!("{:?}", start.elapsed()));

    step_run(&format!("Saving → {}", output_path.display()));
    std::fs::write(output_path, outcome.csv.as_bytes())?;
    step_done(&format!(
        "{} rows in, {} removed",
        outcome.report.rows_processed, outcome.report.rows_removed
    ));

    if let Some(path) = report_path {
        std::fs::write(path, serde_json::to_string_pretty(&outcome.report)?)?;
    }

    println!();
    println!("  {:<22} {}", muted("Rows processed"), outcome.report.rows_processed);
    println!("  {:<22} {}", muted("Outliers removed"), outcome.report.outliers_removed);
    println!("  {:<22} {}", muted("Duplicates removed"), outcome.report.duplicates_removed);
    println!("  {:<22} {}", muted("Columns normalized"), outcome.report.columns_normalized.len());
    println!("  {:<22} {}", muted("Columns encoded"), outcome.report.columns_encoded.len());
    for fallback in &outcome.report.fallbacks {
        println!("  {} {}: {}", "!".yellow(), fallback.stage, fallback.reason);
    }
    println!();

    Ok(())
}

pub fn cmd_info(data_path: &PathBuf) -> anyhow::Result<()> {
    section("Data Info");

    let df = read_csv_path(data_path)?;

    println!("  {:<12} {}", muted("File"), data_path.display());
    println!("  {:<12} {}", muted("Rows"), df.height());
    println!("  {:<12} {}", muted("Columns"), df.width());
    println!();

    println!(
        "  {:<20} {:<12} {:>6} {:>8}",
        muted("Column"),
        muted("Type"),
        muted("Nulls"),
        muted("Unique")
    );
    println!("  {}", dim(&"─".repeat(50)));

    for col in df.get_columns() {
        println!(
            "  {:<20} {:<12} {:>6} {:>8}",
            col.name(),
            format!("{:?}", col.dtype()).truecolor(140, 140, 140),
            col.null_count(),
            col.as_materialized_series().n_unique().unwrap_or(0)
        );
    }

    println!();
    Ok(())
}
