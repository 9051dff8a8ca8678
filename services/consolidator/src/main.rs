//! Consolidator - Merges weekly export longstanding reports into the master file
//!
//! Usage:
//!   # One week of the current year:
//!   cargo run --bin consolidator -- --weeks 26
//!
//!   # Several weeks, explicit year and folders:
//!   cargo run --bin consolidator -- --year 2025 --weeks 26,28-30 --root /data/export --output-dir /data/out

use anyhow::{Context, Result};
use chrono::Datelike;
use clap::Parser;
use std::path::PathBuf;

use consolidator::config::{parse_ignore_list, Config};
use consolidator::periods::{parse_year, WeekSpec};
use consolidator::{logging, ExportConsolidator, FileClassifier, MasterMerger, RunOutcome, RunSummary};

#[derive(Parser, Debug)]
#[command(name = "consolidator", about = "Merges weekly longstanding reports into the master file")]
struct Args {
    /// Week numbers: 26 or 26,27,28 or 26-28
    #[arg(long)]
    weeks: String,

    /// Report year (defaults to the current year)
    #[arg(long)]
    year: Option<String>,

    /// Root folder holding <year>/<week> folders (overrides LONGSTANDING_EXPORT_ROOT)
    #[arg(long)]
    root: Option<PathBuf>,

    /// Folder of the master file (overrides LONGSTANDING_OUTPUT_DIR)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Extra filenames to ignore, comma separated
    #[arg(long)]
    ignore: Option<String>,

    /// Dry run - compute the merge but don't write the master file
    #[arg(long, default_value = "false")]
    dry_run: bool,

    /// Print the run summary as JSON on stdout
    #[arg(long, default_value = "false")]
    json: bool,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    logging::init_logging();
    let args = Args::parse();

    let mut config = Config::from_env();
    if let Some(root) = args.root {
        config.export_root = root;
    }
    if let Some(dir) = args.output_dir {
        config.output_dir = dir;
    }
    if let Some(extra) = args.ignore.as_deref() {
        config.ignore_files.extend(parse_ignore_list(extra));
    }

    let year = match args.year.as_deref() {
        Some(raw) => parse_year(raw).with_context(|| format!("Invalid year '{}'", raw))?,
        None => chrono::Local::now().year(),
    };
    let spec = WeekSpec::parse(&args.weeks);

    tracing::info!(
        root = %config.export_root.display(),
        output = %config.output_dir.display(),
        year,
        dry_run = args.dry_run,
        "Export longstanding consolidation"
    );

    let consolidator = ExportConsolidator::new(&config.export_root, FileClassifier::new(config.ignore_files.clone()))
        .context("Invalid export root")?;
    let merger = MasterMerger::new(config.master_path());

    let summary = consolidator
        .run(year, &spec, &merger, args.dry_run)
        .context("Consolidation failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }

    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!("\n=== Processing Summary ===");
    println!("Successfully processed weeks: {:?}", summary.succeeded);
    if !summary.failed.is_empty() {
        println!("Failed weeks: {:?}", summary.failed);
    }
    if !summary.rejected_tokens.is_empty() {
        println!("Ignored week tokens: {:?}", summary.rejected_tokens);
    }

    match summary.outcome {
        RunOutcome::NoValidWeeks => {
            println!("No valid week numbers found");
            return;
        }
        RunOutcome::NoRecords => {
            println!("No valid files found for any of the specified weeks");
            return;
        }
        RunOutcome::Completed => {}
    }

    let Some(report) = &summary.merge else {
        return;
    };

    println!("\nMaster file: {}", report.master_path.display());
    println!("  Total rows in master file: {}", report.total_rows);
    println!("  Rows extracted this run: {}", report.added_rows);
    println!("  Rows replaced: {}", report.removed_rows);

    println!("  Week breakdown:");
    for week in &report.weeks {
        let marker = if week.new { "  NEW" } else { "" };
        println!("    - Week {}: {} rows{}", week.week, week.rows, marker);
    }

    println!("  File type breakdown:");
    for (sourcetype, count) in &report.sourcetypes {
        println!("    - {}: {} rows", sourcetype, count);
    }

    if let Some(days) = &report.days {
        println!("  DAYS statistics:");
        println!("    - Valid numeric values: {}/{}", days.valid, days.total);
        println!("    - Range: {:.0} to {:.0} days", days.min, days.max);
        println!("    - Average: {:.1} days", days.mean);
    }
}
