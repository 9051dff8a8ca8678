//! Importer - Consolidates monthly country report workbooks
//!
//! Reads the VReport and XReport sheets of every workbook under
//! `<root>/<year>/<month>/WK n`, then overwrites:
//! - ConsolidatedReports.csv (all extracted shipments)
//! - SummaryLog.csv (one row per week folder)
//!
//! Usage:
//!   # All WK folders of a month:
//!   cargo run --bin importer -- --month July
//!
//!   # Specific weeks:
//!   cargo run --bin importer -- --year 2025 --month July --weeks 1,2

use anyhow::{Context, Result};
use chrono::Datelike;
use clap::Parser;
use serde_json::json;
use std::path::PathBuf;

use consolidator::config::{Config, CONSOLIDATED_FILE_NAME, SUMMARY_FILE_NAME};
use consolidator::import::{write_rows, ReportImporter};
use consolidator::logging;
use consolidator::periods::{parse_year, WeekSpec};

#[derive(Parser, Debug)]
#[command(name = "importer", about = "Consolidates monthly longstanding report workbooks")]
struct Args {
    /// Month folder name, e.g. July
    #[arg(long)]
    month: String,

    /// Report year (defaults to the current year)
    #[arg(long)]
    year: Option<String>,

    /// Week numbers (comma separated, ranges allowed); all WK folders when omitted
    #[arg(long)]
    weeks: Option<String>,

    /// Root folder holding <year>/<month> folders (overrides LONGSTANDING_IMPORT_ROOT)
    #[arg(long)]
    root: Option<PathBuf>,

    /// Output folder (overrides LONGSTANDING_OUTPUT_DIR)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Dry run - extract and report, but don't write any file
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
        config.import_root = root;
    }
    if let Some(dir) = args.output_dir {
        config.output_dir = dir;
    }

    let year = match args.year.as_deref() {
        Some(raw) => parse_year(raw).with_context(|| format!("Invalid year '{}'", raw))?,
        None => chrono::Local::now().year(),
    };
    let month = args.month.trim().to_string();

    let importer = ReportImporter::new(&config.import_root, &year.to_string(), &month)
        .context("Report folder not found")?;
    tracing::info!(folder = %importer.month_dir().display(), "Looking inside");

    // Blank --weeks means every WK folder
    let spec = WeekSpec::parse_optional(args.weeks.as_deref());
    if let Some(spec) = &spec {
        if spec.is_empty() {
            println!("No valid week numbers found");
            return Ok(());
        }
    }
    let labels = importer.week_labels(spec.as_ref())?;
    let summary = importer.run(&labels);

    let consolidated_path = config.output_dir.join(CONSOLIDATED_FILE_NAME);
    let summary_path = config.output_dir.join(SUMMARY_FILE_NAME);

    if args.dry_run {
        tracing::info!("Dry run - no files written");
    } else {
        if summary.records.is_empty() {
            tracing::warn!("No data extracted");
        } else {
            write_rows(&consolidated_path, &summary.records)
                .context("Failed to write consolidated report")?;
            tracing::info!(
                path = %consolidated_path.display(),
                rows = summary.records.len(),
                "Fresh consolidated CSV saved"
            );
        }
        if !summary.weeks.is_empty() {
            write_rows(&summary_path, &summary.weeks).context("Failed to write summary log")?;
            tracing::info!(path = %summary_path.display(), "Fresh summary log saved");
        }
    }

    if args.json {
        let report = json!({
            "year": year,
            "month": month,
            "weeks": summary.weeks,
            "missing_weeks": summary.missing_weeks,
            "shipments_extracted": summary.records.len(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("\n=== Import Summary ===");
        for row in &summary.weeks {
            println!(
                "  {}: {} files ({} total on disk), {} shipments ({} so far)",
                row.week, row.files_picked, row.total_files, row.week_shipments, row.shipments_extracted
            );
        }
        if !summary.missing_weeks.is_empty() {
            println!("  Missing week folders: {:?}", summary.missing_weeks);
        }
        println!("  Shipments extracted: {}", summary.records.len());
    }

    Ok(())
}
