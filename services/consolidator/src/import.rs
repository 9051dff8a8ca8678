//! Report import run: `<root>/<year>/<month>/WK n` folders of country workbooks.
//!
//! Unlike the export side there is no master merge. Every run overwrites the
//! consolidated report and the per-week summary log.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{ConsolidateError, Result};
use crate::extract::{extract_report_file, ReportContext, ReportRecord};
use crate::merge::write_atomic;
use crate::periods::WeekSpec;
use crate::walker::{
    folder_name, list_period_dirs, list_spreadsheets, resolve_period_folder, PeriodFolder,
    IMPORT_WEEK_CONVENTIONS,
};

/// Prefix shared by every import week folder.
pub const WEEK_PREFIX: &str = "WK";

/// One row of `SummaryLog.csv`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekSummaryRow {
    #[serde(rename = "Year")]
    pub year: String,
    #[serde(rename = "Month")]
    pub month: String,
    #[serde(rename = "Week")]
    pub week: String,
    #[serde(rename = "TotalFiles_Windows")]
    pub total_files: usize,
    #[serde(rename = "FilesPickedByPython")]
    pub files_picked: usize,
    /// Running total over every week processed so far in the run.
    #[serde(rename = "ShipmentsExtracted")]
    pub shipments_extracted: usize,
    /// Records of this week alone.
    #[serde(skip)]
    pub week_shipments: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ImportSummary {
    pub records: Vec<ReportRecord>,
    pub weeks: Vec<WeekSummaryRow>,
    pub missing_weeks: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ReportImporter {
    month_dir: PathBuf,
    year: String,
    month: String,
}

impl ReportImporter {
    /// Fails when `<root>/<year>/<month>` does not exist.
    pub fn new(root: &Path, year: &str, month: &str) -> Result<Self> {
        let month_dir = root.join(year).join(month);
        if !month_dir.is_dir() {
            return Err(ConsolidateError::PathNotFound(month_dir));
        }
        Ok(Self {
            month_dir,
            year: year.to_string(),
            month: month.to_string(),
        })
    }

    pub fn month_dir(&self) -> &Path {
        &self.month_dir
    }

    /// Week folder labels to process: the given weeks, or every `WK*` folder.
    pub fn week_labels(&self, spec: Option<&WeekSpec>) -> Result<Vec<String>> {
        match spec {
            Some(spec) => Ok(spec
                .to_vec()
                .into_iter()
                .map(|w| folder_name(IMPORT_WEEK_CONVENTIONS[0], &w.to_string()))
                .collect()),
            None => list_period_dirs(&self.month_dir, WEEK_PREFIX)
                .map_err(|e| ConsolidateError::io(&self.month_dir, e)),
        }
    }

    /// Extract one week folder. `None` when the folder does not exist.
    pub fn process_week(&self, label: &str) -> Option<(Vec<ReportRecord>, WeekSummaryRow)> {
        // Labels are already full folder names ("WK 3"); match them literally
        let folder = match resolve_period_folder(&self.month_dir, label, &["{n}"]) {
            PeriodFolder::Found(folder) => folder,
            PeriodFolder::NotFound { searched } => {
                tracing::warn!(week = label, searched = %searched.display(), "Week folder not found");
                return None;
            }
        };

        tracing::info!(folder = %folder.display(), "Processing week");
        let listing = list_spreadsheets(&folder);
        tracing::info!(
            found = listing.spreadsheets.len(),
            total = listing.all_files,
            "Files in week folder"
        );

        let mut records = Vec::new();
        for path in &listing.spreadsheets {
            let country = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let ctx = ReportContext {
                year: self.year.clone(),
                month: self.month.clone(),
                week: label.to_string(),
                date: label.to_string(),
                country,
            };
            records.extend(extract_report_file(path, &ctx));
        }

        let row = WeekSummaryRow {
            year: self.year.clone(),
            month: self.month.clone(),
            week: label.to_string(),
            total_files: listing.all_files,
            files_picked: listing.spreadsheets.len(),
            shipments_extracted: records.len(),
            week_shipments: records.len(),
        };
        Some((records, row))
    }

    pub fn run(&self, labels: &[String]) -> ImportSummary {
        let mut summary = ImportSummary::default();
        for label in labels {
            match self.process_week(label) {
                Some((records, mut row)) => {
                    summary.records.extend(records);
                    row.shipments_extracted = summary.records.len();
                    summary.weeks.push(row);
                }
                None => summary.missing_weeks.push(label.clone()),
            }
        }
        summary
    }
}

fn to_csv_bytes<T: Serialize>(rows: &[T]) -> std::result::Result<Vec<u8>, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}

/// Overwrite `path` with `rows` as CSV (header from the row type).
pub fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let bytes = to_csv_bytes(rows).map_err(|e| ConsolidateError::csv(path, e))?;
    write_atomic(path, &bytes).map_err(|e| ConsolidateError::io(path, e))
}
