//! Record extraction: raw table → canonical records.
//!
//! Two shapes of source are handled:
//! - Export-side files, one table per file, mapped through the layout's column table
//! - Report workbooks, where named sheets must carry a fixed column set
//!
//! Extraction never fails a run. A file that cannot be read, is empty, or
//! lacks the required columns contributes zero records and is logged.

use std::path::Path;

use serde::Serialize;

use crate::days::{format_days, normalize_days};
use crate::error::{ConsolidateError, Result};
use crate::layout::{is_delimited, LayoutTag};
use crate::schema::{CanonicalRecord, Field};
use crate::table::{read_sheet, read_table, RawTable};

// =============================================================================
// EXPORT-SIDE EXTRACTION
// =============================================================================

/// Map one raw table to canonical records for the given layout and week.
///
/// Columns already named like a canonical field are carried over, then the
/// layout's column map is applied on top, then DAYS is normalized and the
/// provenance fields are stamped.
pub fn extract_records(
    table: &RawTable,
    layout: LayoutTag,
    week: &str,
    source: &str,
) -> Vec<CanonicalRecord> {
    let passthrough: Vec<(usize, Field)> = table
        .headers
        .iter()
        .enumerate()
        .filter_map(|(idx, h)| Field::from_header(h).map(|f| (idx, f)))
        .collect();

    let mapped: Vec<(usize, Field)> = layout
        .column_map()
        .iter()
        .filter_map(|(column, field)| table.column_index(column).map(|idx| (idx, *field)))
        .collect();

    let mut unparsed_days = 0usize;
    let mut sample: Option<String> = None;

    let records = table
        .rows
        .iter()
        .map(|row| {
            let mut record = CanonicalRecord::new();
            for &(idx, field) in passthrough.iter().chain(mapped.iter()) {
                record.set(field, row[idx].as_str());
            }

            let raw_days = record.get(Field::Days).to_string();
            let days = normalize_days(&raw_days);
            if days.is_none() && !raw_days.trim().is_empty() {
                unparsed_days += 1;
                sample.get_or_insert(raw_days);
            }
            record.set(Field::Days, format_days(days));

            record.set(Field::Week, week);
            record.set(Field::Source, source);
            record.set(Field::Sourcetype, layout.label());
            record
        })
        .collect();

    if unparsed_days > 0 {
        tracing::warn!(
            source,
            count = unparsed_days,
            example = sample.as_deref().unwrap_or_default(),
            "DAYS values without numeric content left empty"
        );
    }

    records
}

/// Read a file and extract its canonical records. Any failure yields zero records.
pub fn extract_file(path: &Path, layout: LayoutTag, week: &str) -> Vec<CanonicalRecord> {
    let filename = file_name(path);

    let table = match read_table(path) {
        Ok(table) => table,
        Err(e) => {
            tracing::warn!(file = %path.display(), error = %e, "Error reading file");
            return Vec::new();
        }
    };

    if table.is_empty() {
        tracing::warn!(file = %filename, "Empty file");
        return Vec::new();
    }

    if table.len() > 10_000 {
        tracing::info!(file = %filename, rows = table.len(), "Cleaning DAYS values for large file");
    }

    extract_records(&table, layout, week, &filename)
}

// =============================================================================
// REPORT-SHEET EXTRACTION
// =============================================================================

/// Sheets read from every report workbook.
pub const REPORT_SHEETS: &[&str] = &["VReport", "XReport"];

/// Columns a report sheet must contain to be extracted at all.
pub const REPORT_COLUMNS: &[&str] = &["Days", "Shipment Number", "Last Move", "Eqp Type", "COMMENTS"];

/// Period and provenance stamped onto every row of a report workbook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportContext {
    pub year: String,
    pub month: String,
    pub week: String,
    pub date: String,
    pub country: String,
}

/// One consolidated report row, in output column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRecord {
    #[serde(rename = "Days")]
    pub days: String,
    #[serde(rename = "Shipment Number")]
    pub shipment_number: String,
    #[serde(rename = "Last Move")]
    pub last_move: String,
    #[serde(rename = "Eqp Type")]
    pub eqp_type: String,
    #[serde(rename = "COMMENTS")]
    pub comments: String,
    #[serde(rename = "Year")]
    pub year: String,
    #[serde(rename = "Month")]
    pub month: String,
    #[serde(rename = "Week")]
    pub week: String,
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Country")]
    pub country: String,
    #[serde(rename = "Source")]
    pub source: String,
}

/// Extract one report sheet. All of `REPORT_COLUMNS` must be present,
/// otherwise the whole sheet is rejected rather than partially extracted.
pub fn extract_report_sheet(
    table: &RawTable,
    path: &Path,
    sheet: &str,
    ctx: &ReportContext,
) -> Result<Vec<ReportRecord>> {
    let missing = table.missing_columns(REPORT_COLUMNS);
    if !missing.is_empty() {
        return Err(ConsolidateError::MissingColumns {
            path: path.to_path_buf(),
            sheet: sheet.to_string(),
            missing,
        });
    }

    let idx: Vec<usize> = REPORT_COLUMNS
        .iter()
        .filter_map(|c| table.column_index(c))
        .collect();

    Ok(table
        .rows
        .iter()
        .map(|row| ReportRecord {
            days: row[idx[0]].clone(),
            shipment_number: row[idx[1]].clone(),
            last_move: row[idx[2]].clone(),
            eqp_type: row[idx[3]].clone(),
            comments: row[idx[4]].clone(),
            year: ctx.year.clone(),
            month: ctx.month.clone(),
            week: ctx.week.clone(),
            date: ctx.date.clone(),
            country: ctx.country.clone(),
            source: sheet.to_string(),
        })
        .collect())
}

/// Extract every report sheet of a workbook. Sheets are skipped one by one;
/// a delimited file has no sheets and is read once, sourced by its filename.
pub fn extract_report_file(path: &Path, ctx: &ReportContext) -> Vec<ReportRecord> {
    if is_delimited(path) {
        let source = file_name(path);
        return match read_table(path) {
            Ok(table) => report_or_skip(extract_report_sheet(&table, path, &source, ctx)),
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "Error reading file");
                Vec::new()
            }
        };
    }

    let mut records = Vec::new();
    for &sheet in REPORT_SHEETS {
        tracing::debug!(file = %path.display(), sheet, "Reading sheet");
        match read_sheet(path, Some(sheet)) {
            Ok(table) => records.extend(report_or_skip(extract_report_sheet(&table, path, sheet, ctx))),
            Err(e) => tracing::warn!(file = %path.display(), sheet, error = %e, "Skipping sheet"),
        }
    }
    records
}

fn report_or_skip(result: Result<Vec<ReportRecord>>) -> Vec<ReportRecord> {
    match result {
        Ok(records) => records,
        Err(e) => {
            tracing::warn!(error = %e, "Skipping sheet");
            Vec::new()
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
