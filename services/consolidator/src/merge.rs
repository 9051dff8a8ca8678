//! Master table: load, replace processed weeks, sort, persist.
//!
//! The master file is the full history consumed by downstream reporting.
//! Re-running a week REPLACES that week's rows, so a merge is idempotent:
//! the same input twice yields the same file as once.
//!
//! Weeks are compared as trimmed text. "5" and "05" are different weeks.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;

use crate::error::{ConsolidateError, Result};
use crate::schema::{headers, CanonicalRecord, Field};
use crate::table::decode_text;

/// Sort keys of the master table, in priority order.
const SORT_KEYS: [Field; 3] = [Field::Week, Field::ActlocCountry, Field::ShipmentNumber];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MasterTable {
    records: Vec<CanonicalRecord>,
}

impl MasterTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<CanonicalRecord>) -> Self {
        Self { records }
    }

    /// Load the master file, or an empty table when it does not exist yet.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let bytes = std::fs::read(path).map_err(|e| ConsolidateError::MasterLoad {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::parse(&decode_text(&bytes)).map_err(|e| ConsolidateError::MasterLoad {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Parse master CSV text. Columns are matched by header; unknown ones are dropped.
    pub fn parse(content: &str) -> std::result::Result<Self, csv::Error> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(content.as_bytes());

        let columns: Vec<Option<Field>> = reader.headers()?.iter().map(Field::from_header).collect();

        let mut records = Vec::new();
        for result in reader.records() {
            let row = result?;
            records.push(CanonicalRecord::from_row(&columns, &row));
        }
        Ok(Self { records })
    }

    pub fn records(&self) -> &[CanonicalRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop every row whose week is in `weeks`. Returns the number removed.
    pub fn remove_weeks(&mut self, weeks: &BTreeSet<String>) -> usize {
        let before = self.records.len();
        self.records
            .retain(|r| !weeks.contains(r.week().trim()));
        before - self.records.len()
    }

    pub fn append(&mut self, records: impl IntoIterator<Item = CanonicalRecord>) {
        self.records.extend(records);
    }

    /// Stable sort by week, country, shipment. Empty keys sort last.
    pub fn sort(&mut self) {
        self.records.sort_by(|a, b| {
            SORT_KEYS
                .iter()
                .map(|&f| compare_cells(a.get(f), b.get(f)))
                .find(|o| *o != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });
    }

    /// Serialize as UTF-8 CSV with a byte-order mark, header first.
    pub fn to_csv_bytes(&self) -> std::result::Result<Vec<u8>, csv::Error> {
        let mut writer = csv::Writer::from_writer("\u{feff}".as_bytes().to_vec());
        writer.write_record(headers())?;
        for record in &self.records {
            writer.write_record(record.cells())?;
        }
        writer
            .into_inner()
            .map_err(|e| csv::Error::from(e.into_error()))
    }

    /// Write the table to `path`. The previous file stays intact if this fails.
    pub fn persist(&self, path: &Path) -> Result<()> {
        let bytes = self.to_csv_bytes().map_err(|e| ConsolidateError::MasterWrite {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        write_atomic(path, &bytes).map_err(|e| ConsolidateError::MasterWrite {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn week_counts(&self) -> Vec<(String, usize)> {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for r in &self.records {
            *counts.entry(r.week().trim().to_string()).or_default() += 1;
        }
        let mut counts: Vec<(String, usize)> = counts.into_iter().collect();
        counts.sort_by(|a, b| compare_cells(&a.0, &b.0));
        counts
    }

    pub fn sourcetype_counts(&self) -> Vec<(String, usize)> {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for r in &self.records {
            *counts.entry(r.get(Field::Sourcetype).to_string()).or_default() += 1;
        }
        let mut counts: Vec<(String, usize)> = counts.into_iter().collect();
        // Most frequent first; ties stay alphabetical
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts
    }

    pub fn days_stats(&self) -> Option<DaysStats> {
        let values: Vec<f64> = self.records.iter().filter_map(|r| r.days()).collect();
        if values.is_empty() {
            return None;
        }
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        Some(DaysStats {
            valid: values.len(),
            total: self.records.len(),
            min,
            max,
            mean,
        })
    }
}

/// Write `bytes` to a temp file next to `path`, then rename it into place.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Numbers before text before empty; numbers compare numerically.
fn compare_cells(a: &str, b: &str) -> Ordering {
    fn rank(s: &str) -> (u8, Option<f64>) {
        let s = s.trim();
        if s.is_empty() {
            (2, None)
        } else if let Some(n) = s.parse::<f64>().ok().filter(|n| n.is_finite()) {
            (0, Some(n))
        } else {
            (1, None)
        }
    }

    let (ra, na) = rank(a);
    let (rb, nb) = rank(b);
    ra.cmp(&rb).then_with(|| match (na, nb) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => a.trim().cmp(b.trim()),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaysStats {
    pub valid: usize,
    pub total: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekCount {
    pub week: String,
    pub rows: usize,
    pub new: bool,
}

/// What a merge did to the master table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergeReport {
    pub master_path: PathBuf,
    pub created: bool,
    pub existing_rows: usize,
    pub removed_rows: usize,
    pub added_rows: usize,
    pub total_rows: usize,
    pub weeks: Vec<WeekCount>,
    pub sourcetypes: Vec<(String, usize)>,
    pub days: Option<DaysStats>,
}

/// Replace `weeks` in `master` with `new_records` and sort. Pure; nothing is written.
pub fn replace_weeks(
    mut master: MasterTable,
    new_records: Vec<CanonicalRecord>,
    weeks: &BTreeSet<String>,
) -> (MasterTable, usize) {
    let removed = master.remove_weeks(weeks);
    master.append(new_records);
    master.sort();
    (master, removed)
}

/// Owns the master file at a fixed path.
#[derive(Debug, Clone)]
pub struct MasterMerger {
    path: PathBuf,
}

impl MasterMerger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load → remove processed weeks → append → sort → persist.
    ///
    /// The new table is built completely in memory before anything is
    /// written. With `dry_run` the file is left untouched.
    pub fn merge(
        &self,
        new_records: Vec<CanonicalRecord>,
        weeks: &BTreeSet<String>,
        dry_run: bool,
    ) -> Result<MergeReport> {
        let created = !self.path.exists();
        let existing = MasterTable::load(&self.path)?;
        let existing_rows = existing.len();
        if created {
            tracing::info!(path = %self.path.display(), "Creating new master file");
        } else {
            tracing::info!(path = %self.path.display(), rows = existing_rows, "Loaded existing master file");
        }

        let added_rows = new_records.len();
        let (master, removed_rows) = replace_weeks(existing, new_records, weeks);
        tracing::info!(
            removed = removed_rows,
            remaining = existing_rows - removed_rows,
            "Removed rows of processed weeks"
        );

        if dry_run {
            tracing::info!("Dry run - master file not written");
        } else {
            master.persist(&self.path)?;
            tracing::info!(path = %self.path.display(), rows = master.len(), "Master file saved");
        }

        let weeks_report = master
            .week_counts()
            .into_iter()
            .map(|(week, rows)| WeekCount {
                new: weeks.contains(&week),
                week,
                rows,
            })
            .collect();

        Ok(MergeReport {
            master_path: self.path.clone(),
            created,
            existing_rows,
            removed_rows,
            added_rows,
            total_rows: master.len(),
            weeks: weeks_report,
            sourcetypes: master.sourcetype_counts(),
            days: master.days_stats(),
        })
    }
}
