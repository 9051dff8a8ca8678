//! Export consolidation run: weeks → files → canonical records → master merge.
//!
//! Weeks are processed one at a time in ascending order, files in enumeration
//! order. A missing week folder or an unreadable file never stops the run;
//! only configuration errors and master-file failures do.

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::Serialize;

use crate::error::{ConsolidateError, Result};
use crate::extract::extract_file;
use crate::layout::{FileClassifier, FileDecision};
use crate::merge::{MasterMerger, MergeReport};
use crate::periods::WeekSpec;
use crate::schema::CanonicalRecord;
use crate::walker::{list_files, resolve_period_folder, PeriodFolder, EXPORT_WEEK_CONVENTIONS};

/// Records extracted for one week, plus what was seen on the way.
#[derive(Debug, Clone, Default)]
pub struct WeekExtraction {
    pub week: u32,
    pub folder: Option<PathBuf>,
    pub files_processed: usize,
    pub records: Vec<CanonicalRecord>,
}

impl WeekExtraction {
    /// A week counts as processed only if its folder exists and yielded rows.
    pub fn succeeded(&self) -> bool {
        self.folder.is_some() && !self.records.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Completed,
    NoValidWeeks,
    NoRecords,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeekSummary {
    pub week: u32,
    pub folder: Option<PathBuf>,
    pub files_processed: usize,
    pub rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub year: i32,
    pub outcome: RunOutcome,
    pub succeeded: Vec<u32>,
    pub failed: Vec<u32>,
    pub rejected_tokens: Vec<String>,
    pub weeks: Vec<WeekSummary>,
    pub rows_extracted: usize,
    pub merge: Option<MergeReport>,
}

/// Consolidates export-side longstanding reports under `<root>/<year>/<week>`.
#[derive(Debug, Clone)]
pub struct ExportConsolidator {
    root: PathBuf,
    classifier: FileClassifier,
}

impl ExportConsolidator {
    /// Fails when the root folder does not exist; nothing has been touched yet.
    pub fn new(root: impl Into<PathBuf>, classifier: FileClassifier) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(ConsolidateError::PathNotFound(root));
        }
        Ok(Self { root, classifier })
    }

    /// Extract every accepted file of one week folder.
    pub fn process_week(&self, year: i32, week: u32) -> WeekExtraction {
        let year_dir = self.root.join(year.to_string());
        let label = week.to_string();

        let folder = match resolve_period_folder(&year_dir, &label, EXPORT_WEEK_CONVENTIONS) {
            PeriodFolder::Found(folder) => folder,
            PeriodFolder::NotFound { searched } => {
                tracing::warn!(week, searched = %searched.display(), "Week folder not found");
                return WeekExtraction {
                    week,
                    ..Default::default()
                };
            }
        };

        tracing::info!(week, folder = %folder.display(), "Processing week folder");

        let mut extraction = WeekExtraction {
            week,
            folder: Some(folder.clone()),
            ..Default::default()
        };

        for path in list_files(&folder) {
            let layout = match self.classifier.decide_path(&path) {
                FileDecision::Accept(layout) => layout,
                FileDecision::Skip(reason) => {
                    tracing::debug!(file = %path.display(), ?reason, "Skipping file");
                    continue;
                }
            };

            let records = extract_file(&path, layout, &label);
            if records.is_empty() {
                continue;
            }
            tracing::info!(
                layout = %layout,
                file = %path.file_name().unwrap_or_default().to_string_lossy(),
                rows = records.len(),
                "Extracted file"
            );
            extraction.files_processed += 1;
            extraction.records.extend(records);
        }

        tracing::info!(
            week,
            files = extraction.files_processed,
            rows = extraction.records.len(),
            "Week summary"
        );
        extraction
    }

    /// Run every week of `spec` and merge the result into the master file.
    pub fn run(
        &self,
        year: i32,
        spec: &WeekSpec,
        merger: &MasterMerger,
        dry_run: bool,
    ) -> Result<RunSummary> {
        let mut summary = RunSummary {
            year,
            outcome: RunOutcome::Completed,
            succeeded: Vec::new(),
            failed: Vec::new(),
            rejected_tokens: spec.rejected.clone(),
            weeks: Vec::new(),
            rows_extracted: 0,
            merge: None,
        };

        if spec.is_empty() {
            tracing::warn!("No valid week numbers found");
            summary.outcome = RunOutcome::NoValidWeeks;
            return Ok(summary);
        }

        tracing::info!(weeks = ?spec.to_vec(), "Processing weeks");

        let mut all_records = Vec::new();
        for week in spec.to_vec() {
            let extraction = self.process_week(year, week);
            if extraction.succeeded() {
                summary.succeeded.push(week);
            } else {
                tracing::warn!(week, "Week processing failed");
                summary.failed.push(week);
            }
            summary.weeks.push(WeekSummary {
                week,
                folder: extraction.folder.clone(),
                files_processed: extraction.files_processed,
                rows: extraction.records.len(),
            });
            all_records.extend(extraction.records);
        }

        summary.rows_extracted = all_records.len();
        tracing::info!(
            succeeded = ?summary.succeeded,
            failed = ?summary.failed,
            rows = summary.rows_extracted,
            "Processing summary"
        );

        if all_records.is_empty() {
            tracing::warn!("No valid files found for any of the specified weeks");
            summary.outcome = RunOutcome::NoRecords;
            return Ok(summary);
        }

        let processed: BTreeSet<String> = summary.succeeded.iter().map(|w| w.to_string()).collect();
        summary.merge = Some(merger.merge(all_records, &processed, dry_run)?);
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::MasterTable;
    use crate::schema::Field;
    use std::fs;
    use std::path::Path;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn consolidator(root: &Path) -> ExportConsolidator {
        ExportConsolidator::new(root, FileClassifier::default()).unwrap()
    }

    #[test]
    fn test_missing_root_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = ExportConsolidator::new(dir.path().join("nope"), FileClassifier::default());
        assert!(matches!(result, Err(ConsolidateError::PathNotFound(_))));
    }

    #[test]
    fn test_process_week_template_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        write(
            &dir.path().join("2025/Week 26/India/LS Template.csv"),
            "Booking number,Days since Gated Out,ACTLOC Country\nS1,29 to 35 days,IN\n",
        );

        let extraction = consolidator(dir.path()).process_week(2025, 26);
        assert!(extraction.succeeded());
        assert_eq!(extraction.files_processed, 1);
        let r = &extraction.records[0];
        assert_eq!(r.get(Field::ShipmentNumber), "S1");
        assert_eq!(r.days(), Some(32.0));
        assert_eq!(r.get(Field::ActlocCountry), "IN");
        assert_eq!(r.week(), "26");
    }

    #[test]
    fn test_process_week_skips_ignored_unrecognized_and_broken() {
        let dir = tempfile::tempdir().unwrap();
        let week = dir.path().join("2025/Wk26");
        write(&week.join("Raw Data.xlsx"), "SHIPMENT_NUMBER\nX\n");
        write(&week.join("budget.csv"), "SHIPMENT_NUMBER\nX\n");
        write(&week.join("notes.txt"), "ls template");
        write(&week.join("export longstanding.xlsx"), "not a workbook");
        write(&week.join("export_longstandings.csv"), "SHIPMENT_NUMBER,DAYS\nB1,12\n");

        let extraction = consolidator(dir.path()).process_week(2025, 26);
        assert_eq!(extraction.files_processed, 1);
        assert_eq!(extraction.records.len(), 1);
        assert_eq!(extraction.records[0].get(Field::Sourcetype), "Export_Longstandings");
    }

    #[test]
    fn test_process_week_missing_folder_fails_softly() {
        let dir = tempfile::tempdir().unwrap();
        let extraction = consolidator(dir.path()).process_week(2025, 3);
        assert!(extraction.folder.is_none());
        assert!(!extraction.succeeded());
    }

    #[test]
    fn test_run_merges_succeeded_weeks_only() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("in");
        write(&root.join("2025/Week 5/export_longstandings.csv"), "SHIPMENT_NUMBER,DAYS\nNEW,3\n");
        fs::create_dir_all(root.join("2025/Week 6")).unwrap();

        let master_path = dir.path().join("out/master.csv");
        MasterTable::from_records(vec![
            CanonicalRecord::new().with(Field::Week, "5").with(Field::ShipmentNumber, "OLD"),
            CanonicalRecord::new().with(Field::Week, "6").with(Field::ShipmentNumber, "KEEP"),
        ])
        .persist(&master_path)
        .unwrap();

        let merger = MasterMerger::new(&master_path);
        let summary = consolidator(&root)
            .run(2025, &WeekSpec::parse("5-7"), &merger, false)
            .unwrap();

        assert_eq!(summary.outcome, RunOutcome::Completed);
        assert_eq!(summary.succeeded, vec![5]);
        assert_eq!(summary.failed, vec![6, 7]);

        let master = MasterTable::load(&master_path).unwrap();
        let shipments: Vec<&str> = master.records().iter().map(|r| r.get(Field::ShipmentNumber)).collect();
        assert_eq!(shipments, vec!["NEW", "KEEP"]);
    }

    #[test]
    fn test_run_twice_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("in");
        write(
            &root.join("2025/26/LS Template.csv"),
            "Booking number,Days since Gated Out,ACTLOC Country\nS2,20-25,LK\nS1,30,IN\n",
        );
        let master_path = dir.path().join("out/master.csv");
        let merger = MasterMerger::new(&master_path);
        let run = consolidator(&root);

        run.run(2025, &WeekSpec::parse("26"), &merger, false).unwrap();
        let first = fs::read(&master_path).unwrap();
        run.run(2025, &WeekSpec::parse("26"), &merger, false).unwrap();
        let second = fs::read(&master_path).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_run_without_records_does_not_touch_master() {
        let dir = tempfile::tempdir().unwrap();
        let master_path = dir.path().join("master.csv");
        let merger = MasterMerger::new(&master_path);

        let summary = consolidator(dir.path())
            .run(2025, &WeekSpec::parse("1"), &merger, false)
            .unwrap();
        assert_eq!(summary.outcome, RunOutcome::NoRecords);
        assert!(!master_path.exists());
    }

    #[test]
    fn test_run_without_valid_weeks() {
        let dir = tempfile::tempdir().unwrap();
        let merger = MasterMerger::new(dir.path().join("master.csv"));
        let summary = consolidator(dir.path())
            .run(2025, &WeekSpec::parse("x,y"), &merger, false)
            .unwrap();
        assert_eq!(summary.outcome, RunOutcome::NoValidWeeks);
        assert_eq!(summary.rejected_tokens, vec!["x".to_string(), "y".to_string()]);
    }
}
