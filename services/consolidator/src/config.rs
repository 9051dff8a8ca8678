use std::path::PathBuf;

/// Filenames that are never consolidated, regardless of what their name suggests.
pub const DEFAULT_IGNORE_FILES: &[&str] = &["Raw Data.xlsx", "DCC Not Sent.xlsx"];

pub const MASTER_FILE_NAME: &str = "ExportLongstanding_MasterData.csv";
pub const CONSOLIDATED_FILE_NAME: &str = "ConsolidatedReports.csv";
pub const SUMMARY_FILE_NAME: &str = "SummaryLog.csv";

/// Runtime configuration, read from the environment (and `.env` via dotenvy).
#[derive(Debug, Clone)]
pub struct Config {
    pub export_root: PathBuf,
    pub import_root: PathBuf,
    pub output_dir: PathBuf,
    pub ignore_files: Vec<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            export_root: PathBuf::from(
                std::env::var("LONGSTANDING_EXPORT_ROOT")
                    .unwrap_or_else(|_| "./data/export-longstanding".to_string()),
            ),
            import_root: PathBuf::from(
                std::env::var("LONGSTANDING_IMPORT_ROOT")
                    .unwrap_or_else(|_| "./data/reports".to_string()),
            ),
            output_dir: PathBuf::from(
                std::env::var("LONGSTANDING_OUTPUT_DIR")
                    .unwrap_or_else(|_| "./data/output".to_string()),
            ),
            ignore_files: std::env::var("LONGSTANDING_IGNORE_FILES")
                .map(|raw| parse_ignore_list(&raw))
                .unwrap_or_else(|_| default_ignore_files()),
        }
    }

    pub fn master_path(&self) -> PathBuf {
        self.output_dir.join(MASTER_FILE_NAME)
    }
}

pub fn default_ignore_files() -> Vec<String> {
    DEFAULT_IGNORE_FILES.iter().map(|s| s.to_string()).collect()
}

/// Comma-separated list of exact filenames; blanks are dropped.
pub fn parse_ignore_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
