//! Source layouts and filename classification.
//!
//! Each known layout carries its filename keywords and its column mapping as
//! static data. Adding a layout means adding a variant and two table rows.

use std::fmt;
use std::path::Path;

use crate::schema::Field;

/// Spreadsheet and delimited-text suffixes accepted for consolidation.
pub const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xls", "xlsm", "xlsb", "xltx", "xltm", "csv"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LayoutTag {
    Template,
    EmptiesExport,
    FullExport,
    Unrecognized,
}

/// Filename keywords per layout, in priority order. First group to match wins.
const LAYOUT_KEYWORDS: &[(LayoutTag, &[&str])] = &[
    (LayoutTag::Template, &["ls template", "ls templet"]),
    (
        LayoutTag::EmptiesExport,
        &["export_empties_longstandings", "empties longstanding"],
    ),
    (
        LayoutTag::FullExport,
        &["export_longstandings", "export longstanding"],
    ),
];

/// Booking-template sheets filled in by country teams.
const TEMPLATE_COLUMNS: &[(&str, Field)] = &[
    ("Booking number", Field::ShipmentNumber),
    ("Days since Gated Out", Field::Days),
    ("ACTLOC Country", Field::ActlocCountry),
    ("Container Type", Field::ContType),
    ("Process", Field::Move),
];

/// System exports; already mostly in canonical naming.
const EXPORT_COLUMNS: &[(&str, Field)] = &[
    ("Last move", Field::Move),
    ("ACTLOC_COUNTRY", Field::ActlocCountry),
    ("CONT_TYPE", Field::ContType),
    ("DAYS", Field::Days),
    ("SHIPMENT_NUMBER", Field::ShipmentNumber),
    ("CURRENT_YEARWEEK", Field::CurrentYearweek),
];

impl LayoutTag {
    pub const KNOWN: [LayoutTag; 3] = [
        LayoutTag::Template,
        LayoutTag::EmptiesExport,
        LayoutTag::FullExport,
    ];

    /// Classify a bare filename by keyword. Case-insensitive substring match.
    pub fn classify(filename: &str) -> LayoutTag {
        let lower = filename.to_lowercase();
        LAYOUT_KEYWORDS
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
            .map(|(tag, _)| *tag)
            .unwrap_or(LayoutTag::Unrecognized)
    }

    /// Source column → canonical field. Empty for unrecognized layouts.
    pub fn column_map(self) -> &'static [(&'static str, Field)] {
        match self {
            LayoutTag::Template => TEMPLATE_COLUMNS,
            LayoutTag::EmptiesExport | LayoutTag::FullExport => EXPORT_COLUMNS,
            LayoutTag::Unrecognized => &[],
        }
    }

    /// Label written to the `Sourcetype` column.
    pub const fn label(self) -> &'static str {
        match self {
            LayoutTag::Template => "LS_Template",
            LayoutTag::EmptiesExport => "Export_Empties",
            LayoutTag::FullExport => "Export_Longstandings",
            LayoutTag::Unrecognized => "Unrecognized",
        }
    }

    pub fn from_label(label: &str) -> Option<LayoutTag> {
        LayoutTag::KNOWN
            .into_iter()
            .find(|tag| tag.label().eq_ignore_ascii_case(label.trim()))
    }
}

impl fmt::Display for LayoutTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Ignored,
    NotSpreadsheet,
    Unrecognized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileDecision {
    Accept(LayoutTag),
    Skip(SkipReason),
}

/// Decides which files in a period folder get consolidated.
#[derive(Debug, Clone)]
pub struct FileClassifier {
    ignore_files: Vec<String>,
}

impl FileClassifier {
    pub fn new(ignore_files: Vec<String>) -> Self {
        Self { ignore_files }
    }

    pub fn decide(&self, filename: &str) -> FileDecision {
        if self.ignore_files.iter().any(|f| f == filename) {
            return FileDecision::Skip(SkipReason::Ignored);
        }
        if !is_spreadsheet(filename) {
            return FileDecision::Skip(SkipReason::NotSpreadsheet);
        }
        match LayoutTag::classify(filename) {
            LayoutTag::Unrecognized => FileDecision::Skip(SkipReason::Unrecognized),
            tag => FileDecision::Accept(tag),
        }
    }

    pub fn decide_path(&self, path: &Path) -> FileDecision {
        match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => self.decide(name),
            None => FileDecision::Skip(SkipReason::NotSpreadsheet),
        }
    }
}

impl Default for FileClassifier {
    fn default() -> Self {
        Self::new(crate::config::default_ignore_files())
    }
}

/// Extension allow-list check (case-insensitive).
pub fn is_spreadsheet(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|ext| {
            SPREADSHEET_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
        .unwrap_or(false)
}

pub fn is_delimited(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false)
}
