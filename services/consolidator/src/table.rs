//! Raw tabular input: delimited text and spreadsheet workbooks.
//!
//! Both formats are reduced to a `RawTable` of trimmed string cells with the
//! first row as header. Fully blank rows are dropped.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};

use crate::error::{ConsolidateError, Result};
use crate::layout::is_delimited;
use crate::schema::normalize_column_name;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .filter(|row| row.iter().any(|cell| !cell.is_empty()))
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { headers, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Index of the first header matching `name` (case and whitespace insensitive).
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let key = normalize_column_name(name);
        self.headers
            .iter()
            .position(|h| normalize_column_name(h) == key)
    }

    /// Names from `required` that have no matching header.
    pub fn missing_columns(&self, required: &[&str]) -> Vec<String> {
        required
            .iter()
            .filter(|name| self.column_index(name).is_none())
            .map(|name| name.to_string())
            .collect()
    }
}

/// Decode raw bytes to text: BOM first, then strict UTF-8, then Windows-1252.
pub fn decode_text(bytes: &[u8]) -> String {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let (text, _) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        return text.into_owned();
    }
    match UTF_8.decode_without_bom_handling_and_without_replacement(bytes) {
        Some(text) => text.into_owned(),
        None => {
            let (text, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
            text.into_owned()
        }
    }
}

/// Parse delimited text (comma separated, header on the first line).
pub fn parse_delimited(content: &str) -> std::result::Result<RawTable, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(record.iter().map(|c| c.to_string()).collect());
    }

    Ok(RawTable::new(headers, rows))
}

pub fn read_delimited(path: &Path) -> Result<RawTable> {
    let bytes = std::fs::read(path).map_err(|e| ConsolidateError::io(path, e))?;
    let content = decode_text(&bytes);
    parse_delimited(&content).map_err(|e| ConsolidateError::csv(path, e))
}

/// Read one worksheet. `None` reads the first sheet.
pub fn read_sheet(path: &Path, sheet: Option<&str>) -> Result<RawTable> {
    // calamine auto-detects the format: xls, xlsx, xlsm, xlsb, ods
    let mut workbook = open_workbook_auto(path).map_err(|e| ConsolidateError::Workbook {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let names = workbook.sheet_names().to_vec();
    let sheet_name = match sheet {
        Some(wanted) => names
            .iter()
            .find(|n| n.as_str() == wanted)
            .cloned()
            .ok_or_else(|| ConsolidateError::SheetNotFound {
                path: path.to_path_buf(),
                sheet: wanted.to_string(),
            })?,
        None => names.first().cloned().ok_or_else(|| ConsolidateError::Workbook {
            path: path.to_path_buf(),
            message: "workbook has no sheets".to_string(),
        })?,
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| ConsolidateError::Workbook {
            path: path.to_path_buf(),
            message: format!("failed to read sheet '{}': {}", sheet_name, e),
        })?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header) => header.iter().map(cell_text).collect(),
        None => return Ok(RawTable::default()),
    };
    let body: Vec<Vec<String>> = rows.map(|row| row.iter().map(cell_text).collect()).collect();

    Ok(RawTable::new(headers, body))
}

/// Read a file as a single table: delimited text by suffix, else the first sheet.
pub fn read_table(path: &Path) -> Result<RawTable> {
    if is_delimited(path) {
        read_delimited(path)
    } else {
        read_sheet(path, None)
    }
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        other => other.to_string().trim().to_string(),
    }
}

/// Workbooks built at test time.
#[cfg(test)]
pub(crate) mod fixtures {
    use rust_xlsxwriter::Workbook;
    use std::path::Path;

    /// Write an xlsx with one worksheet per entry, in order. Cells that parse
    /// as numbers are stored as numbers; empty strings are left blank.
    pub(crate) fn write_workbook(path: &Path, sheets: &[(&str, Vec<Vec<&str>>)]) {
        let mut workbook = Workbook::new();
        for (name, rows) in sheets {
            let sheet = workbook.add_worksheet();
            sheet.set_name(*name).unwrap();
            for (r, row) in rows.iter().enumerate() {
                for (c, value) in row.iter().enumerate() {
                    if value.is_empty() {
                        continue;
                    }
                    match value.parse::<f64>() {
                        Ok(n) => sheet.write_number(r as u32, c as u16, n).unwrap(),
                        Err(_) => sheet.write_string(r as u32, c as u16, *value).unwrap(),
                    };
                }
            }
        }
        workbook.save(path).unwrap();
    }
}
