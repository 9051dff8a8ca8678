//! Canonical output schema shared by every source layout.

use std::fmt;

/// One column of the canonical schema. The declaration order is the output column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    CurrentYearweek,
    ActlocCountry,
    ContType,
    Days,
    Move,
    ShipmentNumber,
    Week,
    Source,
    DaysSinceGatedOut,
    ActlocCountryLabel,
    ContainerType,
    Process,
    Sourcetype,
    EmailType,
}

pub const FIELD_COUNT: usize = 14;

impl Field {
    pub const ALL: [Field; FIELD_COUNT] = [
        Field::CurrentYearweek,
        Field::ActlocCountry,
        Field::ContType,
        Field::Days,
        Field::Move,
        Field::ShipmentNumber,
        Field::Week,
        Field::Source,
        Field::DaysSinceGatedOut,
        Field::ActlocCountryLabel,
        Field::ContainerType,
        Field::Process,
        Field::Sourcetype,
        Field::EmailType,
    ];

    /// Header text as written to the master file.
    pub const fn header(self) -> &'static str {
        match self {
            Field::CurrentYearweek => "CURRENT_YEARWEEK",
            Field::ActlocCountry => "ACTLOC_COUNTRY",
            Field::ContType => "CONT_TYPE",
            Field::Days => "DAYS",
            Field::Move => "MOVE",
            Field::ShipmentNumber => "SHIPMENT_NUMBER",
            Field::Week => "Week",
            Field::Source => "Source",
            Field::DaysSinceGatedOut => "Days since Gated Out",
            Field::ActlocCountryLabel => "ACTLOC Country",
            Field::ContainerType => "Container Type",
            Field::Process => "Process",
            Field::Sourcetype => "Sourcetype",
            Field::EmailType => "Email Type",
        }
    }

    pub fn from_header(header: &str) -> Option<Field> {
        let key = normalize_column_name(header);
        Field::ALL
            .into_iter()
            .find(|f| normalize_column_name(f.header()) == key)
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

/// Header row of the master file.
pub fn headers() -> Vec<&'static str> {
    Field::ALL.iter().map(|f| f.header()).collect()
}

/// Column-name comparison key: trimmed, lowercase, inner whitespace collapsed.
pub fn normalize_column_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// A row conforming to the canonical schema.
///
/// Every field always has a value; unmapped fields are the empty string.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CanonicalRecord {
    cells: [String; FIELD_COUNT],
}

impl CanonicalRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: Field) -> &str {
        &self.cells[field.index()]
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        self.cells[field.index()] = value.into();
    }

    pub fn with(mut self, field: Field, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    /// The normalized DAYS value, if it holds a number.
    pub fn days(&self) -> Option<f64> {
        self.get(Field::Days)
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|d| d.is_finite())
    }

    pub fn week(&self) -> &str {
        self.get(Field::Week)
    }

    /// Cells in schema order, ready for a CSV writer.
    pub fn cells(&self) -> &[String] {
        &self.cells
    }

    /// Build a record from a CSV row whose header may be in any order.
    /// Unknown columns are dropped and missing ones stay empty.
    pub fn from_row(columns: &[Option<Field>], row: &csv::StringRecord) -> Self {
        let mut record = Self::new();
        for (field, value) in columns.iter().zip(row.iter()) {
            if let Some(field) = field {
                record.set(*field, value);
            }
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_order() {
        assert_eq!(
            headers(),
            vec![
                "CURRENT_YEARWEEK",
                "ACTLOC_COUNTRY",
                "CONT_TYPE",
                "DAYS",
                "MOVE",
                "SHIPMENT_NUMBER",
                "Week",
                "Source",
                "Days since Gated Out",
                "ACTLOC Country",
                "Container Type",
                "Process",
                "Sourcetype",
                "Email Type",
            ]
        );
    }

    #[test]
    fn test_field_index_matches_all_order() {
        for (i, field) in Field::ALL.iter().enumerate() {
            assert_eq!(field.index(), i);
            assert_eq!(field.to_string(), field.header());
        }
    }

    #[test]
    fn test_from_header_is_case_and_space_insensitive() {
        assert_eq!(Field::from_header(" week "), Some(Field::Week));
        assert_eq!(
            Field::from_header("days  since gated   out"),
            Some(Field::DaysSinceGatedOut)
        );
        assert_eq!(Field::from_header("Unnamed: 0"), None);
    }

    #[test]
    fn test_new_record_is_all_empty() {
        let record = CanonicalRecord::new();
        assert_eq!(record.cells().len(), FIELD_COUNT);
        assert!(record.cells().iter().all(String::is_empty));
        assert_eq!(record.days(), None);
    }

    #[test]
    fn test_from_row_reorders_and_drops_unknown() {
        let columns = vec![Some(Field::Week), None, Some(Field::ShipmentNumber)];
        let row = csv::StringRecord::from(vec!["26", "ignored", "S1"]);
        let record = CanonicalRecord::from_row(&columns, &row);
        assert_eq!(record.week(), "26");
        assert_eq!(record.get(Field::ShipmentNumber), "S1");
        assert_eq!(record.get(Field::ActlocCountry), "");
    }
}
