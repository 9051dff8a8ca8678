//! Week specification parsing: `"26"`, `"26,27"`, `"26-28"`, `"26,28-30"`.

use std::collections::BTreeSet;

/// Result of parsing a week specification. Invalid tokens are kept for reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeekSpec {
    pub weeks: BTreeSet<u32>,
    pub rejected: Vec<String>,
}

impl WeekSpec {
    /// Parse a comma-separated list of weeks and inclusive `A-B` ranges.
    ///
    /// Duplicates collapse and the result is ascending. A token that is not a
    /// number or a well-formed range is skipped with a warning; it never
    /// invalidates the other tokens.
    pub fn parse(input: &str) -> Self {
        let mut spec = WeekSpec::default();

        for part in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            match parse_token(part) {
                Some(weeks) => spec.weeks.extend(weeks),
                None => {
                    tracing::warn!(token = part, "Invalid week token skipped");
                    spec.rejected.push(part.to_string());
                }
            }
        }

        spec
    }

    /// Parse an optional week list. Absent or blank input means "no
    /// selection" (`None`), as opposed to a list that rejected every token.
    pub fn parse_optional(input: Option<&str>) -> Option<Self> {
        input.filter(|w| !w.trim().is_empty()).map(WeekSpec::parse)
    }

    pub fn is_empty(&self) -> bool {
        self.weeks.is_empty()
    }

    pub fn to_vec(&self) -> Vec<u32> {
        self.weeks.iter().copied().collect()
    }
}

fn parse_token(part: &str) -> Option<std::ops::RangeInclusive<u32>> {
    match part.split_once('-') {
        Some((start, end)) => {
            let start: u32 = start.trim().parse().ok()?;
            let end: u32 = end.trim().parse().ok()?;
            if start > end {
                return None;
            }
            Some(start..=end)
        }
        None => {
            let week: u32 = part.parse().ok()?;
            Some(week..=week)
        }
    }
}

/// Parse a year; only four-digit positive values are accepted.
pub fn parse_year(input: &str) -> Option<i32> {
    input
        .trim()
        .parse::<i32>()
        .ok()
        .filter(|y| (1000..=9999).contains(y))
}
