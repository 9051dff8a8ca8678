//! Free-text "age in days" normalization.
//!
//! Source reports carry the age of a longstanding container as anything from a
//! plain number to "29 to 35 days". This module reduces such values to a
//! single scalar: ranges become their mean, otherwise the first embedded
//! integer is used.
//!
//! Normalization is DETERMINISTIC and never fails: unusable input is `None`.

use once_cell::sync::Lazy;
use regex::Regex;

/// Range patterns, tried in this order. First match wins.
static RANGE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"([0-9]+)\s*to\s*([0-9]+)",
        r"([0-9]+)\s*-\s*([0-9]+)",
        r"([0-9]+)\s*–\s*([0-9]+)",
        r"([0-9]+)\s*~\s*([0-9]+)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("range pattern is valid"))
    .collect()
});

static SINGLE_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9]+").expect("number pattern is valid"));

/// Normalize a textual days value.
///
/// ```
/// use consolidator::days::normalize_days;
/// assert_eq!(normalize_days("29 to 35 days"), Some(32.0));
/// assert_eq!(normalize_days("20-25"), Some(22.5));
/// assert_eq!(normalize_days("25 days"), Some(25.0));
/// assert_eq!(normalize_days("n/a"), None);
/// ```
pub fn normalize_days(raw: &str) -> Option<f64> {
    let text = raw.trim().to_lowercase();
    if text.is_empty() {
        return None;
    }

    for pattern in RANGE_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(&text) {
            let start: f64 = caps[1].parse().ok()?;
            let end: f64 = caps[2].parse().ok()?;
            return Some((start + end) / 2.0);
        }
    }

    SINGLE_NUMBER
        .find(&text)
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Render a normalized value for a CSV cell. `None` is the empty string.
pub fn format_days(value: Option<f64>) -> String {
    match value {
        Some(v) if v.fract() == 0.0 => format!("{:.1}", v),
        Some(v) => v.to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // RANGE TESTS
    // -------------------------------------------------------------------------

    #[test]
    fn test_range_to_keyword() {
        assert_eq!(normalize_days("29 to 35 days"), Some(32.0));
        assert_eq!(normalize_days("29to35"), Some(32.0));
    }

    #[test]
    fn test_range_hyphen_half_integer() {
        assert_eq!(normalize_days("20-25"), Some(22.5));
        assert_eq!(normalize_days("20 - 25 days"), Some(22.5));
    }

    #[test]
    fn test_range_en_dash() {
        assert_eq!(normalize_days("15–20"), Some(17.5));
    }

    #[test]
    fn test_range_tilde() {
        assert_eq!(normalize_days("10 ~ 14"), Some(12.0));
    }

    #[test]
    fn test_range_mean_is_exact() {
        for (a, b) in [(0u32, 0u32), (1, 2), (7, 100), (45, 46), (120, 365)] {
            for sep in [" to ", "-", "–", "~"] {
                let text = format!("{}{}{}", a, sep, b);
                assert_eq!(
                    normalize_days(&text),
                    Some((a as f64 + b as f64) / 2.0),
                    "input {:?}",
                    text
                );
            }
        }
    }

    #[test]
    fn test_first_range_pattern_wins() {
        // "to" is tried before "-", so the hyphenated pair is ignored
        assert_eq!(normalize_days("1-3 or 10 to 20"), Some(15.0));
    }

    #[test]
    fn test_range_is_case_insensitive() {
        assert_eq!(normalize_days("  30 TO 40 Days "), Some(35.0));
    }

    // -------------------------------------------------------------------------
    // SINGLE NUMBER TESTS
    // -------------------------------------------------------------------------

    #[test]
    fn test_single_number() {
        assert_eq!(normalize_days("30"), Some(30.0));
        assert_eq!(normalize_days("25 days"), Some(25.0));
        assert_eq!(normalize_days("more than 90"), Some(90.0));
    }

    #[test]
    fn test_two_numbers_without_separator_use_first() {
        assert_eq!(normalize_days("30 days / 45 days"), Some(30.0));
        assert_eq!(normalize_days("12 and 18"), Some(12.0));
    }

    #[test]
    fn test_decimal_text_uses_integer_part() {
        assert_eq!(normalize_days("30.5"), Some(30.0));
    }

    // -------------------------------------------------------------------------
    // UNDEFINED INPUT TESTS
    // -------------------------------------------------------------------------

    #[test]
    fn test_empty_is_none() {
        assert_eq!(normalize_days(""), None);
        assert_eq!(normalize_days("   "), None);
    }

    #[test]
    fn test_non_numeric_is_none() {
        assert_eq!(normalize_days("n/a"), None);
        assert_eq!(normalize_days("unknown"), None);
        assert_eq!(normalize_days("-"), None);
    }

    // -------------------------------------------------------------------------
    // FORMATTING TESTS
    // -------------------------------------------------------------------------

    #[test]
    fn test_format_days() {
        assert_eq!(format_days(Some(32.0)), "32.0");
        assert_eq!(format_days(Some(22.5)), "22.5");
        assert_eq!(format_days(None), "");
    }
}
