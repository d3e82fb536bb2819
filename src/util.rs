// Utility helpers for parsing, rounding and console formatting.
//
// This module centralizes all the "dirty" number handling so the rest of
// the code can assume clean, typed values.
use num_format::{Locale, ToFormattedString};

/// Parse a spreadsheet cell into `f64`, falling back to `0.0` for anything
/// that is missing, blank, or not a number.
///
/// Audited companies supply messy sheets; a bad cell must never abort the
/// whole analysis. Thousands separators like `","` are stripped before
/// parsing.
pub fn parse_numeric_or_zero(s: &str) -> f64 {
    let s = s.trim();
    if s.is_empty() {
        return 0.0;
    }
    let s = s.replace(',', "");
    s.parse::<f64>().unwrap_or(0.0)
}

/// Round a quantity to 4 decimal places, the precision carried by every
/// tonnage column in the portal tables.
pub fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}

/// Round a percentage to 2 decimal places.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Compute the financial year following `fy` for a `"YYYY-YY"`-shaped
/// string, e.g. `"2024-25"` becomes `"2025-26"`.
///
/// When the string does not parse as two integers, fall back to the literal
/// `"{fy} (Next)"` so the report still labels its target column.
pub fn next_financial_year(fy: &str) -> String {
    let fy = fy.trim();
    if let Some((start, end)) = fy.split_once('-') {
        if let (Ok(start), Ok(end)) = (start.trim().parse::<i64>(), end.trim().parse::<i64>()) {
            return format!("{}-{:02}", start + 1, end + 1);
        }
    }
    format!("{} (Next)", fy)
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimal places plus locale-aware thousands separators
    // (e.g. `1,234,567.89`), used for console diagnostics only.
    let neg = n.is_sign_negative();
    let abs_n = n.abs();
    let s = format!("{:.*}", decimals, abs_n);
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    } else if decimals > 0 {
        res.push('.');
        res.push_str(&"0".repeat(decimals));
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Thin wrapper around `num-format` for counts in console messages
    // (e.g. `9,855 rows loaded`).
    n.to_formatted_string(&Locale::en)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_parsing_is_forgiving() {
        assert_eq!(parse_numeric_or_zero("12.5"), 12.5);
        assert_eq!(parse_numeric_or_zero(" 1,250.75 "), 1250.75);
        assert_eq!(parse_numeric_or_zero(""), 0.0);
        assert_eq!(parse_numeric_or_zero("n/a"), 0.0);
        assert_eq!(parse_numeric_or_zero("12 tons"), 0.0);
    }

    #[test]
    fn rounding_precision() {
        assert_eq!(round4(1.23456789), 1.2346);
        assert_eq!(round4(10.0), 10.0);
        assert_eq!(round2(33.333333), 33.33);
        assert_eq!(round2(10.126), 10.13);
    }

    #[test]
    fn financial_year_increments() {
        assert_eq!(next_financial_year("2024-25"), "2025-26");
        assert_eq!(next_financial_year("2008-09"), "2009-10");
        assert_eq!(next_financial_year(" 2022-23 "), "2023-24");
    }

    #[test]
    fn financial_year_fallback_for_odd_formats() {
        assert_eq!(next_financial_year("FY24"), "FY24 (Next)");
        assert_eq!(next_financial_year("2024-Q1"), "2024-Q1 (Next)");
    }
}
