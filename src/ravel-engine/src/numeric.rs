// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Numeric field tests shared by schema inference, loading and reporting.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref LEADING_NUMBER_RE: Regex =
        Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?").unwrap();
}

/// Remove whitespace and both grouping/decimal characters.
pub(crate) fn strip_ws_and_decimal_sep(s: &str) -> String {
    s.chars()
        .filter(|&c| !c.is_whitespace() && c != ',' && c != '.')
        .collect()
}

/// Parse `s` as a whole double, optionally surrounded by one matching pair
/// of non-alphanumeric quote characters.
fn quoted_parse(s: &str) -> Option<f64> {
    let mut chars = s.chars();
    if let (Some(first), Some(last)) = (chars.next(), chars.next_back()) {
        if first == last && !first.is_alphanumeric() {
            return chars.as_str().parse().ok();
        }
    }
    s.parse().ok()
}

/// Whether `s` reads as a number.  Words such as `nan` or `inf` do not
/// count, even though `f64` parses them.
pub fn is_numerical(s: &str) -> bool {
    let s = strip_ws_and_decimal_sep(s);
    s.bytes().any(|b| b.is_ascii_digit()) && quoted_parse(&s).is_some()
}

/// The smallest field index such that every non-empty field at or after it
/// is numerical.
pub fn first_numerical(fields: &[String]) -> usize {
    fields
        .iter()
        .enumerate()
        .filter(|(_, f)| !f.is_empty() && !is_numerical(f))
        .map(|(i, _)| i + 1)
        .last()
        .unwrap_or(0)
}

/// True if every field from `start` onwards is empty.
pub fn empty_tail(fields: &[String], start: usize) -> bool {
    fields.iter().skip(start).all(|f| f.is_empty())
}

/// Canonicalise a value field: the configured decimal separator becomes
/// `.`, and whitespace and grouping characters are dropped.
pub(crate) fn normalize_value(field: &str, dec_separator: char) -> String {
    let mut s = String::with_capacity(field.len());
    for c in field.chars() {
        if c == dec_separator {
            s.push('.');
        } else if !c.is_whitespace() && c != '.' && c != ',' {
            s.push(c);
        }
    }
    s
}

/// Whether a normalised value field looks like it holds a number.
pub(crate) fn value_present(s: &str) -> bool {
    matches!(s.chars().next(), Some(c) if c.is_ascii_digit() || c == '-' || c == '+' || c == '.')
}

/// The longest numeric prefix of `s` and its length in bytes.
pub(crate) fn split_leading_f64(s: &str) -> Option<(f64, usize)> {
    let m = LEADING_NUMBER_RE.find(s)?;
    m.as_str().parse().ok().map(|v| (v, m.end()))
}

pub(crate) fn parse_leading_f64(s: &str) -> Option<f64> {
    split_leading_f64(s).map(|(v, _)| v)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_is_numerical() {
        assert!(is_numerical("12"));
        assert!(is_numerical("1,234.5"));
        assert!(is_numerical(" -3 "));
        assert!(is_numerical("1e5"));
        assert!(is_numerical("'42'"));
        assert!(is_numerical("\"42\""));
        assert!(!is_numerical("a42"));
        assert!(!is_numerical("42a"));
        assert!(!is_numerical(""));
        assert!(!is_numerical("   "));
        assert!(!is_numerical("Q1"));
        assert!(!is_numerical("nan"));
        assert!(!is_numerical("Inf"));
    }

    #[test]
    fn test_first_numerical() {
        assert_eq!(0, first_numerical(&fields(&["1", "2", "3"])));
        assert_eq!(1, first_numerical(&fields(&["AU", "2", "3"])));
        assert_eq!(2, first_numerical(&fields(&["AU", "x", "", "3"])));
        assert_eq!(3, first_numerical(&fields(&["a", "b", "c"])));
        assert_eq!(3, first_numerical(&fields(&["1", "2", "c"])));
        assert_eq!(0, first_numerical(&[]));
    }

    #[test]
    fn test_empty_tail() {
        assert!(empty_tail(&fields(&["a", "", ""]), 1));
        assert!(!empty_tail(&fields(&["a", "", "3"]), 1));
        assert!(empty_tail(&fields(&["a"]), 1));
    }

    #[test]
    fn test_normalize_value() {
        assert_eq!("1234.5", normalize_value("1,234.5", '.'));
        assert_eq!("1234.5", normalize_value("1.234,5", ','));
        assert_eq!("-7", normalize_value(" - 7 ", '.'));
        assert!(value_present("-7"));
        assert!(value_present(".5"));
        assert!(!value_present("NA"));
        assert!(!value_present(""));
    }

    #[test]
    fn test_parse_leading_f64() {
        assert_eq!(Some(1.5), parse_leading_f64("1.5"));
        assert_eq!(Some(1.5), parse_leading_f64("1.5abc"));
        assert_eq!(Some(-2e3), parse_leading_f64("-2e3"));
        assert_eq!(Some(0.25), parse_leading_f64(".25"));
        assert_eq!(None, parse_leading_f64("-"));
        assert_eq!(None, parse_leading_f64("x1"));
        assert_eq!(Some((2.0, 1)), split_leading_f64("2eye(2,2)"));
    }
}
