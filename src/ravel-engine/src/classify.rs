// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use ravel_core::time::{self, QUARTER_FORMAT};
use ravel_core::Dimension;

use crate::numeric::is_numerical;

/// Outcome of trial-parsing a sample axis label.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LabelClass {
    Numeric,
    QuarterDate,
    Date,
    String,
}

impl LabelClass {
    pub fn dimension(self) -> Dimension {
        match self {
            LabelClass::Numeric => Dimension::Value,
            LabelClass::QuarterDate => Dimension::Time(QUARTER_FORMAT.to_owned()),
            LabelClass::Date => Dimension::Time(String::new()),
            LabelClass::String => Dimension::String,
        }
    }
}

type Classifier = fn(&str) -> Option<LabelClass>;

fn numeric(label: &str) -> Option<LabelClass> {
    is_numerical(label).then_some(LabelClass::Numeric)
}

fn quarter_date(label: &str) -> Option<LabelClass> {
    time::parse_time(QUARTER_FORMAT, label).map(|_| LabelClass::QuarterDate)
}

fn date(label: &str) -> Option<LabelClass> {
    time::parse_date(label).map(|_| LabelClass::Date)
}

// tried in order, first match wins
const CLASSIFIERS: [Classifier; 3] = [numeric, quarter_date, date];

pub fn classify_label(label: &str) -> LabelClass {
    CLASSIFIERS
        .iter()
        .find_map(|classify| classify(label))
        .unwrap_or(LabelClass::String)
}

/// Whether `label` is a legal element of an axis of type `dim`.
pub fn label_fits(dim: &Dimension, label: &str) -> bool {
    match dim {
        Dimension::Value => is_numerical(label),
        Dimension::Time(format) => time::parse_time(format, label).is_some(),
        Dimension::String => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_label() {
        assert_eq!(LabelClass::Numeric, classify_label("1990"));
        assert_eq!(LabelClass::Numeric, classify_label("1,000.5"));
        assert_eq!(LabelClass::QuarterDate, classify_label("1990-Q1"));
        assert_eq!(LabelClass::Date, classify_label("1990-01-31"));
        assert_eq!(LabelClass::String, classify_label("Australia"));
        assert_eq!(LabelClass::String, classify_label(""));
    }

    #[test]
    fn test_label_dimensions() {
        assert_eq!(Dimension::Value, LabelClass::Numeric.dimension());
        assert_eq!(
            Dimension::Time("%Y-Q%Q".to_owned()),
            LabelClass::QuarterDate.dimension()
        );
        assert_eq!(Dimension::Time(String::new()), LabelClass::Date.dimension());
        assert_eq!(Dimension::String, LabelClass::String.dimension());
    }

    #[test]
    fn test_label_fits() {
        assert!(label_fits(&Dimension::Value, "3.5"));
        assert!(!label_fits(&Dimension::Value, "three"));
        let quarters = Dimension::Time("%Y-Q%Q".to_owned());
        assert!(label_fits(&quarters, "1990-Q2"));
        assert!(!label_fits(&quarters, "1990-06-01"));
        assert!(label_fits(&Dimension::Time(String::new()), "1990-06-01"));
        assert!(label_fits(&Dimension::String, "anything"));
    }
}
