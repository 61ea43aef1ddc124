// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use ravel_core::Dimension;

use crate::tokenizer::Tokenizer;

/// What to do when a key occurs on more than one data row.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateKeyAction {
    #[default]
    Throw,
    Sum,
    Product,
    Min,
    Max,
    Average,
}

impl DuplicateKeyAction {
    /// Fold a repeated value `v` into the stored value `prev`.  `count` is the
    /// number of duplicates already folded for this key.
    pub fn combine(self, prev: f64, v: f64, count: usize) -> f64 {
        match self {
            DuplicateKeyAction::Throw => prev,
            DuplicateKeyAction::Sum => prev + v,
            DuplicateKeyAction::Product => prev * v,
            DuplicateKeyAction::Min => {
                if v < prev {
                    v
                } else {
                    prev
                }
            }
            DuplicateKeyAction::Max => {
                if v > prev {
                    v
                } else {
                    prev
                }
            }
            DuplicateKeyAction::Average => {
                let c = count as f64;
                ((c + 1.0) * prev + v) / (c + 2.0)
            }
        }
    }
}

impl fmt::Display for DuplicateKeyAction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            DuplicateKeyAction::Throw => "throw",
            DuplicateKeyAction::Sum => "sum",
            DuplicateKeyAction::Product => "product",
            DuplicateKeyAction::Min => "min",
            DuplicateKeyAction::Max => "max",
            DuplicateKeyAction::Average => "average",
        };
        write!(f, "{name}")
    }
}

impl FromStr for DuplicateKeyAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "throw" => Ok(DuplicateKeyAction::Throw),
            "sum" => Ok(DuplicateKeyAction::Sum),
            "product" => Ok(DuplicateKeyAction::Product),
            "min" => Ok(DuplicateKeyAction::Min),
            "max" => Ok(DuplicateKeyAction::Max),
            "av" | "average" => Ok(DuplicateKeyAction::Average),
            _ => Err(format!("unknown duplicate key action '{s}'")),
        }
    }
}

/// Describes how a delimited text file maps onto axes and values.
///
/// The first `n_row_axes` lines are header material, with the column names
/// on `header_row`.  The first `n_col_axes` columns of every later line
/// hold axis labels (those listed in `dimension_cols` become axes, the
/// rest are ignored); the columns after them hold values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSpec {
    separator: char,
    escape: char,
    quote: char,
    pub dec_separator: char,
    pub header_row: usize,
    n_row_axes: usize,
    n_col_axes: usize,
    pub dimension_cols: BTreeSet<usize>,
    pub dimensions: Vec<Dimension>,
    pub dimension_names: Vec<String>,
    pub duplicate_key_action: DuplicateKeyAction,
    pub missing_value: Option<f64>,
    /// Set when the layout came from `RavelHypercube=` metadata: exactly one
    /// value column follows the axis columns.
    pub columnar: bool,
    /// Name and type of the axis synthesised from surplus header fields.
    pub horizontal_dim_name: String,
    pub horizontal_dimension: Dimension,
}

impl Default for DataSpec {
    fn default() -> Self {
        DataSpec {
            separator: ',',
            escape: '\\',
            quote: '"',
            dec_separator: '.',
            header_row: 0,
            n_row_axes: 0,
            n_col_axes: 0,
            dimension_cols: BTreeSet::new(),
            dimensions: Vec::new(),
            dimension_names: Vec::new(),
            duplicate_key_action: DuplicateKeyAction::Throw,
            missing_value: None,
            columnar: false,
            horizontal_dim_name: "?".to_owned(),
            horizontal_dimension: Dimension::String,
        }
    }
}

impl DataSpec {
    pub fn new(separator: char, escape: char, quote: char) -> Self {
        DataSpec {
            separator,
            escape,
            quote,
            ..Default::default()
        }
    }

    pub fn separator(&self) -> char {
        self.separator
    }

    pub fn escape(&self) -> char {
        self.escape
    }

    pub fn quote(&self) -> char {
        self.quote
    }

    pub(crate) fn set_separator(&mut self, separator: char) {
        self.separator = separator;
    }

    pub fn n_row_axes(&self) -> usize {
        self.n_row_axes
    }

    pub fn n_col_axes(&self) -> usize {
        self.n_col_axes
    }

    pub fn tokenizer(&self) -> Tokenizer {
        Tokenizer::new(self.separator, self.escape, self.quote)
    }

    /// The value substituted for missing cells; NaN when none is configured.
    pub fn missing_or_nan(&self) -> f64 {
        self.missing_value.unwrap_or(f64::NAN)
    }

    /// Set the header geometry, restoring the layout invariants: the header
    /// row lies within the row-axis region, and no axis column lies beyond
    /// the column-axis region.
    pub fn set_data_area(&mut self, rows: usize, cols: usize) {
        self.n_row_axes = rows;
        self.n_col_axes = cols;
        if self.header_row >= rows {
            self.header_row = rows.saturating_sub(1);
        }
        if self.dimensions.len() < cols {
            self.dimensions.resize(cols, Dimension::default());
        }
        if self.dimension_names.len() < cols {
            self.dimension_names.resize(cols, String::new());
        }
        self.dimension_cols.retain(|&c| c < cols);
    }

    /// Name of the axis held in column `col`.
    pub fn dimension_name(&self, col: usize) -> String {
        match self.dimension_names.get(col) {
            Some(name) if !name.is_empty() => name.clone(),
            _ => format!("dim{col}"),
        }
    }

    pub fn dimension(&self, col: usize) -> Dimension {
        self.dimensions.get(col).cloned().unwrap_or_default()
    }
}
