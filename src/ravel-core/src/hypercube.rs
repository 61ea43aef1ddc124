// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The type classification of an axis.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawDimension", into = "RawDimension")]
pub enum Dimension {
    Value,
    /// A time axis, parameterised by its label format (empty: any date).
    Time(String),
    #[default]
    String,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum DimensionKind {
    String,
    Time,
    Value,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct RawDimension {
    #[serde(rename = "type")]
    kind: DimensionKind,
    #[serde(default)]
    units: String,
}

impl From<RawDimension> for Dimension {
    fn from(raw: RawDimension) -> Self {
        match raw.kind {
            DimensionKind::String => Dimension::String,
            DimensionKind::Time => Dimension::Time(raw.units),
            DimensionKind::Value => Dimension::Value,
        }
    }
}

impl From<Dimension> for RawDimension {
    fn from(dim: Dimension) -> Self {
        let (kind, units) = match dim {
            Dimension::String => (DimensionKind::String, String::new()),
            Dimension::Time(format) => (DimensionKind::Time, format),
            Dimension::Value => (DimensionKind::Value, String::new()),
        };
        RawDimension { kind, units }
    }
}

impl Dimension {
    pub fn type_name(&self) -> &'static str {
        match self {
            Dimension::Value => "value",
            Dimension::Time(_) => "time",
            Dimension::String => "string",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Dimension::Time(format) if !format.is_empty() => write!(f, "time({format})"),
            _ => write!(f, "{}", self.type_name()),
        }
    }
}

/// An axis description as carried in `RavelHypercube=` metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedDimension {
    pub name: String,
    pub dimension: Dimension,
}

/// One axis of a hypercube: a name, a type and its ordered labels.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct XVector {
    pub name: String,
    pub dimension: Dimension,
    labels: Vec<String>,
}

impl XVector {
    pub fn new(name: &str, dimension: Dimension) -> Self {
        XVector {
            name: name.to_owned(),
            dimension,
            labels: Vec::new(),
        }
    }

    pub fn with_labels(name: &str, dimension: Dimension, labels: Vec<String>) -> Self {
        XVector {
            name: name.to_owned(),
            dimension,
            labels,
        }
    }

    pub fn push(&mut self, label: String) {
        self.labels.push(label);
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn named_dimension(&self) -> NamedDimension {
        NamedDimension {
            name: self.name.clone(),
            dimension: self.dimension.clone(),
        }
    }
}

impl std::ops::Index<usize> for XVector {
    type Output = String;

    fn index(&self, i: usize) -> &String {
        &self.labels[i]
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Hypercube {
    pub xvectors: Vec<XVector>,
}

impl Hypercube {
    pub fn new(xvectors: Vec<XVector>) -> Self {
        Hypercube { xvectors }
    }

    /// A hypercube of anonymous value axes, as used by tensor generators.
    pub fn from_dims(dims: &[usize]) -> Self {
        let xvectors = dims
            .iter()
            .enumerate()
            .map(|(i, &n)| {
                let labels = (0..n).map(|j| j.to_string()).collect();
                XVector::with_labels(&i.to_string(), Dimension::Value, labels)
            })
            .collect();
        Hypercube { xvectors }
    }

    pub fn rank(&self) -> usize {
        self.xvectors.len()
    }

    pub fn dims(&self) -> Vec<usize> {
        self.xvectors.iter().map(|xv| xv.len()).collect()
    }

    /// Total cell count, or None if it does not fit in a usize.
    pub fn checked_num_elements(&self) -> Option<usize> {
        self.xvectors
            .iter()
            .try_fold(1usize, |acc, xv| acc.checked_mul(xv.len()))
    }

    pub fn num_elements(&self) -> usize {
        self.checked_num_elements().unwrap_or(usize::MAX)
    }

    pub fn log_num_elements(&self) -> f64 {
        self.xvectors.iter().map(|xv| (xv.len() as f64).ln()).sum()
    }

    pub fn named_dimensions(&self) -> Vec<NamedDimension> {
        self.xvectors.iter().map(XVector::named_dimension).collect()
    }

    /// Decompose a mixed-radix offset into per-axis label ordinals; axis 0
    /// varies fastest.
    pub fn split_offset(&self, mut offset: usize) -> Vec<usize> {
        self.xvectors
            .iter()
            .map(|xv| {
                let n = xv.len().max(1);
                let ordinal = offset % n;
                offset /= n;
                ordinal
            })
            .collect()
    }

    /// Inverse of `split_offset`.  Only meaningful when
    /// `checked_num_elements` is `Some`.
    pub fn join_offset(&self, ordinals: &[usize]) -> usize {
        self.xvectors
            .iter()
            .zip(ordinals)
            .rev()
            .fold(0, |acc, (xv, &i)| acc * xv.len() + i)
    }
}
