// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Streaming load of delimited text into a tensor.

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::io::BufRead;

use tracing::{debug, warn};

use ravel_core::{Dimension, Hypercube, TensorValue, XVector};

use crate::classify::label_fits;
use crate::common::{Error, Result};
use crate::data_spec::{DataSpec, DuplicateKeyAction};
use crate::import_err;
use crate::memory::MemoryBudget;
use crate::numeric::{normalize_value, parse_leading_f64, value_present};
use crate::tokenizer::read_line;

/// An axis under construction: labels in first-seen order plus a
/// label → ordinal table.
struct AxisBuilder {
    xvector: XVector,
    ordinals: HashMap<String, usize>,
}

impl AxisBuilder {
    fn new(name: String, dimension: Dimension) -> Self {
        AxisBuilder {
            xvector: XVector::new(&name, dimension),
            ordinals: HashMap::new(),
        }
    }

    fn ordinal(&mut self, label: &str) -> Result<usize> {
        if let Some(&i) = self.ordinals.get(label) {
            return Ok(i);
        }
        if !label_fits(&self.xvector.dimension, label) {
            return import_err!(
                InvalidData,
                format!(
                    "Invalid data: {} for {} dimensioned column: {}",
                    label,
                    self.xvector.dimension.type_name(),
                    self.xvector.name
                )
            );
        }
        let i = self.xvector.len();
        self.xvector.push(label.to_owned());
        self.ordinals.insert(label.to_owned(), i);
        Ok(i)
    }
}

#[derive(Copy, Clone, Debug)]
struct Cell {
    value: f64,
    // duplicates folded into value so far
    count: usize,
}

/// Accumulates cells keyed by per-axis label ordinals.
struct Accumulator<'a> {
    spec: &'a DataSpec,
    axes: Vec<AxisBuilder>,
    cells: HashMap<Vec<usize>, Cell>,
}

impl Accumulator<'_> {
    fn key_labels(&self, key: &[usize]) -> Vec<&str> {
        self.axes
            .iter()
            .zip(key)
            .map(|(axis, &i)| axis.xvector[i].as_str())
            .collect()
    }

    fn accumulate(&mut self, key: &[usize], field: &str) -> Result<()> {
        let spec = self.spec;
        let s = normalize_value(field, spec.dec_separator);
        let value = if value_present(&s) {
            parse_leading_f64(&s).or(spec.missing_value)
        } else {
            None
        };

        let Some(v) = value else {
            // an absent value only ever seeds a cell with the missing value
            if let Some(missing) = spec.missing_value {
                self.cells.entry(key.to_vec()).or_insert(Cell {
                    value: missing,
                    count: 0,
                });
            }
            return Ok(());
        };

        match self.cells.entry(key.to_vec()) {
            Entry::Vacant(e) => {
                e.insert(Cell { value: v, count: 0 });
            }
            Entry::Occupied(mut e) => {
                if spec.duplicate_key_action == DuplicateKeyAction::Throw {
                    let mut msg = "Duplicate key".to_owned();
                    for label in self.key_labels(key) {
                        msg.push(':');
                        msg.push_str(label);
                    }
                    return import_err!(DuplicateKey, msg);
                }
                let cell = e.get_mut();
                cell.value = spec.duplicate_key_action.combine(cell.value, v, cell.count);
                cell.count += 1;
            }
        }
        Ok(())
    }
}

/// Read `reader` to the end according to `spec`, building the hypercube and
/// its values.  Storage is dense when at least half the cells are
/// populated, sparse otherwise.
pub fn load_tensor(
    reader: &mut dyn BufRead,
    spec: &DataSpec,
    budget: &dyn MemoryBudget,
) -> Result<TensorValue> {
    let tokenizer = spec.tokenizer();
    let n_col_axes = spec.n_col_axes();
    let mut acc = Accumulator {
        spec,
        axes: spec
            .dimension_cols
            .iter()
            .filter(|&&col| col < n_col_axes)
            .map(|&col| AxisBuilder::new(spec.dimension_name(col), spec.dimension(col)))
            .collect(),
        cells: HashMap::new(),
    };

    // ordinals of the surplus header fields, when in tabular (wide) layout
    let mut horizontal: Option<Vec<usize>> = None;
    let mut key: Vec<usize> = Vec::with_capacity(acc.axes.len() + 1);
    let mut buf = String::new();
    let mut row = 0;
    while read_line(reader, &mut buf)? {
        let line_no = row + 1;
        let current = row;
        row += 1;

        if current < spec.n_row_axes() {
            if current == spec.header_row && !spec.columnar {
                let fields = tokenizer.tokenize(&buf);
                if fields.len() > n_col_axes + 1 {
                    let mut axis = AxisBuilder::new(
                        spec.horizontal_dim_name.clone(),
                        spec.horizontal_dimension.clone(),
                    );
                    let ordinals = fields[n_col_axes..]
                        .iter()
                        .map(|label| axis.ordinal(label))
                        .collect::<Result<Vec<_>>>()?;
                    acc.axes.push(axis);
                    horizontal = Some(ordinals);
                }
            }
            continue;
        }
        if buf.trim().is_empty() {
            continue;
        }

        let fields = tokenizer.tokenize(&buf);
        if fields.len() <= n_col_axes {
            return import_err!(NoDataColumns, format!("No data columns on line {line_no}"));
        }
        key.clear();
        let mut dim = 0;
        for (col, label) in fields[..n_col_axes].iter().enumerate() {
            if spec.dimension_cols.contains(&col) {
                key.push(acc.axes[dim].ordinal(label)?);
                dim += 1;
            }
        }

        let values = &fields[n_col_axes..];
        match &horizontal {
            Some(columns) => {
                for (field, &h) in values.iter().zip(columns) {
                    key.push(h);
                    acc.accumulate(&key, field)?;
                    key.pop();
                }
            }
            // only one value column, everything to the right is ignored
            None => acc.accumulate(&key, &values[0])?,
        }
    }

    materialize(acc, budget)
}

fn materialize(acc: Accumulator<'_>, budget: &dyn MemoryBudget) -> Result<TensorValue> {
    let Accumulator { spec, axes, cells } = acc;

    let keep: Vec<bool> = axes.iter().map(|a| !a.xvector.is_empty()).collect();
    for axis in axes.iter().filter(|a| a.xvector.is_empty()) {
        warn!(axis = %axis.xvector.name, "dropping axis with no labels");
    }
    let hypercube = Hypercube::new(
        axes.into_iter()
            .filter(|a| !a.xvector.is_empty())
            .map(|a| a.xvector)
            .collect(),
    );
    let offset = |key: &[usize]| -> usize {
        let ordinals: Vec<usize> = key
            .iter()
            .zip(&keep)
            .filter(|(_, keep)| **keep)
            .map(|(&i, _)| i)
            .collect();
        hypercube.join_offset(&ordinals)
    };

    let populated = cells.len();
    // offsets of every cell must fit in a usize, even when sparse
    let Some(total) = hypercube.checked_num_elements() else {
        warn!(
            rank = hypercube.rank(),
            log_cells = hypercube.log_num_elements(),
            "hypercube too large to address"
        );
        return Err(Error::exhausted_memory());
    };
    let dense = 2 * populated as u128 >= total as u128;
    debug!(
        rank = hypercube.rank(),
        populated,
        total,
        dense,
        "materializing tensor"
    );

    if dense {
        let bytes = total
            .checked_mul(std::mem::size_of::<f64>())
            .ok_or_else(Error::exhausted_memory)?;
        if !budget.allows(bytes) {
            return Err(Error::exhausted_memory());
        }
        let mut values: Vec<f64> = Vec::new();
        values
            .try_reserve_exact(total)
            .map_err(|_| Error::exhausted_memory())?;
        values.resize(total, spec.missing_or_nan());
        for (key, cell) in cells.iter() {
            values[offset(key)] = cell.value;
        }
        return Ok(TensorValue::dense(hypercube, values));
    }

    if !budget.allows(populated.saturating_mul(std::mem::size_of::<f64>())) {
        return Err(Error::exhausted_memory());
    }
    let values: BTreeMap<usize, f64> = cells
        .iter()
        .filter(|(_, cell)| !cell.value.is_nan())
        .map(|(key, cell)| (offset(key), cell.value))
        .collect();
    Ok(TensorValue::sparse(hypercube, values))
}

#[cfg(feature = "file_io")]
pub fn load_tensor_from_path(
    path: &std::path::Path,
    spec: &DataSpec,
    budget: &dyn MemoryBudget,
) -> Result<TensorValue> {
    let file = std::fs::File::open(path)?;
    load_tensor(&mut std::io::BufReader::new(file), spec, budget)
}
