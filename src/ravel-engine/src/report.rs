// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Annotated echo of an input file, flagging the lines a load would trip
//! over.

use std::collections::BTreeMap;
use std::io::{BufRead, Write};

use ravel_core::Key;

use crate::common::Result;
use crate::data_spec::DataSpec;
use crate::numeric::is_numerical;
use crate::tokenizer::read_line;

pub const HEADER_TAG: &str = "error";
pub const MISSING_TAG: &str = "missing numerical data";
pub const INVALID_TAG: &str = "invalid numerical data";
pub const DUPLICATE_TAG: &str = "duplicate key";

/// Write each line of `reader` to `writer` prefixed with a tag and the
/// spec's separator.
///
/// Every input line appears once in the output.  Header lines, blank lines
/// and malformed rows are echoed as they are met.  The rows
/// that remain are grouped by key: rows whose key occurs more than once
/// come first, tagged `duplicate key`, followed by the clean rows with an
/// empty tag.  Both groups are ordered by key.
pub fn report_from_csv(
    reader: &mut dyn BufRead,
    writer: &mut dyn Write,
    spec: &DataSpec,
) -> Result<()> {
    let tokenizer = spec.tokenizer();
    let sep = spec.separator();
    let n_col_axes = spec.n_col_axes();
    let mut rows: BTreeMap<Key, Vec<String>> = BTreeMap::new();

    let mut buf = String::new();
    let mut row = 0;
    while read_line(reader, &mut buf)? {
        let current = row;
        row += 1;

        if current < spec.n_row_axes() {
            writeln!(writer, "{HEADER_TAG}{sep}{buf}")?;
            continue;
        }
        if buf.trim().is_empty() {
            // a blank row has no value column when there are key columns
            let tag = if n_col_axes > 0 { MISSING_TAG } else { "" };
            writeln!(writer, "{tag}{sep}{buf}")?;
            continue;
        }

        let fields = tokenizer.tokenize(&buf);
        if fields.len() <= n_col_axes {
            writeln!(writer, "{MISSING_TAG}{sep}{buf}")?;
            continue;
        }
        let key: Key = fields[..n_col_axes]
            .iter()
            .enumerate()
            .filter(|(col, _)| spec.dimension_cols.contains(col))
            .map(|(_, label)| label.clone())
            .collect();

        let checked = if spec.columnar { 1 } else { fields.len() - n_col_axes };
        let invalid = fields[n_col_axes..]
            .iter()
            .take(checked)
            .any(|f| !f.is_empty() && !is_numerical(f));
        if invalid {
            writeln!(writer, "{INVALID_TAG}{sep}{buf}")?;
            continue;
        }

        rows.entry(key).or_default().push(buf.clone());
    }

    for lines in rows.values().filter(|lines| lines.len() > 1) {
        for line in lines {
            writeln!(writer, "{DUPLICATE_TAG}{sep}{line}")?;
        }
    }
    for lines in rows.values().filter(|lines| lines.len() == 1) {
        writeln!(writer, "{sep}{}", lines[0])?;
    }
    writer.flush()?;
    Ok(())
}
