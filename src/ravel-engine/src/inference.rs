// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Schema inference: guessing a `DataSpec` from a sample of the input.

use std::io::BufRead;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use ravel_core::NamedDimension;

use crate::classify::classify_label;
use crate::common::Result;
use crate::data_spec::DataSpec;
use crate::import_err;
use crate::numeric::{empty_tail, first_numerical};
use crate::tokenizer::read_line;

/// Number of leading lines sampled when guessing a spec.
pub const MAX_ROWS_TO_ANALYSE: usize = 100;

lazy_static! {
    static ref RAVEL_METADATA_RE: Regex = Regex::new(r"^RavelHypercube=(.*)$").unwrap();
}

fn sample_lines(reader: &mut dyn BufRead) -> Result<Vec<String>> {
    let mut lines = Vec::new();
    let mut buf = String::new();
    while lines.len() < MAX_ROWS_TO_ANALYSE && read_line(reader, &mut buf)? {
        lines.push(buf.clone());
    }
    Ok(lines)
}

/// Pick the separator occurring on (nearly) every sampled line.  A space
/// means "collapse whitespace".
pub fn guess_separator(lines: &[String]) -> char {
    let (mut commas, mut semicolons, mut tabs) = (0usize, 0usize, 0usize);
    for c in lines.iter().flat_map(|l| l.chars()) {
        match c {
            ',' => commas += 1,
            ';' => semicolons += 1,
            '\t' => tabs += 1,
            _ => {}
        }
    }

    let threshold = 0.9 * lines.len() as f64;
    if commas as f64 > threshold && commas > semicolons && commas > tabs {
        ','
    } else if semicolons as f64 > threshold && semicolons > tabs {
        ';'
    } else if tabs as f64 > threshold {
        '\t'
    } else {
        ' '
    }
}

impl DataSpec {
    /// Guess a complete spec from the leading lines of `reader`.
    pub fn guess(reader: &mut dyn BufRead) -> Result<DataSpec> {
        let mut spec = DataSpec::default();
        spec.guess_from_stream(reader)?;
        Ok(spec)
    }

    #[cfg(feature = "file_io")]
    pub fn guess_from_path(path: &std::path::Path) -> Result<DataSpec> {
        let file = std::fs::File::open(path)?;
        DataSpec::guess(&mut std::io::BufReader::new(file))
    }

    /// Guess separator, header geometry and axis types, keeping the
    /// configured escape/quote characters and value handling options.
    pub fn guess_from_stream(&mut self, reader: &mut dyn BufRead) -> Result<()> {
        let lines = sample_lines(reader)?;
        let separator = guess_separator(&lines);
        self.guess_remainder_from_lines(&lines, separator)?;
        if !self.columnar {
            self.guess_dimensions_from_lines(&lines);
        }
        debug!(
            separator = ?self.separator(),
            n_row_axes = self.n_row_axes(),
            n_col_axes = self.n_col_axes(),
            header_row = self.header_row,
            columnar = self.columnar,
            "inferred data spec"
        );
        Ok(())
    }

    /// Given the separator, guess the header geometry.
    pub fn given_separator_guess_remainder(
        &mut self,
        reader: &mut dyn BufRead,
        separator: char,
    ) -> Result<()> {
        let lines = sample_lines(reader)?;
        self.guess_remainder_from_lines(&lines, separator)
    }

    /// Classify each axis column from the first data row, and take axis
    /// names from the header row.
    pub fn guess_dimensions_from_stream(&mut self, reader: &mut dyn BufRead) -> Result<()> {
        let lines = sample_lines(reader)?;
        self.guess_dimensions_from_lines(&lines);
        Ok(())
    }

    fn guess_remainder_from_lines(&mut self, lines: &[String], separator: char) -> Result<()> {
        self.set_separator(separator);
        self.columnar = false;
        self.dimension_cols.clear();
        self.dimensions.clear();
        self.dimension_names.clear();

        let tokenizer = self.tokenizer();
        let mut starts: Vec<usize> = Vec::with_capacity(lines.len());
        let mut n_cols = 0;
        let mut first_empty = None;
        let mut n_row_axes = 0;

        for (row, buf) in lines.iter().enumerate() {
            let line = tokenizer.tokenize(buf);
            if let Some(caps) = line.first().and_then(|f| RAVEL_METADATA_RE.captures(f)) {
                return self.populate_from_ravel_metadata(&caps[1], row);
            }
            let start = first_numerical(&line);
            starts.push(start);
            n_cols = n_cols.max(line.len());
            if !line.is_empty() && start == line.len() {
                // no numeric tail: a candidate header line
                n_row_axes = row;
            }
            if first_empty.is_none() && start < n_cols && empty_tail(&line, start) {
                first_empty = Some(row);
            }
        }

        if starts.is_empty() {
            self.set_data_area(0, 0);
            return Ok(());
        }

        // header lines are those whose numeric tail starts later than average
        let average = starts.iter().sum::<usize>() as f64 / starts.len() as f64;
        while n_row_axes < starts.len() && starts[n_row_axes] as f64 > average {
            n_row_axes += 1;
        }
        let n_col_axes = starts[n_row_axes.min(starts.len())..]
            .iter()
            .copied()
            .max()
            .unwrap_or(0);

        // more than one value column: assume a single header line
        if n_row_axes == 0 && n_cols.saturating_sub(n_col_axes) > 1 {
            n_row_axes = 1;
        }
        // allow for a line of column axis labels after the header
        if first_empty == Some(n_row_axes) {
            n_row_axes += 1;
        }

        self.header_row = n_row_axes.saturating_sub(1);
        self.set_data_area(n_row_axes, n_col_axes);
        self.dimension_cols = (0..n_col_axes).collect();
        Ok(())
    }

    fn guess_dimensions_from_lines(&mut self, lines: &[String]) {
        let tokenizer = self.tokenizer();
        let tokenize = |row: usize| -> Vec<String> {
            lines
                .get(row)
                .map(|l| tokenizer.tokenize(l))
                .unwrap_or_default()
        };

        self.dimension_names = if self.n_row_axes() > 0 {
            tokenize(self.header_row)
        } else {
            Vec::new()
        };
        let data = tokenize(self.n_row_axes());
        self.dimensions = (0..self.n_col_axes())
            .map(|col| {
                data.get(col)
                    .map(|label| classify_label(label).dimension())
                    .unwrap_or_default()
            })
            .collect();
    }

    /// Take the layout from a `RavelHypercube=` metadata line found at
    /// `row`: the header line follows it and data starts after that.
    pub fn populate_from_ravel_metadata(&mut self, metadata: &str, row: usize) -> Result<()> {
        let axes: Vec<NamedDimension> = match serde_json::from_str(metadata) {
            Ok(axes) => axes,
            Err(err) => {
                return import_err!(
                    BadMetadata,
                    format!("invalid RavelHypercube metadata on line {}: {err}", row + 1)
                );
            }
        };
        self.columnar = true;
        self.header_row = row + 1;
        self.dimension_names.clear();
        self.dimensions.clear();
        self.set_data_area(row + 2, axes.len());
        self.dimension_names = axes.iter().map(|a| a.name.clone()).collect();
        self.dimensions = axes.into_iter().map(|a| a.dimension).collect();
        self.dimension_cols = (0..self.n_col_axes()).collect();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ravel_core::Dimension;

    fn guess(text: &str) -> DataSpec {
        DataSpec::guess(&mut text.as_bytes()).unwrap()
    }

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(|l| l.to_owned()).collect()
    }

    #[test]
    fn test_guess_separator() {
        assert_eq!(',', guess_separator(&lines("a,b\n1,2\n3,4")));
        assert_eq!(';', guess_separator(&lines("a;b\n1;2\n3;4")));
        assert_eq!('\t', guess_separator(&lines("a\tb\n1\t2\n3\t4")));
        assert_eq!(' ', guess_separator(&lines("a b\n1 2\n3 4")));
        // semicolon separated with decimal commas
        assert_eq!(';', guess_separator(&lines("a;b;c\n1,5;2,5;3\n3;4,1;5")));
        assert_eq!(' ', guess_separator(&[]));
    }

    #[test]
    fn test_single_numeric_column() {
        let spec = guess("1\n2\n3\n");
        assert_eq!(0, spec.n_row_axes());
        assert_eq!(0, spec.n_col_axes());
        assert_eq!(0, spec.header_row);
        assert!(spec.dimension_cols.is_empty());
    }

    #[test]
    fn test_long_format() {
        let spec = guess("country,sex,value\nAU,M,1\nAU,F,2\nUS,M,3\nUS,F,4\n");
        assert_eq!(',', spec.separator());
        assert_eq!(1, spec.n_row_axes());
        assert_eq!(2, spec.n_col_axes());
        assert_eq!(0, spec.header_row);
        assert_eq!(vec![0, 1], spec.dimension_cols.iter().copied().collect::<Vec<_>>());
        assert_eq!(vec!["country", "sex", "value"], spec.dimension_names);
        assert_eq!(vec![Dimension::String, Dimension::String], spec.dimensions);
    }

    #[test]
    fn test_wide_format() {
        let spec = guess("country;2000;2001;2002\nAU;1;2;3\nUS;4;5;6\nNZ;7;8;9\n");
        assert_eq!(';', spec.separator());
        assert_eq!(1, spec.n_row_axes());
        assert_eq!(1, spec.n_col_axes());
        assert_eq!(0, spec.header_row);
    }

    #[test]
    fn test_dimension_types() {
        let spec = guess("date,when,region,v\n2001-Q1,2001-01-01,north,1\n2001-Q2,2001-04-01,south,2\n");
        assert_eq!(3, spec.n_col_axes());
        assert_eq!(
            vec![
                Dimension::Time("%Y-Q%Q".to_owned()),
                Dimension::Time(String::new()),
                Dimension::String
            ],
            spec.dimensions
        );
    }

    #[test]
    fn test_whitespace_separated() {
        let spec = guess("name   value\nalpha  1.5\nbeta   2.5\n");
        assert_eq!(' ', spec.separator());
        assert_eq!(1, spec.n_row_axes());
        assert_eq!(1, spec.n_col_axes());
        assert_eq!(vec!["name", "value"], spec.dimension_names);
    }

    #[test]
    fn test_ravel_metadata_takes_priority() {
        let text = concat!(
            "\"RavelHypercube=[{\\\"name\\\":\\\"country\\\",\\\"dimension\\\":{\\\"type\\\":\\\"string\\\",\\\"units\\\":\\\"\\\"}},",
            "{\\\"name\\\":\\\"year\\\",\\\"dimension\\\":{\\\"type\\\":\\\"value\\\",\\\"units\\\":\\\"\\\"}}]\"\n",
            "\"country\",\"year\",value\n",
            "\"AU\",\"2000\",1\n",
        );
        let spec = guess(text);
        assert!(spec.columnar);
        assert_eq!(1, spec.header_row);
        assert_eq!(2, spec.n_row_axes());
        assert_eq!(2, spec.n_col_axes());
        assert_eq!(vec!["country", "year"], spec.dimension_names);
        assert_eq!(vec![Dimension::String, Dimension::Value], spec.dimensions);
    }

    #[test]
    fn test_ravel_metadata_after_comment() {
        let text = "\"\"\"a comment\"\"\"\n\"RavelHypercube=[]\"\n\"\",value\n1\n";
        let spec = guess(text);
        assert!(spec.columnar);
        assert_eq!(2, spec.header_row);
        assert_eq!(3, spec.n_row_axes());
        assert_eq!(0, spec.n_col_axes());
    }

    #[test]
    fn test_bad_ravel_metadata() {
        let err = DataSpec::guess(&mut "RavelHypercube=[{\n1\n".as_bytes()).unwrap_err();
        assert_eq!(crate::common::ErrorCode::BadMetadata, err.code);
    }

    #[test]
    fn test_guess_keeps_value_options() {
        let mut spec = DataSpec::default();
        spec.missing_value = Some(0.0);
        spec.dec_separator = ',';
        spec.guess_from_stream(&mut "a;b\nx;1,5\ny;2,5\n".as_bytes())
            .unwrap();
        assert_eq!(';', spec.separator());
        assert_eq!(Some(0.0), spec.missing_value);
        assert_eq!(',', spec.dec_separator);
    }

    #[test]
    fn test_given_separator_then_dimensions() {
        let text = "k;v\na;1\nb;2\n";
        let mut spec = DataSpec::default();
        spec.given_separator_guess_remainder(&mut text.as_bytes(), ';')
            .unwrap();
        assert_eq!(';', spec.separator());
        assert_eq!(1, spec.n_row_axes());
        assert_eq!(1, spec.n_col_axes());
        assert_eq!(0, spec.header_row);
        assert!(spec.dimension_names.is_empty());

        spec.guess_dimensions_from_stream(&mut text.as_bytes())
            .unwrap();
        assert_eq!(vec!["k", "v"], spec.dimension_names);
        assert_eq!(vec![Dimension::String], spec.dimensions);
    }

    #[test]
    fn test_column_axis_label_line() {
        // `region,,` has labels but no values: an extra header line
        let text = "country,2000,2001\nregion,,\nAU,1,2\nUS,3,4\n";
        let mut spec = DataSpec::default();
        spec.given_separator_guess_remainder(&mut text.as_bytes(), ',')
            .unwrap();
        assert_eq!(2, spec.n_row_axes());
        assert_eq!(1, spec.n_col_axes());
        assert_eq!(1, spec.header_row);

        spec.guess_dimensions_from_stream(&mut text.as_bytes())
            .unwrap();
        assert_eq!(vec!["region", "", ""], spec.dimension_names);
        assert_eq!(vec![Dimension::String], spec.dimensions);

        // without it, only the first line is a header
        let spec = guess("country,2000,2001\nAU,1,2\nUS,3,4\n");
        assert_eq!(1, spec.n_row_axes());
        assert_eq!(0, spec.header_row);
    }

    #[test]
    fn test_empty_input() {
        let spec = guess("");
        assert_eq!(0, spec.n_row_axes());
        assert_eq!(0, spec.n_col_axes());
    }
}
