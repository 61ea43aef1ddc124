// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::io::{self, Write};

use ravel_core::{Hypercube, TensorData, TensorValue};

use crate::common::{Error, ErrorCode, ErrorKind, Result};
use crate::export_err;

fn export_io(err: io::Error) -> Error {
    Error::new(ErrorKind::Export, ErrorCode::Io, Some(err.to_string()))
}

/// Quote `s` so the default tokenizer reads it back verbatim.
fn quoted(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Write a tensor in the self-describing layout that schema inference
/// recognises: an optional `"""comment"""` line, the `RavelHypercube=`
/// metadata line, a header line and one line per finite cell.
///
/// `index` holds the offset of each entry of `values` when sparse; `None`
/// means `values` is dense.
pub fn export_as_csv(
    writer: &mut dyn Write,
    hypercube: &Hypercube,
    index: Option<&[usize]>,
    values: &[f64],
    comment: &str,
) -> Result<()> {
    if let Some(index) = index.filter(|index| index.len() != values.len()) {
        return export_err!(
            InvalidData,
            format!("{} offsets for {} values", index.len(), values.len())
        );
    }

    if !comment.is_empty() {
        writeln!(writer, "\"\"\"{comment}\"\"\"").map_err(export_io)?;
    }

    let metadata = match serde_json::to_string(&hypercube.named_dimensions()) {
        Ok(json) => json,
        Err(err) => return export_err!(Generic, err.to_string()),
    };
    writeln!(writer, "{}", quoted(&format!("RavelHypercube={metadata}"))).map_err(export_io)?;

    let mut line = String::new();
    for xv in hypercube.xvectors.iter() {
        line.push_str(&quoted(&xv.name));
        line.push(',');
    }
    line.push_str("value");
    writeln!(writer, "{line}").map_err(export_io)?;

    for (i, &v) in values.iter().enumerate() {
        if !v.is_finite() {
            continue;
        }
        let offset = index.map_or(i, |index| index[i]);
        line.clear();
        for (xv, ordinal) in hypercube.xvectors.iter().zip(hypercube.split_offset(offset)) {
            line.push_str(&quoted(&xv[ordinal]));
            line.push(',');
        }
        writeln!(writer, "{line}{v}").map_err(export_io)?;
    }
    writer.flush().map_err(export_io)?;
    Ok(())
}

pub fn export_tensor(writer: &mut dyn Write, tensor: &TensorValue, comment: &str) -> Result<()> {
    match tensor.data() {
        TensorData::Dense(values) => {
            export_as_csv(writer, tensor.hypercube(), None, values, comment)
        }
        TensorData::Sparse(_) => export_as_csv(
            writer,
            tensor.hypercube(),
            Some(tensor.index().as_slice()),
            &tensor.values(),
            comment,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ravel_core::{Dimension, XVector};
    use std::collections::BTreeMap;

    fn cube() -> Hypercube {
        Hypercube::new(vec![
            XVector::with_labels(
                "country",
                Dimension::String,
                vec!["AU".to_owned(), "US".to_owned()],
            ),
            XVector::with_labels(
                "year",
                Dimension::Value,
                vec!["2000".to_owned(), "2001".to_owned()],
            ),
        ])
    }

    fn export(tensor: &TensorValue, comment: &str) -> String {
        let mut out = Vec::new();
        export_tensor(&mut out, tensor, comment).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_export_dense() {
        let t = TensorValue::dense(cube(), vec![1.0, 2.5, f64::NAN, -4.0]);
        let expected = concat!(
            "\"RavelHypercube=[{\\\"name\\\":\\\"country\\\",\\\"dimension\\\":{\\\"type\\\":\\\"string\\\",\\\"units\\\":\\\"\\\"}},",
            "{\\\"name\\\":\\\"year\\\",\\\"dimension\\\":{\\\"type\\\":\\\"value\\\",\\\"units\\\":\\\"\\\"}}]\"\n",
            "\"country\",\"year\",value\n",
            "\"AU\",\"2000\",1\n",
            "\"US\",\"2000\",2.5\n",
            "\"US\",\"2001\",-4\n",
        );
        assert_eq!(expected, export(&t, ""));
    }

    #[test]
    fn test_export_sparse_with_comment() {
        let values: BTreeMap<usize, f64> = [(2, 0.1), (3, f64::INFINITY)].into_iter().collect();
        let t = TensorValue::sparse(cube(), values);
        let out = export(&t, "from the census");
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!("\"\"\"from the census\"\"\"", lines[0]);
        assert!(lines[1].starts_with("\"RavelHypercube=["));
        assert_eq!("\"AU\",\"2001\",0.1", lines[3]);
        assert_eq!(4, lines.len());
    }

    #[test]
    fn test_export_scalar() {
        let out = export(&TensorValue::scalar(3.0), "");
        assert_eq!("\"RavelHypercube=[]\"\nvalue\n3\n", out);
    }

    #[test]
    fn test_quoted_labels_are_escaped() {
        assert_eq!(r#""say \"hi\"""#, quoted("say \"hi\""));
        assert_eq!(r#""a\\b""#, quoted("a\\b"));
    }

    #[test]
    fn test_mismatched_index() {
        let mut out = Vec::new();
        let err = export_as_csv(&mut out, &cube(), Some(&[0, 1][..]), &[1.0], "").unwrap_err();
        assert_eq!(ErrorKind::Export, err.kind);
    }

    #[test]
    fn test_empty_sparse_writes_no_cells() {
        let t = TensorValue::sparse(cube(), BTreeMap::new());
        let out = export(&t, "");
        assert_eq!(2, out.lines().count());
        assert!(out.ends_with("\"country\",\"year\",value\n"));
    }
}
