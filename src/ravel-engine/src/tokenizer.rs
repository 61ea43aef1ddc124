// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::io::BufRead;

use crate::common::Result;

/// Splits one physical line into fields.
///
/// The variant is picked once from a `DataSpec`'s separator: a space
/// selects whitespace collapsing, anything else a single-character
/// delimiter.  Both honour the quote character (which toggles a quoted
/// state where separators are literal) and the escape character (which
/// makes the following character literal).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Tokenizer {
    Delimited { separator: char, escape: char, quote: char },
    Whitespace { escape: char, quote: char },
}

impl Tokenizer {
    pub fn new(separator: char, escape: char, quote: char) -> Self {
        if separator == ' ' {
            Tokenizer::Whitespace { escape, quote }
        } else {
            Tokenizer::Delimited {
                separator,
                escape,
                quote,
            }
        }
    }

    pub fn tokenize(&self, line: &str) -> Vec<String> {
        let line = line.strip_suffix('\r').unwrap_or(line);
        match *self {
            Tokenizer::Delimited {
                separator,
                escape,
                quote,
            } => tokenize_delimited(line, separator, escape, quote),
            Tokenizer::Whitespace { escape, quote } => tokenize_whitespace(line, escape, quote),
        }
    }
}

fn tokenize_delimited(line: &str, separator: char, escape: char, quote: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut tok = String::new();
    let mut quoted = false;
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        if c == escape {
            if let Some(next) = chars.next() {
                tok.push(next);
            }
        } else if c == quote {
            quoted = !quoted;
        } else if c == separator && !quoted {
            fields.push(std::mem::take(&mut tok));
        } else {
            tok.push(c);
        }
    }
    fields.push(tok);
    fields
}

fn tokenize_whitespace(line: &str, escape: char, quote: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut tok = String::new();
    // a field may be present but empty, as in `""`
    let mut in_field = false;
    let mut quoted = false;
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        if c == escape {
            if let Some(next) = chars.next() {
                tok.push(next);
            }
            in_field = true;
        } else if c == quote {
            quoted = !quoted;
            in_field = true;
        } else if !quoted && c.is_whitespace() {
            if in_field {
                fields.push(std::mem::take(&mut tok));
                in_field = false;
            }
        } else {
            tok.push(c);
            in_field = true;
        }
    }
    if in_field {
        fields.push(tok);
    }
    fields
}

/// Read one physical line (without its line terminator) into `buf`,
/// replacing invalid UTF-8.  Returns false at end of input.
pub(crate) fn read_line(reader: &mut dyn BufRead, buf: &mut String) -> Result<bool> {
    let mut bytes = Vec::new();
    if reader.read_until(b'\n', &mut bytes)? == 0 {
        return Ok(false);
    }
    if bytes.last() == Some(&b'\n') {
        bytes.pop();
    }
    if bytes.last() == Some(&b'\r') {
        bytes.pop();
    }
    buf.clear();
    buf.push_str(&String::from_utf8_lossy(&bytes));
    Ok(true)
}
