// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::fmt;
use std::{error, result};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NoError, // will never be produced
    Generic,
    Io,
    NoDataColumns,
    DuplicateKey,
    ExhaustedMemory,
    InvalidData,
    BadMetadata,
    UnknownVariable,
    CircularDefinition,
    InvalidExpression,
    InvalidAccess,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use ErrorCode::*;
        let name = match self {
            NoError => "no_error",
            Generic => "generic",
            Io => "io",
            NoDataColumns => "no_data_columns",
            DuplicateKey => "duplicate_key",
            ExhaustedMemory => "exhausted_memory",
            InvalidData => "invalid_data",
            BadMetadata => "bad_metadata",
            UnknownVariable => "unknown_variable",
            CircularDefinition => "circular_definition",
            InvalidExpression => "invalid_expression",
            InvalidAccess => "invalid_access",
        };

        write!(f, "{name}")
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Schema inference and tensor loading.
    Import,
    /// Value arena access and initial value resolution.
    Variable,
    Export,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    pub kind: ErrorKind,
    pub code: ErrorCode,
    pub details: Option<String>,
}

impl Error {
    pub fn new(kind: ErrorKind, code: ErrorCode, details: Option<String>) -> Self {
        Error {
            kind,
            code,
            details,
        }
    }

    pub fn get_details(&self) -> Option<String> {
        self.details.clone()
    }

    /// The single user facing message used for every flavour of memory
    /// exhaustion during a load.
    pub fn exhausted_memory() -> Self {
        Error::new(
            ErrorKind::Import,
            ErrorCode::ExhaustedMemory,
            Some("exhausted memory - try reducing the rank".to_owned()),
        )
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::new(ErrorKind::Import, ErrorCode::Io, Some(err.to_string()))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let kind = match self.kind {
            ErrorKind::Import => "ImportError",
            ErrorKind::Variable => "VariableError",
            ErrorKind::Export => "ExportError",
        };
        match self.details {
            Some(ref details) => write!(f, "{}{{{}: {}}}", kind, self.code, details),
            None => write!(f, "{}{{{}}}", kind, self.code),
        }
    }
}

impl error::Error for Error {}

pub type Result<T> = result::Result<T, Error>;

#[macro_export]
macro_rules! import_err {
    ($code:tt, $str:expr) => {{
        use $crate::common::{Error, ErrorCode, ErrorKind};
        Err(Error::new(ErrorKind::Import, ErrorCode::$code, Some($str)))
    }};
    ($code:tt) => {{
        use $crate::common::{Error, ErrorCode, ErrorKind};
        Err(Error::new(ErrorKind::Import, ErrorCode::$code, None))
    }};
}

#[macro_export]
macro_rules! var_err {
    ($code:tt, $str:expr) => {{
        use $crate::common::{Error, ErrorCode, ErrorKind};
        Err(Error::new(ErrorKind::Variable, ErrorCode::$code, Some($str)))
    }};
    ($code:tt) => {{
        use $crate::common::{Error, ErrorCode, ErrorKind};
        Err(Error::new(ErrorKind::Variable, ErrorCode::$code, None))
    }};
}

#[macro_export]
macro_rules! export_err {
    ($code:tt, $str:expr) => {{
        use $crate::common::{Error, ErrorCode, ErrorKind};
        Err(Error::new(ErrorKind::Export, ErrorCode::$code, Some($str)))
    }};
}

#[test]
fn test_error_display() {
    let err: Result<()> = import_err!(DuplicateKey, "Duplicate key:A".to_owned());
    let err = err.unwrap_err();
    assert_eq!(
        "ImportError{duplicate_key: Duplicate key:A}",
        format!("{err}")
    );

    let err: Result<()> = var_err!(InvalidAccess);
    assert_eq!("VariableError{invalid_access}", format!("{}", err.unwrap_err()));

    let err = Error::exhausted_memory();
    assert_eq!(ErrorCode::ExhaustedMemory, err.code);
    assert!(err.get_details().unwrap().contains("try reducing the rank"));
}

#[test]
fn test_io_error_conversion() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.csv");
    let err: Error = io.into();
    assert_eq!(ErrorKind::Import, err.kind);
    assert_eq!(ErrorCode::Io, err.code);
    assert!(err.get_details().unwrap().contains("missing.csv"));
}
