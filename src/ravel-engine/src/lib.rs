// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

#![forbid(unsafe_code)]

pub use ravel_core::{common, export_err, import_err, var_err};

mod classify;
mod data_spec;
mod flow_coef;
mod inference;
mod numeric;
mod tokenizer;

pub mod arena;
pub mod eng_notation;
pub mod export;
pub mod loader;
pub mod memory;
pub mod report;
pub mod resolver;
pub mod scope;
pub mod state;
pub mod variable;

#[cfg(test)]
mod test_common;

pub use self::arena::{Pool, ValueArena, ValueHandle};
pub use self::classify::{LabelClass, classify_label};
pub use self::common::{Error, ErrorCode, ErrorKind, Result};
pub use self::data_spec::{DataSpec, DuplicateKeyAction};
pub use self::export::{export_as_csv, export_tensor};
pub use self::flow_coef::FlowCoef;
pub use self::inference::{MAX_ROWS_TO_ANALYSE, guess_separator};
pub use self::loader::load_tensor;
pub use self::memory::{ByteLimit, MemoryBudget, Unlimited};
pub use self::report::report_from_csv;
pub use self::scope::{ScopeId, ScopeTree, ValueId, uq_name};
pub use self::state::SimulationState;
pub use self::tokenizer::Tokenizer;
pub use self::variable::{VarKind, VariableValue};
pub use ravel_core::{Dimension, Hypercube, NamedDimension, TensorData, TensorValue, XVector};
