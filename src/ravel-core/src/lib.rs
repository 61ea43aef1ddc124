// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

#![forbid(unsafe_code)]

pub mod common;
pub mod hypercube;
pub mod tensor;
pub mod time;

pub use common::{Error, ErrorCode, ErrorKind, Result};
pub use hypercube::{Dimension, Hypercube, NamedDimension, XVector};
pub use tensor::{Key, TensorData, TensorValue};
