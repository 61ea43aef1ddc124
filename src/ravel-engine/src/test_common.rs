// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Builder for small models used across the unit tests.

use crate::data_spec::DataSpec;
use crate::loader::load_tensor;
use crate::memory::Unlimited;
use crate::scope::ValueId;
use crate::state::SimulationState;
use crate::variable::{VarKind, VariableValue};

pub struct TestModel {
    state: SimulationState,
}

impl TestModel {
    pub fn new() -> Self {
        Self {
            state: SimulationState::new(),
        }
    }

    /// Add a global variable of `kind` with initial value expression `init`
    pub fn var(mut self, kind: VarKind, name: &str, init: &str) -> Self {
        self.state.add_variable(VariableValue::new(kind, name, init));
        self
    }

    pub fn constant(self, name: &str, init: &str) -> Self {
        self.var(VarKind::Constant, name, init)
    }

    pub fn parameter(self, name: &str, init: &str) -> Self {
        self.var(VarKind::Parameter, name, init)
    }

    pub fn flow(self, name: &str, init: &str) -> Self {
        self.var(VarKind::Flow, name, init)
    }

    pub fn stock(self, name: &str, init: &str) -> Self {
        self.var(VarKind::Stock, name, init)
    }

    /// Add a parameter whose literal data is loaded from `csv`, with the
    /// layout inferred
    pub fn tensor(mut self, name: &str, csv: &str) -> Self {
        let spec = DataSpec::guess(&mut csv.as_bytes()).unwrap();
        let tensor = load_tensor(&mut csv.as_bytes(), &spec, &Unlimited).unwrap();
        self.state
            .add_variable(VariableValue::new(VarKind::Parameter, name, "").with_tensor(tensor));
        self
    }

    /// Mark a global variable as computed by an equation
    pub fn defined(mut self, name: &str) -> Self {
        self.state.mark_defined(ValueId::global(name));
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.state.rng_seed = seed;
        self
    }

    pub fn build(self) -> SimulationState {
        self.state
    }
}
