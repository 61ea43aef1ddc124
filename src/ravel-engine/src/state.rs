// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{BufRead, Write};

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::debug;

use ravel_core::{Dimension, TensorValue};

use crate::arena::{Pool, ValueArena};
use crate::common::Result;
use crate::data_spec::DataSpec;
use crate::export::{export_as_csv, export_tensor};
use crate::loader::load_tensor;
use crate::memory::MemoryBudget;
use crate::resolver::Resolver;
use crate::scope::{ScopeId, ScopeTree, ValueId};
use crate::var_err;
use crate::variable::VariableValue;

/// Everything a model's values live in: the value arena, the variable
/// table, the scope tree and model level settings consulted on reset.
#[derive(Clone, Debug, Default)]
pub struct SimulationState {
    arena: ValueArena,
    variables: BTreeMap<ValueId, VariableValue>,
    scopes: ScopeTree,
    /// Axis types that override those of loaded data, by axis name.
    pub dimensions: BTreeMap<String, Dimension>,
    /// Values computed by an equation rather than initialised.
    defined: BTreeSet<ValueId>,
    /// Seed for the `rand` generator; every reset starts from it.
    pub rng_seed: u64,
}

impl SimulationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arena(&self) -> &ValueArena {
        &self.arena
    }

    pub fn scopes(&self) -> &ScopeTree {
        &self.scopes
    }

    pub fn add_group(&mut self, parent: ScopeId, name: &str) -> ScopeId {
        self.scopes.add_group(parent, name)
    }

    /// Track `var`, replacing any variable with the same identity.
    pub fn add_variable(&mut self, var: VariableValue) -> ValueId {
        let scope = var.scope.unwrap_or(self.scopes.root());
        self.scopes.declare(scope, &var.name);
        let id = self.scopes.value_id(var.scope, &var.name);
        self.variables.insert(id.clone(), var);
        id
    }

    pub fn variable(&self, id: &ValueId) -> Option<&VariableValue> {
        self.variables.get(id)
    }

    pub fn variable_mut(&mut self, id: &ValueId) -> Option<&mut VariableValue> {
        self.variables.get_mut(id)
    }

    pub fn variables(&self) -> impl Iterator<Item = (&ValueId, &VariableValue)> {
        self.variables.iter()
    }

    /// The variable `name` refers to when written inside `scope`.
    pub fn lookup(&self, scope: Option<ScopeId>, name: &str) -> Option<&VariableValue> {
        self.variables.get(&self.scopes.lookup_id(scope, name))
    }

    /// Record that `id` is computed by an equation, so a reset allocates
    /// it without initialising it.
    pub fn mark_defined(&mut self, id: ValueId) {
        self.defined.insert(id);
    }

    pub fn is_defined(&self, id: &ValueId) -> bool {
        self.defined.contains(id)
    }

    /// The first of `base1`, `base2`, ... not naming a global variable.
    pub fn new_name(&self, base: &str) -> String {
        let mut i = 1;
        loop {
            let name = format!("{base}{i}");
            if !self.variables.contains_key(&ValueId::global(&name)) {
                return name;
            }
            i += 1;
        }
    }

    fn unknown(id: &ValueId) -> Result<()> {
        var_err!(UnknownVariable, format!("Unknown variable {id}"))
    }

    /// Load `reader` into the literal data of variable `id`.  The variable
    /// is only touched once the whole tensor has been built.
    pub fn load_csv(
        &mut self,
        id: &ValueId,
        reader: &mut dyn BufRead,
        spec: &DataSpec,
        budget: &dyn MemoryBudget,
    ) -> Result<()> {
        if !self.variables.contains_key(id) {
            return Self::unknown(id);
        }
        let tensor = load_tensor(reader, spec, budget)?;
        debug!(
            variable = %id,
            rank = tensor.rank(),
            size = tensor.size(),
            dense = tensor.is_dense(),
            "loaded tensor"
        );
        let Some(var) = self.variables.get_mut(id) else {
            return Self::unknown(id);
        };
        if var.handle().is_some_and(|h| self.arena.is_valid(&h)) {
            var.assign(&tensor, &mut self.arena)?;
        }
        var.tensor_init = Some(tensor);
        Ok(())
    }

    fn with_dimension_overrides(&self, tensor: &TensorValue) -> TensorValue {
        let mut tensor = tensor.clone();
        if self.dimensions.is_empty() {
            return tensor;
        }
        let mut hypercube = tensor.hypercube().clone();
        for xv in hypercube.xvectors.iter_mut() {
            if let Some(dim) = self.dimensions.get(&xv.name) {
                xv.dimension = dim.clone();
            }
        }
        tensor.set_hypercube(hypercube);
        tensor
    }

    /// Rebuild every variable's value from scratch.
    ///
    /// All initial values are resolved before anything is modified, so a
    /// failed reset leaves the previous values in place.  The pools are
    /// then emptied and every variable is reallocated and written in
    /// `ValueId` order.
    pub fn reset(&mut self) -> Result<()> {
        let mut rng = StdRng::seed_from_u64(self.rng_seed);
        let mut resolved: Vec<Option<TensorValue>> = Vec::with_capacity(self.variables.len());
        let (mut flow_size, mut stock_size) = (0usize, 0usize);

        let mut resolver = Resolver {
            variables: &self.variables,
            scopes: &self.scopes,
            rng: &mut rng,
        };
        for (id, var) in self.variables.iter() {
            let value = match var.kind.pool() {
                None => None,
                Some(_) if var.is_flow_var() && self.defined.contains(id) => None,
                Some(_) => Some(match &var.tensor_init {
                    Some(tensor) => self.with_dimension_overrides(tensor),
                    None => resolver.init_value(var, &mut BTreeSet::new())?,
                }),
            };
            let size = value.as_ref().map_or_else(|| var.size(), |t| t.size());
            match var.kind.pool() {
                Some(Pool::Flow) => flow_size = flow_size.saturating_add(size),
                Some(Pool::Stock) => stock_size = stock_size.saturating_add(size),
                None => {}
            }
            resolved.push(value);
        }

        self.arena.reserve(Pool::Flow, flow_size)?;
        self.arena.reserve(Pool::Stock, stock_size)?;
        self.arena.clear();
        for (var, value) in self.variables.values_mut().zip(resolved) {
            var.unbind();
            match value {
                Some(tensor) => var.assign(&tensor, &mut self.arena)?,
                None => var.alloc_value(&mut self.arena)?,
            }
        }
        debug!(
            variables = self.variables.len(),
            flow_vars = self.arena.pool(Pool::Flow).len(),
            stock_vars = self.arena.pool(Pool::Stock).len(),
            generation = self.arena.generation(),
            "reset"
        );
        Ok(())
    }

    /// The current value of `id`.
    pub fn value(&self, id: &ValueId) -> Result<TensorValue> {
        match self.variables.get(id) {
            Some(var) => var.to_tensor(&self.arena),
            None => var_err!(UnknownVariable, format!("Unknown variable {id}")),
        }
    }

    pub fn val_ref_mut(&mut self, id: &ValueId) -> Result<&mut [f64]> {
        match self.variables.get_mut(id) {
            Some(var) => var.val_ref_mut(&mut self.arena),
            None => var_err!(UnknownVariable, format!("Unknown variable {id}")),
        }
    }

    /// Write the current value of `id`, or its literal data if it has not
    /// been allocated yet.
    pub fn export_as_csv(&self, id: &ValueId, writer: &mut dyn Write, comment: &str) -> Result<()> {
        let Some(var) = self.variables.get(id) else {
            return Self::unknown(id);
        };
        if let Some(values) = var.handle().and_then(|h| self.arena.get(&h)) {
            return export_as_csv(writer, var.hypercube(), var.index(), values, comment);
        }
        match &var.tensor_init {
            Some(tensor) => export_tensor(writer, tensor, comment),
            None => var_err!(InvalidAccess, format!("{} has no value to export", var.name)),
        }
    }

    #[cfg(feature = "file_io")]
    pub fn load_csv_from_path(
        &mut self,
        id: &ValueId,
        path: &std::path::Path,
        spec: &DataSpec,
        budget: &dyn MemoryBudget,
    ) -> Result<()> {
        let file = std::fs::File::open(path)?;
        self.load_csv(id, &mut std::io::BufReader::new(file), spec, budget)
    }

    #[cfg(feature = "file_io")]
    pub fn export_to_path(&self, id: &ValueId, path: &std::path::Path, comment: &str) -> Result<()> {
        use crate::common::{Error, ErrorCode, ErrorKind};

        let file = std::fs::File::create(path)
            .map_err(|err| Error::new(ErrorKind::Export, ErrorCode::Io, Some(err.to_string())))?;
        self.export_as_csv(id, &mut std::io::BufWriter::new(file), comment)
    }
}
