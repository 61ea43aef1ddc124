// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::collections::BTreeMap;
use std::fmt;

use ravel_core::{Hypercube, TensorData, TensorValue};

use crate::arena::{Pool, ValueArena, ValueHandle};
use crate::common::Result;
use crate::scope::ScopeId;
use crate::var_err;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum VarKind {
    Flow,
    TempFlow,
    Constant,
    Parameter,
    Stock,
    Integral,
    Undefined,
}

impl VarKind {
    /// The pool holding values of this kind; undefined values have none.
    pub fn pool(self) -> Option<Pool> {
        match self {
            VarKind::Flow | VarKind::TempFlow | VarKind::Constant | VarKind::Parameter => {
                Some(Pool::Flow)
            }
            VarKind::Stock | VarKind::Integral => Some(Pool::Stock),
            VarKind::Undefined => None,
        }
    }

    pub fn is_flow_var(self) -> bool {
        !matches!(self, VarKind::Stock | VarKind::Integral)
    }
}

impl fmt::Display for VarKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            VarKind::Flow => "flow",
            VarKind::TempFlow => "tempFlow",
            VarKind::Constant => "constant",
            VarKind::Parameter => "parameter",
            VarKind::Stock => "stock",
            VarKind::Integral => "integral",
            VarKind::Undefined => "undefined",
        };
        write!(f, "{name}")
    }
}

/// A model variable's value: its shape, its binding into the value arena
/// and how to compute its initial value.
#[derive(Clone, Debug)]
pub struct VariableValue {
    pub name: String,
    pub scope: Option<ScopeId>,
    pub kind: VarKind,
    hypercube: Hypercube,
    /// Offsets of the stored cells when sparse; `None` when dense.
    index: Option<Vec<usize>>,
    handle: Option<ValueHandle>,
    /// Literal data, typically loaded from a file.
    pub tensor_init: Option<TensorValue>,
    /// Initial value expression, used when there is no literal data.
    pub init: String,
}

impl VariableValue {
    pub fn new(kind: VarKind, name: &str, init: &str) -> Self {
        VariableValue {
            name: name.to_owned(),
            scope: None,
            kind,
            hypercube: Hypercube::default(),
            index: None,
            handle: None,
            tensor_init: None,
            init: init.to_owned(),
        }
    }

    pub fn in_scope(mut self, scope: ScopeId) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn with_tensor(mut self, tensor: TensorValue) -> Self {
        self.tensor_init = Some(tensor);
        self
    }

    pub fn hypercube(&self) -> &Hypercube {
        &self.hypercube
    }

    pub fn index(&self) -> Option<&[usize]> {
        self.index.as_deref()
    }

    pub fn is_dense(&self) -> bool {
        self.index.is_none()
    }

    pub fn rank(&self) -> usize {
        self.hypercube.rank()
    }

    /// Number of slots the value occupies.
    pub fn size(&self) -> usize {
        match &self.index {
            Some(index) => index.len(),
            None => self.hypercube.num_elements(),
        }
    }

    pub fn handle(&self) -> Option<ValueHandle> {
        self.handle
    }

    pub fn is_flow_var(&self) -> bool {
        self.kind.is_flow_var()
    }

    /// Change the value's shape.  Any binding is dropped, as the old slice
    /// no longer fits.
    pub fn set_shape(&mut self, hypercube: Hypercube, index: Option<Vec<usize>>) {
        self.hypercube = hypercube;
        self.index = index;
        self.handle = None;
    }

    pub fn unbind(&mut self) {
        self.handle = None;
    }

    /// Bind a freshly appended slice of the matching pool.  Every call
    /// appends, so only call this once per reset.
    pub fn alloc_value(&mut self, arena: &mut ValueArena) -> Result<()> {
        self.handle = match self.kind.pool() {
            Some(pool) => Some(arena.alloc(pool, self.size())?),
            None => None,
        };
        Ok(())
    }

    /// The bound slice, allocating it first if the value is unbound.
    pub fn val_ref_mut<'a>(&mut self, arena: &'a mut ValueArena) -> Result<&'a mut [f64]> {
        if self.kind.pool().is_none() {
            return var_err!(
                InvalidAccess,
                format!("invalid access of variable value reference: {}", self.name)
            );
        }
        if self.handle.is_none() {
            self.alloc_value(arena)?;
        }
        if let Some(handle) = self.handle {
            if let Some(slice) = arena.get_mut(&handle) {
                return Ok(slice);
            }
        }
        var_err!(
            InvalidAccess,
            format!("invalid access of variable value reference: {}", self.name)
        )
    }

    /// The bound slice, or a single shared zero while the value is unbound
    /// or its binding is stale.
    pub fn val_ref<'a>(&self, arena: &'a ValueArena) -> &'a [f64] {
        static ZERO: [f64; 1] = [0.0];
        self.handle
            .as_ref()
            .and_then(|h| arena.get(h))
            .unwrap_or(&ZERO[..])
    }

    pub fn value(&self, arena: &ValueArena) -> f64 {
        self.val_ref(arena).first().copied().unwrap_or(0.0)
    }

    /// Take the shape of `tensor` and copy its values in.  A tensor of a
    /// different size gets a new slice appended to the pool.
    pub fn assign(&mut self, tensor: &TensorValue, arena: &mut ValueArena) -> Result<()> {
        if self.kind.pool().is_none() {
            return var_err!(
                InvalidAccess,
                format!("cannot assign to undefined variable {}", self.name)
            );
        }
        if self.handle.is_some_and(|h| h.len() != tensor.size()) {
            self.handle = None;
        }
        self.hypercube = tensor.hypercube().clone();
        self.index = match tensor.data() {
            TensorData::Dense(_) => None,
            TensorData::Sparse(values) => Some(values.keys().copied().collect()),
        };

        let slice = self.val_ref_mut(arena)?;
        match tensor.data() {
            TensorData::Dense(values) => slice.copy_from_slice(values),
            TensorData::Sparse(values) => {
                for (dst, v) in slice.iter_mut().zip(values.values()) {
                    *dst = *v;
                }
            }
        }
        Ok(())
    }

    /// The current value, read back out of the arena.
    pub fn to_tensor(&self, arena: &ValueArena) -> Result<TensorValue> {
        let Some(values) = self.handle.as_ref().and_then(|h| arena.get(h)) else {
            return var_err!(InvalidAccess, format!("{} has no current value", self.name));
        };
        let Some(index) = &self.index else {
            return Ok(TensorValue::dense(self.hypercube.clone(), values.to_vec()));
        };
        let data: BTreeMap<usize, f64> = index
            .iter()
            .copied()
            .zip(values.iter().copied())
            .collect();
        Ok(TensorValue::sparse(self.hypercube.clone(), data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ErrorCode;

    #[test]
    fn test_kinds_map_to_pools() {
        assert_eq!(Some(Pool::Flow), VarKind::Constant.pool());
        assert_eq!(Some(Pool::Flow), VarKind::TempFlow.pool());
        assert_eq!(Some(Pool::Stock), VarKind::Integral.pool());
        assert_eq!(None, VarKind::Undefined.pool());
        assert!(VarKind::Parameter.is_flow_var());
        assert!(!VarKind::Stock.is_flow_var());
    }

    #[test]
    fn test_val_ref_allocates_when_unbound() {
        let mut arena = ValueArena::new();
        let mut v = VariableValue::new(VarKind::Stock, "s", "0");
        assert_eq!(&[0.0], v.val_ref(&arena));
        v.val_ref_mut(&mut arena).unwrap()[0] = 3.0;
        assert_eq!(3.0, v.value(&arena));
        assert_eq!(1, arena.pool(Pool::Stock).len());
        assert!(arena.pool(Pool::Flow).is_empty());
    }

    #[test]
    fn test_undefined_access() {
        let mut arena = ValueArena::new();
        let mut v = VariableValue::new(VarKind::Undefined, "u", "");
        let err = v.val_ref_mut(&mut arena).unwrap_err();
        assert_eq!(ErrorCode::InvalidAccess, err.code);
        assert_eq!(0.0, v.value(&arena));
        assert!(v.assign(&TensorValue::scalar(1.0), &mut arena).is_err());
    }

    #[test]
    fn test_stale_binding_reads_zero_and_fails_writes() {
        let mut arena = ValueArena::new();
        let mut v = VariableValue::new(VarKind::Flow, "f", "0");
        v.assign(&TensorValue::scalar(5.0), &mut arena).unwrap();
        arena.clear();
        assert_eq!(0.0, v.value(&arena));
        let err = v.val_ref_mut(&mut arena).unwrap_err();
        assert_eq!(ErrorCode::InvalidAccess, err.code);
    }

    #[test]
    fn test_assign_resizes() {
        let mut arena = ValueArena::new();
        let mut other = VariableValue::new(VarKind::Flow, "other", "0");
        let mut v = VariableValue::new(VarKind::Flow, "v", "0");
        v.assign(&TensorValue::scalar(1.0), &mut arena).unwrap();
        other.assign(&TensorValue::scalar(2.0), &mut arena).unwrap();

        let t = TensorValue::dense(Hypercube::from_dims(&[3]), vec![7.0, 8.0, 9.0]);
        v.assign(&t, &mut arena).unwrap();
        assert_eq!(2, v.handle().unwrap().offset());
        assert_eq!(&[7.0, 8.0, 9.0], v.val_ref(&arena));
        // the neighbouring slice is untouched
        assert_eq!(2.0, other.value(&arena));
        assert_eq!(t, v.to_tensor(&arena).unwrap());
    }

    #[test]
    fn test_sparse_assign() {
        let mut arena = ValueArena::new();
        let data: BTreeMap<usize, f64> = [(1, 4.0), (5, 6.0)].into_iter().collect();
        let t = TensorValue::sparse(Hypercube::from_dims(&[2, 3]), data);
        let mut v = VariableValue::new(VarKind::Parameter, "p", "");
        v.assign(&t, &mut arena).unwrap();
        assert_eq!(2, v.size());
        assert_eq!(Some(&[1, 5][..]), v.index());
        assert_eq!(&[4.0, 6.0], v.val_ref(&arena));
        assert_eq!(t, v.to_tensor(&arena).unwrap());
    }

    #[test]
    fn test_empty_sparse_stays_sparse() {
        let mut arena = ValueArena::new();
        let t = TensorValue::sparse(Hypercube::from_dims(&[2]), BTreeMap::new());
        let mut v = VariableValue::new(VarKind::Parameter, "p", "");
        v.assign(&t, &mut arena).unwrap();
        assert!(!v.is_dense());
        assert_eq!(0, v.size());
        assert!(arena.pool(Pool::Flow).is_empty());
        assert_eq!(t, v.to_tensor(&arena).unwrap());
    }
}
