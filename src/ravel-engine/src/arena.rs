// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Two append-only numeric pools that every variable's value lives in.

use crate::common::{Error, Result};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Pool {
    /// Values recomputed every step.
    Flow,
    /// Integrated or held values.
    Stock,
}

/// A checked reference to a slice of one pool.
///
/// A handle is only honoured while the arena is in the generation that
/// issued it and the slice still fits in its pool.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ValueHandle {
    pool: Pool,
    offset: usize,
    len: usize,
    generation: u64,
}

impl ValueHandle {
    pub fn pool(&self) -> Pool {
        self.pool
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValueArena {
    flow_vars: Vec<f64>,
    stock_vars: Vec<f64>,
    generation: u64,
}

impl ValueArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn pool(&self, pool: Pool) -> &[f64] {
        match pool {
            Pool::Flow => &self.flow_vars,
            Pool::Stock => &self.stock_vars,
        }
    }

    fn pool_mut(&mut self, pool: Pool) -> &mut Vec<f64> {
        match pool {
            Pool::Flow => &mut self.flow_vars,
            Pool::Stock => &mut self.stock_vars,
        }
    }

    /// Append `len` zeroed slots to `pool`.  Slices handed out earlier stay
    /// where they are.
    pub fn alloc(&mut self, pool: Pool, len: usize) -> Result<ValueHandle> {
        let generation = self.generation;
        let values = self.pool_mut(pool);
        values
            .try_reserve(len)
            .map_err(|_| Error::exhausted_memory())?;
        let offset = values.len();
        values.resize(offset + len, 0.0);
        Ok(ValueHandle {
            pool,
            offset,
            len,
            generation,
        })
    }

    /// Ensure `pool` can hold `total` values without reallocating.
    pub fn reserve(&mut self, pool: Pool, total: usize) -> Result<()> {
        let values = self.pool_mut(pool);
        let additional = total.saturating_sub(values.len());
        values
            .try_reserve(additional)
            .map_err(|_| Error::exhausted_memory())
    }

    pub fn is_valid(&self, handle: &ValueHandle) -> bool {
        handle.generation == self.generation
            && handle
                .offset
                .checked_add(handle.len)
                .is_some_and(|end| end <= self.pool(handle.pool).len())
    }

    pub fn get(&self, handle: &ValueHandle) -> Option<&[f64]> {
        if !self.is_valid(handle) {
            return None;
        }
        Some(&self.pool(handle.pool)[handle.offset..handle.offset + handle.len])
    }

    pub fn get_mut(&mut self, handle: &ValueHandle) -> Option<&mut [f64]> {
        if !self.is_valid(handle) {
            return None;
        }
        let range = handle.offset..handle.offset + handle.len;
        Some(&mut self.pool_mut(handle.pool)[range])
    }

    /// Empty both pools, invalidating every outstanding handle.
    pub fn clear(&mut self) {
        self.flow_vars.clear();
        self.stock_vars.clear();
        self.generation += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_is_append_only() {
        let mut arena = ValueArena::new();
        let a = arena.alloc(Pool::Flow, 2).unwrap();
        let b = arena.alloc(Pool::Flow, 3).unwrap();
        let s = arena.alloc(Pool::Stock, 1).unwrap();
        assert_eq!((0, 2), (a.offset(), a.len()));
        assert_eq!((2, 3), (b.offset(), b.len()));
        assert_eq!(0, s.offset());
        assert_eq!(5, arena.pool(Pool::Flow).len());
        assert_eq!(1, arena.pool(Pool::Stock).len());

        arena.get_mut(&a).unwrap().copy_from_slice(&[1.0, 2.0]);
        arena.alloc(Pool::Flow, 100).unwrap();
        assert_eq!(&[1.0, 2.0], arena.get(&a).unwrap());
        assert_eq!(&[0.0, 0.0, 0.0], arena.get(&b).unwrap());
    }

    #[test]
    fn test_clear_invalidates_handles() {
        let mut arena = ValueArena::new();
        let a = arena.alloc(Pool::Stock, 4).unwrap();
        assert!(arena.is_valid(&a));
        arena.clear();
        assert!(!arena.is_valid(&a));
        assert!(arena.get(&a).is_none());
        // even once the pool has regrown past the old slice
        arena.alloc(Pool::Stock, 8).unwrap();
        assert!(arena.get_mut(&a).is_none());
        assert_eq!(1, arena.generation());
    }

    #[test]
    fn test_empty_slice() {
        let mut arena = ValueArena::new();
        let h = arena.alloc(Pool::Flow, 0).unwrap();
        assert!(h.is_empty());
        assert_eq!(Some(&[][..]), arena.get(&h));
    }
}
