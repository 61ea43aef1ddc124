// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::collections::BTreeMap;

use crate::hypercube::Hypercube;

/// Ordered axis labels identifying one tensor cell.
pub type Key = Vec<String>;

#[derive(Clone, Debug, PartialEq)]
pub enum TensorData {
    /// One value per hypercube cell.
    Dense(Vec<f64>),
    /// Populated cells only, keyed by mixed-radix offset.
    Sparse(BTreeMap<usize, f64>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct TensorValue {
    hypercube: Hypercube,
    data: TensorData,
}

impl TensorValue {
    pub fn scalar(value: f64) -> Self {
        TensorValue {
            hypercube: Hypercube::default(),
            data: TensorData::Dense(vec![value]),
        }
    }

    /// Callers guarantee `data.len()` equals the hypercube's cell count.
    pub fn dense(hypercube: Hypercube, data: Vec<f64>) -> Self {
        debug_assert_eq!(hypercube.num_elements(), data.len());
        TensorValue {
            hypercube,
            data: TensorData::Dense(data),
        }
    }

    pub fn sparse(hypercube: Hypercube, data: BTreeMap<usize, f64>) -> Self {
        TensorValue {
            hypercube,
            data: TensorData::Sparse(data),
        }
    }

    pub fn hypercube(&self) -> &Hypercube {
        &self.hypercube
    }

    pub fn set_hypercube(&mut self, hypercube: Hypercube) {
        self.hypercube = hypercube;
    }

    pub fn data(&self) -> &TensorData {
        &self.data
    }

    pub fn rank(&self) -> usize {
        self.hypercube.rank()
    }

    pub fn is_dense(&self) -> bool {
        matches!(self.data, TensorData::Dense(_))
    }

    /// Number of stored values.
    pub fn size(&self) -> usize {
        match &self.data {
            TensorData::Dense(v) => v.len(),
            TensorData::Sparse(m) => m.len(),
        }
    }

    /// Offsets of the stored values; empty for a dense tensor.
    pub fn index(&self) -> Vec<usize> {
        match &self.data {
            TensorData::Dense(_) => Vec::new(),
            TensorData::Sparse(m) => m.keys().copied().collect(),
        }
    }

    /// Stored values in offset order.
    pub fn values(&self) -> Vec<f64> {
        match &self.data {
            TensorData::Dense(v) => v.clone(),
            TensorData::Sparse(m) => m.values().copied().collect(),
        }
    }

    /// Value of the cell at `offset`; unpopulated sparse cells are NaN.
    pub fn get(&self, offset: usize) -> f64 {
        match &self.data {
            TensorData::Dense(v) => v.get(offset).copied().unwrap_or(f64::NAN),
            TensorData::Sparse(m) => m.get(&offset).copied().unwrap_or(f64::NAN),
        }
    }

    /// Value of the cell addressed by axis labels.
    pub fn get_by_key(&self, key: &[&str]) -> Option<f64> {
        if key.len() != self.rank() {
            return None;
        }
        let ordinals = self
            .hypercube
            .xvectors
            .iter()
            .zip(key)
            .map(|(xv, label)| xv.labels().iter().position(|l| l == label))
            .collect::<Option<Vec<usize>>>()?;
        Some(self.get(self.hypercube.join_offset(&ordinals)))
    }

    pub fn scale(mut self, coef: f64) -> Self {
        match &mut self.data {
            TensorData::Dense(v) => v.iter_mut().for_each(|x| *x *= coef),
            TensorData::Sparse(m) => m.values_mut().for_each(|x| *x *= coef),
        }
        self
    }
}
