// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Initial values for variables without literal data.

use std::collections::{BTreeMap, BTreeSet};

use rand::rngs::StdRng;
use rand::Rng;

use ravel_core::{Hypercube, TensorValue};

use crate::common::{Error, Result};
use crate::flow_coef::FlowCoef;
use crate::scope::{ScopeTree, ValueId};
use crate::var_err;
use crate::variable::VariableValue;

/// Built-in tensor generators, called as `name(d1,d2,...)`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Generator {
    Iota,
    One,
    Zero,
    Eye,
    Rand,
}

impl Generator {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim() {
            "iota" => Some(Generator::Iota),
            "one" => Some(Generator::One),
            "zero" => Some(Generator::Zero),
            "eye" => Some(Generator::Eye),
            "rand" => Some(Generator::Rand),
            _ => None,
        }
    }

    /// Build a tensor of value axes sized by `dims`.
    pub fn generate(self, dims: &[usize], rng: &mut StdRng) -> Result<TensorValue> {
        let hypercube = Hypercube::from_dims(dims);
        let n = hypercube
            .checked_num_elements()
            .ok_or_else(Error::exhausted_memory)?;
        let mut values: Vec<f64> = Vec::new();
        values
            .try_reserve_exact(n)
            .map_err(|_| Error::exhausted_memory())?;

        match self {
            Generator::Iota => values.extend((0..n).map(|i| i as f64)),
            Generator::One => values.resize(n, 1.0),
            Generator::Zero => values.resize(n, 0.0),
            Generator::Eye => {
                values.resize(n, 0.0);
                // offset of (1,1,...,1); the i'th diagonal cell is i strides in
                let mut stride = 0;
                let mut radix = 1;
                for &d in dims {
                    stride += radix;
                    radix *= d;
                }
                let diagonal = dims.iter().copied().min().unwrap_or(1);
                for i in 0..diagonal {
                    values[i * stride] = 1.0;
                }
            }
            Generator::Rand => values.extend((0..n).map(|_| rng.random::<f64>())),
        }
        Ok(TensorValue::dense(hypercube, values))
    }
}

/// Split `fn(d1,d2,...)` into the generator and its dimensions.  Returns
/// None when `name` is not a call.
fn parse_call(name: &str) -> Option<Result<(Generator, Vec<usize>)>> {
    let (func, rest) = name.split_once('(')?;
    let Some(generator) = Generator::from_name(func) else {
        return Some(var_err!(
            InvalidExpression,
            format!("unknown tensor generator {}", func.trim())
        ));
    };
    let Some(args) = rest.trim_end().strip_suffix(')') else {
        return Some(var_err!(
            InvalidExpression,
            format!("missing ')' in {name}")
        ));
    };
    if args.trim().is_empty() {
        return Some(Ok((generator, Vec::new())));
    }
    let dims = args
        .split(',')
        .map(|arg| match arg.trim().parse::<usize>() {
            Ok(d) if d > 0 => Ok(d),
            _ => var_err!(
                InvalidExpression,
                format!("invalid dimension '{}' in {}", arg.trim(), name)
            ),
        })
        .collect::<Result<Vec<_>>>();
    Some(dims.map(|dims| (generator, dims)))
}

/// Resolves initial value expressions against a table of variables.
pub struct Resolver<'a> {
    pub variables: &'a BTreeMap<ValueId, VariableValue>,
    pub scopes: &'a ScopeTree,
    pub rng: &'a mut StdRng,
}

impl Resolver<'_> {
    /// The initial value of `var`.  `visited` holds the identities already
    /// being resolved further up the chain of references.
    pub fn init_value(
        &mut self,
        var: &VariableValue,
        visited: &mut BTreeSet<ValueId>,
    ) -> Result<TensorValue> {
        if let Some(tensor) = &var.tensor_init {
            return Ok(tensor.clone());
        }

        let fc = FlowCoef::parse(&var.init);
        if fc.name.is_empty() {
            return Ok(TensorValue::scalar(fc.coef));
        }

        if let Some(call) = parse_call(&fc.name) {
            let (generator, dims) = call?;
            return Ok(generator.generate(&dims, self.rng)?.scale(fc.coef));
        }

        let id = self.scopes.lookup_id(var.scope, &fc.name);
        let variables = self.variables;
        let Some(referenced) = variables.get(&id) else {
            return var_err!(
                UnknownVariable,
                format!("Unknown variable {} in initialisation of {}", fc.name, var.name)
            );
        };
        if !visited.insert(id) {
            return var_err!(
                CircularDefinition,
                format!("circular definition of initial value for {}", fc.name)
            );
        }
        Ok(self.init_value(referenced, visited)?.scale(fc.coef))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ErrorCode;
    use crate::variable::VarKind;
    use rand::SeedableRng;

    fn table(vars: &[(&str, &str)]) -> BTreeMap<ValueId, VariableValue> {
        vars.iter()
            .map(|(name, init)| {
                (
                    ValueId::global(name),
                    VariableValue::new(VarKind::Constant, name, init),
                )
            })
            .collect()
    }

    fn resolve(vars: &BTreeMap<ValueId, VariableValue>, name: &str) -> Result<TensorValue> {
        let scopes = ScopeTree::new();
        let mut rng = StdRng::seed_from_u64(0);
        let mut resolver = Resolver {
            variables: vars,
            scopes: &scopes,
            rng: &mut rng,
        };
        resolver.init_value(&vars[&ValueId::global(name)], &mut BTreeSet::new())
    }

    #[test]
    fn test_scalar_and_reference_chain() {
        let vars = table(&[("a", "2.5"), ("b", "2a"), ("c", "-b"), ("d", "")]);
        assert_eq!(vec![2.5], resolve(&vars, "a").unwrap().values());
        assert_eq!(vec![5.0], resolve(&vars, "b").unwrap().values());
        assert_eq!(vec![-5.0], resolve(&vars, "c").unwrap().values());
        assert_eq!(vec![1.0], resolve(&vars, "d").unwrap().values());
    }

    #[test]
    fn test_literal_tensor_wins() {
        let mut vars = table(&[("a", "7")]);
        let literal = TensorValue::dense(Hypercube::from_dims(&[2]), vec![1.0, 2.0]);
        vars.get_mut(&ValueId::global("a")).unwrap().tensor_init = Some(literal.clone());
        assert_eq!(literal, resolve(&vars, "a").unwrap());
    }

    #[test]
    fn test_unknown_variable() {
        let vars = table(&[("x", "3y")]);
        let err = resolve(&vars, "x").unwrap_err();
        assert_eq!(ErrorCode::UnknownVariable, err.code);
        assert_eq!(
            Some("Unknown variable y in initialisation of x".to_owned()),
            err.get_details()
        );
    }

    #[test]
    fn test_circular_definition() {
        let vars = table(&[("X", "1*Y"), ("Y", "1*X")]);
        let err = resolve(&vars, "X").unwrap_err();
        assert_eq!(ErrorCode::CircularDefinition, err.code);

        let vars = table(&[("self", "2self")]);
        let err = resolve(&vars, "self").unwrap_err();
        assert_eq!(ErrorCode::CircularDefinition, err.code);
    }

    #[test]
    fn test_diamond_is_not_a_cycle() {
        let vars = table(&[("top", "left"), ("left", "base"), ("base", "4")]);
        assert_eq!(vec![4.0], resolve(&vars, "top").unwrap().values());
    }

    #[test]
    fn test_generators() {
        let vars = table(&[
            ("i", "iota(2,3)"),
            ("o", "2one(2)"),
            ("z", "zero(3)"),
            ("e", "eye(3,3)"),
            ("r", "rand(4)"),
        ]);
        let i = resolve(&vars, "i").unwrap();
        assert_eq!(vec![2, 3], i.hypercube().dims());
        assert_eq!(vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0], i.values());
        assert_eq!("1", i.hypercube().xvectors[1].name);
        assert_eq!(vec![2.0, 2.0], resolve(&vars, "o").unwrap().values());
        assert_eq!(vec![0.0; 3], resolve(&vars, "z").unwrap().values());

        let e = resolve(&vars, "e").unwrap().values();
        assert_eq!(9, e.len());
        for (offset, v) in e.iter().enumerate() {
            let expected = if [0, 4, 8].contains(&offset) { 1.0 } else { 0.0 };
            assert_eq!(expected, *v, "offset {offset}");
        }

        let r = resolve(&vars, "r").unwrap().values();
        assert!(r.iter().all(|v| (0.0..1.0).contains(v)));
        assert_eq!(r, resolve(&vars, "r").unwrap().values());
    }

    #[test]
    fn test_eye_rectangular() {
        let vars = table(&[("e", "eye(2,3)"), ("c", "eye(2,2,2)")]);
        // offsets of (0,0) and (1,1) in a 2x3 cube
        let e = resolve(&vars, "e").unwrap().values();
        assert_eq!(vec![1.0, 0.0, 0.0, 1.0, 0.0, 0.0], e);
        let c = resolve(&vars, "c").unwrap().values();
        assert_eq!(1.0, c[0]);
        assert_eq!(1.0, c[7]);
        assert_eq!(2.0, c.iter().sum::<f64>());
    }

    #[test]
    fn test_bad_generators() {
        let vars = table(&[("a", "ones(3)"), ("b", "iota(3"), ("c", "iota(0)"), ("d", "iota(x)")]);
        for name in ["a", "b", "c", "d"] {
            let err = resolve(&vars, name).unwrap_err();
            assert_eq!(ErrorCode::InvalidExpression, err.code, "{name}");
        }
        let vars = table(&[("s", "iota()")]);
        assert_eq!(vec![0.0], resolve(&vars, "s").unwrap().values());
    }
}
